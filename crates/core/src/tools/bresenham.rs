//! Integer line rasterization.

/// Iterator over the integer points of a Bresenham line, both endpoints included.
///
/// The axis with the larger extent drives the walk (ties go to y) and the error
/// accumulator starts at half that extent.
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    x: i32,
    y: i32,
    end: (i32, i32),
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    x_major: bool,
    done: bool,
}

impl BresenhamLine {
    #[must_use]
    pub fn new(from: (i32, i32), to: (i32, i32)) -> Self {
        let dx = (to.0 - from.0).abs();
        let dy = (to.1 - from.1).abs();
        let x_major = dx > dy;
        Self {
            x: from.0,
            y: from.1,
            end: to,
            dx,
            dy,
            sx: if from.0 < to.0 { 1 } else { -1 },
            sy: if from.1 < to.1 { 1 } else { -1 },
            err: if x_major { dx / 2 } else { dy / 2 },
            x_major,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let point = (self.x, self.y);

        if self.x_major {
            if self.x == self.end.0 {
                self.done = true;
                return Some(point);
            }
            self.err -= self.dy;
            if self.err < 0 {
                self.y += self.sy;
                self.err += self.dx;
            }
            self.x += self.sx;
        } else {
            if self.y == self.end.1 {
                self.done = true;
                return Some(point);
            }
            self.err -= self.dx;
            if self.err < 0 {
                self.x += self.sx;
                self.err += self.dy;
            }
            self.y += self.sy;
        }
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line_includes_both_endpoints() {
        let points: Vec<_> = BresenhamLine::new((0, 0), (5, 0)).collect();
        assert_eq!(points, (0..=5).map(|x| (x, 0)).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_point() {
        let points: Vec<_> = BresenhamLine::new((3, 4), (3, 4)).collect();
        assert_eq!(points, vec![(3, 4)]);
    }

    #[test]
    fn test_reverse_vertical() {
        let points: Vec<_> = BresenhamLine::new((2, 3), (2, -1)).collect();
        assert_eq!(points, vec![(2, 3), (2, 2), (2, 1), (2, 0), (2, -1)]);
    }

    #[test]
    fn test_shallow_line_steps_once_per_column() {
        let points: Vec<_> = BresenhamLine::new((0, 0), (6, 2)).collect();
        assert_eq!(points.len(), 7);
        assert_eq!(points.first(), Some(&(0, 0)));
        assert_eq!(points.last(), Some(&(6, 2)));
        for pair in points.windows(2) {
            assert_eq!(pair[1].0 - pair[0].0, 1);
            assert!((pair[1].1 - pair[0].1).abs() <= 1);
        }
    }

    #[test]
    fn test_diagonal_is_y_driven() {
        let points: Vec<_> = BresenhamLine::new((0, 0), (-3, 3)).collect();
        assert_eq!(points, vec![(0, 0), (-1, 1), (-2, 2), (-3, 3)]);
    }
}
