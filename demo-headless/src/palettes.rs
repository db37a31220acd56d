//! Intensity-to-colour tables for the headless renderer.

use clap::ValueEnum;
use cyberfire_core::{Palette, MAX_INTENSITY};

/// Named palettes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaletteKind {
    Fire,
    Gray,
    Cyber,
    ColdFire,
    Sunset,
    Toxic,
    Electric,
}

impl PaletteKind {
    /// Build the 256-entry table for this palette.
    pub fn build(self) -> Palette {
        let f: fn(f32) -> [f32; 3] = match self {
            PaletteKind::Fire => fire,
            PaletteKind::Gray => gray,
            PaletteKind::Cyber => cyber,
            PaletteKind::ColdFire => cold_fire,
            PaletteKind::Sunset => sunset,
            PaletteKind::Toxic => toxic,
            PaletteKind::Electric => electric,
        };
        Palette::from_fn(|i| {
            let t = f32::from(i) / f32::from(MAX_INTENSITY);
            f(t).map(channel)
        })
    }
}

/// Truncate to a colour channel; some ramps overshoot 255 near their knee.
fn channel(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

fn fire(t: f32) -> [f32; 3] {
    if t < 0.33 {
        [255.0 * t * 3.0, 0.0, 0.0]
    } else if t < 0.66 {
        [255.0, 255.0 * (t - 0.33) * 3.0, 0.0]
    } else {
        [255.0, 255.0, 255.0 * (t - 0.66) * 3.0]
    }
}

fn gray(t: f32) -> [f32; 3] {
    let v = 255.0 * t;
    [v, v, v]
}

fn cyber(t: f32) -> [f32; 3] {
    if t < 0.33 {
        let s = t / 0.33;
        [255.0 * s, 0.0, 255.0 * s]
    } else if t < 0.66 {
        let s = (t - 0.33) / 0.33;
        [255.0 * (1.0 - s * 0.5), 100.0 * s, 255.0 * (0.5 + s * 0.5)]
    } else {
        let s = (t - 0.66) / 0.34;
        [0.0, 180.0 + 75.0 * s, 255.0]
    }
}

fn cold_fire(t: f32) -> [f32; 3] {
    if t < 0.5 {
        [0.0, 0.0, 20.0 + 230.0 * t * 2.0]
    } else {
        [200.0 * (t - 0.5) * 2.0, 255.0, 255.0]
    }
}

fn sunset(t: f32) -> [f32; 3] {
    if t < 0.33 {
        let s = t / 0.33;
        [50.0 + 610.0 * s, 0.0, 80.0 + 130.0 * s]
    } else if t < 0.66 {
        let s = (t - 0.33) / 0.33;
        [255.0, 100.0 * s, 150.0 * (1.0 - s)]
    } else {
        let s = (t - 0.66) / 0.34;
        [255.0, 210.0 * (1.0 - s) + 80.0 * s, 80.0 * (1.0 - s)]
    }
}

fn toxic(t: f32) -> [f32; 3] {
    if t < 0.5 {
        [0.0, 30.0 + 225.0 * t * 2.0, 0.0]
    } else {
        let s = (t - 0.5) * 2.0;
        [100.0 * s, 255.0, 50.0 * (1.0 - s)]
    }
}

fn electric(t: f32) -> [f32; 3] {
    if t < 0.5 {
        [30.0 * t * 2.0, 0.0, 50.0 + 205.0 * t * 2.0]
    } else {
        let s = (t - 0.5) * 2.0;
        [80.0 * s, 180.0 * s, 255.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_ramp() {
        let palette = PaletteKind::Fire.build();
        assert_eq!(palette.color(0), [0, 0, 0]);
        assert_eq!(palette.color(255), [255, 255, 255]);
        assert_eq!(palette.color(127)[0], 255);
    }

    #[test]
    fn test_gray_is_identity() {
        let palette = PaletteKind::Gray.build();
        assert_eq!(palette.color(0), [0, 0, 0]);
        assert_eq!(palette.color(255), [255, 255, 255]);
    }

    #[test]
    fn test_sunset_saturates() {
        let palette = PaletteKind::Sunset.build();
        assert_eq!(palette.color(0), [50, 0, 80]);
        assert_eq!(palette.color(80)[0], 255);
    }
}
