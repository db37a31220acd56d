mod palettes;

use clap::{Parser, ValueEnum};
use cyberfire_core::{
    FireConfig2D, FireConfig3D, FireSimulation2D, FireSimulation3D, RenderPath, RgbImage,
    SpreadParams, SpreadPreset, TracerSettings,
};
use palettes::PaletteKind;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Time advanced per frame, matching a 60 Hz display loop.
const FRAME_TIME: f32 = 1.0 / 60.0;
/// 2D grid used when no size is given. Smaller than the library's 1440x960 default
/// so an unattended run finishes in seconds; pass `--width`/`--height` for full size.
const DEMO_GRID_2D: (usize, usize) = (320, 200);
/// 3D grid edge used when no size is given. The library default is 500 cells.
const DEMO_EXTENT_3D: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    #[value(name = "2d")]
    TwoD,
    #[value(name = "3d")]
    ThreeD,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Normal,
    FloatingSparks,
    BigFire,
}

impl From<Preset> for SpreadPreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Normal => SpreadPreset::Normal,
            Preset::FloatingSparks => SpreadPreset::FloatingSparks,
            Preset::BigFire => SpreadPreset::BigFire,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Renderer {
    Trace,
    Mesh,
}

/// Headless cyberfire runner: advances the automaton and writes PPM frames
#[derive(Parser, Debug)]
#[command(name = "cyberfire-headless")]
#[command(about = "Cellular-automaton fire simulator without a window", long_about = None)]
struct Args {
    /// Simulation dimensionality
    #[arg(short, long, value_enum, default_value_t = Mode::TwoD)]
    mode: Mode,

    /// Grid width in cells [default: 320 in 2D, 48 in 3D]
    #[arg(long, env = "FIRE_WIDTH")]
    width: Option<usize>,

    /// Grid height in cells [default: 200 in 2D, 48 in 3D]
    #[arg(long, env = "FIRE_HEIGHT")]
    height: Option<usize>,

    /// Grid depth in cells (3D only) [default: 48]
    #[arg(long, env = "FIRE_DEPTH")]
    depth: Option<usize>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 120)]
    frames: u32,

    /// Write an image every N frames (the last frame is always written)
    #[arg(long, default_value_t = 30)]
    every: u32,

    /// Spread preset for the automaton
    #[arg(short, long, value_enum, default_value_t = Preset::Normal)]
    preset: Preset,

    /// Colour palette
    #[arg(long, value_enum, default_value_t = PaletteKind::Fire)]
    palette: PaletteKind,

    /// 3D renderer
    #[arg(long, value_enum, default_value_t = Renderer::Trace)]
    renderer: Renderer,

    /// Traced image size as WIDTHxHEIGHT (3D only)
    #[arg(long, default_value = "320x180", value_parser = parse_resolution)]
    resolution: (usize, usize),

    /// Path tracer samples per rendered frame (3D only)
    #[arg(long, default_value_t = 4)]
    samples: u32,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output directory for PPM frames
    #[arg(short, long, default_value = "frames")]
    out: PathBuf,
}

fn parse_resolution(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cyberfire-headless: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    match args.mode {
        Mode::TwoD => run_2d(args),
        Mode::ThreeD => run_3d(args),
    }
}

fn should_write(args: &Args, frame: u32) -> bool {
    frame + 1 == args.frames || (args.every > 0 && frame % args.every == 0)
}

fn run_2d(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = FireConfig2D {
        width: args.width.unwrap_or(DEMO_GRID_2D.0),
        height: args.height.unwrap_or(DEMO_GRID_2D.1),
        spread: SpreadParams::preset(args.preset.into()),
        seed: args.seed,
    };
    let mut sim = FireSimulation2D::new(&config)?;
    sim.set_palette(args.palette.build());

    // A glowing bar a third of the way up, held in place by the fixed mask.
    let (w, h) = (config.width as i32, config.height as i32);
    let bar_y = h / 3;
    sim.fire_rect(w / 4, w * 3 / 4, bar_y, bar_y + 1, None)?;
    sim.set_fixed_rect((w / 4, bar_y), (w * 3 / 4, bar_y + 1), true);

    for frame in 0..args.frames {
        sim.step(frame as f32 * FRAME_TIME);
        if frame % 20 == 10 {
            let x = (frame as i32 * 7) % w.max(1);
            sim.fire_line((x, h / 2), (w - 1 - x, h / 2 + h / 6), 3, 1.0)?;
        }
        if should_write(args, frame) {
            let image = sim.render_frame();
            write_frame(&args.out, frame, &image)?;
        }
    }

    let timer = sim.timer();
    info!(
        "2D run finished: {} frames, {:.2} ms average frame",
        sim.frame(),
        timer.average_frame_time_ms()
    );
    Ok(())
}

fn run_3d(args: &Args) -> Result<(), Box<dyn Error>> {
    let (image_width, image_height) = args.resolution;
    let config = FireConfig3D {
        width: args.width.unwrap_or(DEMO_EXTENT_3D),
        height: args.height.unwrap_or(DEMO_EXTENT_3D),
        depth: args.depth.unwrap_or(DEMO_EXTENT_3D),
        spread: SpreadParams::preset(args.preset.into()),
        seed: args.seed,
        render_path: match args.renderer {
            Renderer::Trace => RenderPath::VoxelTrace,
            Renderer::Mesh => RenderPath::MarchingCubes,
        },
        tracer: TracerSettings {
            image_width,
            image_height,
            samples_per_frame: args.samples,
            ..TracerSettings::default()
        },
        ..FireConfig3D::default()
    };
    let mut sim = FireSimulation3D::new(&config)?;
    sim.set_palette(args.palette.build());

    let (w, h, d) = (config.width as i32, config.height as i32, config.depth as i32);
    sim.apply_heat(w / 2, h / 2, d / 2, (w.min(d) / 6).max(1) as u32, 1.0)?;

    for frame in 0..args.frames {
        sim.step(frame as f32 * FRAME_TIME);
        if frame == 1 && sim.frame_fire().is_none() {
            warn!("Nothing burning to frame, keeping the home camera");
        }
        if should_write(args, frame) {
            let image = sim.render_frame();
            write_frame(&args.out, frame, &image)?;
        }
    }

    let (kept, dropped) = sim.mesh_stats();
    info!(
        "3D run finished: {} frames, {:.2} ms average frame, last mesh {} triangles ({} dropped)",
        sim.frame(),
        sim.timer().average_frame_time_ms(),
        kept,
        dropped
    );
    Ok(())
}

/// Write `image` as a binary PPM (top row first).
fn write_ppm(path: &Path, image: &RgbImage) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write!(writer, "P6\n{} {}\n255\n", image.width(), image.height())?;
    writer.write_all(&image.to_top_down())?;
    writer.flush()
}

fn write_frame(dir: &Path, frame: u32, image: &RgbImage) -> std::io::Result<()> {
    let path = dir.join(format!("frame_{frame:05}.ppm"));
    write_ppm(&path, image)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("640x360"), Ok((640, 360)));
        assert!(parse_resolution("640").is_err());
        assert!(parse_resolution("ax3").is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["cyberfire-headless", "--mode", "3d", "--width", "8"])
            .unwrap();
        assert_eq!(args.mode, Mode::ThreeD);
        assert_eq!(args.width, Some(8));
        assert_eq!(args.palette, PaletteKind::Fire);
        assert_eq!(args.resolution, (320, 180));
        assert_eq!(args.height, None);
    }

    #[test]
    fn test_demo_grids_fit_library_limits() {
        let config = FireConfig2D {
            width: DEMO_GRID_2D.0,
            height: DEMO_GRID_2D.1,
            ..FireConfig2D::default()
        };
        assert!(FireSimulation2D::new(&config).is_ok());
        assert!(DEMO_EXTENT_3D <= FireConfig3D::default().width);
    }

    #[test]
    fn test_write_schedule() {
        let args = Args::try_parse_from(["cyberfire-headless", "--frames", "10", "--every", "4"])
            .unwrap();
        let written: Vec<u32> = (0..10).filter(|&f| should_write(&args, f)).collect();
        assert_eq!(written, vec![0, 4, 8, 9]);
    }
}
