use anyhow::{Context, Result};
use ar_view::sim::{ProbeAnswer, SimulatedCamera, SimulatedRuntime};
use ar_view::{command_channel, ArConfig, ArContext, ArView, FrameInput, ViewCommand};
use clap::{Parser, ValueEnum};
use devices::{PointerEvent, Viewport};
use glam::{Vec2, Vec3};
use placement::Pose;
use scene::{FileTransformStore, MemoryTransformStore, RenderFrame, SceneContent, TransformStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use xr::{FrameSnapshot, XrRuntime};

/// Which simulated platform to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Platform {
    /// Immersive AR supported, hit-testing available
    Immersive,
    /// Immersive AR supported, but hit-test sources are refused
    NoHitTest,
    /// Runtime present, immersive AR unsupported
    Passthrough,
    /// Capability probe fails
    ProbeError,
    /// No AR runtime at all
    NoRuntime,
}

#[derive(Parser)]
#[command(name = "ar-sim")]
#[command(about = "Run the AR placement loop against simulated devices", long_about = None)]
struct Cli {
    /// Content item JSON file
    content: PathBuf,

    /// Item id (defaults to the file stem)
    #[arg(long)]
    item_id: Option<String>,

    /// Simulated platform
    #[arg(long, value_enum, default_value_t = Platform::Immersive)]
    platform: Platform,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 30)]
    frames: u32,

    /// Frames per second of the simulated display
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Tap at `FRAME:X,Y` in pixels (passthrough); repeatable
    #[arg(long, value_parser = parse_tap)]
    tap: Vec<ScriptedTap>,

    /// Hit-test result position `X,Y,Z` reported from `--hit-from` on (immersive)
    #[arg(long, value_parser = parse_vec3)]
    hit: Option<Vec3>,

    /// First frame with a hit-test result
    #[arg(long, default_value_t = 0)]
    hit_from: u32,

    /// Frame with a `select` gesture (immersive); repeatable
    #[arg(long)]
    select: Vec<u32>,

    /// Viewport `WIDTHxHEIGHT` in pixels
    #[arg(long, default_value = "1080x1920", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Simulated camera resolution `WIDTHxHEIGHT`
    #[arg(long, default_value = "1920x1080", value_parser = parse_viewport)]
    camera: Viewport,

    /// Config file (defaults to the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretend the model asset failed to load
    #[arg(long)]
    model_fails: bool,

    /// Save the transform when done
    #[arg(long)]
    save: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScriptedTap {
    frame: u32,
    position: Vec2,
}

#[derive(Serialize)]
struct FrameLine<'a> {
    frame: u32,
    time: f32,
    candidate: Option<Pose>,
    anchor: Option<Pose>,
    render: &'a RenderFrame,
    sent: Vec<ViewCommand>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON lines go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let mut config = ArConfig::load_from(path)?;
            config.apply_env();
            config
        }
        None => ArConfig::load(),
    };

    let item_id = cli.item_id.clone().unwrap_or_else(|| {
        cli.content
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "item".to_string())
    });
    let json = std::fs::read_to_string(&cli.content)
        .with_context(|| format!("Failed to read {}", cli.content.display()))?;
    let content = SceneContent::from_json(&item_id, &json)
        .with_context(|| format!("Invalid content record {}", cli.content.display()))?;

    let store: Arc<dyn TransformStore> = match &config.store.dir {
        Some(dir) => Arc::new(FileTransformStore::new(dir.clone())),
        None => Arc::new(MemoryTransformStore::new()),
    };
    let (commands, mut received) = command_channel(64);
    let ctx = ArContext {
        runtime: runtime_for(cli.platform),
        camera: Arc::new(SimulatedCamera::new(
            cli.camera.width as u32,
            cli.camera.height as u32,
        )),
        store,
        commands: Some(commands),
        config,
    };

    let mut view = ArView::open(&ctx, content, &CancellationToken::new()).await?;
    if cli.model_fails {
        view.renderer_mut().mark_model_failed();
    }
    tracing::info!(path = view.render_path().name(), "Simulation started");

    let start = Instant::now();
    let frame_time = frame_duration(cli.fps)?;
    let mut stdout = std::io::stdout().lock();

    for frame in 0..cli.frames {
        let now = frame_instant(start, frame_time, frame)?;

        let hit = cli.hit.filter(|_| frame >= cli.hit_from);
        let selects = cli.select.iter().filter(|&&f| f == frame).count() as u32;
        let snapshot = match hit {
            Some(position) => FrameSnapshot::hit(Pose::from_position(position)),
            None => FrameSnapshot::empty(),
        }
        .with_selects(selects);

        let taps: Vec<PointerEvent> = cli
            .tap
            .iter()
            .filter(|t| t.frame == frame)
            .enumerate()
            .map(|(i, t)| {
                let id = u64::from(frame) * 16 + i as u64;
                PointerEvent::down(id, t.position.x, t.position.y)
            })
            .collect();

        let input = FrameInput {
            now,
            xr: Some(&snapshot),
            viewer: Some(Pose::IDENTITY),
            pointer: &taps,
            viewport: cli.viewport,
        };
        let render = view.frame(&input)?;

        let mut sent = Vec::new();
        while let Ok(command) = received.try_recv() {
            sent.push(command);
        }

        let line = FrameLine {
            frame,
            time: now.saturating_duration_since(start).as_secs_f32(),
            candidate: view.candidate(),
            anchor: view.anchor().map(|a| a.pose),
            render: &render,
            sent,
        };
        serde_json::to_writer(&mut stdout, &line)?;
        std::io::Write::write_all(&mut stdout, b"\n")?;

        // Let the transform fetch task run
        tokio::task::yield_now().await;
    }

    if cli.save {
        let payload = view.save().await?;
        tracing::info!(hotspots = payload.hotspots.len(), "Saved");
    }
    view.close();
    Ok(())
}

fn runtime_for(platform: Platform) -> Option<Arc<dyn XrRuntime>> {
    let runtime = match platform {
        Platform::Immersive => SimulatedRuntime::new(ProbeAnswer::Supported),
        Platform::NoHitTest => SimulatedRuntime::new(ProbeAnswer::Supported).without_hit_test(),
        Platform::Passthrough => SimulatedRuntime::new(ProbeAnswer::Unsupported),
        Platform::ProbeError => SimulatedRuntime::new(ProbeAnswer::Fail("simulated probe failure".into())),
        Platform::NoRuntime => return None,
    };
    Some(Arc::new(runtime))
}

/// Duration of one simulated frame
fn frame_duration(fps: f32) -> Result<Duration> {
    anyhow::ensure!(fps.is_finite() && fps > 0.0, "fps must be positive");
    Duration::try_from_secs_f32(1.0 / fps)
        .with_context(|| format!("fps {fps} gives no usable frame time"))
}

/// Simulated clock reading at the start of `frame`
fn frame_instant(start: Instant, frame_time: Duration, frame: u32) -> Result<Instant> {
    frame_time
        .checked_mul(frame)
        .and_then(|elapsed| start.checked_add(elapsed))
        .with_context(|| format!("frame {frame} overflows the simulated clock"))
}

fn parse_floats<const N: usize>(s: &str, sep: char) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(sep).map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} values separated by '{sep}', got \"{s}\""));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("\"{part}\" is not a number"))?;
    }
    Ok(out)
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    parse_floats::<3>(s, ',').map(Vec3::from_array)
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let [width, height] = parse_floats::<2>(s, 'x')?;
    let viewport = Viewport::new(width, height);
    if !viewport.is_valid() {
        return Err(format!("\"{s}\" is not a usable size"));
    }
    Ok(viewport)
}

fn parse_tap(s: &str) -> Result<ScriptedTap, String> {
    let (frame, position) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:X,Y, got \"{s}\""))?;
    let frame = frame
        .trim()
        .parse()
        .map_err(|_| format!("\"{frame}\" is not a frame number"))?;
    let [x, y] = parse_floats::<2>(position, ',')?;
    Ok(ScriptedTap {
        frame,
        position: Vec2::new(x, y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tap() {
        assert_eq!(
            parse_tap("12:540,960").unwrap(),
            ScriptedTap {
                frame: 12,
                position: Vec2::new(540.0, 960.0)
            }
        );
        assert!(parse_tap("540,960").is_err());
        assert!(parse_tap("x:1,2").is_err());
    }

    #[test]
    fn test_parse_vec3_and_viewport() {
        assert_eq!(parse_vec3("0, -1.5, -2").unwrap(), Vec3::new(0.0, -1.5, -2.0));
        assert!(parse_vec3("1,2").is_err());
        assert_eq!(parse_viewport("1080x1920").unwrap(), Viewport::new(1080.0, 1920.0));
        assert!(parse_viewport("0x100").is_err());
    }

    #[test]
    fn test_frame_clock_rejects_unusable_rates() {
        assert_eq!(frame_duration(2.0).unwrap(), Duration::from_millis(500));
        assert!(frame_duration(1e-39).is_err());
        assert!(frame_duration(0.0).is_err());
        assert!(frame_duration(f32::NAN).is_err());

        let start = Instant::now();
        assert_eq!(
            frame_instant(start, Duration::from_millis(20), 3).unwrap(),
            start + Duration::from_millis(60)
        );
        assert!(frame_instant(start, Duration::MAX, 2).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
