use bubblefield_config::{load_config, BubbleConfig, ConfigError};
use bubblefield_core::{Millis, RecordingSurface};
use bubblefield_images::{AvatarLoader, HttpFetcher, ImageError};
use bubblefield_simulation::Simulation;
use clap::Parser;
use hdrhistogram::Histogram;
use log::{error, info, warn};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

mod profiles;

// --- Error Type ---

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image loader error: {0}")]
    Images(#[from] ImageError),

    #[error("Failed to read profiles from {path}: {source}")]
    ProfileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse profiles: {0}")]
    ProfileParse(#[from] serde_json::Error),

    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to start thread: {0}")]
    Thread(#[from] std::io::Error),

    #[error("Failed to set up frame statistics: {0}")]
    Stats(String),
}

/// A resize applied at a fixed point of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScriptedResize {
    at: Millis,
    width: f32,
    height: f32,
}

fn parse_resize(value: &str) -> Result<ScriptedResize, String> {
    let invalid = || format!("expected MS:WIDTHxHEIGHT, got '{value}'");
    let (at, size) = value.split_once(':').ok_or_else(invalid)?;
    let (width, height) = size.split_once('x').ok_or_else(invalid)?;
    Ok(ScriptedResize {
        at: at.trim().parse().map_err(|_| invalid())?,
        width: width.trim().parse().map_err(|_| invalid())?,
        height: height.trim().parse().map_err(|_| invalid())?,
    })
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs the bubble field headless", long_about = None)]
struct Args {
    /// Path to a JSON or TOML configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON profile list: an array or {"avatars": [...]}; image URLs may be http(s), data: or file paths
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Delay before the profile list arrives
    #[arg(long, default_value_t = 500)]
    profile_delay_ms: u64,

    #[arg(long, default_value_t = 800.0)]
    width: f32,

    #[arg(long, default_value_t = 600.0)]
    height: f32,

    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,

    /// User agent used for mobile detection
    #[arg(long)]
    user_agent: Option<String>,

    /// Stop after this many seconds (runs until Ctrl+C otherwise)
    #[arg(short, long)]
    seconds: Option<f64>,

    /// Simulated display refresh rate
    #[arg(long, default_value_t = 60)]
    refresh_hz: u32,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Resize during the run, e.g. --resize-at 5000:400x600 (repeatable)
    #[arg(long, value_parser = parse_resize)]
    resize_at: Vec<ScriptedResize>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), RunnerError> {
    let config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Using configuration from {}", path.display());
            config
        }
        None => BubbleConfig::default(),
    };
    let config = Arc::new(config);

    let loader = AvatarLoader::start(
        HttpFetcher::new()?,
        config.avatars.max_concurrent_loads,
        Duration::from_millis(config.avatars.load_timeout_ms),
    )?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Bubble field runner (seed {seed})");

    let mut sim = Simulation::new(Arc::clone(&config), loader, seed)?;
    if let Some(user_agent) = &args.user_agent {
        sim = sim.with_user_agent(user_agent.clone());
    }

    let profile_feed = profiles::spawn_profile_source(
        args.profiles.clone(),
        Duration::from_millis(args.profile_delay_ms),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    // frame work in microseconds
    let mut frame_times = Histogram::<u64>::new_with_bounds(1, 10_000_000, 3)
        .map_err(|e| RunnerError::Stats(e.to_string()))?;

    let mut resizes: Vec<ScriptedResize> = args.resize_at.clone();
    resizes.sort_by_key(|r| r.at);
    let mut resizes: VecDeque<ScriptedResize> = resizes.into();

    let refresh = Duration::from_secs_f64(1.0 / args.refresh_hz.max(1) as f64);
    let deadline = args.seconds.map(|s| (s * 1000.0) as Millis);
    let mut surface = RecordingSurface::new();

    let outcome = sim.resize(args.width, args.height, args.pixel_ratio, 0);
    info!(
        "Canvas {}x{} ({}x{} px, {:?})",
        args.width, args.height, outcome.buffer_width, outcome.buffer_height, outcome.device
    );

    let start = Instant::now();
    sim.mount(0);

    let mut ticks: u64 = 0;
    let mut drawn: u64 = 0;
    let mut last_report: Millis = 0;

    while running.load(Ordering::SeqCst) {
        let frame_start = Instant::now();
        let now = start.elapsed().as_millis() as Millis;
        if deadline.is_some_and(|d| now >= d) {
            break;
        }

        if let Ok(feed) = profile_feed.try_recv() {
            sim.set_profiles(feed);
            if let Some(notice) = sim.profile_notice() {
                warn!("{notice}");
            }
        }

        while resizes.front().is_some_and(|r| r.at <= now) {
            if let Some(resize) = resizes.pop_front() {
                let outcome = sim.resize(resize.width, resize.height, args.pixel_ratio, now);
                info!(
                    "Resized to {}x{} ({:?}, significant: {})",
                    resize.width, resize.height, outcome.device, outcome.significant
                );
            }
        }

        if sim.tick(now, &mut surface) {
            drawn += 1;
            frame_times.saturating_record(frame_start.elapsed().as_micros() as u64);
        }
        ticks += 1;

        if now >= last_report + 5000 {
            last_report = now;
            let avatars = sim.source().cache();
            info!(
                "t={:.1}s bubbles={} particles={} queued respawns={} draw calls={} avatars={} ({} KiB)",
                now as f64 / 1000.0,
                sim.normal_count(),
                sim.particle_count(),
                sim.respawn_queue().len(),
                surface.commands().len(),
                avatars.cached_len(),
                avatars.cached_bytes() / 1024
            );
        }

        let elapsed = frame_start.elapsed();
        if elapsed < refresh {
            spin_sleep::sleep(refresh - elapsed);
        } else if args.refresh_hz > 10 {
            warn!("Frame time exceeded budget: {:?} > {:?}", elapsed, refresh);
        }
    }

    sim.unmount();
    report(&frame_times, ticks, drawn, start.elapsed());
    Ok(())
}

fn report(frame_times: &Histogram<u64>, ticks: u64, drawn: u64, wall: Duration) {
    info!(
        "Ran {:.1}s: {} ticks, {} frames drawn ({:.1} fps)",
        wall.as_secs_f64(),
        ticks,
        drawn,
        drawn as f64 / wall.as_secs_f64().max(f64::EPSILON)
    );
    if frame_times.is_empty() {
        return;
    }
    info!(
        "Frame work (us): p50={} p95={} p99={} max={}",
        frame_times.value_at_quantile(0.5),
        frame_times.value_at_quantile(0.95),
        frame_times.value_at_quantile(0.99),
        frame_times.max()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scripted_resizes() {
        assert_eq!(
            parse_resize("5000:400x600"),
            Ok(ScriptedResize {
                at: 5000,
                width: 400.0,
                height: 600.0
            })
        );
        assert!(parse_resize("5000").is_err());
        assert!(parse_resize("5000:400").is_err());
        assert!(parse_resize("soon:400x600").is_err());
    }

    #[test]
    fn cli_accepts_repeated_resizes() {
        let args = Args::try_parse_from([
            "bubblefield-runner",
            "--seconds",
            "2",
            "--resize-at",
            "500:400x600",
            "--resize-at",
            "1000:800x600",
        ])
        .unwrap();
        assert_eq!(args.resize_at.len(), 2);
        assert_eq!(args.width, 800.0);
        assert_eq!(args.profile_delay_ms, 500);
    }
}
