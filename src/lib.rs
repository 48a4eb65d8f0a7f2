pub mod action;
pub mod config;
pub mod cooldown;
pub mod display;
pub mod engine;
pub mod error;
pub mod profiles;
pub mod registry;
pub mod scenario;
pub mod status;
pub mod world;

pub use action::{ActionBuilder, ActionDefinition, ActionId, Blocker, EvalContext, Verdict};
pub use cooldown::{CooldownState, CooldownTracker, Recast};
pub use error::ConfigError;
pub use registry::ActionRegistry;
pub use world::{BattleChara, EventObject, GameObject, TargetObject, WorldSnapshot};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

const USAGE: &str = "usage: rotation-gate <scenario.toml> [config-dir]\n       rotation-gate --list";

pub fn run() -> Result<()> {
    // -----------------------------------------------------------------------
    // Logging — decisions go to stdout, so tracing writes to a rolling file.
    // Log directory: $ROTATION_GATE_LOG_DIR, else <tmp>/rotation-gate/logs.
    // Files rotate daily.
    // -----------------------------------------------------------------------
    let log_dir = std::env::var("ROTATION_GATE_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("rotation-gate").join("logs"));
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, "rotation.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rotation_gate_lib=debug".parse()?),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    // -----------------------------------------------------------------------
    // Panic hook — log panics through tracing before the process dies.
    // -----------------------------------------------------------------------
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        tracing::error!("PANIC at {}: {}", location, message);
    }));

    tracing::info!("rotation-gate starting — logs → {}", log_dir.display());

    let mut args = std::env::args().skip(1);
    let first = args.next().ok_or_else(|| anyhow::anyhow!(USAGE))?;

    if first == "--list" {
        for p in profiles::list_all() {
            println!("{}", serde_json::to_string(&p)?);
        }
        return Ok(());
    }

    let config_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let cfg = config::load_or_default(&config_dir)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(replay(Path::new(&first), cfg))
}

/// Replay a scenario through the engine task, printing one JSON decision per frame.
async fn replay(path: &Path, cfg: config::EngineConfig) -> Result<()> {
    let scenario = scenario::Scenario::load(path)?;
    let registry = scenario.registry(&cfg.profile)?;
    tracing::info!("Replaying {} frames from {}", scenario.frames.len(), path.display());

    // Pipeline: frames -> engine -> decisions
    let (frame_tx, frame_rx)           = mpsc::channel::<engine::FrameUpdate>(64);
    let (profile_tx, profile_rx)       = mpsc::channel::<ActionRegistry>(1);
    let (decision_tx, mut decision_rx) = mpsc::channel::<engine::Decision>(64);

    let eng = engine::RotationEngine::new(registry, cfg);
    let task = tokio::spawn(engine::run(frame_rx, profile_rx, decision_tx, eng));
    // A replay never switches profiles; closing lets the task end with the frames.
    drop(profile_tx);

    let frames = scenario.frames;
    let feeder = tokio::spawn(async move {
        for frame in frames {
            if frame_tx.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut printed = 0usize;
    while let Some(decision) = decision_rx.recv().await {
        println!("{}", serde_json::to_string(&decision)?);
        printed += 1;
    }

    feeder.await.context("frame feeder task")?;
    task.await.context("engine task")??;
    tracing::info!("Replay finished: {} decisions", printed);
    Ok(())
}
