//! keyrepeat entry point.
//!
//! Loads the configuration and the macro list, installs the input hooks and
//! runs until Ctrl-C.
//!
//! ```text
//! main()
//!  └─ load config.toml and data.json
//!  └─ AppState::new()         (command bridge for the editor UI)
//!  └─ Engine::start()
//!       ├─ hook thread        (WH_KEYBOARD_LL / WH_MOUSE_LL)
//!       ├─ listener thread    (pressed-key tracking)
//!       └─ dispatcher task    (matching, execution tasks)
//! ```
//!
//! # Usage
//!
//! ```text
//! keyrepeat [OPTIONS]
//!
//! Options:
//!   --config <PATH>      Config file [env: KEYREPEAT_CONFIG]
//!   --data <PATH>        Macro file  [env: KEYREPEAT_DATA]
//!   --log-level <LEVEL>  Log filter when RUST_LOG is unset [env: KEYREPEAT_LOG_LEVEL]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use keyrepeat_engine::application::engine::{Engine, EnginePorts};
use keyrepeat_engine::infrastructure::storage::config::{
    config_dir, config_file_path, load_config_from,
};
use keyrepeat_engine::infrastructure::storage::macros::read_macros;
use keyrepeat_engine::infrastructure::ui_bridge::{subscribe_events, AppState};
use keyrepeat_engine::infrastructure::{input_capture, input_injection, key_state, window_info};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Global hotkey listener and macro player.
#[derive(Debug, Parser)]
#[command(name = "keyrepeat", about = "Hotkey capture and macro execution engine", version)]
struct Cli {
    /// Path to `config.toml`.  Defaults to the platform config directory.
    #[arg(long, env = "KEYREPEAT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the macro file.  Overrides `storage.data_file`.
    #[arg(long, env = "KEYREPEAT_DATA")]
    data: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.  Overrides `engine.log_level`.
    #[arg(long, env = "KEYREPEAT_LOG_LEVEL")]
    log_level: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config_file_path().context("locating config file")?,
    };
    let config = load_config_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.engine.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
    install_panic_hook();

    info!(config = %config_path.display(), "keyrepeat starting");

    let data_path = match cli.data {
        Some(path) => path,
        None => {
            let base = match config_path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => config_dir().context("locating data directory")?,
            };
            config.data_path(&base)
        }
    };
    let data = read_macros(&data_path)
        .with_context(|| format!("loading macros from {}", data_path.display()))?;
    info!(path = %data_path.display(), macros = data.macros.len(), "macros loaded");

    let ports = EnginePorts {
        source: input_capture::platform_input_source().context("selecting input source")?,
        injector: input_injection::platform_injector().context("selecting input injector")?,
        key_state: key_state::platform_key_state(),
        windows: window_info::platform_window_provider(),
    };
    let engine = Arc::new(Engine::new(ports, data, config.engine_settings()));
    let state = AppState::new(Arc::clone(&engine), data_path);

    let mut ui_events = subscribe_events(&state);
    tokio::spawn(async move {
        while let Some(event) = ui_events.recv().await {
            debug!(%event, "UI event");
        }
    });

    state.engine.start().context("starting engine")?;

    info!("keyrepeat ready.  Press Ctrl-C to exit.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");

    state.engine.shutdown().await;
    info!("keyrepeat stopped");
    Ok(())
}

/// Logs every panic, with a backtrace, through `tracing` before the default
/// hook runs.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let thread = std::thread::current();
        let backtrace = std::backtrace::Backtrace::force_capture();
        error!(
            thread = thread.name().unwrap_or("<unnamed>"),
            "panic: {panic_info}\n{backtrace}"
        );
        default_hook(panic_info);
    }));
}
