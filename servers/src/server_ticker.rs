use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use lib_ticker::{DisplayRuntime, HealthBoard, SnapshotBus, StatusBoard, WorkerSupervisor};

mod ticker_logic;
use ticker_logic::{config, control, feeds, logger, monitor};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    let log_path = logger::setup_logging(&config.log_dir(), config.log_level(), config.log_keep())?;
    log::info!("server_ticker starting, logging to {}", log_path.display());

    let store = Arc::new(config::load_display(&config)?);
    let display = store.current();
    let bus = Arc::new(SnapshotBus::new());
    let health = Arc::new(HealthBoard::new());
    let board = Arc::new(StatusBoard::new());
    let cancel = CancellationToken::new();

    // --- Pollers ---
    let mut supervisor =
        WorkerSupervisor::new(Arc::clone(&bus), Arc::clone(&health), Arc::clone(&store), cancel.child_token());
    for poller in feeds::build_pollers(&config, &display)? {
        supervisor.spawn(poller);
    }
    log::info!("{} poller(s) running", supervisor.len());

    // --- Render loop ---
    let (sink, _last_frame) = feeds::build_sink(&config, &display);
    let (runtime, control_handle) = DisplayRuntime::new(Arc::clone(&store), Arc::clone(&bus), Arc::clone(&board), sink);
    let render_handle = tokio::spawn(runtime.run(cancel.child_token()));

    // --- Status, reload and control ---
    let sources = monitor::StatusSources {
        bus: Arc::clone(&bus),
        health: Arc::clone(&health),
        config: Arc::clone(&store),
        board: Arc::clone(&board),
    };
    let status_path = config.status_path.clone();
    let status_handle = status_path.clone().map(|path| {
        tokio::spawn(monitor::run_status(
            sources.clone(),
            path,
            Duration::from_secs(config.status_interval_seconds()),
            cancel.child_token(),
        ))
    });
    let reload_handle = tokio::spawn(monitor::run_reload(
        Arc::clone(&store),
        Duration::from_secs(config.reload_check_seconds()),
        cancel.child_token(),
    ));
    let control_handle = tokio::spawn(control::run(control_handle, cancel.child_token()));

    wait_for_shutdown().await?;

    // Send shutdown signal to all components
    cancel.cancel();
    supervisor.shutdown().await;
    match render_handle.await {
        Ok(runtime) => {
            let stats = runtime.stats();
            log::info!("Rendered {} frames ({} dropped, {} sink errors)", stats.frames, stats.dropped, stats.sink_errors);
        }
        Err(e) => log::error!("Render loop ended abnormally: {}", e),
    }
    let _ = tokio::join!(reload_handle, control_handle);
    if let Some(handle) = status_handle {
        let _ = handle.await;
    }
    if let Some(path) = status_path {
        sources.write(&path);
    }

    log::info!("Shutdown complete.");
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut term_signal = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = signal::ctrl_c() => {
                res?;
                log::info!("Ctrl-C received, initiating shutdown.");
            }
            _ = term_signal.recv() => log::info!("SIGTERM received, initiating shutdown."),
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        log::info!("Ctrl-C received, initiating shutdown.");
    }
    Ok(())
}
