use std::io::BufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lib_ticker::ControlHandle;

/// Reads operator commands from stdin, one per line, and forwards them to the
/// render loop. Each acknowledgement is logged.
pub async fn run(control: ControlHandle, cancel: CancellationToken) {
    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => {
                let Some(line) = line else {
                    log::info!("Control input closed");
                    break;
                };
                apply_line(&control, &line).await;
            }
        }
    }
}

/// Sends one command line; returns whether it was accepted.
pub async fn apply_line(control: &ControlHandle, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    match control.send_line(line).await {
        Ok(()) => {
            log::info!("Command applied: {}", line);
            true
        }
        Err(e) => {
            log::warn!("Command rejected: {} ({})", line, e);
            false
        }
    }
}

// Stdin is read on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
