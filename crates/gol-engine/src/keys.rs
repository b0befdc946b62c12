//! Keyboard control: stdin lines mapped to control tokens.
//!
//! | Key | Signal |
//! |-----|--------|
//! | `p` | pause toggle |
//! | `s` | snapshot |
//! | `q` | quit |

use std::io::BufRead;

use gol_types::ControlSignal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Map one input line to a control token.
///
/// Surrounding whitespace is ignored and keys are case-insensitive.
pub fn parse_key(line: &str) -> Option<ControlSignal> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" => Some(ControlSignal::PauseToggle),
        "s" => Some(ControlSignal::Snapshot),
        "q" => Some(ControlSignal::Quit),
        _ => None,
    }
}

/// Read `input` line by line, forwarding recognised keys to `controls`.
///
/// Returns when input ends or the receiving side is gone.
pub fn forward_keys(input: impl BufRead, controls: &mpsc::Sender<ControlSignal>) {
    for line in input.lines() {
        let Ok(line) = line else {
            warn!("Failed to read from stdin, keyboard control disabled");
            return;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_key(&line) {
            Some(signal) => {
                debug!(%signal, "Key pressed");
                if controls.blocking_send(signal).is_err() {
                    return;
                }
            }
            None => warn!(key = line.trim(), "Unknown key, expected p, s, or q"),
        }
    }
    debug!("stdin closed");
}

/// Start a detached thread forwarding stdin keys to `controls`.
///
/// A plain thread is used so a blocked stdin read never holds up runtime
/// shutdown.
pub fn spawn_stdin_reader(controls: mpsc::Sender<ControlSignal>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("gol-keys".to_owned())
        .spawn(move || forward_keys(std::io::stdin().lock(), &controls))
        .map(|_detached| ())
}
