//! Scores complaints read as JSON lines on stdin, one result per line on stdout.

use std::io::{self, BufRead, Write};

use civic_priority::logging;
use civic_priority::{ComplaintPayload, PriorityResult, PriorityService, config};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    if let Err(err) = logging::init() {
        eprintln!("File logging disabled: {err}");
        if let Err(err) = logging::init_stderr_only() {
            eprintln!("Logging disabled: {err}");
        }
    }
    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    let service = PriorityService::from_settings(&settings).map_err(|err| err.to_string())?;
    service.warmup();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("Failed to read stdin: {err}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result = match serde_json::from_str::<ComplaintPayload>(line) {
            Ok(payload) => service.predict(&payload),
            Err(err) => {
                tracing::warn!("Skipping malformed complaint payload: {err}");
                PriorityResult::fallback(&ComplaintPayload::default())
            }
        };
        let json = serde_json::to_string(&result).map_err(|err| err.to_string())?;
        writeln!(out, "{json}").map_err(|err| format!("Failed to write stdout: {err}"))?;
        out.flush().map_err(|err| format!("Failed to write stdout: {err}"))?;
    }

    let stats = service.stats();
    tracing::info!(
        "Scored {} complaints ({} fallbacks, {} training runs)",
        stats.predictions + stats.fallbacks,
        stats.fallbacks,
        stats.training_runs
    );
    Ok(())
}
