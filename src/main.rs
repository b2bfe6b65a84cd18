use std::io::{self, BufRead, Write};

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use placementd::api::RestBackend;
use placementd::{config, ipc};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PLACEMENTD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("placementd=info,warn"));
    // stdout carries the protocol; all logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cfg = config::from_env();
    let mut state = ipc::AppState::new(cfg.clone());
    if let Some(base_url) = cfg.api_base_url.as_deref() {
        match RestBackend::new(base_url, cfg.api_token.clone(), cfg.http_timeout_secs) {
            Ok(backend) => {
                state.attach_backend(Box::new(backend), base_url);
                info!(base_url, "backend connected from environment");
            }
            Err(e) => warn!(error = %e, "PLACEMENTD_API_BASE_URL set but backend init failed"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; ignore.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
