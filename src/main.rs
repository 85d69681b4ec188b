mod cli;

use std::{env, io, process};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    init_tracing();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GUIDEPOST_LOG")
        .unwrap_or_else(|_| EnvFilter::new("guidepost=info,warn"));

    let format = env::var("GUIDEPOST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}
