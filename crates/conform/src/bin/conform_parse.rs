//! `conform-parse`: parse a urlencoded form body into a structured submission.
//!
//! Usage:
//!   conform-parse [config.json]
//!
//! The body is read from stdin. The optional argument is a JSON file with
//! `FormConfig` settings. Set `RUST_LOG=debug` to trace parsing on stderr.

use std::io::{self, Read, Write};

use conform::cli::parse_urlencoded;
use conform::FormConfig;
use tracing_subscriber::EnvFilter;

fn load_config(path: Option<&String>) -> Result<FormConfig, String> {
    let Some(path) = path else {
        return Ok(FormConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("{path}: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match load_config(args.get(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match parse_urlencoded(&buf, &config) {
        Ok(result) => {
            let mut out = io::stdout().lock();
            if writeln!(out, "{result}").is_err() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
