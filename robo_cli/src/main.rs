mod cli;
mod error_fmt;
mod sim;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{
    CONFIG_INVALID, CONFIG_PARSE, CONFIG_READ, exit_code_for_error, format_error_json, humanize,
};
use crate::sim::{SimOptions, print_outcome, run_sim, self_check};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;
    let cfg = load_config(&cli.config)?;
    // flushes the file log when dropped at the end of this function
    let _log_guard = init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "ctrl-c handler not installed");
        }
    }

    match cli.cmd {
        Commands::Run {
            scenario,
            ticks,
            tag_bearing,
            realtime,
            trace_ticks,
        } => {
            let opts = SimOptions {
                scenario,
                ticks,
                tag_bearing_deg: tag_bearing,
                realtime,
                trace_ticks,
                json: cli.json,
            };
            let outcome = run_sim(&cfg, opts, shutdown)?;
            print_outcome(&outcome, cli.json);
        }
        Commands::SelfCheck => {
            let report = self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "ok", "report": sim::report_json(&report) })
                );
            } else {
                let faults: Vec<&str> = report.faults.iter().map(|f| f.as_str()).collect();
                println!(
                    "self-check ok: arm={} shooter={} target={} faults=[{}]",
                    report.arm.as_str(),
                    report.shooter.as_str(),
                    report.has_target,
                    faults.join(",")
                );
            }
        }
        Commands::Health => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "ok", "tick_rate_hz": cfg.tick.rate_hz })
                );
            } else {
                println!("ok");
            }
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<robo_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("{CONFIG_READ} {}", path.display()))?;
    let cfg = robo_config::load_toml(&text).wrap_err(CONFIG_PARSE)?;
    cfg.validate().wrap_err(CONFIG_INVALID)?;
    Ok(cfg)
}

/// Console layer on stderr (pretty or JSON) plus an optional JSON file layer.
///
/// `RUST_LOG` overrides `--log-level` for the console.
fn init_tracing(
    json: bool,
    level: &str,
    logging: &robo_config::Logging,
) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "robocore.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, &name),
            "hourly" => tracing_appender::rolling::hourly(dir, &name),
            _ => tracing_appender::rolling::never(dir, &name),
        };
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
            .wrap_err("invalid logging.level")?;
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("installing log subscriber")?;
    Ok(guard)
}
