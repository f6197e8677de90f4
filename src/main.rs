//! overflow-backpack - routes overflowing items into player backpacks
//!
//! Headless driver: loads the config and the preference store, replays a
//! scenario against the in-memory inventory and prints what happened.

mod commands;
mod messages;
mod scenario;

use anyhow::{Context, Result};
use overflow_router::{JsonPreferenceStore, OverflowConfig};
use scenario::{Scenario, StepResult};
use std::{env, path::PathBuf};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/overflow.toml";
const DEFAULT_DATA_PATH: &str = "data/overflow_prefs.json";

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting overflow-backpack v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1))?;
    if cli.show_help {
        print_usage();
        return Ok(());
    }

    let config = OverflowConfig::load_from_path(&cli.config_path);
    if cli.write_config {
        config
            .save_to_path(&cli.config_path)
            .with_context(|| format!("failed to write {}", cli.config_path.display()))?;
        info!(path = %cli.config_path.display(), "config written");
    }

    let Some(script) = cli.scenario.as_deref() else {
        if cli.write_config {
            return Ok(());
        }
        print_usage();
        anyhow::bail!("--scenario is required");
    };

    let scenario = Scenario::from_path(script)?;
    let store = JsonPreferenceStore::open(&cli.data_path)
        .with_context(|| format!("failed to open {}", cli.data_path.display()))?;
    let mut router = scenario.build_router(store, config);
    let records = scenario.run(&mut router);

    for record in &records {
        if cli.json {
            println!("{}", serde_json::to_string(record)?);
            continue;
        }
        let who = record
            .player
            .map(|player| player.to_string())
            .unwrap_or_else(|| "-".to_string());
        let result = match &record.result {
            StepResult::Hook(response) => format!("{response:?}"),
            StepResult::Deferred(outcome) => format!("{outcome:?}"),
            StepResult::Reply(key) => format!("reply {key:?}"),
            StepResult::Rejected(reason) => format!("rejected: {reason}"),
            StepResult::Ignored => "ignored".to_string(),
        };
        println!("[tick {:>4}] {who:>20} {:<16} {result}", record.tick.0, record.action);
    }

    for (player, line) in router.notifier().outbox() {
        println!("chat -> {player}: {line}");
    }
    Ok(())
}

fn print_usage() {
    println!("usage: overflow-backpack --scenario <file.json> [options]");
    println!("  --config <path>     config file (default {DEFAULT_CONFIG_PATH})");
    println!("  --data <path>       preference store (default {DEFAULT_DATA_PATH})");
    println!("  --write-config      write the effective config back to disk");
    println!("  --json              print one JSON record per line");
}

#[derive(Debug, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data_path: PathBuf,
    scenario: Option<PathBuf>,
    write_config: bool,
    json: bool,
    show_help: bool,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self> {
        let mut opts = CliOptions {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            scenario: None,
            write_config: false,
            json: false,
            show_help: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => opts.config_path = PathBuf::from(expect_value(&mut args, &arg)?),
                "--data" => opts.data_path = PathBuf::from(expect_value(&mut args, &arg)?),
                "--scenario" => opts.scenario = Some(PathBuf::from(expect_value(&mut args, &arg)?)),
                "--write-config" => opts.write_config = true,
                "--json" => opts.json = true,
                "-h" | "--help" => opts.show_help = true,
                other => anyhow::bail!("unknown argument '{other}'"),
            }
        }
        Ok(opts)
    }
}

fn expect_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_point_at_plugin_paths() {
        let opts = parse(&[]).unwrap();
        assert_eq!(opts.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(opts.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(opts.scenario, None);
        assert!(!opts.write_config);
    }

    #[test]
    fn parses_every_flag() {
        let opts = parse(&[
            "--config",
            "a.toml",
            "--data",
            "b.json",
            "--scenario",
            "c.json",
            "--write-config",
            "--json",
        ])
        .unwrap();
        assert_eq!(opts.config_path, PathBuf::from("a.toml"));
        assert_eq!(opts.data_path, PathBuf::from("b.json"));
        assert_eq!(opts.scenario, Some(PathBuf::from("c.json")));
        assert!(opts.write_config);
        assert!(opts.json);
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = parse(&["--scenario"]).unwrap_err();
        assert!(err.to_string().contains("--scenario requires a value"));
        assert!(parse(&["--bogus"]).is_err());
    }
}
