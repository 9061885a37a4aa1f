//! `scribe` command line: run the composition server or check its config

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use scribe_core::ScribeConfig;
use scribe_server::{build_pipeline, run, telemetry, AppState};
use std::net::SocketAddr;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .help("Path to a TOML configuration file")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Command::new("scribe")
        .version(scribe_core::VERSION)
        .about("Scribe composition service")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP server")
                .arg(config_arg())
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .help("Listen address, overrides server.bind"),
                )
                .arg(
                    Arg::new("no-quota")
                        .long("no-quota")
                        .action(ArgAction::SetTrue)
                        .help("Disable the guest generation limit"),
                )
                .arg(
                    Arg::new("log-json")
                        .long("log-json")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate configuration and print the effective values")
                .arg(config_arg()),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("serve", args)) => serve(args).await,
        Some(("check-config", args)) => check_config(args),
        _ => Ok(()),
    }
}

fn load_config(args: &ArgMatches) -> anyhow::Result<ScribeConfig> {
    match args.get_one::<String>("config") {
        Some(path) => ScribeConfig::load(path).with_context(|| format!("loading {path}")),
        None => Ok(ScribeConfig::new()),
    }
}

async fn serve(args: &ArgMatches) -> anyhow::Result<()> {
    telemetry::init(args.get_flag("log-json"))?;

    let mut config = load_config(args)?;
    if let Some(bind) = args.get_one::<String>("bind") {
        config.server.bind.clone_from(bind);
    }
    if args.get_flag("no-quota") {
        config = config.with_quota_enforcement(false);
    }

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;

    tracing::info!(
        quota_enforced = config.quota.enforce,
        storage_enabled = config.storage.enabled,
        "starting scribe"
    );
    let state = AppState::new(build_pipeline(config));
    run(state, addr).await
}

fn check_config(args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(args)?;
    config.validate()?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    if std::env::var(&config.generation.api_key_env).map_or(true, |key| key.trim().is_empty()) {
        eprintln!(
            "warning: {} is not set; compose requests will fail until it is",
            config.generation.api_key_env
        );
    }
    Ok(())
}
