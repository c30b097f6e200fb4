use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use shared_logging::LogLevel;
use talkfx_colony::{bootstrap, Colonist};
use talkfx_directives::{DirectiveTelemetry, Dispatcher, EngineConfig, QuotaLedger, Tick};

#[derive(Parser, Debug)]
#[command(name = "tfx", version, about = "Runs embedded directives against a colonist")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists registered directives with their effective quota.
    Catalog {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Prints the ranked advertisement for a colonist.
    Advertise {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        json: bool,
    },
    /// Applies every directive embedded in a reply.
    Dispatch {
        #[command(flatten)]
        session: SessionArgs,
        /// Reply text, or `@path` to read it from a file.
        #[arg(long)]
        text: String,
        /// JSON-lines telemetry log.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Save the mutated colonist back to `--agent`.
        #[arg(long)]
        write_agent: bool,
    },
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Colonist JSON file.
    #[arg(long)]
    agent: PathBuf,
    /// Game tick (hours since start).
    #[arg(long, default_value_t = 0)]
    at: Tick,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Quota ledger JSON; created on first dispatch.
    #[arg(long)]
    quota_state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Catalog { config, json } => handle_catalog(config.as_deref(), json),
        Commands::Advertise { session, json } => handle_advertise(&session, json),
        Commands::Dispatch {
            session,
            text,
            log,
            write_agent,
        } => handle_dispatch(&session, &text, log, write_agent),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    path.map_or_else(|| Ok(EngineConfig::default()), EngineConfig::load)
}

fn load_ledger(dispatcher: &Dispatcher<Colonist>, path: Option<&Path>) -> Result<QuotaLedger> {
    match path {
        Some(path) if path.exists() => QuotaLedger::load_json(path),
        _ => Ok(dispatcher.new_ledger()),
    }
}

fn read_text(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading reply text {path}"))
        }
        None => Ok(raw.to_string()),
    }
}

fn handle_catalog(config: Option<&Path>, as_json: bool) -> Result<()> {
    let config = load_config(config)?;
    let dispatcher = bootstrap(config, None);
    let mut rows = Vec::new();
    for handler in dispatcher.catalog().iter() {
        let definition = handler.definition();
        let quota = dispatcher.config().quota_for(&definition.id, handler.quota());
        let disabled = dispatcher.config().is_disabled(&definition.id);
        if as_json {
            rows.push(json!({
                "id": definition.id,
                "category": definition.category,
                "description": definition.description,
                "usage": definition.usage(),
                "quota": quota,
                "disabled": disabled,
            }));
        } else {
            println!(
                "{:<18} {:<10} {}{}",
                definition.id,
                definition.category,
                definition.usage(),
                if disabled { " (disabled)" } else { "" }
            );
        }
    }
    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

fn handle_advertise(session: &SessionArgs, as_json: bool) -> Result<()> {
    let config = load_config(session.config.as_deref())?;
    let dispatcher = bootstrap(config, None);
    let mut colonist = Colonist::load_json(&session.agent)?;
    colonist.expire(session.at);
    let ledger = load_ledger(&dispatcher, session.quota_state.as_deref())?;
    let advertisement = dispatcher.advertise_at(&colonist, &ledger, session.at);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&advertisement)?);
    } else {
        print!("{advertisement}");
    }
    Ok(())
}

fn handle_dispatch(
    session: &SessionArgs,
    text: &str,
    log: Option<PathBuf>,
    write_agent: bool,
) -> Result<()> {
    let config = load_config(session.config.as_deref())?;
    let telemetry = log
        .map(|path| {
            DirectiveTelemetry::builder("tfx")
                .log_path(path)
                .min_level(LogLevel::Debug)
                .build()
        })
        .transpose()?;
    let dispatcher = bootstrap(config, telemetry);
    let mut colonist = Colonist::load_json(&session.agent)?;
    colonist.expire(session.at);
    let mut ledger = load_ledger(&dispatcher, session.quota_state.as_deref())?;

    let reply = read_text(text)?;
    let report = dispatcher.dispatch_at(&reply, &mut colonist, &mut ledger, session.at);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = &session.quota_state {
        ledger.save_json(path)?;
    }
    if write_agent {
        colonist.save_json(&session.agent)?;
    }
    Ok(())
}
