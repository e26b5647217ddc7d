use std::{collections::BTreeMap, path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use touchpoint_actions::{ActionRegistry, HostContext, Parameters};
use touchpoint_core::{
    Environment, Outcome, Severity,
    keys::{OS_NAME_PROPERTY, P2HOME_OVERRIDE_PROPERTY},
    resolve_detailed,
};
use touchpoint_platform::{PlatformError, SystemProperties};
use touchpoint_platform_local::{ConfigIni, LocalFs, ProcessProperties};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "touchpoint", about = "Run p2 touchpoint actions")]
struct Cli {
    /// System property visible to actions, as with `-Dkey=value` on a JVM.
    #[arg(short = 'D', long = "property", value_name = "KEY=VALUE", global = true)]
    properties: Vec<String>,
    /// OS name to resolve for instead of the running one.
    #[arg(long, global = true)]
    os: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the p2 home directory that `setp2home` would store.
    Resolve,
    /// Run an action's install step.
    Execute(ActionArgs),
    /// Run an action's uninstall step.
    Undo(ActionArgs),
    /// List registered actions.
    Actions,
}

#[derive(Debug, Args)]
struct ActionArgs {
    action: String,
    #[arg(long, default_value = "configuration/config.ini")]
    config: PathBuf,
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Execute,
    Undo,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("failed to encode outcome: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {flag} value '{value}': expected KEY=VALUE")]
    InvalidPair { flag: &'static str, value: String },
    #[error("action {action} failed: {message}{detail}")]
    Action {
        action: String,
        message: String,
        detail: String,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("touchpoint error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let properties = ProcessProperties;
    for (key, value) in parse_pairs("-D", cli.properties)? {
        properties.set(&key, &value);
    }

    let os_name = cli
        .os
        .or_else(|| properties.get(OS_NAME_PROPERTY))
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    let host = HostContext::new(
        Arc::new(LocalFs),
        Arc::new(properties),
        Environment::from_process(),
        os_name,
    );

    match cli.command {
        Command::Resolve => {
            let input = host.resolution_input(P2HOME_OVERRIDE_PROPERTY);
            let resolution = resolve_detailed(&input, host.probe.as_ref());
            info!(
                os = %host.os_name,
                source = resolution.source.map(|source| source.as_str()).unwrap_or("none"),
                "resolved p2 home directory"
            );
            println!("{}", resolution.path);
            Ok(())
        }
        Command::Actions => {
            for name in ActionRegistry::with_defaults(host).names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Execute(args) => run_action(host, args, Phase::Execute),
        Command::Undo(args) => run_action(host, args, Phase::Undo),
    }
}

fn run_action(host: HostContext, args: ActionArgs, phase: Phase) -> Result<(), CliError> {
    let registry = ActionRegistry::with_defaults(host);
    let mut config = ConfigIni::load(&args.config)?;
    info!(config = %config.path().display(), action = %args.action, ?phase, "running action");

    let mut params = Parameters::new().with_manipulator(&mut config);
    params.extend(parse_pairs("--param", args.params)?);

    let outcome = match phase {
        Phase::Execute => registry.execute(&args.action, &mut params),
        Phase::Undo => registry.undo(&args.action, &mut params),
    };

    report(&outcome, args.json)?;
    if outcome.is_error() {
        return Err(CliError::Action {
            action: args.action,
            message: outcome.message.unwrap_or_default(),
            detail: format_detail(outcome.detail),
        });
    }
    Ok(())
}

fn report(outcome: &Outcome, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome.severity {
        Severity::Ok => println!("ok"),
        Severity::Warning => println!(
            "warning: {}{}",
            outcome.message.as_deref().unwrap_or_default(),
            format_detail(outcome.detail.clone())
        ),
        Severity::Error => {}
    }
    Ok(())
}

fn parse_pairs(
    flag: &'static str,
    pairs: Vec<String>,
) -> Result<BTreeMap<String, String>, CliError> {
    let mut values = BTreeMap::new();

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CliError::InvalidPair { flag, value: pair });
        };

        if key.is_empty() {
            return Err(CliError::InvalidPair {
                flag,
                value: format!("={value}"),
            });
        }

        values.insert(key.to_string(), value.to_string());
    }

    Ok(values)
}

fn format_detail(detail: Option<String>) -> String {
    detail
        .map(|value| format!(" ({value})"))
        .unwrap_or_default()
}
