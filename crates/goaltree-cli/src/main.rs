//! `goaltree` command line

mod watch;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use goaltree_core::GoalSettings;
use goaltree_vault::{GoalPlugin, LogNotifier, PassController, PassRunner, VaultPlugin, VaultStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Settings file looked up in the vault root when `--config` is not given
const CONFIG_FILE: &str = "goaltree.toml";

fn cli() -> Command {
    Command::new("goaltree")
        .version(goaltree_core::VERSION)
        .about("Recompute goal rollups and derived fields across a vault of markdown notes")
        .arg(
            Arg::new("vault")
                .long("vault")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Vault root directory"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (default: <vault>/goaltree.toml when present)"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("recalculate").about("Recalculate all goals"))
        .subcommand(
            Command::new("validate")
                .about("Validate the goal hierarchy")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Recalculate, then keep recalculating as goals change")
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Poll interval in milliseconds"),
                )
                .arg(
                    Arg::new("debounce")
                        .long("debounce")
                        .default_value("500")
                        .value_parser(value_parser!(u64))
                        .help("Quiet period before a pass, in milliseconds"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective settings as TOML")
                .arg(
                    Arg::new("default")
                        .long("default")
                        .action(ArgAction::SetTrue)
                        .help("Print built-in defaults instead"),
                ),
        )
}

/// Settings from `--config`, else `<vault>/goaltree.toml`, else defaults
fn load_settings(vault: &Path, config: Option<&PathBuf>) -> anyhow::Result<GoalSettings> {
    let path = match config {
        Some(path) => path.clone(),
        None => {
            let candidate = vault.join(CONFIG_FILE);
            if !candidate.is_file() {
                tracing::debug!("No {} in {}; using defaults", CONFIG_FILE, vault.display());
                return Ok(GoalSettings::default());
            }
            candidate
        }
    };
    GoalSettings::load(&path).with_context(|| format!("loading settings from {}", path.display()))
}

fn plugin(vault: &Path, settings: GoalSettings, debounce: Duration) -> VaultPlugin<VaultStore> {
    let runner = Arc::new(PassRunner::new(
        Arc::new(VaultStore::new(vault)),
        settings,
        Arc::new(LogNotifier),
    ));
    VaultPlugin::with_controller(PassController::new(runner).with_debounce(debounce))
}

async fn run(matches: &ArgMatches) -> anyhow::Result<i32> {
    let vault = matches
        .get_one::<PathBuf>("vault")
        .context("missing --vault")?
        .clone();
    let config = matches.get_one::<PathBuf>("config");

    match matches.subcommand() {
        Some(("recalculate", _)) => {
            let settings = load_settings(&vault, config)?;
            let plugin = plugin(&vault, settings, goaltree_vault::DEFAULT_DEBOUNCE);
            if let Some(report) = plugin.recalculate().await? {
                println!(
                    "Recalculated {} goals: {} recomputed, {} written",
                    report.goals, report.planned, report.written
                );
                if report.critical() > 0 {
                    println!(
                        "{} orphaned/circular reference(s); run `goaltree validate` for details",
                        report.critical()
                    );
                }
            }
            Ok(0)
        }
        Some(("validate", args)) => {
            let settings = load_settings(&vault, config)?;
            let plugin = plugin(&vault, settings, goaltree_vault::DEFAULT_DEBOUNCE);
            let report = plugin.validate().await?;

            if args.get_flag("json") {
                let json = serde_json::json!({
                    "goals": report.goals,
                    "summary": report.summary,
                    "issues": report.issues,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{}", report.message);
                println!();
                println!("{}", report.summary);
            }
            Ok(i32::from(report.summary.errors > 0))
        }
        Some(("watch", args)) => {
            let settings = load_settings(&vault, config)?;
            let interval = Duration::from_millis(*args.get_one::<u64>("interval").context("missing --interval")?);
            let debounce = Duration::from_millis(*args.get_one::<u64>("debounce").context("missing --debounce")?);
            let plugin = Arc::new(plugin(&vault, settings, debounce));
            watch::run(plugin, interval).await?;
            Ok(0)
        }
        Some(("config", args)) => {
            if args.get_flag("default") {
                print!("{}", GoalSettings::default().to_toml_string()?);
            } else {
                let settings = load_settings(&vault, config)?;
                print!("{}", plugin(&vault, settings, goaltree_vault::DEFAULT_DEBOUNCE).render_configuration()?);
            }
            Ok(0)
        }
        _ => Ok(2),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli().get_matches();
    let code = run(&matches).await?;
    std::process::exit(code);
}
