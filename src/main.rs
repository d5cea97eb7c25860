mod activity;
mod checker;
mod config;
mod digest;
mod leetcode;
mod notify;
mod scheduler;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use checker::Checker;
use config::Config;

#[derive(Parser)]
#[command(
    name = "leetnudge",
    version,
    about = "Email nudges for the LeetCode problem of the day"
)]
struct Cli {
    #[arg(short, long, env = "LEETNUDGE_CONFIG", default_value = "~/.leetnudge/config.toml")]
    config: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run checks on their schedule until interrupted
    Run,
    /// Run one configured check now and exit
    Check {
        /// Check name from the config file
        name: String,
    },
    /// Create ~/.leetnudge/config.toml from a template
    Init,
    /// Print the loaded configuration and upcoming triggers
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Init => {
            let path = config::init_config_dir().await?;
            tracing::info!("Config template at {}", path.display());
        }
        Commands::Run => {
            let cfg = config::load(&cli.config)?;
            let checker = Arc::new(build_checker(&cfg)?);
            scheduler::Scheduler::new(&cfg, checker)?.start().await?;
        }
        Commands::Check { name } => {
            let cfg = config::load(&cli.config)?;
            let check = cfg
                .check(&name)
                .ok_or_else(|| anyhow::anyhow!("No check named '{name}' in config"))?;
            let outcome = build_checker(&cfg)?.run(check, Utc::now()).await;
            if outcome.is_failure() {
                anyhow::bail!("Check '{name}' {outcome}");
            }
            tracing::info!("Check '{name}': {outcome}");
        }
        Commands::ShowConfig => show_config(&config::load(&cli.config)?)?,
    }
    Ok(())
}

fn build_checker(cfg: &Config) -> Result<Checker> {
    let client = Arc::new(leetcode::LeetCodeClient::new(&cfg.leetcode)?);
    let notifier = notify::create_notifier(&cfg.mail)?;
    Ok(Checker::new(
        cfg.subjects.clone(),
        client.clone(),
        client,
        notifier,
    ))
}

fn show_config(cfg: &Config) -> Result<()> {
    println!("{}", toml::to_string_pretty(cfg)?);
    if cfg.mail.password.is_some() {
        println!("# [mail] password: (set, hidden)");
    }
    let now = Utc::now();
    for check in &cfg.checks {
        for trigger in check.parsed_triggers()? {
            println!(
                "# {} at {trigger} (UTC{:+}m) next fires {}",
                check.name,
                cfg.utc_offset_minutes,
                trigger.next_fire(cfg.utc_offset_minutes, now)
            );
        }
    }
    Ok(())
}
