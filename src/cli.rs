use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::db::{scan_repo, schema, snapshot_repo};
use crate::error::{WatchError, WatchResult};
use crate::model::ScanRecord;
use crate::scan::Watcher;

#[derive(Debug, Parser)]
#[command(name = "guildwatch", version, about = "Watches Tibia guild rosters and posts changes to a webhook")]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, env = "GUILDWATCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan all guilds forever
    Run,
    /// Scan all guilds once and exit
    Once,
    /// Show recent scans of a guild
    History {
        guild: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Drop a guild's stored snapshot so the next scan starts over
    Forget { guild: String },
    /// List stored snapshots
    Snapshots,
}

pub fn run(cli: Cli) -> WatchResult<()> {
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Run => Watcher::from_config(&cfg)?.run(&cfg),
        Command::Once => {
            let records = Watcher::from_config(&cfg)?.run_once(&cfg);
            for record in &records {
                println!("{}", format_record(record));
            }
            if records.len() < cfg.guilds.len() {
                return Err(WatchError::Other(format!(
                    "{} of {} guilds could not be scanned",
                    cfg.guilds.len() - records.len(),
                    cfg.guilds.len()
                )));
            }
        }
        Command::History { guild, limit } => {
            let name = resolve_guild(&cfg, &guild);
            let conn = schema::open(&cfg.database)?;
            let records = scan_repo::recent_for_group(&conn, &name, limit)?;
            if records.is_empty() {
                println!("No scans recorded for {}", name);
            }
            for record in &records {
                println!("{}", format_record(record));
            }
        }
        Command::Forget { guild } => {
            let name = resolve_guild(&cfg, &guild);
            let conn = schema::open(&cfg.database)?;
            if snapshot_repo::delete(&conn, &name)? {
                println!("Forgot snapshot of {}", name);
            } else {
                println!("No snapshot stored for {}", name);
            }
        }
        Command::Snapshots => {
            let conn = schema::open(&cfg.database)?;
            for (name, fetched_at) in snapshot_repo::list(&conn)? {
                println!("{:<30} {}", name, fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }
    Ok(())
}

/// Maps a user-typed name onto the configured spelling, if any.
fn resolve_guild(cfg: &Config, input: &str) -> String {
    cfg.find_guild(input)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| input.trim().to_string())
}

pub fn format_record(record: &ScanRecord) -> String {
    let mut line = format!(
        "{}  {:<24} {:<15} changes: {:<3} anomalies: {}",
        record.scanned_at.format("%Y-%m-%d %H:%M:%S"),
        record.group_name,
        record.outcome.to_db_str(),
        record.change_count,
        record.anomaly_count
    );
    if let Some(detail) = &record.detail {
        line.push_str(&format!("  ({})", detail));
    }
    line
}
