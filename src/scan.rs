use std::thread;

use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::config::{Config, GuildConfig};
use crate::db::{scan_repo, schema, snapshot_repo};
use crate::diff::{diff, Anomaly, DiffReport};
use crate::error::{WatchError, WatchResult};
use crate::lookup::IdentityLookup;
use crate::model::{GroupSnapshot, ScanOutcome, ScanRecord};
use crate::render::{build_payloads, RenderOptions};
use crate::source::{GroupSource, TibiaDataClient};
use crate::webhook::{Notifier, WebhookClient};

pub struct Watcher {
    conn: Connection,
    source: Box<dyn GroupSource>,
    lookup: Box<dyn IdentityLookup>,
    notifier: Box<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        conn: Connection,
        source: Box<dyn GroupSource>,
        lookup: Box<dyn IdentityLookup>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            conn,
            source,
            lookup,
            notifier,
        }
    }

    /// Watcher backed by the configured database and the live services.
    pub fn from_config(cfg: &Config) -> WatchResult<Self> {
        let conn = schema::open(&cfg.database)?;
        Ok(Self::new(
            conn,
            Box::new(TibiaDataClient::new(&cfg.api_url)),
            Box::new(TibiaDataClient::new(&cfg.api_url)),
            Box::new(WebhookClient::new()),
        ))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs one scan cycle for `guild`.
    ///
    /// The stored snapshot is only replaced after the new one has been
    /// compared and its changes handed to the notifier, so a failure part
    /// way leaves a usable baseline for the next cycle.
    pub fn scan_group(&self, cfg: &Config, guild: &GuildConfig) -> WatchResult<ScanRecord> {
        let name = guild.name.as_str();
        let previous = snapshot_repo::load(&self.conn, name)?;

        info!(guild = name, "scanning guild");
        let current = match self.source.fetch_group(name) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let outcome = match e {
                    WatchError::NotFound { .. } => {
                        error!(guild = name, "guild doesn't exist");
                        ScanOutcome::NotFound
                    }
                    ref other => {
                        warn!(guild = name, error = %other, "fetch failed, keeping previous snapshot");
                        ScanOutcome::FetchFailed
                    }
                };
                let mut record = ScanRecord::create(name.to_string(), outcome);
                record.detail = Some(e.to_string());
                scan_repo::insert(&self.conn, &record)?;
                return Ok(record);
            }
        };

        let previous = match previous {
            Some(p) => p,
            None => {
                info!(guild = name, members = current.members.len(), "no previous data, saving baseline");
                snapshot_repo::save(&self.conn, name, &current)?;
                let record = ScanRecord::create(name.to_string(), ScanOutcome::Baseline);
                scan_repo::insert(&self.conn, &record)?;
                return Ok(record);
            }
        };

        let report = diff(&previous, &current, self.lookup.as_ref());
        for anomaly in &report.anomalies {
            warn!(guild = name, "{}", anomaly);
        }

        let member_count = (current.member_count != previous.member_count).then_some(current.member_count);
        let opts = render_options(cfg, guild, &current);
        let payloads = build_payloads(&report.changes, &opts, member_count);

        let mut failed = 0;
        for payload in &payloads {
            if let Err(e) = self.notifier.deliver(&guild.webhook_url, payload) {
                error!(guild = name, error = %e, "couldn't publish changes");
                failed += 1;
            }
        }

        snapshot_repo::save(&self.conn, name, &carry_unresolved(&current, &report))?;

        let outcome = if failed > 0 {
            ScanOutcome::DeliveryFailed
        } else {
            ScanOutcome::Compared
        };
        let mut record = ScanRecord::create(name.to_string(), outcome);
        record.change_count = report.changes.len();
        record.anomaly_count = report.anomalies.len();
        if failed > 0 {
            record.detail = Some(format!("{} of {} messages not delivered", failed, payloads.len()));
        }
        scan_repo::insert(&self.conn, &record)?;

        info!(
            guild = name,
            changes = record.change_count,
            messages = payloads.len(),
            "scanning done"
        );
        Ok(record)
    }

    /// Scans every configured guild once, pausing between guilds. A guild
    /// whose cycle errors is logged and skipped.
    pub fn run_once(&self, cfg: &Config) -> Vec<ScanRecord> {
        let mut records = Vec::new();
        for (i, guild) in cfg.guilds.iter().enumerate() {
            if i > 0 && !cfg.group_pause.is_zero() {
                thread::sleep(cfg.group_pause);
            }
            match self.scan_group(cfg, guild) {
                Ok(record) => records.push(record),
                Err(e) => error!(guild = %guild.name, error = %e, "scan aborted"),
            }
        }
        records
    }

    /// Scans forever, `cfg.interval` apart.
    pub fn run(&self, cfg: &Config) -> ! {
        loop {
            self.run_once(cfg);
            info!(seconds = cfg.interval.as_secs(), "waiting for next round");
            thread::sleep(cfg.interval);
        }
    }
}

/// The snapshot to store after a comparison. Vanished members whose lookup
/// failed stay on the stored roster so the next scan looks them up again.
/// `member_count` is left as reported by the source.
fn carry_unresolved(current: &GroupSnapshot, report: &DiffReport) -> GroupSnapshot {
    let mut stored = current.clone();
    for anomaly in &report.anomalies {
        if let Anomaly::Indeterminate { member, .. } = anomaly {
            debug!(member = %member.name, "keeping unresolved member for next scan");
            stored.members.push(member.clone());
        }
    }
    stored
}

/// Display settings for one guild's notifications.
pub fn render_options(cfg: &Config, guild: &GuildConfig, current: &GroupSnapshot) -> RenderOptions {
    RenderOptions {
        username: if guild.override_name {
            Some(current.name.clone())
        } else {
            cfg.username.clone()
        },
        avatar_url: if guild.override_image {
            current.logo_url.clone().or_else(|| cfg.avatar_url.clone())
        } else {
            cfg.avatar_url.clone()
        },
        title_suffix: if !guild.override_name && cfg.is_multi_guild() {
            Some(guild.name.clone())
        } else {
            None
        },
    }
}
