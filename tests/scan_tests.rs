use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use guildwatch::config::Config;
use guildwatch::db::{scan_repo, schema, snapshot_repo};
use guildwatch::error::{WatchError, WatchResult};
use guildwatch::lookup::{CanonicalRecord, IdentityLookup};
use guildwatch::model::*;
use guildwatch::render::WebhookPayload;
use guildwatch::scan::{render_options, Watcher};
use guildwatch::source::GroupSource;
use guildwatch::webhook::Notifier;

#[derive(Clone, Default)]
struct FakeSource {
    responses: Rc<RefCell<VecDeque<WatchResult<GroupSnapshot>>>>,
}

impl FakeSource {
    fn push(&self, response: WatchResult<GroupSnapshot>) {
        self.responses.borrow_mut().push_back(response);
    }
}

impl GroupSource for FakeSource {
    fn fetch_group(&self, name: &str) -> WatchResult<GroupSnapshot> {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(WatchError::Network(format!("no response queued for {}", name))))
    }
}

/// Answers lookups from a queue; once it runs dry every character is gone.
#[derive(Clone, Default)]
struct FakeLookup {
    answers: Rc<RefCell<VecDeque<WatchResult<Option<CanonicalRecord>>>>>,
    asked: Rc<RefCell<Vec<String>>>,
}

impl FakeLookup {
    fn push(&self, answer: WatchResult<Option<CanonicalRecord>>) {
        self.answers.borrow_mut().push_back(answer);
    }
}

impl IdentityLookup for FakeLookup {
    fn lookup(&self, name: &str) -> WatchResult<Option<CanonicalRecord>> {
        self.asked.borrow_mut().push(name.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or(Ok(None))
    }
}

#[derive(Clone, Default)]
struct FakeNotifier {
    sent: Rc<RefCell<Vec<(String, WebhookPayload)>>>,
    fail: bool,
}

impl Notifier for FakeNotifier {
    fn deliver(&self, url: &str, payload: &WebhookPayload) -> WatchResult<()> {
        if self.fail {
            return Err(WatchError::Network("webhook down".into()));
        }
        self.sent.borrow_mut().push((url.to_string(), payload.clone()));
        Ok(())
    }
}

fn config() -> Config {
    Config::from_toml_str(
        r#"
        webhook_url = "https://discord.com/api/webhooks/1/global"
        group_pause = 0
        username = "Guild Watcher"
        guilds = ["Redd Alliance", { name = "Bald Dwarfs", webhook_url = "https://discord.com/api/webhooks/2/own", override_name = true, override_image = true }]
        "#,
    )
    .unwrap()
}

fn guild(members: &[&str]) -> GroupSnapshot {
    let mut g = GroupSnapshot::create("Redd Alliance".into());
    g.ranks = vec!["Leader".into(), "Member".into()];
    g.logo_url = Some("https://static.tibia.com/images/guildlogos/Redd_Alliance.gif".into());
    g.members = members
        .iter()
        .map(|name| Member::create(name.to_string(), Some("Member".into())))
        .collect();
    g.member_count = members.len() as u32;
    g
}

fn setup_with_lookup(fail_delivery: bool) -> (Watcher, FakeSource, FakeLookup, FakeNotifier) {
    let source = FakeSource::default();
    let lookup = FakeLookup::default();
    let notifier = FakeNotifier {
        fail: fail_delivery,
        ..FakeNotifier::default()
    };
    let watcher = Watcher::new(
        schema::test_connection(),
        Box::new(source.clone()),
        Box::new(lookup.clone()),
        Box::new(notifier.clone()),
    );
    (watcher, source, lookup, notifier)
}

fn setup(fail_delivery: bool) -> (Watcher, FakeSource, FakeNotifier) {
    let (watcher, source, _, notifier) = setup_with_lookup(fail_delivery);
    (watcher, source, notifier)
}

// ==========================================================================
// SCAN CYCLE
// ==========================================================================

#[test]
fn first_scan_stores_baseline_without_notifying() {
    let (watcher, source, notifier) = setup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa"])));

    let record = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    assert_eq!(record.outcome, ScanOutcome::Baseline);
    assert!(notifier.sent.borrow().is_empty());
    let stored = snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().unwrap();
    assert_eq!(stored.members.len(), 1);
}

#[test]
fn changes_are_delivered_and_snapshot_replaced() {
    let (watcher, source, notifier) = setup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa"])));
    source.push(Ok(guild(&["Galarzaa", "Noob"])));

    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    let record = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    assert_eq!(record.outcome, ScanOutcome::Compared);
    assert_eq!(record.change_count, 1);

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    let (url, payload) = &sent[0];
    assert_eq!(url, "https://discord.com/api/webhooks/1/global");
    assert_eq!(payload.content.as_deref(), Some("The guild now has **2** members."));
    assert_eq!(payload.username.as_deref(), Some("Guild Watcher"));
    assert_eq!(payload.embeds[0].title, "New member in Redd Alliance");

    let stored = snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().unwrap();
    assert_eq!(stored.members.len(), 2);
}

#[test]
fn deleted_member_reported_when_lookup_confirms() {
    let (watcher, source, notifier) = setup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa", "Botter"])));
    source.push(Ok(guild(&["Galarzaa"])));

    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    let sent = notifier.sent.borrow();
    assert_eq!(sent[0].1.embeds[0].title, "Members deleted in Redd Alliance");
}

#[test]
fn unchanged_guild_sends_nothing() {
    let (watcher, source, notifier) = setup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa"])));
    source.push(Ok(guild(&["Galarzaa"])));

    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    let record = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    assert_eq!(record.outcome, ScanOutcome::Compared);
    assert_eq!(record.change_count, 0);
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn fetch_failure_keeps_previous_snapshot() {
    let (watcher, source, notifier) = setup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa"])));
    source.push(Err(WatchError::Network("timed out".into())));

    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    let record = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    assert_eq!(record.outcome, ScanOutcome::FetchFailed);
    assert!(record.detail.unwrap().contains("timed out"));
    assert!(notifier.sent.borrow().is_empty());
    let stored = snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().unwrap();
    assert_eq!(stored, guild(&["Galarzaa"]));
}

#[test]
fn missing_guild_is_recorded() {
    let (watcher, source, _) = setup(false);
    let cfg = config();
    source.push(Err(WatchError::NotFound {
        entity_type: "Guild".into(),
        id: "Redd Alliance".into(),
    }));

    let record = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    assert_eq!(record.outcome, ScanOutcome::NotFound);
    assert!(snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().is_none());
}

#[test]
fn delivery_failure_still_advances_snapshot() {
    let (watcher, source, _) = setup(true);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa"])));
    source.push(Ok(guild(&["Galarzaa", "Noob"])));

    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    let record = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    assert_eq!(record.outcome, ScanOutcome::DeliveryFailed);
    assert_eq!(record.detail.as_deref(), Some("1 of 1 messages not delivered"));
    let stored = snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().unwrap();
    assert_eq!(stored.members.len(), 2);
}

#[test]
fn failed_lookup_is_retried_on_next_scan() {
    let (watcher, source, lookup, notifier) = setup_with_lookup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa", "Quitter"])));
    source.push(Ok(guild(&["Galarzaa"])));
    source.push(Ok(guild(&["Galarzaa"])));
    lookup.push(Err(WatchError::Network("character service down".into())));
    lookup.push(Ok(Some(CanonicalRecord::named("Quitter"))));

    watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();

    let unresolved = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    assert_eq!(unresolved.outcome, ScanOutcome::Compared);
    assert_eq!(unresolved.change_count, 0);
    assert_eq!(unresolved.anomaly_count, 1);
    let stored = snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().unwrap();
    let names: Vec<&str> = stored.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Galarzaa", "Quitter"]);
    assert_eq!(stored.member_count, 1);

    let resolved = watcher.scan_group(&cfg, &cfg.guilds[0]).unwrap();
    assert_eq!(resolved.change_count, 1);
    assert_eq!(resolved.anomaly_count, 0);
    assert_eq!(*lookup.asked.borrow(), vec!["Quitter".to_string(), "Quitter".to_string()]);

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 2);
    // The count dropped while Quitter's fate was still unknown.
    assert_eq!(sent[0].1.content.as_deref(), Some("The guild now has **1** members."));
    assert!(sent[0].1.embeds.is_empty());
    assert_eq!(sent[1].1.content, None);
    assert_eq!(sent[1].1.embeds[0].title, "Member left or kicked in Redd Alliance");

    let stored = snapshot_repo::load(watcher.conn(), "Redd Alliance").unwrap().unwrap();
    assert_eq!(stored.members.len(), 1);
}

#[test]
fn run_once_scans_every_guild_and_logs() {
    let (watcher, source, _) = setup(false);
    let cfg = config();
    source.push(Ok(guild(&["Galarzaa"])));
    source.push(Ok(guild(&["Nezune"])));

    let records = watcher.run_once(&cfg);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.outcome == ScanOutcome::Baseline));

    let log = scan_repo::recent_for_group(watcher.conn(), "Bald Dwarfs", 5).unwrap();
    assert_eq!(log.len(), 1);
}

// ==========================================================================
// RENDER OPTIONS
// ==========================================================================

#[test]
fn render_options_follow_guild_overrides() {
    let cfg = config();
    let current = guild(&["Galarzaa"]);

    let shared = render_options(&cfg, &cfg.guilds[0], &current);
    assert_eq!(shared.username.as_deref(), Some("Guild Watcher"));
    assert_eq!(shared.avatar_url, None);
    assert_eq!(shared.title_suffix.as_deref(), Some("Redd Alliance"));

    let own = render_options(&cfg, &cfg.guilds[1], &current);
    assert_eq!(own.username.as_deref(), Some("Redd Alliance"));
    assert_eq!(own.avatar_url, current.logo_url);
    assert_eq!(own.title_suffix, None);
}
