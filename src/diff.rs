use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::WatchResult;
use crate::lookup::{CanonicalRecord, IdentityLookup};
use crate::model::{Change, GroupSnapshot, Member};

/// Something irregular met while diffing. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A rank change could not be ordered because a rank is missing from the
    /// current hierarchy (renamed, or no longer shown because it is empty).
    UnknownRank {
        member: String,
        previous_rank: Option<String>,
        current_rank: Option<String>,
    },
    /// A lookup resolved to a name that did not single out one arrival.
    /// `candidates` counts the unclaimed arrivals bearing that name.
    AmbiguousIdentity {
        former_name: String,
        current_name: String,
        candidates: usize,
    },
    /// The lookup for a vanished member failed, so its fate is unknown.
    Indeterminate { member: Member, reason: String },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::UnknownRank {
                member,
                previous_rank,
                current_rank,
            } => write!(
                f,
                "{}: cannot order rank change {} -> {}",
                member,
                previous_rank.as_deref().unwrap_or("(none)"),
                current_rank.as_deref().unwrap_or("(none)")
            ),
            Anomaly::AmbiguousIdentity {
                former_name,
                current_name,
                candidates,
            } => write!(
                f,
                "{} resolved to {} with {} unclaimed candidates",
                former_name, current_name, candidates
            ),
            Anomaly::Indeterminate { member, reason } => {
                write!(f, "{}: lookup failed ({})", member.name, reason)
            }
        }
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub changes: Vec<Change>,
    pub anomalies: Vec<Anomaly>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.anomalies.is_empty()
    }
}

/// Name-based pairing of two rosters.
struct Roster<'a> {
    matched: Vec<(&'a Member, &'a Member)>,
    vanished: Vec<&'a Member>,
    arrived: Vec<&'a Member>,
}

/// Compares `before` with `after` and classifies every difference.
///
/// Changes come out in stage order: guild attributes, members still
/// present, vanished members, arrivals, then invites. `lookup` is only
/// consulted for members that vanished.
pub fn diff(before: &GroupSnapshot, after: &GroupSnapshot, lookup: &dyn IdentityLookup) -> DiffReport {
    let mut report = DiffReport::default();

    compare_attributes(before, after, &mut report.changes);

    let roster = partition_members(before, after);
    compare_matched(&roster.matched, after, &mut report);

    let claimed = resolve_vanished(&roster, lookup, &mut report);
    for (i, member) in roster.arrived.iter().enumerate() {
        if !claimed[i] {
            debug!(member = %member.name, "new member");
            report.changes.push(Change::NewMember {
                member: (*member).clone(),
            });
        }
    }

    compare_invites(before, after, &roster.arrived, &mut report.changes);
    report
}

fn compare_attributes(before: &GroupSnapshot, after: &GroupSnapshot, changes: &mut Vec<Change>) {
    match (before.guildhall_name(), after.guildhall_name()) {
        (None, Some(name)) => {
            debug!(guildhall = name, "guildhall acquired");
            changes.push(Change::GuildhallChanged {
                name: name.to_string(),
                previous: None,
            });
        }
        (Some(old), None) => {
            debug!(guildhall = old, "guildhall lost");
            changes.push(Change::GuildhallRemoved {
                name: old.to_string(),
            });
        }
        (Some(old), Some(name)) if old != name => {
            debug!(from = old, to = name, "guildhall moved");
            changes.push(Change::GuildhallChanged {
                name: name.to_string(),
                previous: Some(old.to_string()),
            });
        }
        _ => {}
    }

    if before.disband_condition != after.disband_condition {
        match &after.disband_condition {
            None => changes.push(Change::RemovedDisbandWarning),
            Some(condition) => changes.push(Change::NewDisbandWarning {
                condition: condition.clone(),
                date: after.disband_date,
            }),
        }
    }

    if before.open_applications != after.open_applications {
        changes.push(Change::ApplicationsChanged {
            open: after.open_applications,
        });
    }
}

/// Pairs members one-to-one by name. Each `after` member is claimed by at
/// most one `before` member, first come first served in `before` order.
fn partition_members<'a>(before: &'a GroupSnapshot, after: &'a GroupSnapshot) -> Roster<'a> {
    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, member) in after.members.iter().enumerate() {
        by_name.entry(member.name.as_str()).or_default().push(i);
    }

    let mut taken = vec![false; after.members.len()];
    let mut matched = Vec::new();
    let mut vanished = Vec::new();

    for member in &before.members {
        let slot = by_name
            .get(member.name.as_str())
            .and_then(|indices| indices.iter().copied().find(|&i| !taken[i]));
        match slot {
            Some(i) => {
                taken[i] = true;
                matched.push((member, &after.members[i]));
            }
            None => vanished.push(member),
        }
    }

    let arrived = after
        .members
        .iter()
        .zip(taken.iter())
        .filter(|(_, taken)| !**taken)
        .map(|(m, _)| m)
        .collect();

    Roster {
        matched,
        vanished,
        arrived,
    }
}

fn compare_matched(matched: &[(&Member, &Member)], after: &GroupSnapshot, report: &mut DiffReport) {
    for &(old, new) in matched {
        if old.rank != new.rank {
            let positions = match (&old.rank, &new.rank) {
                (Some(from), Some(to)) => after.rank_index(from).zip(after.rank_index(to)),
                _ => None,
            };
            match positions {
                Some((from, to)) if to > from => {
                    debug!(member = %new.name, "demoted");
                    report.changes.push(Change::Demoted { member: new.clone() });
                }
                Some((from, to)) if to < from => {
                    debug!(member = %new.name, "promoted");
                    report.changes.push(Change::Promoted { member: new.clone() });
                }
                // Same position means the rank list repeats a name; nothing to order.
                Some(_) => {}
                None => report.anomalies.push(Anomaly::UnknownRank {
                    member: new.name.clone(),
                    previous_rank: old.rank.clone(),
                    current_rank: new.rank.clone(),
                }),
            }
        }

        if old.title != new.title {
            debug!(member = %new.name, from = %old.title, to = %new.title, "title changed");
            report.changes.push(Change::TitleChange {
                member: new.clone(),
                old_title: old.title.clone(),
            });
        }
    }
}

/// Classifies each vanished member as deleted, renamed, or removed.
/// Returns which arrivals were claimed by a rename.
fn resolve_vanished(roster: &Roster<'_>, lookup: &dyn IdentityLookup, report: &mut DiffReport) -> Vec<bool> {
    // All lookups complete before any arrival is claimed, so the outcome
    // does not depend on how the lookups were scheduled.
    let resolutions: Vec<(&Member, WatchResult<Option<CanonicalRecord>>)> = roster
        .vanished
        .iter()
        .map(|&member| {
            debug!(member = %member.name, "checking vanished member");
            (member, lookup.lookup(&member.name))
        })
        .collect();

    let mut claimed = vec![false; roster.arrived.len()];

    for (member, resolution) in resolutions {
        match resolution {
            Ok(None) => {
                debug!(member = %member.name, "deleted");
                report.changes.push(Change::Deleted {
                    member: member.clone(),
                });
            }
            Ok(Some(record)) => {
                let same_name: Vec<usize> = roster
                    .arrived
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.name == record.name)
                    .map(|(i, _)| i)
                    .collect();
                let unclaimed: Vec<usize> = same_name.iter().copied().filter(|&i| !claimed[i]).collect();

                if unclaimed.len() > 1 || (unclaimed.is_empty() && !same_name.is_empty()) {
                    report.anomalies.push(Anomaly::AmbiguousIdentity {
                        former_name: member.name.clone(),
                        current_name: record.name.clone(),
                        candidates: unclaimed.len(),
                    });
                }

                match unclaimed.first() {
                    Some(&i) => {
                        claimed[i] = true;
                        debug!(from = %member.name, to = %record.name, "name changed");
                        report.changes.push(Change::NameChange {
                            member: roster.arrived[i].clone(),
                            former_name: member.name.clone(),
                        });
                    }
                    None => {
                        debug!(member = %member.name, "left or kicked");
                        report.changes.push(Change::Removed {
                            member: member.clone(),
                        });
                    }
                }
            }
            Err(e) => report.anomalies.push(Anomaly::Indeterminate {
                member: member.clone(),
                reason: e.to_string(),
            }),
        }
    }

    claimed
}

fn compare_invites(before: &GroupSnapshot, after: &GroupSnapshot, arrived: &[&Member], changes: &mut Vec<Change>) {
    for invite in &before.invites {
        if after.has_invite(&invite.name) {
            continue;
        }
        let accepted = arrived.iter().any(|m| m.name == invite.name);
        if !accepted {
            debug!(invite = %invite.name, "invite rejected or cancelled");
            changes.push(Change::InviteRemoved {
                invite: invite.clone(),
            });
        }
    }

    for invite in &after.invites {
        if !before.has_invite(&invite.name) {
            debug!(invite = %invite.name, "new invite");
            changes.push(Change::NewInvite {
                invite: invite.clone(),
            });
        }
    }
}
