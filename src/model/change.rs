use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::snapshot::{Invite, Member};

/// One classified difference between two snapshots. Each variant carries
/// everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Change {
    NewMember { member: Member },
    Deleted { member: Member },
    Removed { member: Member },
    NameChange { member: Member, former_name: String },
    TitleChange { member: Member, old_title: String },
    Promoted { member: Member },
    Demoted { member: Member },
    InviteRemoved { invite: Invite },
    NewInvite { invite: Invite },
    GuildhallChanged { name: String, previous: Option<String> },
    GuildhallRemoved { name: String },
    NewDisbandWarning { condition: String, date: Option<NaiveDate> },
    RemovedDisbandWarning,
    ApplicationsChanged { open: bool },
}

/// Fieldless discriminant of [`Change`], used for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    NewMember,
    Deleted,
    Removed,
    NameChange,
    TitleChange,
    Promoted,
    Demoted,
    InviteRemoved,
    NewInvite,
    GuildhallChanged,
    GuildhallRemoved,
    NewDisbandWarning,
    RemovedDisbandWarning,
    ApplicationsChanged,
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::NewMember { .. } => ChangeKind::NewMember,
            Change::Deleted { .. } => ChangeKind::Deleted,
            Change::Removed { .. } => ChangeKind::Removed,
            Change::NameChange { .. } => ChangeKind::NameChange,
            Change::TitleChange { .. } => ChangeKind::TitleChange,
            Change::Promoted { .. } => ChangeKind::Promoted,
            Change::Demoted { .. } => ChangeKind::Demoted,
            Change::InviteRemoved { .. } => ChangeKind::InviteRemoved,
            Change::NewInvite { .. } => ChangeKind::NewInvite,
            Change::GuildhallChanged { .. } => ChangeKind::GuildhallChanged,
            Change::GuildhallRemoved { .. } => ChangeKind::GuildhallRemoved,
            Change::NewDisbandWarning { .. } => ChangeKind::NewDisbandWarning,
            Change::RemovedDisbandWarning => ChangeKind::RemovedDisbandWarning,
            Change::ApplicationsChanged { .. } => ChangeKind::ApplicationsChanged,
        }
    }
}

impl ChangeKind {
    /// Guild-level changes render as standalone panels.
    pub fn is_guild_level(&self) -> bool {
        matches!(
            self,
            ChangeKind::GuildhallChanged
                | ChangeKind::GuildhallRemoved
                | ChangeKind::NewDisbandWarning
                | ChangeKind::RemovedDisbandWarning
                | ChangeKind::ApplicationsChanged
        )
    }
}
