use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::vocation::Vocation;

/// One roster row. Two members are the same member iff their names match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub rank: Option<String>,
    #[serde(default)]
    pub title: String,
    pub vocation: Vocation,
    pub level: u32,
    pub joined: Option<NaiveDate>,
}

impl Member {
    pub fn create(name: String, rank: Option<String>) -> Self {
        Self {
            name,
            rank,
            title: String::new(),
            vocation: Vocation::None,
            level: 1,
            joined: None,
        }
    }
}

/// A pending, not-yet-accepted invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub name: String,
    pub date: Option<NaiveDate>,
}

impl Invite {
    pub fn create(name: String, date: Option<NaiveDate>) -> Self {
        Self { name, date }
    }
}

/// A house owned by the guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guildhall {
    pub name: String,
    pub paid_until: Option<NaiveDate>,
}

/// The observed state of a guild at one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    #[serde(default)]
    pub world: String,
    pub logo_url: Option<String>,
    pub guildhall: Option<Guildhall>,
    pub disband_condition: Option<String>,
    pub disband_date: Option<NaiveDate>,
    #[serde(default)]
    pub open_applications: bool,
    #[serde(default)]
    pub member_count: u32,
    /// Rank names, highest authority first.
    #[serde(default)]
    pub ranks: Vec<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub invites: Vec<Invite>,
}

impl GroupSnapshot {
    pub fn create(name: String) -> Self {
        Self {
            name,
            world: String::new(),
            logo_url: None,
            guildhall: None,
            disband_condition: None,
            disband_date: None,
            open_applications: false,
            member_count: 0,
            ranks: Vec::new(),
            members: Vec::new(),
            invites: Vec::new(),
        }
    }

    pub fn has_invite(&self, name: &str) -> bool {
        self.invites.iter().any(|i| i.name == name)
    }

    /// Position of a rank in the hierarchy; lower is more senior.
    pub fn rank_index(&self, rank: &str) -> Option<usize> {
        self.ranks.iter().position(|r| r == rank)
    }

    pub fn guildhall_name(&self) -> Option<&str> {
        self.guildhall.as_ref().map(|g| g.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_index_follows_supplied_order() {
        let mut guild = GroupSnapshot::create("Test".into());
        guild.ranks = vec!["Leader".into(), "Vice Leader".into(), "Member".into()];
        assert_eq!(guild.rank_index("Leader"), Some(0));
        assert_eq!(guild.rank_index("Member"), Some(2));
        assert_eq!(guild.rank_index("Recruit"), None);
    }

    #[test]
    fn snapshot_tolerates_missing_collections() {
        let json = r#"{"name":"Test","logo_url":null,"guildhall":null,"disband_condition":null,"disband_date":null}"#;
        let guild: GroupSnapshot = serde_json::from_str(json).unwrap();
        assert!(guild.members.is_empty());
        assert!(guild.invites.is_empty());
        assert!(!guild.open_applications);
    }
}
