use serde::Serialize;

use crate::model::{Change, ChangeKind, Invite, Member};

/// Longest body a single panel may carry.
pub const DESCRIPTION_LIMIT: usize = 1900;
/// Most panels a single webhook message may carry.
pub const PANELS_PER_MESSAGE: usize = 10;
/// Character budget (titles + bodies) of a single webhook message.
pub const MESSAGE_CHAR_LIMIT: usize = 6000;

const CHARACTER_URL: &str = "https://www.tibia.com/community/?subtopic=characters&name=";

/// One embed: a titled, coloured block of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
    pub color: u32,
    pub description: String,
}

impl Panel {
    fn char_len(&self) -> usize {
        self.title.chars().count() + self.description.chars().count()
    }
}

/// Per-call display settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    /// Appended to panel titles as " in {suffix}".
    pub title_suffix: Option<String>,
}

/// Body of one webhook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Panel>,
}

struct Section {
    kind: ChangeKind,
    title: &'static str,
    color: u32,
}

/// Member panels, in display order.
const SECTIONS: &[Section] = &[
    Section { kind: ChangeKind::NewMember, title: "New member", color: 0x05825B },
    Section { kind: ChangeKind::Removed, title: "Member left or kicked", color: 0xFF0000 },
    Section { kind: ChangeKind::Promoted, title: "Member promoted", color: 0xFFFF00 },
    Section { kind: ChangeKind::Demoted, title: "Member demoted", color: 0xFFA500 },
    Section { kind: ChangeKind::Deleted, title: "Members deleted", color: 0x000000 },
    Section { kind: ChangeKind::NameChange, title: "Member changed name", color: 0x00FFFF },
    Section { kind: ChangeKind::TitleChange, title: "Title changed", color: 0xC512ED },
    Section { kind: ChangeKind::InviteRemoved, title: "Invites rejected or cancelled", color: 0xFF6966 },
    Section { kind: ChangeKind::NewInvite, title: "New invites", color: 0x7DF589 },
];

pub fn character_url(name: &str) -> String {
    format!("{}{}", CHARACTER_URL, name.replace(' ', "+"))
}

fn link(name: &str) -> String {
    format!("[{}]({})", name, character_url(name))
}

fn stats(m: &Member) -> String {
    let line = format!("**{}** **{}** {}", m.level, m.vocation.abbreviation(), m.vocation.emoji());
    line.trim_end().to_string()
}

fn member_line(m: &Member) -> String {
    format!("{} - {}", link(&m.name), stats(m))
}

fn member_line_full(m: &Member) -> String {
    let joined = m
        .joined
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".into());
    format!(
        "{} - Rank: **{}** - Joined **{}**",
        member_line(m),
        m.rank.as_deref().unwrap_or("None"),
        joined
    )
}

fn invite_line(i: &Invite) -> String {
    let date = i.date.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
    format!("{} - Invited: **{}**", link(&i.name), date)
}

fn or_none(title: &str) -> &str {
    if title.is_empty() {
        "None"
    } else {
        title
    }
}

/// The line a member-level change contributes to its panel.
fn change_line(change: &Change) -> Option<String> {
    let line = match change {
        Change::NewMember { member } => member_line(member),
        Change::Removed { member }
        | Change::Promoted { member }
        | Change::Demoted { member }
        | Change::Deleted { member } => member_line_full(member),
        Change::NameChange { member, former_name } => {
            format!("{} \u{2192} {}", former_name, member_line(member))
        }
        Change::TitleChange { member, old_title } => format!(
            "{} - {} \u{2192} {} - {}",
            link(&member.name),
            or_none(old_title),
            or_none(&member.title),
            stats(member)
        ),
        Change::InviteRemoved { invite } | Change::NewInvite { invite } => invite_line(invite),
        _ => return None,
    };
    Some(line)
}

/// Standalone panel for a guild-level change.
fn guild_panel(change: &Change) -> Option<(&'static str, u32, String)> {
    let panel = match change {
        Change::GuildhallChanged { name, previous: None } => (
            "Guildhall changed",
            0xFFFFFF,
            format!("Guild moved to guildhall **{}**", name),
        ),
        Change::GuildhallChanged {
            name,
            previous: Some(previous),
        } => (
            "Guildhall changed",
            0xFFFFFF,
            format!("Guild moved from guildhall **{}** to **{}**", previous, name),
        ),
        Change::GuildhallRemoved { name } => (
            "Guildhall removed",
            0xA9A9A9,
            format!("Guild no longer owns guildhall **{}**", name),
        ),
        Change::NewDisbandWarning { condition, date } => {
            let description = match date {
                Some(date) => format!("Guild will be disbanded on **{}** {}.", date, condition.trim_end_matches('.')),
                None => format!("Guild may be disbanded: {}.", condition.trim_end_matches('.')),
            };
            ("Guild in risk of being disbanded", 0xE59400, description)
        }
        Change::RemovedDisbandWarning => (
            "Guild no longer in disband risk",
            0x08CC8F,
            "Guild no longer in risk of being disbanded.".to_string(),
        ),
        Change::ApplicationsChanged { open } => (
            "Guild application status changed",
            0xF5F5DC,
            format!("Applications are now {}.", if *open { "open" } else { "closed" }),
        ),
        _ => return None,
    };
    Some(panel)
}

fn titled(title: &str, opts: &RenderOptions) -> String {
    match &opts.title_suffix {
        Some(suffix) => format!("{} in {}", title, suffix),
        None => title.to_string(),
    }
}

/// Builds every panel for `changes`: guild-level panels first in change
/// order, then one group of panels per member section.
pub fn build_panels(changes: &[Change], opts: &RenderOptions) -> Vec<Panel> {
    let mut panels: Vec<Panel> = changes
        .iter()
        .filter(|c| c.kind().is_guild_level())
        .filter_map(guild_panel)
        .map(|(title, color, description)| Panel {
            title: titled(title, opts),
            color,
            description,
        })
        .collect();

    for section in SECTIONS {
        let body: String = changes
            .iter()
            .filter(|c| c.kind() == section.kind)
            .filter_map(change_line)
            .map(|line| line + "\n")
            .collect();
        if body.is_empty() {
            continue;
        }
        for description in split_description(&body, DESCRIPTION_LIMIT) {
            panels.push(Panel {
                title: titled(section.title, opts),
                color: section.color,
                description,
            });
        }
    }

    panels
}

/// Splits `text` into chunks of at most `limit` characters, breaking on
/// line boundaries. A line longer than `limit` is cut on char boundaries.
pub fn split_description(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Groups panels into messages of at most [`PANELS_PER_MESSAGE`] panels and
/// [`MESSAGE_CHAR_LIMIT`] characters, preserving order.
pub fn batch_panels(panels: Vec<Panel>) -> Vec<Vec<Panel>> {
    let mut batches = Vec::new();
    let mut current: Vec<Panel> = Vec::new();
    let mut current_len = 0;

    for panel in panels {
        let len = panel.char_len();
        if !current.is_empty() && (current.len() == PANELS_PER_MESSAGE || current_len + len > MESSAGE_CHAR_LIMIT) {
            batches.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += len;
        current.push(panel);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Renders `changes` into ready-to-post webhook bodies. The first body
/// announces `member_count` when one is given, even if it carries no panels.
pub fn build_payloads(changes: &[Change], opts: &RenderOptions, member_count: Option<u32>) -> Vec<WebhookPayload> {
    let mut batches = batch_panels(build_panels(changes, opts));
    if batches.is_empty() && member_count.is_some() {
        batches.push(Vec::new());
    }

    batches
        .into_iter()
        .enumerate()
        .map(|(i, embeds)| WebhookPayload {
            username: opts.username.clone(),
            avatar_url: opts.avatar_url.clone(),
            content: member_count
                .filter(|_| i == 0)
                .map(|n| format!("The guild now has **{}** members.", n)),
            embeds,
        })
        .collect()
}
