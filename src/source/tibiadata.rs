use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use super::GroupSource;
use crate::error::{WatchError, WatchResult};
use crate::lookup::{CanonicalRecord, IdentityLookup};
use crate::model::{GroupSnapshot, Guildhall, Invite, Member, Vocation};

pub const DEFAULT_API_URL: &str = "https://api.tibiadata.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("guildwatch/", env!("CARGO_PKG_VERSION"));

/// Blocking client for the TibiaData v4 API. Serves both as the guild
/// source and as the character lookup.
pub struct TibiaDataClient {
    base_url: String,
    agent: ureq::Agent,
}

impl TibiaDataClient {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    /// GETs a JSON document. `Ok(None)` when the API answers 404.
    fn get_body(&self, path: &str) -> WatchResult<Option<String>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "fetching");
        match self.agent.get(&url).call() {
            Ok(resp) => Ok(Some(resp.into_string()?)),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(WatchError::Network(format!(
                    "HTTP {} from {}: {}",
                    code,
                    url,
                    body.chars().take(200).collect::<String>()
                )))
            }
            Err(ureq::Error::Transport(t)) => Err(WatchError::Network(t.to_string())),
        }
    }
}

impl Default for TibiaDataClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl GroupSource for TibiaDataClient {
    fn fetch_group(&self, name: &str) -> WatchResult<GroupSnapshot> {
        let body = self.get_body(&format!("/v4/guild/{}", path_segment(name)))?;
        let parsed = match body {
            Some(body) => parse_guild(&body)?,
            None => None,
        };
        parsed.ok_or_else(|| WatchError::NotFound {
            entity_type: "Guild".into(),
            id: name.to_string(),
        })
    }
}

impl IdentityLookup for TibiaDataClient {
    fn lookup(&self, name: &str) -> WatchResult<Option<CanonicalRecord>> {
        match self.get_body(&format!("/v4/character/{}", path_segment(name)))? {
            Some(body) => parse_character(&body),
            None => Ok(None),
        }
    }
}

// Character names only contain letters, spaces, apostrophes, dots and dashes.
fn path_segment(name: &str) -> String {
    name.trim().replace('%', "%25").replace(' ', "%20").replace('/', "%2F")
}

#[derive(Debug, Default, Deserialize)]
struct Information {
    #[serde(default)]
    status: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    http_code: u16,
}

impl Information {
    fn says_not_found(&self) -> bool {
        self.status.as_ref().map(|s| s.http_code == 404).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct GuildEnvelope {
    guild: Option<GuildPayload>,
    #[serde(default)]
    information: Information,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GuildPayload {
    name: String,
    world: String,
    logo_url: String,
    guildhalls: Option<Vec<GuildhallPayload>>,
    open_applications: bool,
    disband_date: String,
    disband_condition: String,
    members_total: u32,
    members: Option<Vec<MemberPayload>>,
    invites: Option<Vec<InvitePayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GuildhallPayload {
    name: String,
    paid_until: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MemberPayload {
    name: String,
    title: String,
    rank: String,
    vocation: String,
    level: u32,
    joined: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InvitePayload {
    name: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct CharacterEnvelope {
    character: Option<CharacterWrapper>,
    #[serde(default)]
    information: Information,
}

#[derive(Debug, Deserialize)]
struct CharacterWrapper {
    character: Option<CharacterPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CharacterPayload {
    name: String,
}

/// Parses a `/v4/guild` response. `Ok(None)` when the payload says the
/// guild does not exist.
pub fn parse_guild(body: &str) -> WatchResult<Option<GroupSnapshot>> {
    let envelope: GuildEnvelope = serde_json::from_str(body)?;
    if envelope.information.says_not_found() {
        return Ok(None);
    }
    let payload = match envelope.guild {
        Some(g) if !g.name.trim().is_empty() => g,
        _ => return Ok(None),
    };

    let mut ranks: Vec<String> = Vec::new();
    let members: Vec<Member> = payload
        .members
        .unwrap_or_default()
        .into_iter()
        .map(|m| {
            let rank = non_empty(m.rank);
            // Members are listed grouped by rank, most senior first.
            if let Some(r) = &rank {
                if !ranks.contains(r) {
                    ranks.push(r.clone());
                }
            }
            Member {
                name: m.name,
                rank,
                title: m.title,
                vocation: Vocation::from_name(&m.vocation),
                level: m.level,
                joined: parse_date(&m.joined),
            }
        })
        .collect();

    let invites = payload
        .invites
        .unwrap_or_default()
        .into_iter()
        .map(|i| Invite::create(i.name, parse_date(&i.date)))
        .collect();

    let guildhall = payload
        .guildhalls
        .unwrap_or_default()
        .into_iter()
        .find(|g| !g.name.is_empty())
        .map(|g| Guildhall {
            paid_until: parse_date(&g.paid_until),
            name: g.name,
        });

    let member_count = if payload.members_total == 0 {
        members.len() as u32
    } else {
        payload.members_total
    };

    Ok(Some(GroupSnapshot {
        name: payload.name,
        world: payload.world,
        logo_url: non_empty(payload.logo_url),
        guildhall,
        disband_condition: non_empty(payload.disband_condition),
        disband_date: parse_date(&payload.disband_date),
        open_applications: payload.open_applications,
        member_count,
        ranks,
        members,
        invites,
    }))
}

/// Parses a `/v4/character` response into the character's current name.
pub fn parse_character(body: &str) -> WatchResult<Option<CanonicalRecord>> {
    let envelope: CharacterEnvelope = serde_json::from_str(body)?;
    if envelope.information.says_not_found() {
        return Ok(None);
    }
    Ok(envelope
        .character
        .and_then(|c| c.character)
        .and_then(|c| non_empty(c.name))
        .map(CanonicalRecord::named))
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // The API mostly uses ISO dates; some guild fields come as "Mar 13 2024".
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%b %d %Y"))
        .ok();
    if date.is_none() {
        warn!(value = s, "unrecognised date");
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: &str = r#"{
        "guild": {
            "name": "Redd Alliance",
            "world": "Antica",
            "logo_url": "https://static.tibia.com/images/guildlogos/Redd_Alliance.gif",
            "guildhalls": [{"name": "Sword Hall", "world": "Antica", "paid_until": "2024-04-19"}],
            "open_applications": true,
            "disband_date": "",
            "disband_condition": "",
            "members_total": 3,
            "members": [
                {"name": "Galarzaa Fidera", "title": "", "rank": "Leader", "vocation": "Royal Paladin", "level": 285, "joined": "2019-06-12", "status": "offline"},
                {"name": "Nezune", "title": "Nab", "rank": "Vice Leader", "vocation": "Elite Knight", "level": 412, "joined": "2019-06-13", "status": "online"},
                {"name": "Tschis", "title": "", "rank": "Vice Leader", "vocation": "Druid", "level": 205, "joined": "2019-06-14", "status": "offline"}
            ],
            "invites": [{"name": "Xzilla", "date": "2024-01-01"}]
        },
        "information": {"api": {"version": 4}, "status": {"http_code": 200}}
    }"#;

    #[test]
    fn parse_guild_derives_ranks_in_listing_order() {
        let guild = parse_guild(GUILD).unwrap().unwrap();
        assert_eq!(guild.name, "Redd Alliance");
        assert_eq!(guild.ranks, vec!["Leader".to_string(), "Vice Leader".to_string()]);
        assert_eq!(guild.members.len(), 3);
        assert_eq!(guild.members[1].title, "Nab");
        assert_eq!(guild.members[0].vocation, Vocation::RoyalPaladin);
        assert_eq!(guild.members[0].joined, NaiveDate::from_ymd_opt(2019, 6, 12));
        assert_eq!(guild.member_count, 3);
    }

    #[test]
    fn parse_guild_maps_empty_strings_to_none() {
        let guild = parse_guild(GUILD).unwrap().unwrap();
        assert_eq!(guild.disband_condition, None);
        assert_eq!(guild.disband_date, None);
        assert_eq!(guild.guildhall_name(), Some("Sword Hall"));
        assert!(guild.open_applications);
        assert_eq!(guild.invites.len(), 1);
    }

    #[test]
    fn parse_guild_detects_not_found() {
        let body = r#"{"guild": {"name": ""}, "information": {"status": {"http_code": 404, "error": 20004}}}"#;
        assert!(parse_guild(body).unwrap().is_none());

        let body = r#"{"guild": {"name": ""}, "information": {"status": {"http_code": 200}}}"#;
        assert!(parse_guild(body).unwrap().is_none());
    }

    #[test]
    fn parse_guild_accepts_null_lists() {
        let body = r#"{"guild": {"name": "Empty", "members": null, "invites": null, "guildhalls": null}}"#;
        let guild = parse_guild(body).unwrap().unwrap();
        assert!(guild.members.is_empty());
        assert!(guild.ranks.is_empty());
        assert!(guild.guildhall.is_none());
    }

    #[test]
    fn parse_guild_rejects_malformed_json() {
        assert!(parse_guild("<html>maintenance</html>").is_err());
    }

    #[test]
    fn parse_character_returns_current_name() {
        let body = r#"{"character": {"character": {"name": "Galarzaa Fidera", "former_names": ["Galarzaa"]}}, "information": {"status": {"http_code": 200}}}"#;
        assert_eq!(
            parse_character(body).unwrap(),
            Some(CanonicalRecord::named("Galarzaa Fidera"))
        );
    }

    #[test]
    fn parse_character_detects_not_found() {
        let body = r#"{"character": {"character": {"name": ""}}, "information": {"status": {"http_code": 404}}}"#;
        assert_eq!(parse_character(body).unwrap(), None);
    }

    #[test]
    fn path_segment_encodes_spaces() {
        assert_eq!(path_segment(" Redd Alliance "), "Redd%20Alliance");
    }

    #[test]
    fn parse_date_accepts_both_formats() {
        assert_eq!(parse_date("2024-03-13"), NaiveDate::from_ymd_opt(2024, 3, 13));
        assert_eq!(parse_date("Mar 13 2024"), NaiveDate::from_ymd_opt(2024, 3, 13));
        assert_eq!(parse_date(""), None);
    }
}
