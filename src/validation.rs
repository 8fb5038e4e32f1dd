use std::time::Duration;

use crate::error::{WatchError, WatchResult};

/// Normalises a configured guild name the way the game displays it: outer
/// whitespace dropped, inner runs of whitespace folded to one space.
pub fn guild_name(value: &str) -> WatchResult<String> {
    let name = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(WatchError::BlankField {
            field: "guild name".to_string(),
        });
    }
    Ok(name)
}

/// Seconds between scan rounds. Zero would spin the scan loop.
pub fn scan_interval(secs: u64) -> WatchResult<Duration> {
    if secs == 0 {
        return Err(WatchError::NonPositive {
            field: "interval".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Checks that `value` is a Discord webhook endpoint:
/// `http(s)://<host>/api[/v<N>]/webhooks/<numeric id>/<token>`.
pub fn discord_webhook(value: &str, field: &str) -> WatchResult<String> {
    let url = value.trim();
    let invalid = |reason: &str| {
        WatchError::Config(format!("{} is not a Discord webhook URL ({}): '{}'", field, reason, url))
    };

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| invalid("expected an http(s) scheme"))?;

    let mut segments = rest.split('/');
    if segments.next().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if segments.next() != Some("api") {
        return Err(invalid("path must start with /api"));
    }
    let mut next = segments.next();
    if next.map_or(false, |s| s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit())) {
        next = segments.next();
    }
    if next != Some("webhooks") {
        return Err(invalid("path must contain /webhooks"));
    }
    match segments.next() {
        Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {}
        _ => return Err(invalid("webhook id must be numeric")),
    }
    if segments.next().map_or(true, str::is_empty) {
        return Err(invalid("missing webhook token"));
    }

    Ok(url.to_string())
}

/// An optional text setting; blank counts as unset.
pub fn optional_setting(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}
