use std::env;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber.
///
/// `GUILDWATCH_LOG` takes an `EnvFilter` directive (default
/// `guildwatch=info,warn`); `GUILDWATCH_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("GUILDWATCH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "guildwatch=debug,info"
        } else {
            "guildwatch=info,warn"
        })
    });

    let format = env::var("GUILDWATCH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => registry.with(fmt::layer().json().with_ansi(false)).init(),
        _ => registry.with(fmt::layer().compact()).init(),
    }
}
