use chrono::{DateTime, Duration, Utc};
use goodday_core::capability::CapabilityParams;
use goodday_core::config::AppConfig;
use serde_json::json;

use crate::commands::{capability_engine, load_config, CommandResult};

pub fn run(
    team_id: &str,
    user_id: &str,
    tz_offset_hours: i32,
    ttl_days: Option<u32>,
) -> CommandResult {
    let config = match load_config("sign") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    sign_with(&config, team_id, user_id, tz_offset_hours, ttl_days, Utc::now())
}

/// Signs heatmap and report links for one viewer; the token expiry is `now` + ttl.
pub fn sign_with(
    config: &AppConfig,
    team_id: &str,
    user_id: &str,
    tz_offset_hours: i32,
    ttl_days: Option<u32>,
    now: DateTime<Utc>,
) -> CommandResult {
    let engine = match capability_engine("sign", config) {
        Ok(engine) => engine,
        Err(failure) => return failure,
    };

    let ttl =
        ttl_days.map_or_else(|| config.signer.ttl(), |days| Duration::days(i64::from(days)));
    let params = CapabilityParams::new(team_id, user_id, tz_offset_hours)
        .expiring_at(now.timestamp() + ttl.num_seconds());

    let heatmap_url = engine.signed_url(&config.server.heatmap_base_url(), &params, ttl);
    let report_url = engine.signed_url(&config.server.report_base_url(), &params, ttl);
    let expires_at = now + ttl;

    CommandResult::success_with(
        "sign",
        format!("signed image links for {team_id}/{user_id}"),
        Some(json!({
            "heatmap_url": heatmap_url,
            "report_url": report_url,
            "expires_at": expires_at.to_rfc3339(),
        })),
    )
}
