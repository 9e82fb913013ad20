use chrono::{DateTime, Utc};
use goodday_core::capability::token_from_path;
use goodday_core::config::AppConfig;
use serde_json::json;

use crate::commands::{capability_engine, load_config, CommandResult};

const TOKEN_REJECTED_EXIT_CODE: u8 = 6;

/// Verifies a token, or the last path segment of an image URL, against the configured key.
pub fn run(token_or_url: &str) -> CommandResult {
    let config = match load_config("inspect") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    inspect_with(&config, token_or_url, Utc::now())
}

pub fn inspect_with(config: &AppConfig, token_or_url: &str, now: DateTime<Utc>) -> CommandResult {
    let engine = match capability_engine("inspect", config) {
        Ok(engine) => engine,
        Err(failure) => return failure,
    };

    let token = token_from_path(token_or_url.trim());
    match engine.verify_at(token, now) {
        Ok(params) => {
            let expires_at = params
                .expires_at_unix
                .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
                .map(|instant| instant.to_rfc3339());
            CommandResult::success_with(
                "inspect",
                "token is valid",
                Some(json!({
                    "team_id": params.team_id,
                    "user_id": params.user_id,
                    "tz_offset_hours": params.tz_offset_hours,
                    "expires_at": expires_at,
                })),
            )
        }
        Err(error) => CommandResult::failure(
            "inspect",
            error.kind(),
            error.to_string(),
            TOKEN_REJECTED_EXIT_CODE,
        ),
    }
}
