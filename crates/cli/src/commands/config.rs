use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use goodday_core::config::AppConfig;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use toml::Value as TomlValue;

use crate::commands::{load_config, CommandResult};

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

/// Effective configuration with the source of every value; secrets are redacted.
pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut details = Map::new();
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        details.insert(field.key.to_string(), json!({ "value": field.value, "source": source }));
    }

    CommandResult::success_with(
        "config",
        "effective config (source precedence: env > file > default)",
        Some(Value::Object(details)),
    )
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let field = |key: &'static str, env_keys: &'static [&'static str], value: String| Field {
        key,
        env_keys,
        value,
    };
    vec![
        field("database.url", &["GOODDAY_DATABASE_URL"], config.database.url.clone()),
        field(
            "database.max_connections",
            &["GOODDAY_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        field(
            "database.timeout_secs",
            &["GOODDAY_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        field(
            "slack.bot_token",
            &["GOODDAY_SLACK_BOT_TOKEN"],
            redact_token(config.slack.bot_token.expose_secret()),
        ),
        field(
            "slack.signing_secret",
            &["GOODDAY_SLACK_SIGNING_SECRET"],
            redact_secret(Some(&config.slack.signing_secret)),
        ),
        field(
            "slack.api_base_url",
            &["GOODDAY_SLACK_API_BASE_URL"],
            config.slack.api_base_url.clone(),
        ),
        field(
            "server.bind_address",
            &["GOODDAY_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        field("server.port", &["GOODDAY_SERVER_PORT", "PORT"], config.server.port.to_string()),
        field(
            "server.public_base_url",
            &["GOODDAY_SERVER_PUBLIC_BASE_URL"],
            config.server.public_base_url.clone(),
        ),
        field(
            "server.graceful_shutdown_secs",
            &["GOODDAY_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        field("signer.key", &["GOODDAY_SIGNER_KEY"], redact_secret(Some(&config.signer.key))),
        field("signer.ttl_days", &["GOODDAY_SIGNER_TTL_DAYS"], config.signer.ttl_days.to_string()),
        field("render.url", &["GOODDAY_RENDER_URL"], config.render.url.clone()),
        field(
            "render.timeout_secs",
            &["GOODDAY_RENDER_TIMEOUT_SECS"],
            config.render.timeout_secs.to_string(),
        ),
        field(
            "render.bearer_token",
            &["GOODDAY_RENDER_BEARER_TOKEN"],
            redact_secret(config.render.bearer_token.as_ref()),
        ),
        field(
            "logging.level",
            &["GOODDAY_LOGGING_LEVEL", "GOODDAY_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        field(
            "logging.format",
            &["GOODDAY_LOGGING_FORMAT", "GOODDAY_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("goodday.toml"), PathBuf::from("config/goodday.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<TomlValue> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<TomlValue>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&TomlValue>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &TomlValue, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret {
        None => "<unset>".to_string(),
        Some(secret) if secret.expose_secret().trim().is_empty() => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
