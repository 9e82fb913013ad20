use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde_json::json;

use crate::commands::CommandResult;

pub const KEY_BYTES: usize = 32;

/// Prints a fresh random signing key for `signer.key`. Needs no configuration.
pub fn run() -> CommandResult {
    let mut key = [0_u8; KEY_BYTES];
    OsRng.fill_bytes(&mut key);

    CommandResult::success_with(
        "keygen",
        "generated signing key; store it as GOODDAY_SIGNER_KEY or signer.key",
        Some(json!({ "key": STANDARD.encode(key), "bytes": KEY_BYTES })),
    )
}
