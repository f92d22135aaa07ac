//! Save tokens and resume URLs.
//!
//! A token is `std1.` followed by the run payload as URL-safe base64
//! without padding. Tokens travel as a single `save` query parameter.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::constants::{
    LOG_SAVE_DECODED, LOG_SAVE_ENCODED, MAX_SHAREABLE_URL_LENGTH, SAVE_QUERY_PARAM,
    SAVE_TOKEN_PREFIX, SAVE_VERSION,
};
use crate::dice::DiceSpec;
use crate::progression::BuildChoiceError;
use crate::run::DungeonRun;
use crate::run::save::RunSave;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("Save token is empty.")]
    MissingToken,
    #[error("Save token is not valid base64.")]
    InvalidBase64,
    #[error("Save payload is invalid: {0}")]
    InvalidPayload(String),
    #[error("Unsupported save version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Save data map payload is malformed.")]
    MalformedWorld,
    #[error("Save data carries invalid dice notation.")]
    MalformedDice,
    #[error("Unable to restore {container}: too many items.")]
    ContainerOverflow { container: String },
    #[error("Unknown build choice: {id}")]
    UnknownBuildChoice { id: String },
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Payload key holding a weapon's damage notation.
const DAMAGE_DICE_FIELD: &str = "damageDice";

/// The one field every payload version shares.
#[derive(Deserialize)]
struct PayloadVersion {
    version: u32,
}

impl From<BuildChoiceError> for SaveError {
    fn from(err: BuildChoiceError) -> Self {
        match err {
            BuildChoiceError::Unknown { id } => Self::UnknownBuildChoice { id },
        }
    }
}

/// Serialize a run into a shareable token.
///
/// # Errors
///
/// Returns [`SaveError::InvalidPayload`] if the payload cannot be rendered
/// as JSON.
pub fn encode_save_token(run: &DungeonRun) -> Result<String, SaveError> {
    let payload = serde_json::to_string(&run.to_save())?;
    let token = format!("{SAVE_TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(payload.as_bytes()));
    log::debug!(
        "{LOG_SAVE_ENCODED}: payload={} token={}",
        payload.len(),
        token.len()
    );
    Ok(token)
}

/// Parse a token back into its payload. The `std1.` prefix is optional.
///
/// # Errors
///
/// Fails on an empty token, bad base64, a version other than the current
/// one (checked before the rest of the payload), bad dice notation, or a
/// payload that is not a save.
pub fn decode_save_token(token: &str) -> Result<RunSave, SaveError> {
    let trimmed = token.trim();
    let payload = trimmed.strip_prefix(SAVE_TOKEN_PREFIX).unwrap_or(trimmed);
    let payload = payload.trim_end_matches('=');
    if payload.is_empty() {
        return Err(SaveError::MissingToken);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| SaveError::InvalidBase64)?;
    log::debug!("{LOG_SAVE_DECODED}: payload={}", bytes.len());
    let payload: Value = serde_json::from_slice(&bytes)?;
    let PayloadVersion { version } = PayloadVersion::deserialize(&payload)?;
    if version != SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: version,
            expected: SAVE_VERSION,
        });
    }
    if let Some(notation) = first_malformed_dice(&payload) {
        log::debug!("{LOG_SAVE_DECODED}: rejected dice {notation:?}");
        return Err(SaveError::MalformedDice);
    }
    Ok(RunSave::deserialize(payload)?)
}

fn first_malformed_dice(value: &Value) -> Option<&str> {
    match value {
        Value::Object(fields) => fields.iter().find_map(|(key, field)| match field {
            Value::String(notation)
                if key == DAMAGE_DICE_FIELD && notation.parse::<DiceSpec>().is_err() =>
            {
                Some(notation.as_str())
            }
            other => first_malformed_dice(other),
        }),
        Value::Array(items) => items.iter().find_map(first_malformed_dice),
        _ => None,
    }
}

/// Decode a token and rebuild the run it describes.
///
/// # Errors
///
/// Any [`SaveError`] from decoding or from rebuilding the run.
pub fn load_run_from_token(token: &str) -> Result<DungeonRun, SaveError> {
    DungeonRun::from_save(decode_save_token(token)?)
}

/// Pull a token out of user input: a bare token, a resume URL, or a query
/// string. Returns `None` for blank input.
#[must_use]
pub fn extract_save_token(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with(SAVE_TOKEN_PREFIX) {
        return Some(trimmed.to_string());
    }
    let query = if trimmed.starts_with('?') {
        Some(trimmed)
    } else if trimmed.contains("://") {
        trimmed.split_once('?').map(|(_, query)| query)
    } else {
        None
    };
    query
        .and_then(extract_save_token_from_search)
        .or_else(|| Some(trimmed.to_string()))
}

/// Read the `save` parameter from a query string such as `?save=std1.abc`.
#[must_use]
pub fn extract_save_token_from_search(search: &str) -> Option<String> {
    let search = search.strip_prefix('?').unwrap_or(search);
    let search = search.split_once('#').map_or(search, |(query, _)| query);
    search
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key) == SAVE_QUERY_PARAM).then(|| percent_decode(value))
        })
        .next()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resume URL for `token` at `origin` + `path`.
#[must_use]
pub fn build_save_url(token: &str, origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    format!(
        "{origin}{path}?{SAVE_QUERY_PARAM}={}",
        percent_encode(token)
    )
}

/// Whether a resume URL is short enough to share as a link.
#[must_use]
pub const fn can_use_shareable_url(url: &str) -> bool {
    url.len() <= MAX_SHAREABLE_URL_LENGTH
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(char::from(byte));
            }
            b' ' => out.push('+'),
            other => {
                let _ = write!(out, "%{other:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_a_fresh_run() {
        let run = DungeonRun::new("token-trip").expect("run");
        let token = encode_save_token(&run).expect("encode");
        assert!(token.starts_with("std1."));
        assert!(!token.contains('='));
        let save = decode_save_token(&token).expect("decode");
        assert_eq!(save.seed_phrase, "token-trip");
        let without_prefix = token.trim_start_matches(SAVE_TOKEN_PREFIX);
        assert!(decode_save_token(without_prefix).is_ok());
    }

    #[test]
    fn bad_tokens_are_rejected() {
        assert_eq!(decode_save_token("   "), Err(SaveError::MissingToken));
        assert_eq!(decode_save_token("std1."), Err(SaveError::MissingToken));
        assert_eq!(decode_save_token("std1.@@@"), Err(SaveError::InvalidBase64));
        let not_json = format!("std1.{}", URL_SAFE_NO_PAD.encode("nope"));
        assert!(matches!(
            decode_save_token(&not_json),
            Err(SaveError::InvalidPayload(_))
        ));
    }

    fn token_for(payload: &str) -> String {
        format!("{SAVE_TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn other_versions_fail_before_the_schema_is_read() {
        let token = token_for(r#"{"version":2,"seed":"x"}"#);
        assert_eq!(
            load_run_from_token(&token).err(),
            Some(SaveError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        );
        assert!(matches!(
            decode_save_token(&token_for(r#"{"seed":"x"}"#)),
            Err(SaveError::InvalidPayload(_))
        ));
    }

    #[test]
    fn bad_weapon_dice_are_malformed_dice() {
        let run = DungeonRun::new("dice").expect("run");
        let json = serde_json::to_string(&run.to_save()).expect("json");
        assert!(json.contains("\"damageDice\":\"1d10\""));
        let broken = json.replacen("\"damageDice\":\"1d10\"", "\"damageDice\":\"ten sided\"", 1);
        assert_eq!(
            decode_save_token(&token_for(&broken)).err(),
            Some(SaveError::MalformedDice)
        );
        let fine = decode_save_token(&token_for(&json)).expect("valid dice");
        assert_eq!(fine.seed_phrase, "dice");
    }

    #[test]
    fn tokens_are_found_in_urls_and_queries() {
        assert_eq!(extract_save_token("  "), None);
        assert_eq!(
            extract_save_token("  std1.abc \n"),
            Some("std1.abc".to_string())
        );
        assert_eq!(
            extract_save_token("https://example.test/play?x=1&save=std1.xyz#top"),
            Some("std1.xyz".to_string())
        );
        assert_eq!(
            extract_save_token("?save=std1.q"),
            Some("std1.q".to_string())
        );
        assert_eq!(
            extract_save_token("https://example.test/play"),
            Some("https://example.test/play".to_string())
        );
        assert_eq!(extract_save_token("raw-token"), Some("raw-token".to_string()));
    }

    #[test]
    fn search_strings_are_percent_decoded() {
        assert_eq!(
            extract_save_token_from_search("?save=std1.a%2Db+"),
            Some("std1.a-b".to_string())
        );
        assert_eq!(extract_save_token_from_search("?save=%20%20"), None);
        assert_eq!(extract_save_token_from_search("?other=1"), None);
        assert_eq!(extract_save_token_from_search("save=bad%zz"), Some("bad%zz".to_string()));
    }

    #[test]
    fn save_urls_carry_the_token_as_a_query_param() {
        let url = build_save_url("std1.abc_-", "https://example.test/", "play");
        assert_eq!(url, "https://example.test/play?save=std1.abc_-");
        let token = extract_save_token(&url);
        assert_eq!(token.as_deref(), Some("std1.abc_-"));
        assert_eq!(
            build_save_url("a b/c", "http://h", "/"),
            "http://h/?save=a+b%2Fc"
        );
    }

    #[test]
    fn long_urls_are_not_shareable() {
        let short = build_save_url("std1.abc", "https://example.test", "/");
        assert!(can_use_shareable_url(&short));
        let long = "x".repeat(MAX_SHAREABLE_URL_LENGTH + 1);
        assert!(!can_use_shareable_url(&long));
    }
}
