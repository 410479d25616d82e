//! Permissive parsing of directory reply bodies.
//!
//! Every body is JSON.  Absent or wrong-typed fields fall back to their
//! negative value (`false`, empty string, zero) instead of failing the whole
//! reply; only a body that is not JSON at all is a [`ProtocolError`].  The
//! workers turn that error into an `ok = false` reply carrying the parser's
//! message, so callers only ever branch on `ok`.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::listing::ServerRecord;

/// Error tag for requests whose normalized host is empty.
pub const INVALID_HOST: &str = "invalid_host";

static NULL: Value = Value::Null;

/// Errors raised while parsing a reply body.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The body is not valid JSON.
    #[error("{0}")]
    Json(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Json(err.to_string())
    }
}

/// Reply to `GET /api/user_registered`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReply {
    pub ok: bool,
    pub error: String,
    pub community_name: String,
    pub registered: bool,
    pub salt: String,
    pub locked: bool,
    pub deleted: bool,
}

impl ProbeReply {
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self {
            ok: bool_field(&value, "ok"),
            error: str_field(&value, "error"),
            community_name: str_field(&value, "community_name"),
            registered: bool_field(&value, "registered"),
            salt: str_field(&value, "salt"),
            locked: bool_field(&value, "locked"),
            deleted: bool_field(&value, "deleted"),
        })
    }

    /// A failed probe carrying a short error tag.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

/// Reply to `POST /api/auth`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginReply {
    pub ok: bool,
    pub error: String,
    pub community_admin: bool,
    pub local_admin: bool,
}

impl LoginReply {
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self {
            ok: bool_field(&value, "ok"),
            error: str_field(&value, "error"),
            community_admin: bool_field(&value, "community_admin"),
            local_admin: bool_field(&value, "local_admin"),
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

/// Reply to `GET /api/info`.
///
/// Any JSON object counts as reachable; the name and details are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub ok: bool,
    pub error: String,
    pub community_name: String,
    pub details: String,
}

impl DirectoryInfo {
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Ok(Self::failed("unexpected_body"));
        }
        Ok(Self {
            ok: true,
            error: String::new(),
            community_name: first_non_empty(&value, &["community_name", "name"]),
            details: first_non_empty(&value, &["community_details", "description"]),
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

/// Reply to `GET /api/server/{code}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerDetails {
    pub ok: bool,
    pub error: String,
    pub name: String,
    pub description: String,
}

impl ServerDetails {
    /// Reads `server.name` and the first non-empty of `server.description`,
    /// `server.overview`, top-level `description`, top-level `overview`.
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(body)?;
        let server = value.get("server").unwrap_or(&NULL);
        let mut description = first_non_empty(server, &["description", "overview"]);
        if description.is_empty() {
            description = first_non_empty(&value, &["description", "overview"]);
        }
        Ok(Self {
            ok: value.is_object(),
            error: str_field(&value, "error"),
            name: str_field(server, "name"),
            description,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

/// Parses a `GET /api/servers` body into records attributed to `source_host`.
///
/// Accepts either `{"servers": [...]}` or a bare array.  Entries without a
/// host or with a port outside `1..=65535` are skipped.
pub fn parse_server_listing(
    body: &str,
    source_host: &str,
    source_name: &str,
) -> Result<Vec<ServerRecord>, ProtocolError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!("unreadable server listing from {source_host}: {e}");
        ProtocolError::from(e)
    })?;
    let list = match value.get("servers").unwrap_or(&value) {
        Value::Array(items) => items.as_slice(),
        _ => {
            debug!("server listing from {source_host} has no server array");
            &[]
        }
    };

    let records: Vec<ServerRecord> = list
        .iter()
        .filter_map(|item| {
            let host = first_non_empty(item, &["host", "address"]);
            let port = port_field(item)?;
            if host.is_empty() {
                return None;
            }
            Some(ServerRecord {
                host,
                port,
                name: str_field(item, "name"),
                code: str_field(item, "code"),
                game_mode: str_field(item, "game_mode"),
                active_players: first_u32(item, &["active_players", "clients"]),
                max_players: first_u32(item, &["max_players", "clients_max"]),
                flags: item
                    .get("flags")
                    .and_then(Value::as_array)
                    .map(|flags| {
                        flags
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                source_host: source_host.to_string(),
                source_name: source_name.to_string(),
                screenshot_id: str_field(item, "screenshot_id"),
                description: str_field(item, "description"),
            })
        })
        .collect();

    if records.len() < list.len() {
        debug!(
            "skipped {} invalid entries in listing from {source_host}",
            list.len() - records.len()
        );
    }
    Ok(records)
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn first_non_empty(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| str_field(value, key))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn first_u32(value: &Value, keys: &[&str]) -> u32 {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_u64))
        .next()
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Ports arrive as numbers from most directories and as strings from some.
fn port_field(value: &Value) -> Option<u16> {
    let raw = value.get("port")?;
    let port = match raw {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u16::try_from(port).ok().filter(|p| *p != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reply_reads_all_fields() {
        // Arrange
        let body = r#"{"ok":true,"community_name":"Hub","registered":true,
                       "salt":"abc","locked":false,"deleted":true}"#;

        // Act
        let reply = ProbeReply::parse(body).expect("valid json");

        // Assert
        assert!(reply.ok);
        assert!(reply.registered);
        assert!(reply.deleted);
        assert!(!reply.locked);
        assert_eq!(reply.salt, "abc");
        assert_eq!(reply.community_name, "Hub");
    }

    #[test]
    fn test_probe_reply_defaults_missing_and_wrong_typed_fields() {
        let reply = ProbeReply::parse(r#"{"ok":true,"registered":"yes","salt":5}"#).unwrap();
        assert!(reply.ok);
        assert!(!reply.registered);
        assert_eq!(reply.salt, "");
        assert!(!reply.locked);
    }

    #[test]
    fn test_probe_reply_non_object_json_is_not_ok() {
        let reply = ProbeReply::parse("[1,2,3]").unwrap();
        assert!(!reply.ok);
    }

    #[test]
    fn test_probe_reply_malformed_body_is_protocol_error() {
        assert!(matches!(
            ProbeReply::parse("{not json"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_login_reply_reads_admin_flags() {
        let reply =
            LoginReply::parse(r#"{"ok":true,"community_admin":true,"local_admin":false}"#).unwrap();
        assert!(reply.ok);
        assert!(reply.community_admin);
        assert!(!reply.local_admin);
    }

    #[test]
    fn test_login_reply_keeps_server_error() {
        let reply = LoginReply::parse(r#"{"ok":false,"error":"bad_password"}"#).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error, "bad_password");
    }

    #[test]
    fn test_directory_info_accepts_any_object() {
        let info = DirectoryInfo::parse("{}").unwrap();
        assert!(info.ok);
        assert_eq!(info.community_name, "");

        let named = DirectoryInfo::parse(r#"{"name":"Hub","description":"d"}"#).unwrap();
        assert_eq!(named.community_name, "Hub");
        assert_eq!(named.details, "d");

        assert!(!DirectoryInfo::parse("\"text\"").unwrap().ok);
    }

    #[test]
    fn test_server_details_prefers_nested_description_then_overview() {
        let nested = ServerDetails::parse(
            r#"{"server":{"name":"S","description":"","overview":"over"},"description":"top"}"#,
        )
        .unwrap();
        assert_eq!(nested.name, "S");
        assert_eq!(nested.description, "over");

        let top = ServerDetails::parse(r#"{"overview":"top-over"}"#).unwrap();
        assert_eq!(top.description, "top-over");
        assert_eq!(top.name, "");
    }

    #[test]
    fn test_parse_server_listing_skips_invalid_entries() {
        // Arrange
        let body = r#"{"servers":[
            {"host":"a.example","port":30000,"name":"A","code":"x1","clients":3,"clients_max":10,
             "flags":["pvp",1]},
            {"address":"b.example","port":"30001"},
            {"host":"","port":30002},
            {"host":"c.example","port":70000},
            {"host":"d.example"}
        ]}"#;

        // Act
        let records = parse_server_listing(body, "https://dir.example", "Dir").unwrap();

        // Assert
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].active_players, 3);
        assert_eq!(records[0].max_players, 10);
        assert_eq!(records[0].flags, vec!["pvp".to_string()]);
        assert_eq!(records[0].source_host, "https://dir.example");
        assert_eq!(records[1].host, "b.example");
        assert_eq!(records[1].port, 30001);
    }

    #[test]
    fn test_parse_server_listing_accepts_bare_array() {
        let records = parse_server_listing(r#"[{"host":"a","port":1}]"#, "h", "").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_server_listing_without_array_is_empty() {
        let records = parse_server_listing(r#"{"servers":"soon"}"#, "h", "").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_server_listing_rejects_non_json() {
        let result = parse_server_listing("<html>", "h", "");
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }
}
