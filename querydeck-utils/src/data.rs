// Querydeck Data Model
//
// Scripts, their identities and the query output stored alongside them.

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identity of a script, either a placeholder handed out before the first
/// save or the id assigned by the script store.
///
/// On the wire both variants are a single integer: temporary ids are
/// negative, persisted ids are zero or positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptId {
    /// Placeholder for a script that has never been saved
    Temporary(i64),
    /// Id issued by the script store
    Persisted(u64),
}

impl ScriptId {
    /// Decode a raw wire id by its sign.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            ScriptId::Temporary(raw)
        } else {
            ScriptId::Persisted(raw as u64)
        }
    }

    /// Build a persisted id from a store-issued integer.
    ///
    /// Returns `None` for negative values, which a store must never issue.
    pub fn persisted(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().map(ScriptId::Persisted)
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, ScriptId::Temporary(_))
    }

    pub fn as_persisted(&self) -> Option<u64> {
        match self {
            ScriptId::Persisted(id) => Some(*id),
            ScriptId::Temporary(_) => None,
        }
    }

    pub fn as_temporary(&self) -> Option<i64> {
        match self {
            ScriptId::Temporary(id) => Some(*id),
            ScriptId::Persisted(_) => None,
        }
    }
}

impl From<i64> for ScriptId {
    fn from(raw: i64) -> Self {
        ScriptId::from_raw(raw)
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptId::Temporary(id) => write!(f, "{}", id),
            ScriptId::Persisted(id) => write!(f, "{}", id),
        }
    }
}

impl Serialize for ScriptId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScriptId::Temporary(id) => serializer.serialize_i64(*id),
            ScriptId::Persisted(id) => serializer.serialize_u64(*id),
        }
    }
}

struct ScriptIdVisitor;

impl<'de> Visitor<'de> for ScriptIdVisitor {
    type Value = ScriptId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer script id")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ScriptId, E> {
        Ok(ScriptId::from_raw(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ScriptId, E> {
        Ok(ScriptId::Persisted(value))
    }
}

impl<'de> Deserialize<'de> for ScriptId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_i64(ScriptIdVisitor)
    }
}

/// A named SQL script. `query_text` is the last-saved baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub id: ScriptId,
    pub name: String,
    pub query_text: String,
    pub connection_id: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
}

impl Script {
    /// Synthesize a record for a script the store has never seen.
    pub fn placeholder(id: ScriptId, name: impl Into<String>, query_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            query_text: query_text.into(),
            connection_id: None,
            description: None,
            tags: None,
            created_at: now,
            updated_at: now,
            favorite: false,
        }
    }
}

/// Lifecycle of the most recent query run from a script tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Idle => write!(f, "idle"),
            QueryStatus::Running => write!(f, "running"),
            QueryStatus::Completed => write!(f, "completed"),
            QueryStatus::Error => write!(f, "error"),
        }
    }
}

/// One statement's output as returned by the query executor. Stored as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    #[serde(default)]
    pub first_page: Vec<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_id_sign_convention() {
        assert_eq!(ScriptId::from_raw(-3), ScriptId::Temporary(-3));
        assert_eq!(ScriptId::from_raw(5), ScriptId::Persisted(5));
        assert_eq!(ScriptId::Temporary(-3).as_temporary(), Some(-3));
        assert_eq!(ScriptId::Persisted(3).as_temporary(), None);
        assert!(ScriptId::Temporary(-1).is_temporary());
        assert_eq!(ScriptId::Persisted(9).as_persisted(), Some(9));
        assert_eq!(ScriptId::Temporary(-9).as_persisted(), None);
    }

    #[test]
    fn test_persisted_rejects_negative_store_ids() {
        assert_eq!(ScriptId::persisted(12), Some(ScriptId::Persisted(12)));
        assert_eq!(ScriptId::persisted(-12), None);
    }

    #[test]
    fn test_script_id_serializes_as_integer() {
        let json = serde_json::to_string(&vec![ScriptId::Persisted(5), ScriptId::Temporary(-3)]).unwrap();
        assert_eq!(json, "[5,-3]");

        let ids: Vec<ScriptId> = serde_json::from_str("[-1, 7]").unwrap();
        assert_eq!(ids, vec![ScriptId::Temporary(-1), ScriptId::Persisted(7)]);
    }

    #[test]
    fn test_large_persisted_id_keeps_its_sign() {
        let id = ScriptId::Persisted(u64::MAX);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "18446744073709551615");
        assert_eq!(serde_json::from_str::<ScriptId>(&json).unwrap(), id);
        assert_eq!(id.to_string(), "18446744073709551615");
    }

    #[test]
    fn test_query_status_wire_names() {
        assert_eq!(serde_json::to_string(&QueryStatus::Running).unwrap(), "\"running\"");
        assert_eq!(QueryStatus::default(), QueryStatus::Idle);
        assert_eq!(QueryStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_placeholder_script_is_blank_metadata() {
        let script = Script::placeholder(ScriptId::Temporary(-2), "Untitled Script", "SELECT 1;");
        assert_eq!(script.query_text, "SELECT 1;");
        assert!(script.connection_id.is_none());
        assert!(!script.favorite);
    }
}
