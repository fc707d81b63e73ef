// Database record models for the script store

use chrono::{DateTime, Utc};
use querydeck_utils::data::{Script, ScriptId};

use crate::backends::BackendError;

/// Row of the `scripts` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScriptRecord {
    pub id: i64,
    pub name: String,
    pub query_text: String,
    pub connection_id: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorite: bool,
}

impl TryFrom<ScriptRecord> for Script {
    type Error = BackendError;

    /// Rows with a negative id would masquerade as unsaved scripts, so they
    /// are refused here rather than decoded by sign.
    fn try_from(record: ScriptRecord) -> Result<Self, Self::Error> {
        let id = ScriptId::persisted(record.id).ok_or(BackendError::InvalidScriptId(record.id))?;
        Ok(Script {
            id,
            name: record.name,
            query_text: record.query_text,
            connection_id: record.connection_id,
            description: record.description,
            tags: record.tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
            favorite: record.favorite,
        })
    }
}

/// Check an id returned by `INSERT ... RETURNING id`.
pub fn issued_id(raw: i64) -> Result<u64, BackendError> {
    u64::try_from(raw).map_err(|_| BackendError::InvalidScriptId(raw))
}

/// Column value for a persisted id. Ids past `BIGINT` range cannot exist in
/// the table.
pub fn row_key(id: u64) -> Result<i64, BackendError> {
    i64::try_from(id).map_err(|_| BackendError::ScriptNotFound(id))
}
