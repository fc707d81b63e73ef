// Querydeck Persistence Layer
//
// PostgreSQL-backed script store. Degrades to a disabled store when the
// database is missing or unreachable instead of failing startup.

mod models;
mod store;

pub use models::ScriptRecord;
pub use store::PgScriptStore;
