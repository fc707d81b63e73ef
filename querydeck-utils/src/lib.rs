pub mod data;
pub mod notice;
pub mod session;

pub use data::{QueryResult, QueryStatus, Script, ScriptId};
pub use notice::{Notice, NoticeLevel};
pub use session::{SessionSnapshot, TempScript};
