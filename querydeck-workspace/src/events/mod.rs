mod bus;

pub use bus::{EventBus, ListenerId, WorkspaceEvent};
