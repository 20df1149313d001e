pub mod state;
pub mod store;

pub use state::{Notice, NoticeLevel, PanelState, SessionState};
pub use store::{ResolvedSession, SessionHandle, SessionStore, SessionStoreStats};
