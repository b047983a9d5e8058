mod connection;
mod status;

pub use connection::{Connection, OpenError, SessionEvent, SessionStats};
pub use status::{SessionStatus, StatusKind};
