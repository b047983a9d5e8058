pub mod data;
pub mod feed;
pub mod session;
pub mod view;

pub use data::{AlertSet, Snapshot};
pub use session::{Connection, SessionStatus};
pub use view::ViewModel;
