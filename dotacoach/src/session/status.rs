use std::sync::Arc;

use crate::data::{AlertSet, Snapshot};

/// Connection and data availability of a session.
///
/// `HasData` holds the one live snapshot together with the alerts derived
/// from it, so the two are always replaced together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    /// Socket open, no snapshot received yet.
    Connected,
    HasData {
        snapshot: Arc<Snapshot>,
        alerts: AlertSet,
    },
}

/// `SessionStatus` without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Disconnected,
    Connected,
    HasData,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StatusKind::Disconnected => "DISCONNECTED",
            StatusKind::Connected => "CONNECTED",
            StatusKind::HasData => "HAS_DATA",
        })
    }
}

impl SessionStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            SessionStatus::Disconnected => StatusKind::Disconnected,
            SessionStatus::Connected => StatusKind::Connected,
            SessionStatus::HasData { .. } => StatusKind::HasData,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            SessionStatus::HasData { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn alerts(&self) -> Option<&AlertSet> {
        match self {
            SessionStatus::HasData { alerts, .. } => Some(alerts),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self, SessionStatus::Disconnected)
    }
}
