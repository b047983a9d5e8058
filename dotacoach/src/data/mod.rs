mod alerts;
mod codec;
mod snapshot;

pub use alerts::{derive, Alert, AlertSet, LOW_HEALTH_PERCENT, LOW_MANA_PERCENT};
pub use codec::{decode, encode, DecodeError, FieldKind};
pub use snapshot::{BuybackStatus, Snapshot};
