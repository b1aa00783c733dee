//! IEEE 802.11 domain models.

mod ieee80211;

pub use ieee80211::{FrameFields, FrameType, MgmtSubtype};
