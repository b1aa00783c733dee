//! beaconpipe - WiFi beacon sniffer.
//!
//! Compiles a beacon-only decision tree into a radio's hardware receive
//! filter engine, then bridges the radio's raw-frame socket onto a live
//! pcap stream an analyzer such as Wireshark can read frame-by-frame.
//!
//! The radio collaborators are traits: [`filter::FilterEngine`] for the
//! hardware filter engine and [`capture::FrameSource`] for the raw-frame
//! socket. [`filter::SoftwareFilterEngine`] is an in-memory engine with
//! the same contract, used for replayed captures and as the reference
//! model in tests.

pub mod bridge;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod pcap;
pub mod sink;

pub use bridge::CaptureBridge;
pub use capture::{FrameSource, ReplaySource, RxMetadata, MAX_FRAME_LEN};
pub use config::{Config, SinkSpec};
pub use error::{CaptureError, ConfigError, FilterError, SinkError};
pub use filter::{
    install_beacon_policy, remove_beacon_policy, FilterEngine, FilterId, FilterIdMask,
    FilteredSource, SoftwareFilterEngine, Verdict,
};
