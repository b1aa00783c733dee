//! Replay frame source.
//!
//! Feeds pre-assembled receive buffers (metadata header + raw 802.11
//! bytes) to the capture bridge, either built in memory or loaded from a
//! recording file. Exhaustion surfaces as a receive error, the same
//! terminal path a hardware source takes.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::CaptureError;

use super::{FrameSource, RxMetadata, MAX_FRAME_LEN};

/// Device ticks between synthetic beacons: the 802.11 default beacon
/// interval of 100 TU (102.4 ms) in microseconds.
const BEACON_INTERVAL_US: u32 = 102_400;

/// Frame source that replays canned receive buffers.
pub struct ReplaySource {
    frames: VecDeque<Vec<u8>>,
    interval: Option<Duration>,
}

impl ReplaySource {
    /// Replay the given receive buffers in order.
    pub fn from_buffers(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames: frames.into(),
            interval: None,
        }
    }

    /// Load a recording: a sequence of records, each a host-order u32
    /// length followed by that many buffer bytes. The format is
    /// machine-local, like the capture stream itself.
    pub fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let mut file = File::open(path).map_err(CaptureError::Replay)?;
        let mut raw = Vec::new();
        file.read_to_end(&mut raw).map_err(CaptureError::Replay)?;

        let mut frames = Vec::new();
        let mut offset = 0usize;
        while offset + 4 <= raw.len() {
            let len = u32::from_ne_bytes([
                raw[offset],
                raw[offset + 1],
                raw[offset + 2],
                raw[offset + 3],
            ]) as usize;
            offset += 4;
            if len > MAX_FRAME_LEN || offset + len > raw.len() {
                debug!("replay file truncated at offset {}", offset);
                break;
            }
            frames.push(raw[offset..offset + len].to_vec());
            offset += len;
        }
        debug!("loaded {} replay frames from {:?}", frames.len(), path);
        Ok(Self::from_buffers(frames))
    }

    /// Build a run of synthetic beacon frames on the given channel,
    /// spaced one beacon interval apart in device time.
    pub fn synthetic_beacons(count: usize, channel: u8) -> Self {
        let mut frames = Vec::with_capacity(count);
        for seq in 0..count {
            let meta = RxMetadata {
                rate: 11,
                channel,
                rssi: -60,
                timestamp_us: (seq as u32).wrapping_mul(BEACON_INTERVAL_US),
            };
            frames.push(assemble(&meta, &beacon_frame(seq as u16)));
        }
        Self::from_buffers(frames)
    }

    /// Pace replay: sleep this long before each frame is handed out.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        // Exhaustion is the replay counterpart of a hardware receive error.
        let frame = self.frames.pop_front().ok_or(CaptureError::Receive(-1))?;
        if frame.len() > buf.len() {
            return Err(CaptureError::Receive(-2));
        }
        if let Some(interval) = self.interval {
            std::thread::sleep(interval);
        }
        buf[..frame.len()].copy_from_slice(&frame);
        Ok(frame.len())
    }
}

/// Prefix a raw 802.11 frame with its receive metadata header.
pub fn assemble(meta: &RxMetadata, frame: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RxMetadata::LEN + frame.len());
    buf.extend_from_slice(&meta.to_bytes());
    buf.extend_from_slice(frame);
    buf
}

/// A minimal but well-formed beacon frame body.
fn beacon_frame(seq: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(48);
    // Frame control: management / beacon, then duration.
    frame.extend_from_slice(&[0x80, 0x00, 0x00, 0x00]);
    // DA broadcast, SA and BSSID locally administered.
    frame.extend_from_slice(&[0xFF; 6]);
    frame.extend_from_slice(&[0x02, 0x00, 0x5E, 0x10, 0x20, 0x30]);
    frame.extend_from_slice(&[0x02, 0x00, 0x5E, 0x10, 0x20, 0x30]);
    // Sequence control: sequence number in the upper 12 bits.
    frame.extend_from_slice(&((seq % 4096) << 4).to_le_bytes());
    // Fixed parameters: TSF timestamp, beacon interval 100 TU, capabilities.
    frame.extend_from_slice(&(seq as u64 * u64::from(BEACON_INTERVAL_US)).to_le_bytes());
    frame.extend_from_slice(&[0x64, 0x00]);
    frame.extend_from_slice(&[0x01, 0x04]);
    // SSID information element.
    frame.extend_from_slice(&[0x00, 0x04]);
    frame.extend_from_slice(b"lab0");
    frame
}
