//! Raw-frame source abstraction.
//!
//! A frame source hands back receive buffers consisting of a fixed
//! radio-reported metadata header followed by the raw over-the-air
//! 802.11 bytes. Opening on a channel is each implementation's
//! constructor contract; `receive` blocks until the next frame.

mod replay;

pub use replay::{assemble, ReplaySource};

use crate::error::CaptureError;

/// Receive buffer bound, matching the radio's maximum frame size.
pub const MAX_FRAME_LEN: usize = 1536;

/// Radio-reported receive metadata prefixed to every captured frame.
///
/// Wire layout (8 bytes, host order): rate, channel, rssi, one pad
/// byte, then the 32-bit device timestamp in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxMetadata {
    pub rate: u8,
    pub channel: u8,
    pub rssi: i8,
    pub timestamp_us: u32,
}

impl RxMetadata {
    /// Size of the on-wire metadata header.
    pub const LEN: usize = 8;

    /// Parse the metadata header from the start of a receive buffer.
    pub fn parse(buf: &[u8]) -> Result<Self, CaptureError> {
        if buf.len() < Self::LEN {
            return Err(CaptureError::TruncatedMetadata(buf.len()));
        }
        Ok(Self {
            rate: buf[0],
            channel: buf[1],
            rssi: buf[2] as i8,
            timestamp_us: u32::from_ne_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Serialize back to the on-wire layout. Used to assemble replay
    /// and test buffers.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let ts = self.timestamp_us.to_ne_bytes();
        [
            self.rate,
            self.channel,
            self.rssi as u8,
            0,
            ts[0],
            ts[1],
            ts[2],
            ts[3],
        ]
    }
}

/// Blocking source of raw frames (the radio's transceiver socket, or a
/// replay of one).
pub trait FrameSource {
    /// Block until the next frame and copy it into `buf`, returning the
    /// number of bytes received (metadata header included). Errors are
    /// unrecoverable for the source.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError>;

    /// Release the source. Best-effort; called once when draining.
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    mod metadata_tests {
        use super::*;

        #[test]
        fn parse_round_trip() {
            let meta = RxMetadata {
                rate: 11,
                channel: 10,
                rssi: -63,
                timestamp_us: 1_234_567,
            };
            let parsed = RxMetadata::parse(&meta.to_bytes()).unwrap();
            assert_eq!(parsed, meta);
        }

        #[test]
        fn parse_ignores_trailing_frame_bytes() {
            let mut buf = RxMetadata {
                rate: 1,
                channel: 6,
                rssi: -80,
                timestamp_us: 42,
            }
            .to_bytes()
            .to_vec();
            buf.extend_from_slice(&[0x80, 0x00, 0x00, 0x00]);
            let parsed = RxMetadata::parse(&buf).unwrap();
            assert_eq!(parsed.channel, 6);
            assert_eq!(parsed.timestamp_us, 42);
        }

        #[test]
        fn short_buffer_rejected() {
            let err = RxMetadata::parse(&[0u8; 7]).unwrap_err();
            assert!(matches!(err, CaptureError::TruncatedMetadata(7)));
        }

        #[test]
        fn negative_rssi_survives_round_trip() {
            let meta = RxMetadata {
                rate: 6,
                channel: 1,
                rssi: -128,
                timestamp_us: 0,
            };
            assert_eq!(RxMetadata::parse(&meta.to_bytes()).unwrap().rssi, -128);
        }
    }
}
