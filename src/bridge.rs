//! Live capture bridge.
//!
//! Turns a raw-frame source into a continuous pcap byte stream: wait
//! for the consumer, write the global header once, then strictly
//! alternate receive and emit with a single buffer in flight. Frames
//! are never dropped, reordered, or batched; any receive or write
//! failure drains the source and ends the stream for good.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capture::{FrameSource, RxMetadata, MAX_FRAME_LEN};
use crate::error::CaptureError;
use crate::pcap::{GlobalHeader, RadiotapHeader, RecordHeader};
use crate::sink::ByteSink;

/// Bridges one frame source onto one byte sink. Both are owned for the
/// bridge's entire lifetime.
pub struct CaptureBridge<S: FrameSource, K: ByteSink> {
    source: S,
    sink: K,
    running: Arc<AtomicBool>,
}

impl<S: FrameSource, K: ByteSink> CaptureBridge<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stop flag checked between iterations. Clearing it ends the
    /// stream cleanly after the in-flight frame.
    pub fn with_stop_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Run the bridge until the source or sink fails, or the stop flag
    /// clears. Returns the number of records emitted.
    pub fn run(mut self) -> Result<u64, CaptureError> {
        let result = self.stream();
        // Draining: release the source whichever way the loop ended.
        self.source.close();
        match &result {
            Ok(frames) => info!("capture stream ended after {} frames", frames),
            Err(e) => warn!("capture stream aborted: {}", e),
        }
        result
    }

    fn stream(&mut self) -> Result<u64, CaptureError> {
        self.sink.wait_for_consumer()?;

        self.sink.write_all(&GlobalHeader::default().to_bytes())?;
        debug!("pcap global header written");

        let radiotap = RadiotapHeader::default().to_bytes();
        let mut buf = [0u8; MAX_FRAME_LEN];
        let mut frames: u64 = 0;

        while self.running.load(Ordering::SeqCst) {
            let received = self.source.receive(&mut buf)?;
            let meta = RxMetadata::parse(&buf[..received])?;
            debug!(
                "frame: rssi {} dBm, channel {}, rate {}",
                meta.rssi, meta.channel, meta.rate
            );

            // The emitted frame swaps the receive metadata header for
            // the radiotap header; nothing is ever truncated.
            let body = &buf[RxMetadata::LEN..received];
            let encoded_len = (body.len() + RadiotapHeader::LEN) as u32;
            let record = RecordHeader::new(meta.timestamp_us, encoded_len);

            self.sink.write_all(&record.to_bytes())?;
            self.sink.write_all(&radiotap)?;
            self.sink.write_all(body)?;
            frames += 1;
        }

        Ok(frames)
    }
}
