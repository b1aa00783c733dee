//! Error types for filter compilation, frame capture, and the outbound sink.

use thiserror::Error;

/// Errors from the hardware receive-filter engine.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("filter engine rejected rule (status {0})")]
    RuleRejected(i16),

    #[error("filter commit failed (status {0})")]
    CommitFailed(i16),

    #[error("filter id {0} out of range (0-63)")]
    IdOutOfRange(u8),

    #[error("rule references parent filter {0} that does not exist")]
    UnknownParent(u8),

    #[error("no free filter slots")]
    SlotsExhausted,
}

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid channel {0}: must be 1-13")]
    InvalidChannel(u8),

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnvValue { key: &'static str, value: String },
}

/// Errors from the raw-frame source and the capture loop.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open frame source on channel {channel} (status {status})")]
    SourceOpen { channel: u8, status: i16 },

    #[error("frame receive failed (status {0})")]
    Receive(i16),

    #[error("received {0} bytes, shorter than the receive metadata header")]
    TruncatedMetadata(usize),

    #[error("failed to load replay recording: {0}")]
    Replay(std::io::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Errors from the outbound byte sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to open sink: {0}")]
    Open(std::io::Error),

    #[error("failed to attach consumer: {0}")]
    Accept(std::io::Error),

    #[error("write to consumer failed: {0}")]
    Write(std::io::Error),
}
