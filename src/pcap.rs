//! Legacy pcap stream encoding.
//!
//! The consumer reads a classic libpcap byte stream: one 24-byte global
//! header, then per frame a 16-byte record header, an 8-byte radiotap
//! header marking the payload as radio capture, and the raw 802.11
//! bytes. Headers are serialized in host byte order; the magic number
//! tells the consumer which ordering it is reading, so no conversion is
//! performed on this side.

/// Identifies the stream as a host-order libpcap capture.
pub const PCAP_MAGIC: u32 = 0xA1B2_C3D4;

pub const PCAP_VERSION_MAJOR: u16 = 2;
pub const PCAP_VERSION_MINOR: u16 = 4;

/// Snapshot length: capture entire frames, never truncate.
pub const PCAP_SNAPLEN: u32 = 0x0000_FFFF;

/// Link-layer type 127: IEEE 802.11 with radiotap framing.
pub const LINKTYPE_IEEE802_11_RADIOTAP: u32 = 127;

pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// The 24-byte stream preamble, written exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeader {
    pub magic_number: u32,
    pub version_major: u16,
    pub version_minor: u16,
    /// GMT offset; 0, no wall-clock correlation is attempted.
    pub thiszone: i32,
    /// Timestamp accuracy; 0 means unknown.
    pub sigfigs: u32,
    pub snaplen: u32,
    pub network: u32,
}

impl Default for GlobalHeader {
    fn default() -> Self {
        Self {
            magic_number: PCAP_MAGIC,
            version_major: PCAP_VERSION_MAJOR,
            version_minor: PCAP_VERSION_MINOR,
            thiszone: 0,
            sigfigs: 0,
            snaplen: PCAP_SNAPLEN,
            network: LINKTYPE_IEEE802_11_RADIOTAP,
        }
    }
}

impl GlobalHeader {
    pub const LEN: usize = 24;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[0..4].copy_from_slice(&self.magic_number.to_ne_bytes());
        bytes[4..6].copy_from_slice(&self.version_major.to_ne_bytes());
        bytes[6..8].copy_from_slice(&self.version_minor.to_ne_bytes());
        bytes[8..12].copy_from_slice(&self.thiszone.to_ne_bytes());
        bytes[12..16].copy_from_slice(&self.sigfigs.to_ne_bytes());
        bytes[16..20].copy_from_slice(&self.snaplen.to_ne_bytes());
        bytes[20..24].copy_from_slice(&self.network.to_ne_bytes());
        bytes
    }
}

/// The 16-byte header preceding every captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub ts_sec: u32,
    pub ts_usec: u32,
    /// Octets of the frame present in the stream.
    pub incl_len: u32,
    /// Octets the frame had on the air. Always equals `incl_len`;
    /// nothing is ever truncated.
    pub orig_len: u32,
}

impl RecordHeader {
    pub const LEN: usize = 16;

    /// Build a record header for a frame of `len` encoded bytes received
    /// at device time `timestamp_us`.
    pub fn new(timestamp_us: u32, len: u32) -> Self {
        let (ts_sec, ts_usec) = split_timestamp(timestamp_us);
        Self {
            ts_sec,
            ts_usec,
            incl_len: len,
            orig_len: len,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[0..4].copy_from_slice(&self.ts_sec.to_ne_bytes());
        bytes[4..8].copy_from_slice(&self.ts_usec.to_ne_bytes());
        bytes[8..12].copy_from_slice(&self.incl_len.to_ne_bytes());
        bytes[12..16].copy_from_slice(&self.orig_len.to_ne_bytes());
        bytes
    }
}

/// Minimal radiotap header: no present fields, just framing that tells
/// the consumer the payload is raw 802.11 from a radio capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadiotapHeader {
    pub version: u8,
    pub pad: u8,
    pub len: u16,
    pub present: u32,
}

impl RadiotapHeader {
    pub const LEN: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[0] = self.version;
        bytes[1] = self.pad;
        bytes[2..4].copy_from_slice(&self.len.to_ne_bytes());
        bytes[4..8].copy_from_slice(&self.present.to_ne_bytes());
        bytes
    }
}

impl Default for RadiotapHeader {
    fn default() -> Self {
        Self {
            version: 0,
            pad: 0,
            len: Self::LEN as u16,
            present: 0,
        }
    }
}

/// Split a device timestamp into whole seconds and the microsecond
/// remainder.
pub fn split_timestamp(timestamp_us: u32) -> (u32, u32) {
    (
        timestamp_us / MICROS_PER_SECOND,
        timestamp_us % MICROS_PER_SECOND,
    )
}
