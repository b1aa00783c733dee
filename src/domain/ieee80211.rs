//! IEEE 802.11 frame type model.
//!
//! These types mirror the fields the radio's filter engine can inspect:
//! the 2-bit frame type and the 4-bit subtype, both taken from the first
//! frame-control byte. Subtype values are kept in the hardware field
//! encoding (upper nibble), which is how the engine compares them.

/// IEEE 802.11 frame types, as reported by the hardware header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Management,
    Control,
    Data,
}

impl FrameType {
    /// Parse from the 2-bit type field value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Management),
            1 => Some(Self::Control),
            2 => Some(Self::Data),
            _ => None,
        }
    }

    /// The raw value the filter engine compares against.
    pub fn field_value(self) -> u8 {
        match self {
            Self::Management => 0,
            Self::Control => 1,
            Self::Data => 2,
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Management => write!(f, "MANAGEMENT"),
            Self::Control => write!(f, "CONTROL"),
            Self::Data => write!(f, "DATA"),
        }
    }
}

/// Management frame subtypes, in the hardware field encoding
/// (subtype bits in the upper nibble).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgmtSubtype {
    AssocRequest,
    AssocResponse,
    ReassocRequest,
    ReassocResponse,
    ProbeRequest,
    ProbeResponse,
    Beacon,
}

impl MgmtSubtype {
    /// The raw value the filter engine compares against.
    pub fn field_value(self) -> u8 {
        match self {
            Self::AssocRequest => 0x00,
            Self::AssocResponse => 0x10,
            Self::ReassocRequest => 0x20,
            Self::ReassocResponse => 0x30,
            Self::ProbeRequest => 0x40,
            Self::ProbeResponse => 0x50,
            Self::Beacon => 0x80,
        }
    }
}

impl std::fmt::Display for MgmtSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssocRequest => write!(f, "ASSOC-REQ"),
            Self::AssocResponse => write!(f, "ASSOC-RES"),
            Self::ReassocRequest => write!(f, "REASSOC-REQ"),
            Self::ReassocResponse => write!(f, "REASSOC-RES"),
            Self::ProbeRequest => write!(f, "PROBE-REQ"),
            Self::ProbeResponse => write!(f, "PROBE-RES"),
            Self::Beacon => write!(f, "BEACON"),
        }
    }
}

/// The header fields of one frame that the filter engine inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFields {
    /// 2-bit frame type field value.
    pub frame_type: u8,
    /// Subtype field value in the upper nibble.
    pub frame_subtype: u8,
}

impl FrameFields {
    pub fn new(frame_type: FrameType, subtype_field: u8) -> Self {
        Self {
            frame_type: frame_type.field_value(),
            frame_subtype: subtype_field,
        }
    }

    /// Extract the filterable fields from raw over-the-air 802.11 bytes.
    ///
    /// The frame-control byte carries the protocol version (bits 0-1),
    /// type (bits 2-3), and subtype (bits 4-7).
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        let fc = *frame.first()?;
        Some(Self {
            frame_type: (fc >> 2) & 0x03,
            frame_subtype: fc & 0xF0,
        })
    }

    /// Build the frame-control byte carrying these fields.
    pub fn to_frame_control(self) -> u8 {
        ((self.frame_type & 0x03) << 2) | (self.frame_subtype & 0xF0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod frame_type_tests {
        use super::*;

        #[test]
        fn from_u8_valid_values() {
            assert_eq!(FrameType::from_u8(0), Some(FrameType::Management));
            assert_eq!(FrameType::from_u8(1), Some(FrameType::Control));
            assert_eq!(FrameType::from_u8(2), Some(FrameType::Data));
        }

        #[test]
        fn from_u8_reserved_value() {
            assert_eq!(FrameType::from_u8(3), None);
        }

        #[test]
        fn round_trips_through_field_value() {
            for ft in [FrameType::Management, FrameType::Control, FrameType::Data] {
                assert_eq!(FrameType::from_u8(ft.field_value()), Some(ft));
            }
        }
    }

    mod subtype_tests {
        use super::*;

        #[test]
        fn beacon_field_encoding() {
            assert_eq!(MgmtSubtype::Beacon.field_value(), 0x80);
        }

        #[test]
        fn probe_request_field_encoding() {
            assert_eq!(MgmtSubtype::ProbeRequest.field_value(), 0x40);
        }
    }

    mod frame_fields_tests {
        use super::*;

        #[test]
        fn parses_beacon_frame_control() {
            // Beacon: version 0, type 00, subtype 1000 -> fc = 0x80
            let fields = FrameFields::from_frame(&[0x80, 0x00]).unwrap();
            assert_eq!(fields.frame_type, FrameType::Management.field_value());
            assert_eq!(fields.frame_subtype, MgmtSubtype::Beacon.field_value());
        }

        #[test]
        fn parses_control_frame() {
            // RTS: type 01, subtype 1011 -> fc = 0xB4
            let fields = FrameFields::from_frame(&[0xB4]).unwrap();
            assert_eq!(fields.frame_type, FrameType::Control.field_value());
        }

        #[test]
        fn empty_frame_has_no_fields() {
            assert!(FrameFields::from_frame(&[]).is_none());
        }

        #[test]
        fn frame_control_round_trip() {
            let fields = FrameFields::new(FrameType::Management, MgmtSubtype::Beacon.field_value());
            let fc = fields.to_frame_control();
            assert_eq!(FrameFields::from_frame(&[fc]).unwrap(), fields);
        }
    }
}
