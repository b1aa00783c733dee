//! Software rendition of the hardware filter engine.
//!
//! Rules live in an arena addressed by creation index; slot ids are
//! handed out by the engine, never assumed by the caller. Evaluation
//! walks the enabled rules in creation order (parents are created before
//! children), so the decision tree is honored without an explicit graph.
//!
//! Used as the reference model in tests and as a pre-filter in front of
//! replayed frame sources, standing in for the radio's hardware engine.

use tracing::trace;

use crate::capture::{FrameSource, RxMetadata};
use crate::domain::FrameFields;
use crate::error::{CaptureError, FilterError};

use super::{
    ConnectionState, FilterEngine, FilterId, FilterIdMask, FilterOp, FilterRule, HeaderField,
    RoleState, RuleAction, FILTER_SLOTS,
};

/// Outcome of evaluating one frame against the enabled rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No enabled rule dropped the frame.
    Accept,
    /// The frame was dropped by the rule with this id.
    Drop(FilterId),
}

/// Link state the trigger gates are checked against.
#[derive(Debug, Clone, Copy)]
pub struct LinkState {
    pub connected: bool,
    pub promiscuous: bool,
}

impl Default for LinkState {
    /// Monitor-mode capture: not associated, receiving promiscuously.
    fn default() -> Self {
        Self {
            connected: false,
            promiscuous: true,
        }
    }
}

/// In-memory filter engine with the same contract as the hardware one.
#[derive(Debug, Default)]
pub struct SoftwareFilterEngine {
    rules: Vec<FilterRule>,
    enabled: FilterIdMask,
    link: LinkState,
}

impl SoftwareFilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_link_state(&mut self, link: LinkState) {
        self.link = link;
    }

    fn gates_open(&self, rule: &FilterRule) -> bool {
        let conn_ok = match rule.trigger.connection_state {
            ConnectionState::StaNotConnected => !self.link.connected,
        };
        let role_ok = match rule.trigger.role {
            RoleState::Promiscuous => self.link.promiscuous,
        };
        conn_ok && role_ok
    }

    /// Evaluate one frame's header fields against the enabled rules.
    pub fn evaluate(&self, fields: &FrameFields) -> Verdict {
        let mut fired = [false; FILTER_SLOTS];

        for (idx, rule) in self.rules.iter().enumerate() {
            let id = FilterId::new(idx as u8).expect("arena bounded by FILTER_SLOTS");
            if !self.enabled.contains(id) || !self.gates_open(rule) {
                continue;
            }
            if let Some(parent) = rule.trigger.parent {
                if !fired[parent.value() as usize] {
                    continue;
                }
            }

            let field = match rule.field {
                HeaderField::FrameType => fields.frame_type,
                HeaderField::FrameSubtype => fields.frame_subtype,
            };
            if rule.compare.matches(field, rule.value, rule.mask) {
                if rule.action == RuleAction::Drop {
                    return Verdict::Drop(id);
                }
                fired[idx] = true;
            }
        }

        Verdict::Accept
    }
}

impl FilterEngine for SoftwareFilterEngine {
    fn create_rule(&mut self, rule: &FilterRule) -> Result<FilterId, FilterError> {
        if self.rules.len() >= FILTER_SLOTS {
            return Err(FilterError::SlotsExhausted);
        }
        if let Some(parent) = rule.trigger.parent {
            if parent.value() as usize >= self.rules.len() {
                return Err(FilterError::UnknownParent(parent.value()));
            }
        }
        let id = FilterId::new(self.rules.len() as u8)?;
        self.rules.push(*rule);
        Ok(id)
    }

    fn commit(&mut self, op: FilterOp, mask: &FilterIdMask) -> Result<(), FilterError> {
        match op {
            FilterOp::Enable => {
                for id in mask.ids() {
                    self.enabled.set(id);
                }
            }
            FilterOp::Disable => {
                let mut next = FilterIdMask::new();
                for kept in self.enabled.ids().filter(|kept| !mask.contains(*kept)) {
                    next.set(kept);
                }
                self.enabled = next;
            }
        }
        Ok(())
    }

    fn enabled_mask(&self) -> Result<FilterIdMask, FilterError> {
        Ok(self.enabled)
    }
}

/// Frame source wrapper that applies a filter engine's verdicts.
///
/// The hardware engine filters frames before they ever reach the raw
/// socket; this wrapper gives replayed sources the same behavior. Frames
/// too short to carry the receive metadata header are passed through for
/// the bridge to fault on.
pub struct FilteredSource<S: FrameSource> {
    inner: S,
    engine: SoftwareFilterEngine,
}

impl<S: FrameSource> FilteredSource<S> {
    pub fn new(inner: S, engine: SoftwareFilterEngine) -> Self {
        Self { inner, engine }
    }
}

impl<S: FrameSource> FrameSource for FilteredSource<S> {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        loop {
            let received = self.inner.receive(buf)?;
            if received < RxMetadata::LEN {
                return Ok(received);
            }
            match FrameFields::from_frame(&buf[RxMetadata::LEN..received]) {
                Some(fields) => match self.engine.evaluate(&fields) {
                    Verdict::Accept => return Ok(received),
                    Verdict::Drop(id) => {
                        trace!("frame dropped by filter {}", id);
                    }
                },
                None => return Ok(received),
            }
        }
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FrameType, MgmtSubtype};
    use crate::filter::{drop_non_beacon, drop_non_management, install_beacon_policy};

    fn engine_with_policy() -> SoftwareFilterEngine {
        let mut engine = SoftwareFilterEngine::new();
        install_beacon_policy(&mut engine).unwrap();
        engine
    }

    fn fields(frame_type: FrameType, subtype_field: u8) -> FrameFields {
        FrameFields::new(frame_type, subtype_field)
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn ids_assigned_in_creation_order() {
            let mut engine = SoftwareFilterEngine::new();
            let a = engine.create_rule(&drop_non_management()).unwrap();
            let b = engine.create_rule(&drop_non_management()).unwrap();
            assert_eq!(a.value(), 0);
            assert_eq!(b.value(), 1);
        }

        #[test]
        fn rejects_unknown_parent() {
            let mut engine = SoftwareFilterEngine::new();
            let bogus = FilterId::new(5).unwrap();
            let err = engine.create_rule(&drop_non_beacon(bogus)).unwrap_err();
            assert!(matches!(err, FilterError::UnknownParent(5)));
        }

        #[test]
        fn enabled_mask_reflects_commits() {
            let mut engine = engine_with_policy();
            assert_eq!(engine.enabled_mask().unwrap().count(), 3);

            let mask = engine.enabled_mask().unwrap();
            engine.commit(FilterOp::Disable, &mask).unwrap();
            assert!(engine.enabled_mask().unwrap().is_empty());
        }
    }

    mod verdict_tests {
        use super::*;

        #[test]
        fn control_frame_dropped_at_root() {
            let engine = engine_with_policy();
            let verdict = engine.evaluate(&fields(FrameType::Control, 0x00));
            // R1 holds slot 0.
            assert_eq!(verdict, Verdict::Drop(FilterId::new(0).unwrap()));
        }

        #[test]
        fn data_frame_dropped_regardless_of_subtype() {
            let engine = engine_with_policy();
            for subtype in [0x00, 0x40, 0x80] {
                let verdict = engine.evaluate(&fields(FrameType::Data, subtype));
                assert_eq!(verdict, Verdict::Drop(FilterId::new(0).unwrap()));
            }
        }

        #[test]
        fn probe_request_dropped_at_subtype_rule() {
            let engine = engine_with_policy();
            let verdict = engine.evaluate(&fields(
                FrameType::Management,
                MgmtSubtype::ProbeRequest.field_value(),
            ));
            // R3 holds slot 2.
            assert_eq!(verdict, Verdict::Drop(FilterId::new(2).unwrap()));
        }

        #[test]
        fn beacon_accepted() {
            let engine = engine_with_policy();
            let verdict = engine.evaluate(&fields(
                FrameType::Management,
                MgmtSubtype::Beacon.field_value(),
            ));
            assert_eq!(verdict, Verdict::Accept);
        }

        #[test]
        fn end_to_end_three_frame_scenario() {
            let engine = engine_with_policy();
            let cases = [
                (fields(FrameType::Control, 0x00), false),
                (
                    fields(FrameType::Management, MgmtSubtype::ProbeRequest.field_value()),
                    false,
                ),
                (
                    fields(FrameType::Management, MgmtSubtype::Beacon.field_value()),
                    true,
                ),
            ];
            for (frame, accepted) in cases {
                assert_eq!(engine.evaluate(&frame) == Verdict::Accept, accepted);
            }
        }

        #[test]
        fn disabled_rules_do_not_drop() {
            let mut engine = engine_with_policy();
            let mask = engine.enabled_mask().unwrap();
            engine.commit(FilterOp::Disable, &mask).unwrap();
            let verdict = engine.evaluate(&fields(FrameType::Control, 0x00));
            assert_eq!(verdict, Verdict::Accept);
        }

        #[test]
        fn connected_station_bypasses_gated_rules() {
            let mut engine = engine_with_policy();
            engine.set_link_state(LinkState {
                connected: true,
                promiscuous: true,
            });
            let verdict = engine.evaluate(&fields(FrameType::Control, 0x00));
            assert_eq!(verdict, Verdict::Accept);
        }
    }

    mod filtered_source_tests {
        use super::*;
        use crate::capture::{assemble, ReplaySource, MAX_FRAME_LEN};

        fn meta() -> RxMetadata {
            RxMetadata {
                rate: 11,
                channel: 10,
                rssi: -60,
                timestamp_us: 0,
            }
        }

        #[test]
        fn only_beacons_come_through() {
            // RTS (control), probe request, beacon.
            let frames = vec![
                assemble(&meta(), &[0xB4, 0x00]),
                assemble(&meta(), &[0x40, 0x00]),
                assemble(&meta(), &[0x80, 0x00, 0xAA]),
            ];
            let replay = ReplaySource::from_buffers(frames);
            let mut source = FilteredSource::new(replay, engine_with_policy());

            let mut buf = [0u8; MAX_FRAME_LEN];
            let n = source.receive(&mut buf).unwrap();
            assert_eq!(&buf[RxMetadata::LEN..n], &[0x80, 0x00, 0xAA]);

            // Nothing left but the exhaustion error.
            assert!(source.receive(&mut buf).is_err());
        }

        #[test]
        fn source_error_passes_through() {
            let replay = ReplaySource::from_buffers(vec![]);
            let mut source = FilteredSource::new(replay, engine_with_policy());
            let mut buf = [0u8; MAX_FRAME_LEN];
            let err = source.receive(&mut buf).unwrap_err();
            assert!(matches!(err, CaptureError::Receive(-1)));
        }
    }
}
