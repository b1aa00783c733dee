//! Receive-filter rule model and the beacon-only policy compiler.
//!
//! The radio's filter engine is a chain of hardware decision-tree nodes:
//! a child rule is only evaluated for frames its parent rule matched
//! without dropping. This module defines the `FilterEngine` trait (the
//! hardware contract) and compiles the fixed "drop everything except
//! Beacon management frames" policy into it.

mod software;

pub use software::{FilteredSource, LinkState, SoftwareFilterEngine, Verdict};

use tracing::{debug, info};

use crate::domain::{FrameType, MgmtSubtype};
use crate::error::FilterError;

/// Number of rule slots the engine exposes.
pub const FILTER_SLOTS: usize = 64;

/// Identifier of one installed rule, assigned by the engine at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(u8);

impl FilterId {
    pub fn new(id: u8) -> Result<Self, FilterError> {
        if (id as usize) < FILTER_SLOTS {
            Ok(Self(id))
        } else {
            Err(FilterError::IdOutOfRange(id))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for FilterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 64-slot enabled-state bitmask submitted on commit.
///
/// Built incrementally from the ids the engine hands back; a rule's id is
/// only known after successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterIdMask([u8; 8]);

impl FilterIdMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: FilterId) {
        self.0[(id.value() / 8) as usize] |= 1 << (id.value() % 8);
    }

    pub fn contains(&self, id: FilterId) -> bool {
        self.0[(id.value() / 8) as usize] & (1 << (id.value() % 8)) != 0
    }

    /// Number of slots set in the mask.
    pub fn count(&self) -> usize {
        self.0.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Iterate over the ids set in the mask, ascending.
    pub fn ids(&self) -> impl Iterator<Item = FilterId> + '_ {
        (0..FILTER_SLOTS as u8).filter_map(|id| {
            let id = FilterId(id);
            self.contains(id).then_some(id)
        })
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl std::fmt::Display for FilterIdMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.ids().map(|id| id.to_string()).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}

/// Which frame header field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    FrameType,
    FrameSubtype,
}

/// Comparison applied to the masked field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    Equal,
    NotEqual,
}

impl CompareFunc {
    /// Apply the comparison to a masked field value and masked argument.
    pub fn matches(self, field: u8, value: u8, mask: u8) -> bool {
        match self {
            Self::Equal => field & mask == value & mask,
            Self::NotEqual => field & mask != value & mask,
        }
    }
}

/// What the engine does with a frame when a rule matches.
///
/// No rule ever explicitly accepts: absence of a drop verdict is
/// pass-through by hardware default. `Pass` rules exist to anchor
/// child rules in the decision tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Drop,
    Pass,
}

/// Connection-state gate: the rule only applies in this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    StaNotConnected,
}

/// Role gate: the rule only applies while receiving in this role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    Promiscuous,
}

/// Condition under which a rule is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// `None` is a root rule; `Some(id)` chains to a previously created
    /// rule and is only evaluated for frames that rule matched without
    /// dropping.
    pub parent: Option<FilterId>,
    pub connection_state: ConnectionState,
    pub role: RoleState,
}

impl Trigger {
    /// Root trigger gated on monitor-mode reception while not associated.
    pub fn root() -> Self {
        Self {
            parent: None,
            connection_state: ConnectionState::StaNotConnected,
            role: RoleState::Promiscuous,
        }
    }

    /// Trigger chained to a previously created rule.
    pub fn chained_to(parent: FilterId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::root()
        }
    }
}

/// One hardware decision-tree node: a header-field comparison rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRule {
    pub field: HeaderField,
    pub compare: CompareFunc,
    pub value: u8,
    pub mask: u8,
    pub trigger: Trigger,
    pub action: RuleAction,
}

/// Commit operation: flip the masked rule slots on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Enable,
    Disable,
}

/// Contract of the radio's hardware filter engine.
///
/// Callers never inspect rule internals beyond identifiers; the id
/// returned by `create_rule` is only needed to wire up parent references
/// and to build the commit mask.
pub trait FilterEngine {
    /// Admit one rule into the engine and return its assigned slot id.
    fn create_rule(&mut self, rule: &FilterRule) -> Result<FilterId, FilterError>;

    /// Enable or disable the rule slots set in the mask, in one call.
    fn commit(&mut self, op: FilterOp, mask: &FilterIdMask) -> Result<(), FilterError>;

    /// Read back the currently enabled rule slots.
    fn enabled_mask(&self) -> Result<FilterIdMask, FilterError>;
}

/// R1: drop every frame whose type is not Management. Root rule.
pub fn drop_non_management() -> FilterRule {
    FilterRule {
        field: HeaderField::FrameType,
        compare: CompareFunc::NotEqual,
        value: FrameType::Management.field_value(),
        mask: 0xFF,
        trigger: Trigger::root(),
        action: RuleAction::Drop,
    }
}

/// R2: match Management frames with no action. Root rule.
///
/// Its sole purpose is to provide a stable parent id for R3: the
/// engine's trigger model keys off a parent's identifier, not its
/// outcome, so the "frame is Management" fact needs its own tree node.
pub fn match_management() -> FilterRule {
    FilterRule {
        field: HeaderField::FrameType,
        compare: CompareFunc::Equal,
        value: FrameType::Management.field_value(),
        mask: 0xFF,
        trigger: Trigger::root(),
        action: RuleAction::Pass,
    }
}

/// R3: drop Management frames whose subtype is not Beacon.
/// Evaluated only for frames that matched `parent`.
pub fn drop_non_beacon(parent: FilterId) -> FilterRule {
    FilterRule {
        field: HeaderField::FrameSubtype,
        compare: CompareFunc::NotEqual,
        value: MgmtSubtype::Beacon.field_value(),
        mask: 0xFF,
        trigger: Trigger::chained_to(parent),
        action: RuleAction::Drop,
    }
}

/// Install and enable the beacon-only receive policy.
///
/// Creates the three-rule decision tree (parents before children, ids
/// taken from the engine as they are assigned), then commits the
/// accumulated mask once with a single enable call. Any failing step
/// aborts and surfaces the engine error; rules already created are not
/// rolled back (known limitation of the engine contract).
pub fn install_beacon_policy(engine: &mut dyn FilterEngine) -> Result<FilterIdMask, FilterError> {
    let mut mask = FilterIdMask::new();

    let r1 = engine.create_rule(&drop_non_management())?;
    debug!("filter rule created, id: {}", r1);
    mask.set(r1);

    let r2 = engine.create_rule(&match_management())?;
    debug!("filter rule created, id: {}", r2);
    mask.set(r2);

    let r3 = engine.create_rule(&drop_non_beacon(r2))?;
    debug!("filter rule created, id: {}", r3);
    mask.set(r3);

    engine.commit(FilterOp::Enable, &mask)?;
    info!("beacon rx filters enabled: {}", mask);

    Ok(mask)
}

/// Disable a previously installed policy's rule slots.
pub fn remove_beacon_policy(
    engine: &mut dyn FilterEngine,
    mask: &FilterIdMask,
) -> Result<(), FilterError> {
    engine.commit(FilterOp::Disable, mask)?;
    info!("beacon rx filters disabled: {}", mask);
    Ok(())
}
