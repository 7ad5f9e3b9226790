//! Compiled pattern-variable references (SPEC_FULL.md section 3.2).

/// The compiled form of a pattern variable: an ellipsis depth and a slot
/// index into a [`crate::macro_system::bindings::MatchVec`]. Source symbols
/// never survive compilation as pattern variables -- every occurrence is
/// rewritten to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PvRef {
    /// Ellipsis nesting depth at which the variable was bound (0 = outermost).
    pub level: u16,
    /// Slot index into the rule's binding table.
    pub index: u16,
}

impl PvRef {
    /// Builds a reference at `level`/`index`.
    pub fn new(level: u16, index: u16) -> Self {
        PvRef { level, index }
    }
}
