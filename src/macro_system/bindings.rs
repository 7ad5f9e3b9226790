//! Per-invocation binding table (SPEC_FULL.md section 3.5) and index vector
//! (section 3.6).
//!
//! The original builds the binding tree by mutating cons cells in place
//! (`SET-CAR!`/`SET-CDR!` "sprout grafting"). This reimplementation keeps a
//! `Vec`-based accumulator per currently-open nesting level instead and
//! finalizes it to an immutable [`MatchValue`] tree on `exit` -- the same
//! shape, without mutable aliasing (section 9, "MatchVec growth via
//! mutation").

/// A completed (or partially completed) binding for one pattern variable.
///
/// `Leaf` is what a level-0 variable (or the innermost leaf of a deeper
/// one) holds; `Branch` is one level of ellipsis nesting. The depth of
/// nested `Branch`es for a fully matched variable equals its `PvRef::level`
/// (SPEC_FULL.md section 8, invariant 3).
#[derive(Debug, Clone, PartialEq)]
pub enum MatchValue {
    /// The matched subform itself.
    Leaf(crate::expr::Expr),
    /// One level of `...` repetition, in the order encountered.
    Branch(Vec<MatchValue>),
}

impl MatchValue {
    /// Walks `steps` levels down the tree, taking `indices[k]` at each step
    /// (1-indexed as in SPEC_FULL.md section 4.3). Returns `None` if the
    /// walk runs past the end of some branch -- the termination signal the
    /// transcriber uses to stop an ellipsis loop (`UNBOUND`).
    pub fn lookup(&self, steps: u16, indices: &[usize]) -> Option<&Expr> {
        let mut cur = self;
        for k in 1..=steps {
            match cur {
                MatchValue::Branch(items) => {
                    cur = items.get(indices[k as usize])?;
                }
                MatchValue::Leaf(_) => return None,
            }
        }
        match cur {
            MatchValue::Leaf(value) => Some(value),
            MatchValue::Branch(_) => None,
        }
    }

    /// Walks `steps` levels down the tree exactly like [`Self::lookup`], but
    /// returns the length of the `Branch` landed on instead of a leaf.
    /// `x ... ...` (flattening) uses this to ask "does row `indices[steps]`
    /// exist, and how many columns does it have" without going through a
    /// leaf lookup that can't tell "this row is legitimately empty" apart
    /// from "there is no such row" (section 8, scenario 4).
    pub fn branch_len(&self, steps: u16, indices: &[usize]) -> Option<usize> {
        let mut cur = self;
        for k in 1..=steps {
            match cur {
                MatchValue::Branch(items) => cur = items.get(indices[k as usize])?,
                MatchValue::Leaf(_) => return None,
            }
        }
        match cur {
            MatchValue::Branch(items) => Some(items.len()),
            MatchValue::Leaf(_) => None,
        }
    }
}

use crate::expr::Expr;

/// One pattern variable's binding slot.
#[derive(Debug, Clone, Default)]
pub struct MatchVar {
    /// The finalized binding, once matching completes for this variable.
    pub root: Option<MatchValue>,
    /// Currently-open accumulator frames, innermost last.
    frames: Vec<Vec<MatchValue>>,
}

impl MatchVar {
    /// Clears any state left over from a previous (failed or finished)
    /// match attempt.
    pub fn reset(&mut self) {
        self.root = None;
        self.frames.clear();
    }

    /// Records a directly-matched subform. `level == 0` writes straight to
    /// `root`; otherwise the value joins the innermost open frame
    /// (SPEC_FULL.md section 4.2, "Insertion").
    pub fn insert_leaf(&mut self, level: u16, value: Expr) {
        if level == 0 {
            self.root = Some(MatchValue::Leaf(value));
        } else {
            self.frames
                .last_mut()
                .expect("a frame must be open before inserting at level > 0")
                .push(MatchValue::Leaf(value));
        }
    }

    /// Opens a fresh accumulator, one nesting level deeper than whatever is
    /// currently open (SPEC_FULL.md section 4.2, "Subpattern protocol",
    /// step 1: Enter).
    ///
    /// Every subpattern activation that lists this variable in `vars` calls
    /// `enter`, no matter whether the activation is this variable's own
    /// declaring level or an enclosing one -- an enclosing activation's
    /// frame simply stays open across all of that level's iterations,
    /// accumulating one finished child per iteration via the matching
    /// `exit` calls nested inside it. This unconditional push/pop is what
    /// lets a single flat frame (for a level-1 variable) and a row of
    /// per-iteration branches (for a deeper one) fall out of the same code
    /// path instead of needing separate handling per level.
    pub fn enter(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Closes the innermost open accumulator, grafting it into the frame
    /// below or, if none remains open, finalizing it as `root` (step 3:
    /// Exit).
    pub fn exit(&mut self) {
        let finished = self.frames.pop().expect("a frame must be open before exiting");
        let branch = MatchValue::Branch(finished);
        match self.frames.last_mut() {
            Some(parent) => parent.push(branch),
            None => self.root = Some(branch),
        }
    }
}

/// The per-invocation binding table: one [`MatchVar`] per `PvRef` slot.
#[derive(Debug, Clone, Default)]
pub struct MatchVec {
    vars: Vec<MatchVar>,
}

impl MatchVec {
    /// Allocates a table with `size` slots, all empty.
    pub fn with_size(size: u16) -> Self {
        MatchVec { vars: vec![MatchVar::default(); size as usize] }
    }

    /// Resizes (growing only) and clears every slot, ready for a new rule
    /// attempt (SPEC_FULL.md section 3.5, "Lifecycle").
    pub fn reset(&mut self, num_pvars: u16) {
        if self.vars.len() < num_pvars as usize {
            self.vars.resize(num_pvars as usize, MatchVar::default());
        }
        for var in &mut self.vars[..num_pvars as usize] {
            var.reset();
        }
    }

    /// The binding slot for `index`.
    pub fn get(&self, index: u16) -> &MatchVar {
        &self.vars[index as usize]
    }

    /// The binding slot for `index`, mutably.
    pub fn get_mut(&mut self, index: u16) -> &mut MatchVar {
        &mut self.vars[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_zero_insert_sets_root_directly() {
        let mut var = MatchVar::default();
        var.insert_leaf(0, Expr::Number(42.0));
        assert_eq!(var.root, Some(MatchValue::Leaf(Expr::Number(42.0))));
    }

    #[test]
    fn single_level_repetition_builds_flat_branch() {
        let mut var = MatchVar::default();
        var.enter();
        var.insert_leaf(1, Expr::Number(1.0));
        var.insert_leaf(1, Expr::Number(2.0));
        var.insert_leaf(1, Expr::Number(3.0));
        var.exit();
        assert_eq!(
            var.root,
            Some(MatchValue::Branch(vec![
                MatchValue::Leaf(Expr::Number(1.0)),
                MatchValue::Leaf(Expr::Number(2.0)),
                MatchValue::Leaf(Expr::Number(3.0)),
            ]))
        );
    }

    #[test]
    fn two_level_repetition_builds_a_branch_of_branches() {
        // Mirrors a level-2 variable nested one row at a time: an outer
        // frame stays open across three rows, each row opening and closing
        // its own inner frame.
        let mut var = MatchVar::default();
        var.enter(); // outer, opened once for the whole match
        var.enter(); // row 1
        var.insert_leaf(2, Expr::Number(2.0));
        var.insert_leaf(2, Expr::Number(3.0));
        var.exit(); // row 1 closes, joins the outer frame
        var.enter(); // row 2
        var.insert_leaf(2, Expr::Number(5.0));
        var.exit();
        var.enter(); // row 3, empty
        var.exit();
        var.exit(); // outer closes, finalizes root
        assert_eq!(
            var.root,
            Some(MatchValue::Branch(vec![
                MatchValue::Branch(vec![MatchValue::Leaf(Expr::Number(2.0)), MatchValue::Leaf(Expr::Number(3.0))]),
                MatchValue::Branch(vec![MatchValue::Leaf(Expr::Number(5.0))]),
                MatchValue::Branch(vec![]),
            ]))
        );
        assert_eq!(var.root.as_ref().unwrap().lookup(2, &[0, 0, 1]), Some(&Expr::Number(3.0)));
        assert_eq!(var.root.as_ref().unwrap().lookup(2, &[0, 1, 0]), Some(&Expr::Number(5.0)));
        assert_eq!(var.root.as_ref().unwrap().lookup(2, &[0, 2, 0]), None);
    }

    #[test]
    fn lookup_walks_indices_and_reports_exhaustion() {
        let tree = MatchValue::Branch(vec![
            MatchValue::Leaf(Expr::Number(1.0)),
            MatchValue::Leaf(Expr::Number(2.0)),
        ]);
        assert_eq!(tree.lookup(1, &[0, 0]), Some(&Expr::Number(1.0)));
        assert_eq!(tree.lookup(1, &[0, 1]), Some(&Expr::Number(2.0)));
        assert_eq!(tree.lookup(1, &[0, 2]), None);
    }
}
