//! Error taxonomy for pattern compilation, matching, and transcription
//! (SPEC_FULL.md section 7).
//!
//! Diagnostics describe the offending form structurally (via `Expr`'s
//! `Display`); there is no source-location tracking here -- per the
//! Non-goals, spans are the host's concern, not this crate's.

use std::fmt;

use crate::expr::Expr;

/// Everything that can go wrong compiling a `syntax-rules` form, matching a
/// use site against a compiled pattern, or realizing a template.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroError {
    /// A `syntax-rules` form itself is malformed: missing literals list,
    /// a rule that isn't a two-element list, a pattern whose head isn't a
    /// pair, and similar shape violations caught before any use-site
    /// matching happens.
    MalformedMacro {
        /// What was expected at this position.
        expected: &'static str,
        /// The offending form.
        found: Expr,
    },
    /// An ellipsis (`...`) appeared somewhere it cannot: standalone, with a
    /// non-empty tail following it in a list, more than once before the
    /// final slot of a vector, or as the sole element of a vector.
    BadEllipsis {
        /// The list or vector context the ellipsis was found in.
        context: Expr,
    },
    /// The same pattern variable was bound twice in one pattern.
    DuplicatePvar {
        /// The repeated variable's name.
        name: String,
    },
    /// A pattern variable was referenced in a template at an ellipsis depth
    /// inconsistent with the depth it was bound at.
    LevelMismatch {
        /// The variable's name.
        name: String,
        /// The level it was bound at during compilation.
        bound_level: u16,
        /// The level it was referenced at.
        used_level: u16,
    },
    /// A macro use site doesn't match any rule in the macro's `SyntaxRules`.
    MalformedUse {
        /// The macro keyword.
        keyword: String,
        /// The use-site form that failed to match every rule.
        form: Expr,
    },
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroError::MalformedMacro { expected, found } => {
                write!(f, "malformed syntax-rules form: expected {expected}, found {found}")
            }
            MacroError::BadEllipsis { context } => {
                write!(f, "misplaced ellipsis in {context}")
            }
            MacroError::DuplicatePvar { name } => {
                write!(f, "pattern variable `{name}` bound more than once")
            }
            MacroError::LevelMismatch { name, bound_level, used_level } => {
                write!(
                    f,
                    "pattern variable `{name}` used at ellipsis depth {used_level}, \
                     but was bound at depth {bound_level}"
                )
            }
            MacroError::MalformedUse { keyword, form } => {
                write!(f, "no rule of `{keyword}` matches {form}")
            }
        }
    }
}

impl std::error::Error for MacroError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MacroError>;
