//! The hygienic `syntax-rules` expander core (SPEC_FULL.md section 3): pattern
//! compiler, matcher, transcriber, and transformer facade.

mod bindings;
mod compiler;
mod matcher;
mod pattern;
mod pvref;
mod syntax_rules;
mod transcriber;
mod transformer;

pub use bindings::{MatchValue, MatchVar, MatchVec};
pub use matcher::match_pattern;
pub use pattern::{Node, SyntaxPattern};
pub use pvref::PvRef;
pub use syntax_rules::{compile_syntax_rules, compile_syntax_rules_with_config, SyntaxRule, SyntaxRules};
pub use transcriber::realize;
pub use transformer::{MacroTransformer, SyntaxRulesTransformer, Transformer};
