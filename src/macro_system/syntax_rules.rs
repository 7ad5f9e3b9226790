//! Compiled `syntax-rules` macros (SPEC_FULL.md section 3.4) and the
//! `compileSyntaxRules` entry point (section 6.2).

use crate::env::Environment;
use crate::error::Result;
use crate::expr::Expr;

use super::compiler;
use super::pattern::SyntaxPattern;

/// One `(pattern template)` clause, compiled.
#[derive(Debug, Clone)]
pub struct SyntaxRule {
    /// The compiled pattern (keyword position excluded).
    pub pattern: SyntaxPattern,
    /// The compiled template.
    pub template: SyntaxPattern,
    /// Total `PvRef` slots this rule needs.
    pub num_pvars: u16,
    /// Deepest ellipsis nesting this rule reaches.
    pub max_level: u16,
}

/// A compiled `syntax-rules` macro: its rules, tried in source order, plus
/// the shared binding-table size every invocation needs.
#[derive(Debug, Clone)]
pub struct SyntaxRules {
    /// The macro's name, for diagnostics.
    pub name: String,
    /// Compiled rules, in source (and match-attempt) order.
    pub rules: Vec<SyntaxRule>,
    /// `max(rule.num_pvars)` across all rules, used to pre-size a shared
    /// `MatchVec`.
    pub max_num_pvars: u16,
}

/// Compiles a `syntax-rules` macro definition: a name (for diagnostics), a
/// literals list, a rules list, and the environment captured at the
/// definition site (SPEC_FULL.md section 4.1).
pub fn compile_syntax_rules(
    name: &str,
    literals: &Expr,
    rules: &Expr,
    def_env: &Environment,
) -> Result<SyntaxRules> {
    compile_syntax_rules_with_config(name, literals, rules, def_env, &crate::config::ExpanderConfig::default())
}

/// As [`compile_syntax_rules`], but with an explicit [`crate::config::ExpanderConfig`]
/// (for callers that need a non-default ellipsis-depth ceiling).
pub fn compile_syntax_rules_with_config(
    name: &str,
    literals: &Expr,
    rules: &Expr,
    def_env: &Environment,
    config: &crate::config::ExpanderConfig,
) -> Result<SyntaxRules> {
    let (rules, max_num_pvars) = compiler::compile_rules(name, literals, rules, def_env, config.max_level)?;
    Ok(SyntaxRules { name: name.to_string(), rules, max_num_pvars })
}
