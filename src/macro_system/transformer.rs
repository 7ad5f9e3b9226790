//! Transformer facade (SPEC_FULL.md section 4.4, component C5): the glue a
//! host compiler actually calls at a macro use site.

use crate::env::Environment;
use crate::error::{MacroError, Result};
use crate::expr::Expr;

use super::bindings::MatchVec;
use super::matcher::match_pattern;
use super::syntax_rules::SyntaxRules;
use super::transcriber::realize;

/// Something a macro use site can be handed off to: `(form, useEnv) -> form'`.
pub trait Transformer {
    /// Expands one use of the macro. `form` is the whole use, keyword
    /// included (e.g. `(my-macro a b)`).
    fn expand(&self, form: &Expr, use_env: &Environment) -> Result<Expr>;
}

/// A hygienic `syntax-rules` transformer: tries each compiled rule in order,
/// transcribing the first one whose pattern matches.
pub struct SyntaxRulesTransformer {
    rules: SyntaxRules,
}

impl SyntaxRulesTransformer {
    /// Wraps a compiled [`SyntaxRules`] as a [`Transformer`].
    pub fn new(rules: SyntaxRules) -> Self {
        SyntaxRulesTransformer { rules }
    }
}

impl Transformer for SyntaxRulesTransformer {
    fn expand(&self, form: &Expr, use_env: &Environment) -> Result<Expr> {
        let args = match form.as_pair() {
            Some((_, cdr)) => cdr,
            None => {
                return Err(MacroError::MalformedUse { keyword: self.rules.name.clone(), form: form.clone() });
            }
        };

        let mut mvec = MatchVec::with_size(self.rules.max_num_pvars);
        for rule in &self.rules.rules {
            mvec.reset(rule.num_pvars);
            if match_pattern(args, &rule.pattern, use_env, &mut mvec) {
                return Ok(realize(&rule.template, &mvec, rule.max_level));
            }
        }
        Err(MacroError::MalformedUse { keyword: self.rules.name.clone(), form: form.clone() })
    }
}

/// A traditional (non-hygienic, non-pattern) macro: a host-supplied
/// procedure invoked on the whole use form. Compiling the result in the
/// use-site environment is the host's job (SPEC_FULL.md section 4.4) --
/// this crate only stores and calls the procedure.
pub struct MacroTransformer {
    procedure: Box<dyn Fn(&Expr) -> Result<Expr>>,
}

impl MacroTransformer {
    /// Wraps `procedure` as a [`Transformer`].
    pub fn new(procedure: Box<dyn Fn(&Expr) -> Result<Expr>>) -> Self {
        MacroTransformer { procedure }
    }
}

impl Transformer for MacroTransformer {
    fn expand(&self, form: &Expr, _use_env: &Environment) -> Result<Expr> {
        (self.procedure)(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_system::syntax_rules::compile_syntax_rules;
    use pretty_assertions::assert_eq;

    #[test]
    fn syntax_rules_transformer_picks_the_first_matching_rule() {
        let def_env = Environment::root();
        let rules_form = Expr::list([
            Expr::list([
                Expr::list([Expr::Symbol("_".into()), Expr::Symbol("a".into()), Expr::Symbol("b".into())]),
                Expr::list([Expr::Symbol("swap".into()), Expr::Symbol("b".into()), Expr::Symbol("a".into())]),
            ]),
            Expr::list([
                Expr::list([Expr::Symbol("_".into()), Expr::Symbol("x".into())]),
                Expr::Symbol("x".into()),
            ]),
        ]);
        let compiled = compile_syntax_rules("pick", &Expr::Nil, &rules_form, &def_env).unwrap();
        let transformer = SyntaxRulesTransformer::new(compiled);

        let use_env = Environment::root();
        let two_arg_use = Expr::list([Expr::Symbol("pick".into()), Expr::Number(1.0), Expr::Number(2.0)]);
        let result = transformer.expand(&two_arg_use, &use_env).unwrap();
        // `swap` is a template-inserted free identifier, so we only check
        // the operand order came out reversed.
        let (items, _) = result.to_vec();
        assert_eq!(items[1], Expr::Number(2.0));
        assert_eq!(items[2], Expr::Number(1.0));

        let one_arg_use = Expr::list([Expr::Symbol("pick".into()), Expr::Number(9.0)]);
        assert_eq!(transformer.expand(&one_arg_use, &use_env).unwrap(), Expr::Number(9.0));
    }

    #[test]
    fn syntax_rules_transformer_reports_malformed_use_when_no_rule_matches() {
        let def_env = Environment::root();
        let rules_form = Expr::list([Expr::list([
            Expr::list([Expr::Symbol("_".into()), Expr::Symbol("a".into())]),
            Expr::Symbol("a".into()),
        ])]);
        let compiled = compile_syntax_rules("one-arg", &Expr::Nil, &rules_form, &def_env).unwrap();
        let transformer = SyntaxRulesTransformer::new(compiled);

        let use_env = Environment::root();
        let bad_use = Expr::list([Expr::Symbol("one-arg".into()), Expr::Number(1.0), Expr::Number(2.0)]);
        let err = transformer.expand(&bad_use, &use_env).unwrap_err();
        assert!(matches!(err, MacroError::MalformedUse { .. }));
    }

    #[test]
    fn macro_transformer_invokes_the_stored_procedure() {
        let transformer = MacroTransformer::new(Box::new(|form| Ok(form.clone())));
        let env = Environment::root();
        let form = Expr::list([Expr::Symbol("id".into()), Expr::Number(5.0)]);
        assert_eq!(transformer.expand(&form, &env).unwrap(), form);
    }
}
