//! Pattern compiler (SPEC_FULL.md section 4.1, component C2).
//!
//! Turns the surface pattern/template forms of each `syntax-rules` rule
//! into the [`Node`]/[`SyntaxPattern`] IR, assigning every pattern variable
//! a [`PvRef`] and wrapping every template-inserted free symbol as a
//! hygienic [`Identifier`].

use std::rc::Rc;

use crate::env::Environment;
use crate::error::{MacroError, Result};
use crate::expr::Expr;
use crate::ident::Identifier;

use super::pattern::{Node, SyntaxPattern};
use super::pvref::PvRef;
use super::syntax_rules::SyntaxRule;

const ELLIPSIS: &str = "...";

/// Compile-time state threaded through one rule's recursive walk.
struct PatternContext<'a> {
    name: &'a str,
    literals: &'a [Identifier],
    def_env: &'a Environment,
    pvars: Vec<(String, PvRef)>,
    pvcnt: u16,
    maxlev: u16,
    tvars: Vec<Identifier>,
    max_level_limit: u16,
}

impl<'a> PatternContext<'a> {
    fn new(name: &'a str, literals: &'a [Identifier], def_env: &'a Environment, max_level_limit: u16) -> Self {
        PatternContext {
            name,
            literals,
            def_env,
            pvars: Vec::new(),
            pvcnt: 0,
            maxlev: 0,
            tvars: Vec::new(),
            max_level_limit,
        }
    }

    fn find_literal(&self, name: &str) -> Option<&Identifier> {
        self.literals.iter().find(|id| id.name == name)
    }

    fn add_pvar(&mut self, spat: &mut SyntaxPattern, name: &str) -> Result<Node> {
        if self.pvars.iter().any(|(n, _)| n == name) {
            return Err(MacroError::DuplicatePvar { name: name.to_string() });
        }
        let pvref = PvRef::new(spat.level, self.pvcnt);
        self.pvcnt += 1;
        self.pvars.push((name.to_string(), pvref));
        spat.vars.push(pvref);
        Ok(Node::PvRef(pvref))
    }

    fn pvar_ref(&self, spat: &SyntaxPattern, name: &str) -> Result<Option<PvRef>> {
        match self.pvars.iter().find(|(n, _)| n == name) {
            Some((_, pvref)) if pvref.level != spat.level => Err(MacroError::LevelMismatch {
                name: name.to_string(),
                bound_level: pvref.level,
                used_level: spat.level,
            }),
            Some((_, pvref)) => Ok(Some(*pvref)),
            None => Ok(None),
        }
    }

    fn mint_identifier(&mut self, name: &str) -> Identifier {
        if let Some(existing) = self.tvars.iter().find(|id| id.name == name) {
            return existing.clone();
        }
        let id = Identifier::new(name, self.def_env.clone());
        self.tvars.push(id.clone());
        id
    }

    /// Tracks how deep this rule's ellipsis nesting goes. Unlike a fixed
    /// array length, nothing here actually bounds how deep compilation can
    /// go -- `max_level_limit` only sizes the index vector the transcriber
    /// preallocates (SPEC_FULL.md section 8, "Depth overflow": nesting past
    /// the default ceiling must still compile and expand correctly).
    fn enter_level(&mut self, level: u16) {
        if self.maxlev <= level {
            self.maxlev += 1;
        }
        if self.maxlev > self.max_level_limit {
            log::trace!(
                "rule `{}` nests ellipses {} levels deep, past the configured {} hint",
                self.name,
                self.maxlev,
                self.max_level_limit
            );
        }
    }

    fn bad_ellipsis(&self, context: Expr) -> MacroError {
        let _ = self.name;
        MacroError::BadEllipsis { context }
    }
}

fn is_ellipsis(expr: &Expr) -> bool {
    matches!(expr.symbol_name(), Some(name) if name == ELLIPSIS)
}

/// Coerces every element of a `syntax-rules` literals list to an
/// [`Identifier`] capturing `def_env` (SPEC_FULL.md section 4.1, "Literal
/// preprocessing").
fn preprocess_literals(literals: &Expr, def_env: &Environment) -> Result<Vec<Identifier>> {
    let (items, tail) = literals.to_vec();
    if !tail.is_nil() {
        return Err(MacroError::MalformedMacro { expected: "a proper literals list", found: literals.clone() });
    }
    items
        .into_iter()
        .map(|item| match item {
            Expr::Symbol(name) => Ok(Identifier::new(name, def_env.clone())),
            Expr::Identifier(id) => Ok(id),
            other => Err(MacroError::MalformedMacro { expected: "a literal symbol", found: other }),
        })
        .collect()
}

fn compile_symbol(
    name: &str,
    spat: &mut SyntaxPattern,
    ctx: &mut PatternContext<'_>,
    patternp: bool,
) -> Result<Node> {
    if name == ELLIPSIS {
        return Err(ctx.bad_ellipsis(Expr::Symbol(name.to_string())));
    }
    if let Some(lit) = ctx.find_literal(name) {
        return Ok(Node::Identifier(lit.clone()));
    }
    if patternp {
        ctx.add_pvar(spat, name)
    } else {
        match ctx.pvar_ref(spat, name)? {
            Some(pvref) => Ok(Node::PvRef(pvref)),
            None => Ok(Node::Identifier(ctx.mint_identifier(name))),
        }
    }
}

fn compile_rule1(
    form: &Expr,
    spat: &mut SyntaxPattern,
    ctx: &mut PatternContext<'_>,
    patternp: bool,
) -> Result<Node> {
    match form {
        Expr::Pair(car, cdr) => {
            if let Expr::Pair(second, third) = &**cdr {
                if is_ellipsis(second) {
                    if let Expr::Pair(fourth, fifth) = &**third {
                        if is_ellipsis(fourth) && fifth.is_nil() {
                            return compile_flatten_ellipsis(car, form, spat, ctx, patternp);
                        }
                        return Err(ctx.bad_ellipsis(form.clone()));
                    }
                    if !third.is_nil() {
                        return Err(ctx.bad_ellipsis(form.clone()));
                    }
                    ctx.enter_level(spat.level);
                    let mut nspat = SyntaxPattern::new(spat.level + 1, true);
                    let compiled = compile_rule1(car, &mut nspat, ctx, patternp)?;
                    nspat.pattern = compiled;
                    spat.vars.extend(nspat.vars.iter().copied());
                    let repeat = Node::Repeat(Rc::new(nspat));
                    return Ok(Node::Pair(Box::new(repeat), Box::new(Node::Nil)));
                }
            }
            let compiled_car = compile_rule1(car, spat, ctx, patternp)?;
            let compiled_cdr = compile_rule1(cdr, spat, ctx, patternp)?;
            Ok(Node::Pair(Box::new(compiled_car), Box::new(compiled_cdr)))
        }
        Expr::Nil => Ok(Node::Nil),
        Expr::Vector(items) => compile_vector(items, spat, ctx, patternp),
        Expr::Identifier(id) if patternp => compile_symbol(&id.name.clone(), spat, ctx, patternp),
        Expr::Symbol(name) => compile_symbol(name, spat, ctx, patternp),
        Expr::Identifier(id) => Ok(Node::Identifier(id.clone())),
        other => Ok(Node::Atom(other.clone())),
    }
}

/// Compiles a template-only `(x ... ...)` spine position: the same two
/// levels of nesting `((x ...) ...)` would produce written out in full, but
/// spliced into the surrounding list rather than kept as one nested element
/// per outer iteration (SPEC_FULL.md section 8, scenario 4's flattened
/// `(b ... ...)`). Rejected on the pattern side -- this is strictly a
/// transcription-time splice, there is nothing for the matcher to do with
/// it.
fn compile_flatten_ellipsis(
    car: &Expr,
    form: &Expr,
    spat: &mut SyntaxPattern,
    ctx: &mut PatternContext<'_>,
    patternp: bool,
) -> Result<Node> {
    if patternp {
        return Err(ctx.bad_ellipsis(form.clone()));
    }
    ctx.enter_level(spat.level);
    ctx.enter_level(spat.level + 1);
    let mut leaf = SyntaxPattern::new(spat.level + 2, true);
    let compiled = compile_rule1(car, &mut leaf, ctx, patternp)?;
    leaf.pattern = compiled;
    spat.vars.extend(leaf.vars.iter().copied());
    Ok(Node::Pair(Box::new(Node::FlattenRepeat(Rc::new(leaf))), Box::new(Node::Nil)))
}

fn compile_vector(
    items: &Rc<Vec<Expr>>,
    spat: &mut SyntaxPattern,
    ctx: &mut PatternContext<'_>,
    patternp: bool,
) -> Result<Node> {
    let n = items.len();
    if n == 0 {
        return Ok(Node::Vector(Vec::new()));
    }
    if is_ellipsis(&items[n - 1]) {
        if n < 2 {
            return Err(ctx.bad_ellipsis(Expr::Vector(items.clone())));
        }
        for item in &items[..n.saturating_sub(2)] {
            if is_ellipsis(item) {
                return Err(ctx.bad_ellipsis(Expr::Vector(items.clone())));
            }
        }
        let mut compiled = Vec::with_capacity(n - 1);
        for item in &items[..n - 2] {
            compiled.push(compile_rule1(item, spat, ctx, patternp)?);
        }
        ctx.enter_level(spat.level);
        let mut nspat = SyntaxPattern::new(spat.level + 1, true);
        let inner = compile_rule1(&items[n - 2], &mut nspat, ctx, patternp)?;
        nspat.pattern = inner;
        spat.vars.extend(nspat.vars.iter().copied());
        compiled.push(Node::Repeat(Rc::new(nspat)));
        Ok(Node::Vector(compiled))
    } else {
        let compiled = items
            .iter()
            .map(|item| compile_rule1(item, spat, ctx, patternp))
            .collect::<Result<Vec<_>>>()?;
        Ok(Node::Vector(compiled))
    }
}

/// Compiles every `(pattern template)` rule in `rules_form` against
/// `literals_form`, producing the rule list a [`super::SyntaxRules`] is
/// built from. The pattern side of each rule excludes the macro keyword --
/// callers pass `cdr(pattern-form)` as `pattern`.
pub(super) fn compile_rules(
    name: &str,
    literals_form: &Expr,
    rules_form: &Expr,
    def_env: &Environment,
    max_level_limit: u16,
) -> Result<(Vec<SyntaxRule>, u16)> {
    let literals = preprocess_literals(literals_form, def_env)?;
    let (rule_forms, tail) = rules_form.to_vec();
    if !tail.is_nil() {
        return Err(MacroError::MalformedMacro { expected: "a proper rules list", found: rules_form.clone() });
    }
    if rule_forms.is_empty() {
        return Err(MacroError::MalformedMacro { expected: "at least one rule", found: rules_form.clone() });
    }

    let mut rules = Vec::with_capacity(rule_forms.len());
    let mut max_num_pvars = 0u16;

    for rule_form in &rule_forms {
        let (parts, rule_tail) = rule_form.to_vec();
        if !rule_tail.is_nil() || parts.len() != 2 {
            return Err(MacroError::MalformedMacro { expected: "a (pattern template) pair", found: rule_form.clone() });
        }
        let pattern_form = &parts[0];
        let template_form = &parts[1];
        let (_, pattern_rest) = match pattern_form.as_pair() {
            Some((car, cdr)) => (car.clone(), cdr.clone()),
            None => {
                return Err(MacroError::MalformedMacro {
                    expected: "a pattern whose head is a pair",
                    found: pattern_form.clone(),
                });
            }
        };

        let mut ctx = PatternContext::new(name, &literals, def_env, max_level_limit);
        let mut pat_top = SyntaxPattern::new(0, false);
        let pattern = compile_rule1(&pattern_rest, &mut pat_top, &mut ctx, true)?;
        pat_top.pattern = pattern;

        let pat_pvcnt = ctx.pvcnt;
        let pat_maxlev = ctx.maxlev;

        let mut tmpl_top = SyntaxPattern::new(0, false);
        let template = compile_rule1(template_form, &mut tmpl_top, &mut ctx, false)?;
        tmpl_top.pattern = template;

        let num_pvars = pat_pvcnt.max(ctx.pvcnt);
        let max_level = pat_maxlev.max(ctx.maxlev);
        max_num_pvars = max_num_pvars.max(num_pvars);

        rules.push(SyntaxRule { pattern: pat_top, template: tmpl_top, num_pvars, max_level });
    }

    Ok((rules, max_num_pvars))
}
