//! Transcriber (SPEC_FULL.md section 4.3, component C4).
//!
//! The mirror image of the matcher: matching grows binding trees
//! depth-first, transcription consumes them with a per-depth index stack.
//! Running off the end of a tree is the termination signal for an
//! ellipsis loop -- there is no separate "count the repetitions first"
//! pass.

use std::rc::Rc;

use crate::expr::Expr;

use super::bindings::MatchVec;
use super::pattern::{Node, SyntaxPattern};

/// Realizes `template` against `mvec`, producing a fresh form. Never
/// mutates `mvec`.
pub fn realize(template: &SyntaxPattern, mvec: &MatchVec, max_level: u16) -> Expr {
    let mut indices = vec![0usize; max_level as usize + 1];
    realize_node(&template.pattern, 0, &mut indices, mvec)
        .expect("a rule's top-level template cannot reference an unbound ellipsis depth")
}

/// Returns `None` when a `PvRef`'s tree is exhausted at the current
/// `indices` -- the `UNBOUND` signal of section 4.3.
fn realize_node(node: &Node, level: u16, indices: &mut [usize], mvec: &MatchVec) -> Option<Expr> {
    match node {
        Node::PvRef(pvref) => {
            let root = mvec.get(pvref.index).root.as_ref()?;
            let value = root.lookup(pvref.level, indices).cloned();
            log::trace!("realize: pvref {:?} at indices {:?} -> {:?}", pvref, indices, value);
            value
        }
        Node::Identifier(id) => Some(Expr::Identifier(id.clone())),
        Node::Atom(value) => Some(value.clone()),
        Node::Nil => Some(Expr::Nil),
        Node::Repeat(_) | Node::FlattenRepeat(_) => {
            unreachable!("a Repeat/FlattenRepeat node only ever sits in the terminal slot of a Pair or Vector")
        }
        Node::Pair(car, cdr) => realize_pair(car, cdr, level, indices, mvec),
        Node::Vector(items) => realize_vector(items, level, indices, mvec),
    }
}

fn realize_pair(car: &Node, cdr: &Node, level: u16, indices: &mut [usize], mvec: &MatchVec) -> Option<Expr> {
    if let Node::Repeat(subpat) = car {
        let spliced = realize_repeat(subpat, indices, mvec);
        return Some(Expr::list(spliced));
    }
    if let Node::FlattenRepeat(subpat) = car {
        return Some(Expr::list(realize_flatten(subpat, indices, mvec)));
    }
    let car_val = realize_node(car, level, indices, mvec)?;
    let cdr_val = realize_node(cdr, level, indices, mvec)?;
    Some(Expr::cons(car_val, cdr_val))
}

/// Realizes a template-only `x ... ...` position (section 8, scenario 4).
///
/// A plain `realize_repeat` can't drive this: the outer dimension has no
/// `PvRef` of its own at `subpat.level - 1` to signal exhaustion (every
/// variable here is declared at `subpat.level`), so a generic "did this
/// iteration succeed" check can't distinguish a legitimately empty row from
/// running off the end of the rows altogether -- both realize as an empty
/// list. Instead this walks the row dimension directly against one of the
/// governing variables' own binding tree, using [`MatchValue::branch_len`]
/// to ask "does row `indices[outer_depth]` exist, and how wide is it" before
/// ever calling into `realize_node` for its columns.
fn realize_flatten(subpat: &SyntaxPattern, indices: &mut [usize], mvec: &MatchVec) -> Vec<Expr> {
    let inner_depth = subpat.level as usize;
    let outer_depth = inner_depth - 1;
    let pvref = match subpat.vars.first() {
        Some(pv) => *pv,
        None => return Vec::new(),
    };
    indices[outer_depth] = 0;
    let mut flat = Vec::new();
    loop {
        let row_len = match mvec.get(pvref.index).root.as_ref() {
            Some(root) => match root.branch_len(outer_depth as u16, indices) {
                Some(len) => len,
                None => {
                    log::trace!("realize: flatten exhausted at row {}", indices[outer_depth]);
                    break;
                }
            },
            None => break,
        };
        log::trace!("realize: flatten row {} has {} columns", indices[outer_depth], row_len);
        for col in 0..row_len {
            indices[inner_depth] = col;
            if let Some(expr) = realize_node(&subpat.pattern, subpat.level, indices, mvec) {
                flat.push(expr);
            }
        }
        indices[outer_depth] += 1;
    }
    flat
}

fn realize_vector(items: &[Node], level: u16, indices: &mut [usize], mvec: &MatchVec) -> Option<Expr> {
    let mut out = Vec::with_capacity(items.len());
    match items.last() {
        Some(Node::Repeat(subpat)) => {
            for item in &items[..items.len() - 1] {
                out.push(realize_node(item, level, indices, mvec)?);
            }
            out.extend(realize_repeat(subpat, indices, mvec));
        }
        _ => {
            for item in items {
                out.push(realize_node(item, level, indices, mvec)?);
            }
        }
    }
    Some(Expr::Vector(Rc::new(out)))
}

/// Loops the repeated child template at depth `subpat.level`, splicing one
/// element per iteration until the first `PvRef` inside exhausts its tree.
/// Ellipsis variables sharing a level thus advance in lockstep.
fn realize_repeat(subpat: &SyntaxPattern, indices: &mut [usize], mvec: &MatchVec) -> Vec<Expr> {
    let depth = subpat.level as usize;
    indices[depth] = 0;
    let mut results = Vec::new();
    loop {
        match realize_node(&subpat.pattern, subpat.level, indices, mvec) {
            Some(expr) => {
                log::trace!("realize: repeat at depth {} iteration {}", depth, indices[depth]);
                results.push(expr);
                indices[depth] += 1;
            }
            None => {
                log::trace!("realize: repeat at depth {} exhausted after {} iterations", depth, indices[depth]);
                break;
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::macro_system::compiler::compile_rules;
    use crate::macro_system::matcher::match_pattern;
    use pretty_assertions::assert_eq;

    fn compile_one_rule(
        pattern_form: Expr,
        template_form: Expr,
    ) -> (SyntaxPattern, SyntaxPattern, u16, u16, Environment) {
        let def_env = Environment::root();
        let rules_form = Expr::list([Expr::list([
            Expr::cons(Expr::Symbol("_".into()), pattern_form),
            template_form,
        ])]);
        let (rules, max_num_pvars) = compile_rules("m", &Expr::Nil, &rules_form, &def_env, 10).unwrap();
        let rule = rules.into_iter().next().unwrap();
        (rule.pattern, rule.template, rule.max_level, max_num_pvars, def_env)
    }

    #[test]
    fn identity_rule_realizes_the_matched_form() {
        let (pattern, template, max_level, num_pvars, _def_env) =
            compile_one_rule(Expr::list([Expr::Symbol("x".into())]), Expr::Symbol("x".into()));
        let env = Environment::root();
        let mut mvec = MatchVec::with_size(num_pvars);
        mvec.reset(num_pvars);
        let form = Expr::list([Expr::Number(42.0)]);
        assert!(match_pattern(&form, &pattern, &env, &mut mvec));
        assert_eq!(realize(&template, &mvec, max_level), Expr::Number(42.0));
    }

    #[test]
    fn flat_ellipsis_rebuilds_a_list_form() {
        let (pattern, template, max_level, num_pvars, def_env) = compile_one_rule(
            Expr::list([Expr::Symbol("x".into()), Expr::Symbol("...".into())]),
            Expr::cons(
                Expr::Symbol("list".into()),
                Expr::list([Expr::Symbol("x".into()), Expr::Symbol("...".into())]),
            ),
        );
        let env = Environment::root();
        let mut mvec = MatchVec::with_size(num_pvars);
        mvec.reset(num_pvars);
        let form = Expr::list([Expr::Number(1.0), Expr::Number(2.0), Expr::Number(3.0)]);
        assert!(match_pattern(&form, &pattern, &env, &mut mvec));
        let result = realize(&template, &mvec, max_level);
        // `list` is a template-inserted free symbol, not a pattern variable
        // or literal, so it comes back wrapped as a hygienic identifier
        // captured in the rule's definition environment, not a bare symbol.
        let list_id = Expr::Identifier(crate::ident::Identifier::new("list", def_env));
        assert_eq!(result, Expr::list([list_id, Expr::Number(1.0), Expr::Number(2.0), Expr::Number(3.0)]));
    }

    #[test]
    fn nested_ellipsis_pairs_each_row_with_its_sublist() {
        // Pattern: ((a b ...) ...) -- one row per top-level element, `a`
        // bound at level 1, `b` bound at level 2. Template: ((list a (b ...)) ...)
        // rebuilds each row as `(list a-value (b-values ...))`. A template
        // like `((b ...) ...)`, which tries to reconstruct `b`'s rows
        // without ever mentioning a level-1 variable in the outer
        // repetition, has no pattern variable at the outer level to signal
        // when to stop -- so this crate (like the grounded matcher it's
        // built from) requires every ellipsis level to be driven by a
        // variable declared at that exact level.
        let row = Expr::list([
            Expr::Symbol("a".into()),
            Expr::Symbol("b".into()),
            Expr::Symbol("...".into()),
        ]);
        let pattern_form = Expr::list([row, Expr::Symbol("...".into())]);
        let template_form = Expr::list([
            Expr::list([
                Expr::Symbol("list".into()),
                Expr::Symbol("a".into()),
                Expr::list([Expr::Symbol("b".into()), Expr::Symbol("...".into())]),
            ]),
            Expr::Symbol("...".into()),
        ]);
        let (pattern, template, max_level, num_pvars, def_env) = compile_one_rule(pattern_form, template_form);
        let env = Environment::root();
        let mut mvec = MatchVec::with_size(num_pvars);
        mvec.reset(num_pvars);
        let form = Expr::list([
            Expr::list([Expr::Number(1.0), Expr::Number(2.0), Expr::Number(3.0)]),
            Expr::list([Expr::Number(4.0), Expr::Number(5.0)]),
            Expr::list([Expr::Number(6.0)]),
        ]);
        assert!(match_pattern(&form, &pattern, &env, &mut mvec));
        let result = realize(&template, &mvec, max_level);
        let list_id = || Expr::Identifier(crate::ident::Identifier::new("list", def_env.clone()));
        assert_eq!(
            result,
            Expr::list([
                Expr::list([list_id(), Expr::Number(1.0), Expr::list([Expr::Number(2.0), Expr::Number(3.0)])]),
                Expr::list([list_id(), Expr::Number(4.0), Expr::list([Expr::Number(5.0)])]),
                Expr::list([list_id(), Expr::Number(6.0), Expr::Nil]),
            ])
        );
    }

    #[test]
    fn vector_template_with_trailing_ellipsis_realizes_a_vector() {
        // Pattern: (a x ...). Template: #(a x ...) -- a fixed leading slot
        // followed by a `...`-repeated tail, realized as a vector rather
        // than a list (the original's `Scm_Error("!!! NOT SUPPORTED YET!!!")`
        // case for template-side vector ellipsis).
        let pattern_form = Expr::list([
            Expr::Symbol("a".into()),
            Expr::Symbol("x".into()),
            Expr::Symbol("...".into()),
        ]);
        let template_form = Expr::Vector(Rc::new(vec![
            Expr::Symbol("a".into()),
            Expr::Symbol("x".into()),
            Expr::Symbol("...".into()),
        ]));
        let (pattern, template, max_level, num_pvars, _def_env) = compile_one_rule(pattern_form, template_form);
        let env = Environment::root();
        let mut mvec = MatchVec::with_size(num_pvars);
        mvec.reset(num_pvars);
        let form = Expr::list([Expr::Number(1.0), Expr::Number(2.0), Expr::Number(3.0)]);
        assert!(match_pattern(&form, &pattern, &env, &mut mvec));
        let result = realize(&template, &mvec, max_level);
        assert_eq!(
            result,
            Expr::Vector(Rc::new(vec![Expr::Number(1.0), Expr::Number(2.0), Expr::Number(3.0)]))
        );
    }

    #[test]
    fn double_ellipsis_flattens_the_rows_away() {
        // Pattern: ((a b ...) ...), same shape as the pairing test above.
        // Template: ((a ...) (b ... ...)) keeps `a`'s rows grouped one per
        // row but flattens every row's `b`s into one shared list, dropping
        // which row each came from.
        let row = Expr::list([Expr::Symbol("a".into()), Expr::Symbol("b".into()), Expr::Symbol("...".into())]);
        let pattern_form = Expr::list([row, Expr::Symbol("...".into())]);
        let template_form = Expr::list([
            Expr::list([Expr::Symbol("a".into()), Expr::Symbol("...".into())]),
            Expr::list([Expr::Symbol("b".into()), Expr::Symbol("...".into()), Expr::Symbol("...".into())]),
        ]);
        let (pattern, template, max_level, num_pvars, _def_env) = compile_one_rule(pattern_form, template_form);
        let env = Environment::root();
        let mut mvec = MatchVec::with_size(num_pvars);
        mvec.reset(num_pvars);
        let form = Expr::list([
            Expr::list([Expr::Number(1.0), Expr::Number(2.0), Expr::Number(3.0)]),
            Expr::list([Expr::Number(4.0), Expr::Number(5.0)]),
            Expr::list([Expr::Number(6.0)]),
        ]);
        assert!(match_pattern(&form, &pattern, &env, &mut mvec));
        let result = realize(&template, &mvec, max_level);
        assert_eq!(
            result,
            Expr::list([
                Expr::list([Expr::Number(1.0), Expr::Number(4.0), Expr::Number(6.0)]),
                Expr::list([Expr::Number(2.0), Expr::Number(3.0), Expr::Number(5.0)]),
            ])
        );
    }
}
