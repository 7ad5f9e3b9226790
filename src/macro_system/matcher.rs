//! Matcher (SPEC_FULL.md section 4.2, component C3).

use crate::env::Environment;
use crate::expr::Expr;

use super::bindings::MatchVec;
use super::pattern::{Node, SyntaxPattern};

/// Matches `form` against `pattern`, filling `mvec` with bindings for every
/// `PvRef` reachable in `pattern` on success.
///
/// Returns `false` on the first structural mismatch; `mvec` is then garbage
/// and must be reset before the caller tries another rule. This function
/// never errors -- matching failure is not a `MacroError`, only a signal to
/// try the next rule (section 4.2, "Failure").
pub fn match_pattern(form: &Expr, pattern: &SyntaxPattern, use_env: &Environment, mvec: &mut MatchVec) -> bool {
    match_node(form, &pattern.pattern, use_env, mvec)
}

fn match_node(form: &Expr, node: &Node, use_env: &Environment, mvec: &mut MatchVec) -> bool {
    match node {
        Node::PvRef(pvref) => {
            log::trace!("match: binding pvref {:?} <- {form}", pvref);
            mvec.get_mut(pvref.index).insert_leaf(pvref.level, form.clone());
            true
        }
        Node::Identifier(id) => match form {
            Expr::Symbol(name) => id.binding_equivalent_to_symbol(name, use_env),
            Expr::Identifier(other) => id.binding_equivalent(other),
            _ => false,
        },
        Node::Repeat(subpat) => match_subpattern(form, subpat, use_env, mvec),
        // Never produced on the pattern side (the compiler rejects `x ... ...`
        // there), but matches like an ordinary repeat if it ever shows up.
        Node::FlattenRepeat(subpat) => match_subpattern(form, subpat, use_env, mvec),
        Node::Pair(car, cdr) => match_pair(form, car, cdr, use_env, mvec),
        Node::Nil => form.is_nil(),
        Node::Vector(elements) => match_vector(form, elements, use_env, mvec),
        Node::Atom(expected) => form == expected,
    }
}

fn match_pair(form: &Expr, car: &Node, cdr: &Node, use_env: &Environment, mvec: &mut MatchVec) -> bool {
    if let Node::Repeat(subpat) = car {
        debug_assert!(matches!(cdr, Node::Nil), "a repeat slot is always the spine's last element");
        return match_subpattern(form, subpat, use_env, mvec);
    }
    match form.as_pair() {
        Some((car_form, cdr_form)) => match_node(car_form, car, use_env, mvec) && match_node(cdr_form, cdr, use_env, mvec),
        None => false,
    }
}

/// Implements the "Subpattern protocol" of section 4.2: enter, iterate the
/// incoming list element-wise, then exit -- extending every governed
/// `PvRef`'s tree by one level.
///
/// `enter`/`exit` fire for every `PvRef` in `subpat.vars`, not only the ones
/// declared at `subpat.level`. A variable declared deeper than this
/// subpattern still has it listed here (pattern variables merge upward into
/// every enclosing subpattern), and this activation's frame is exactly the
/// row that variable's own, more deeply nested activations accumulate into
/// -- one row per iteration of this loop. A variable declared at exactly
/// this level has its single frame opened once and filled directly by
/// `insert_leaf` across every iteration, with no intervening enter/exit.
fn match_subpattern(form: &Expr, subpat: &SyntaxPattern, use_env: &Environment, mvec: &mut MatchVec) -> bool {
    for pv in &subpat.vars {
        mvec.get_mut(pv.index).enter();
    }

    let (elements, tail) = form.to_vec();
    let mut ok = tail.is_nil();
    if ok {
        for element in &elements {
            if !match_node(element, &subpat.pattern, use_env, mvec) {
                ok = false;
                break;
            }
        }
    }

    if ok {
        for pv in &subpat.vars {
            mvec.get_mut(pv.index).exit();
        }
    }

    ok
}

fn match_vector(form: &Expr, elements: &[Node], use_env: &Environment, mvec: &mut MatchVec) -> bool {
    let form_items = match form {
        Expr::Vector(items) => items,
        _ => return false,
    };

    match elements.last() {
        Some(Node::Repeat(subpat)) => {
            let fixed = &elements[..elements.len() - 1];
            if form_items.len() < fixed.len() {
                return false;
            }
            for (pattern_elem, form_elem) in fixed.iter().zip(form_items.iter()) {
                if !match_node(form_elem, pattern_elem, use_env, mvec) {
                    return false;
                }
            }
            let rest = Expr::list(form_items[fixed.len()..].iter().cloned());
            match_subpattern(&rest, subpat, use_env, mvec)
        }
        _ => {
            if form_items.len() != elements.len() {
                return false;
            }
            elements
                .iter()
                .zip(form_items.iter())
                .all(|(pattern_elem, form_elem)| match_node(form_elem, pattern_elem, use_env, mvec))
        }
    }
}
