//! The generic datum type the macro core is specified over.
//!
//! A host's reader produces these from source text; this crate never parses
//! text itself (see the crate-level docs). Lists are represented the way
//! Scheme readers actually build them -- chains of [`Expr::Pair`] terminated
//! by [`Expr::Nil`] -- rather than as `Vec<Expr>`, because the matcher and
//! transcriber need to walk and splice along the cons spine (SPEC_FULL.md
//! section 4.2, 4.3).

use std::fmt;
use std::rc::Rc;

use crate::ident::Identifier;

/// A Scheme-like datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The empty list `()`.
    Nil,
    /// `#t` / `#f`.
    Bool(bool),
    /// A numeric literal. Scheme's numeric tower is out of scope; `f64` is
    /// enough to exercise matching and transcription by value.
    Number(f64),
    /// A string literal.
    Str(String),
    /// A character literal.
    Char(char),
    /// A bare use-site symbol, not yet wrapped for hygiene.
    Symbol(String),
    /// A hygiene-wrapped identifier: a symbol paired with a captured
    /// environment (SPEC_FULL.md section 3.1).
    Identifier(Identifier),
    /// A cons cell.
    Pair(Rc<Expr>, Rc<Expr>),
    /// A vector literal.
    Vector(Rc<Vec<Expr>>),
}

impl Expr {
    /// Builds a proper list from `items`.
    pub fn list(items: impl IntoIterator<Item = Expr, IntoIter: DoubleEndedIterator>) -> Expr {
        Self::dotted(items, Expr::Nil)
    }

    /// Builds a list whose final cdr is `tail` instead of `Nil`.
    pub fn dotted(
        items: impl IntoIterator<Item = Expr, IntoIter: DoubleEndedIterator>,
        tail: Expr,
    ) -> Expr {
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| Expr::cons(item, acc))
    }

    /// Conses `car` onto `cdr`.
    pub fn cons(car: Expr, cdr: Expr) -> Expr {
        Expr::Pair(Rc::new(car), Rc::new(cdr))
    }

    /// Returns `true` for `Nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Expr::Nil)
    }

    /// Returns `true` for a pair.
    pub fn is_pair(&self) -> bool {
        matches!(self, Expr::Pair(..))
    }

    /// Returns `(car, cdr)` if this is a pair.
    pub fn as_pair(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Pair(car, cdr) => Some((car, cdr)),
            _ => None,
        }
    }

    /// Returns the bare symbol name, whether the form is a raw `Symbol` or
    /// an already-hygienic `Identifier`.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            Expr::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }

    /// Walks a (possibly improper) list, returning its elements and the
    /// final tail (`Nil` for a proper list). Mirrors `length` from
    /// SPEC_FULL.md section 6.1, except it never fails on improper lists --
    /// it just reports the dangling tail instead of `-1`.
    pub fn to_vec(&self) -> (Vec<Expr>, Expr) {
        let mut items = Vec::new();
        let mut cur = self.clone();
        loop {
            match cur {
                Expr::Pair(car, cdr) => {
                    items.push((*car).clone());
                    cur = (*cdr).clone();
                }
                other => return (items, other),
            }
        }
    }

    /// `length` from SPEC_FULL.md section 6.1: `Some(n)` for a proper list
    /// of length `n`, `None` for an improper (or non-list) tail.
    pub fn list_length(&self) -> Option<usize> {
        let (items, tail) = self.to_vec();
        if tail.is_nil() { Some(items.len()) } else { None }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nil => write!(f, "()"),
            Expr::Bool(b) => write!(f, "#{}", if *b { "t" } else { "f" }),
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Str(s) => write!(f, "\"{s}\""),
            Expr::Char(c) => write!(f, "#\\{c}"),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Identifier(id) => write!(f, "{}", id.name),
            Expr::Vector(items) => {
                write!(f, "#(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Expr::Pair(..) => {
                write!(f, "(")?;
                let (items, tail) = self.to_vec();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                if !tail.is_nil() {
                    write!(f, " . {tail}")?;
                }
                write!(f, ")")
            }
        }
    }
}
