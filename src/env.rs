//! A minimal lexical environment, used only to give identifiers a captured
//! scope to compare for hygiene (SPEC_FULL.md section 3.1). This is not an
//! evaluator environment -- it never holds values, only binding frames --
//! modeled after the parent-chained `Rc` environment a host interpreter
//! would already have (see `environment.rs` in the ambient stack notes).

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

struct Frame {
    names: RefCell<HashSet<String>>,
    parent: Option<Environment>,
}

/// A lexical scope frame, cheaply cloneable and compared by identity.
///
/// Two environments are `==` only if they are literally the same frame
/// (`Rc::ptr_eq`), mirroring how a host interpreter's environment equality
/// works: same frame, not same bindings.
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// Creates a fresh top-level environment with no parent.
    pub fn root() -> Self {
        Environment(Rc::new(Frame { names: RefCell::new(HashSet::new()), parent: None }))
    }

    /// Creates a child scope of `self`.
    pub fn child(&self) -> Self {
        Environment(Rc::new(Frame { names: RefCell::new(HashSet::new()), parent: Some(self.clone()) }))
    }

    /// Records that `name` is bound in this frame.
    pub fn bind(&self, name: &str) {
        self.0.names.borrow_mut().insert(name.to_string());
    }

    /// Finds the nearest frame (walking outward from `self`) that binds
    /// `name`, identified by its `Rc` address. `None` means `name` is free
    /// in this environment -- not an error, just an unbound reference.
    fn binding_frame(&self, name: &str) -> Option<*const Frame> {
        if self.0.names.borrow().contains(name) {
            return Some(Rc::as_ptr(&self.0));
        }
        self.0.parent.as_ref().and_then(|p| p.binding_frame(name))
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment({:p})", Rc::as_ptr(&self.0))
    }
}

/// `free-identifier=?`: two identifiers with the same name refer to "the
/// same" binding if they resolve to the same frame, or if both are free
/// (unbound) in their respective environments -- two unbound keywords with
/// the same name, such as the `else` auxiliary keyword of `cond`, are
/// treated as equivalent (SPEC_FULL.md section 4.2, scenario 8.5).
pub fn binding_equivalent(name: &str, env_a: &Environment, env_b: &Environment) -> bool {
    match (env_a.binding_frame(name), env_b.binding_frame(name)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => true,
        _ => false,
    }
}
