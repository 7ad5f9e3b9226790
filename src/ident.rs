//! Hygienic identifiers: a symbol paired with the environment it was
//! captured in (SPEC_FULL.md section 3.1).

use crate::env::{self, Environment};

/// A symbol wrapped with its captured definition environment. Free
/// identifiers inserted by a template (symbols that are neither pattern
/// variables nor literals) are minted as `Identifier`s at compile time,
/// which is how this crate establishes hygiene without a whole-tree
/// renaming pass: the identifier simply carries its origin with it.
#[derive(Debug, Clone)]
pub struct Identifier {
    /// The identifier's name.
    pub name: String,
    /// The environment it was captured in.
    pub env: Environment,
}

impl Identifier {
    /// Wraps `name` with `env`.
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Identifier { name: name.into(), env }
    }

    /// Identifier-vs-identifier match: same name, and the exact same
    /// captured environment -- not merely "both free somewhere". Mirrors the
    /// original's literal `id->env == SCM_IDENTIFIER(obj)->env` pointer
    /// comparison (`examples/original_source/src/macro.c:579-583`), which is
    /// stricter than the use-site `free-identifier=?` walk in
    /// [`env::binding_equivalent`] -- two unrelated, unbound captures are
    /// different environments and so do not match here.
    pub fn binding_equivalent(&self, other: &Identifier) -> bool {
        self.name == other.name && self.env == other.env
    }

    /// `free-identifier=?` against a bare use-site symbol evaluated in
    /// `use_env`: same name, and equivalent binding.
    pub fn binding_equivalent_to_symbol(&self, name: &str, use_env: &Environment) -> bool {
        self.name == name && env::binding_equivalent(name, &self.env, use_env)
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.env == other.env
    }
}
