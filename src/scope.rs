//! Hierarchical variable scopes with shadowing lookup.
//!
//! Every template node owns a [`Scope`]. Assigning a child to a layout links
//! the child scope's parent handle to the layout's scope, forming a chain
//! that is walked lazily on [`Scope::resolve`]: the nearest scope wins for
//! duplicate keys, and changes made to an ancestor after linking remain
//! visible to descendants that have not locally overridden the same key.
//!
//! The parent link is non-owning ([`Weak`]). If the parent scope is dropped,
//! resolution simply stops at the orphaned scope instead of dangling.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::error::{DocweaveError, Result};

/// A cheap, cloneable handle to a variable scope.
///
/// Cloning the handle shares the underlying scope; there is no deep copy.
/// Scopes are single-threaded by construction (`Rc`/`RefCell`).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

#[derive(Debug, Default)]
struct ScopeInner {
    variables: HashMap<String, String>,
    parent: Weak<RefCell<ScopeInner>>,
}

impl Scope {
    /// Creates an empty scope with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a variable in this scope's local map.
    ///
    /// Only the local map is touched; ancestors are never written through.
    /// There is no removal operation: once assigned, a key persists for the
    /// scope's lifetime.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::InvalidArgument`] if `name` is empty.
    pub fn assign(&self, name: &str, value: impl Into<String>) -> Result<()> {
        if name.is_empty() {
            return Err(DocweaveError::invalid_argument("variable name must not be empty"));
        }
        self.inner.borrow_mut().variables.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Links this scope to a parent scope.
    ///
    /// The link is non-owning; dropping the parent orphans this scope
    /// without invalidating it. Re-linking replaces the previous parent.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::ScopeCycle`] if `parent` is the same underlying
    /// scope instance as `self`. Longer cycles are not detected here; tree
    /// discipline is the caller's responsibility. On error the scope is
    /// left unchanged.
    pub fn set_parent(&self, parent: &Scope) -> Result<()> {
        if Rc::ptr_eq(&self.inner, &parent.inner) {
            return Err(DocweaveError::ScopeCycle);
        }
        self.inner.borrow_mut().parent = Rc::downgrade(&parent.inner);
        Ok(())
    }

    /// Computes the shadow-merged view of this scope chain.
    ///
    /// Own entries first, then the parent's *already-resolved* entries
    /// added only for keys not yet present, so the nearest scope wins. The
    /// view is computed on demand and never cached.
    pub fn resolve(&self) -> HashMap<String, String> {
        let inner = self.inner.borrow();
        let mut resolved = inner.variables.clone();
        if let Some(parent) = inner.parent.upgrade() {
            let parent = Scope { inner: parent };
            for (key, value) in parent.resolve() {
                resolved.entry(key).or_insert(value);
            }
        }
        resolved
    }

    /// Looks a single variable up through the chain.
    pub fn get(&self, name: &str) -> Option<String> {
        self.resolve().remove(name)
    }

}

/// Value equality over the resolved view, used by the template-model
/// equality contract.
impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.resolve() == other.resolve()
    }
}
