use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::object::Object;

/// One lexical scope. Created once per program run and once per function
/// call; `if`/`else` blocks evaluate in the scope they are given.
///
/// Scopes are shared through `Rc<RefCell<_>>` because every closure
/// defined in a scope keeps that scope alive. A binding added later is
/// visible to all of them.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root scope with no enclosing environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// A child scope whose lookups fall back to `outer`.
    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { store: HashMap::new(), outer: Some(outer) }))
    }

    /// Bind `name` in this scope only, replacing any previous local binding.
    pub fn define(&mut self, name: impl Into<String>, val: Object) {
        self.store.insert(name.into(), val);
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(v) => Some(v.clone()),
            None => self.outer.as_ref().and_then(|o| o.borrow().get(name)),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.borrow_mut().define("a", Object::Integer(5));
        assert_eq!(env.borrow().get("a"), Some(Object::Integer(5)));
        assert_eq!(env.borrow().get("b"), None);
    }

    #[test]
    fn redefinition_overwrites() {
        let env = Environment::new();
        env.borrow_mut().define("a", Object::Integer(1));
        env.borrow_mut().define("a", Object::str("one"));
        assert_eq!(env.borrow().get("a"), Some(Object::str("one")));
    }

    #[test]
    fn lookup_walks_enclosing_chain() {
        let root = Environment::new();
        root.borrow_mut().define("x", Object::Integer(1));
        let mid = Environment::new_enclosed(root.clone());
        let leaf = Environment::new_enclosed(mid);
        assert_eq!(leaf.borrow().get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn child_shadows_without_touching_parent() {
        let root = Environment::new();
        root.borrow_mut().define("x", Object::Integer(1));
        let child = Environment::new_enclosed(root.clone());
        child.borrow_mut().define("x", Object::Integer(2));
        assert_eq!(child.borrow().get("x"), Some(Object::Integer(2)));
        assert_eq!(root.borrow().get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn later_parent_bindings_are_visible_to_children() {
        let root = Environment::new();
        let child = Environment::new_enclosed(root.clone());
        assert_eq!(child.borrow().get("late"), None);
        root.borrow_mut().define("late", Object::TRUE);
        assert_eq!(child.borrow().get("late"), Some(Object::TRUE));
    }
}
