use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Shared handle to a scope. Closures hold one to keep their defining scope alive.
pub type Env = Rc<RefCell<Environment>>;

/// One lexical scope: its own bindings plus an optional enclosing scope.
///
/// Lookups walk outward through `enclosing`; writes always land in this
/// scope's own map, never in an ancestor's.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh root scope behind a shared handle.
    pub fn root() -> Env {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// Fresh child scope of `parent` behind a shared handle.
    pub fn child(parent: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    /// Create or overwrite `name` in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Resolve `name` through this scope and its ancestors.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Whether `name` is bound in this scope itself, ignoring ancestors.
    pub fn contains_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Name‑sorted copy of this scope's own bindings.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
