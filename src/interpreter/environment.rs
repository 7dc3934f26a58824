use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub type Env = Rc<Environment>;

/// A lexical frame: name bindings plus an optional pointer to the
/// enclosing frame. `get` walks the chain outward; `set` always writes
/// the current frame.
#[derive(Debug, Default)]
pub struct Environment {
    store: RefCell<HashMap<Rc<str>, Value>>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Env {
        Rc::new(Environment::default())
    }

    pub fn enclosed(outer: Env) -> Env {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.borrow().get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    pub fn set(&self, name: Rc<str>, value: Value) {
        self.store.borrow_mut().insert(name, value);
    }
}
