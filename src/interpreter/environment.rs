//! Runtime environment: lexically nested name→value scopes with
//! constant-flag enforcement.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::interpreter::value::Value;

/// Why an assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    Undefined,
    Constant,
}

/// A scope: bindings, the set of constant-flagged names, and a link to
/// the enclosing scope.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    constants: HashSet<String>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            constants: HashSet::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Declare a new binding in this scope. Fails (returns false) if the
    /// name is already bound here; ancestor scopes may shadow freely.
    pub fn declare(&mut self, name: String, value: Value, constant: bool) -> bool {
        if self.values.contains_key(&name) {
            return false;
        }
        if constant {
            self.constants.insert(name.clone());
        }
        self.values.insert(name, value);
        true
    }

    /// Assign to an existing binding, walking the scope chain to its
    /// defining scope. Fails if unbound or constant there.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), AssignError> {
        if self.values.contains_key(name) {
            if self.constants.contains(name) {
                return Err(AssignError::Constant);
            }
            self.values.insert(name.to_string(), value);
            return Ok(());
        }
        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }
        Err(AssignError::Undefined)
    }

    /// Look up a binding, walking the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow().get(name);
        }
        None
    }

    /// Whether a binding exists anywhere in the chain.
    pub fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self
                .enclosing
                .as_ref()
                .is_some_and(|e| e.borrow().is_defined(name))
    }

    /// Whether the name is bound in this scope only.
    pub fn contains_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_get() {
        let mut env = Environment::new();
        assert!(env.declare("x".to_string(), Value::Number(1.0), false));
        assert_eq!(env.get("x"), Some(Value::Number(1.0)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut env = Environment::new();
        assert!(env.declare("x".to_string(), Value::Number(1.0), false));
        assert!(!env.declare("x".to_string(), Value::Number(2.0), false));
    }

    #[test]
    fn test_shadowing_in_child_scope() {
        let parent = Rc::new(RefCell::new(Environment::new()));
        parent
            .borrow_mut()
            .declare("x".to_string(), Value::Number(1.0), false);
        let mut child = Environment::with_enclosing(parent);
        assert!(child.declare("x".to_string(), Value::Number(2.0), false));
        assert_eq!(child.get("x"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_assign_walks_chain() {
        let parent = Rc::new(RefCell::new(Environment::new()));
        parent
            .borrow_mut()
            .declare("x".to_string(), Value::Number(1.0), false);
        let mut child = Environment::with_enclosing(parent.clone());
        assert_eq!(child.assign("x", Value::Number(5.0)), Ok(()));
        assert_eq!(parent.borrow().get("x"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_assign_undefined() {
        let mut env = Environment::new();
        assert_eq!(
            env.assign("x", Value::Null),
            Err(AssignError::Undefined)
        );
    }

    #[test]
    fn test_constant_enforced_in_defining_scope() {
        let parent = Rc::new(RefCell::new(Environment::new()));
        parent
            .borrow_mut()
            .declare("c".to_string(), Value::Number(1.0), true);
        let mut child = Environment::with_enclosing(parent.clone());
        assert_eq!(
            child.assign("c", Value::Number(2.0)),
            Err(AssignError::Constant)
        );
        // No mutation happened.
        assert_eq!(parent.borrow().get("c"), Some(Value::Number(1.0)));
    }
}
