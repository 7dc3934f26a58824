use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ast::Block;
use crate::interpreter::environment::Environment;

pub const INTEGER: &str = "INTEGER";
pub const BOOLEAN: &str = "BOOLEAN";
pub const STRING: &str = "STRING";
pub const NULL: &str = "NULL";
pub const ARRAY: &str = "ARRAY";
pub const HASH: &str = "HASH";
pub const FUNCTION: &str = "FUNCTION";
pub const BUILTIN: &str = "BUILTIN";
pub const RETURN: &str = "RETURN";
pub const BREAK: &str = "BREAK";
pub const CONTINUE: &str = "CONTINUE";
pub const ERROR: &str = "ERROR";

pub type BuiltinFn = fn(&[Value]) -> Value;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// Runtime values. `Return`, `Break`, `Continue` and `Error` are
/// control-flow sentinels threaded through evaluation rather than host
/// exceptions.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Str(Rc<str>),
    Null,
    Array(Rc<Vec<Value>>),
    Hash(Rc<HashValue>),
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
    Return(Box<Value>),
    Break,
    Continue,
    Error(String),
}

/// Stable map key: the value's type tag plus a 64-bit digest. Only
/// integers, booleans and strings are hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: &'static str,
    pub value: u64,
}

#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct HashValue {
    pub pairs: IndexMap<HashKey, HashPair>,
}

pub struct FunctionValue {
    pub params: Vec<Rc<str>>,
    pub body: Block,
    pub env: Rc<Environment>,
}

// The captured environment may transitively contain this function again;
// Debug keeps to the signature to stay cycle-safe.
impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("params", &self.params)
            .field("body", &self.body.to_string())
            .finish_non_exhaustive()
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => INTEGER,
            Value::Boolean(_) => BOOLEAN,
            Value::Str(_) => STRING,
            Value::Null => NULL,
            Value::Array(_) => ARRAY,
            Value::Hash(_) => HASH,
            Value::Function(_) => FUNCTION,
            Value::Builtin(_) => BUILTIN,
            Value::Return(_) => RETURN,
            Value::Break => BREAK,
            Value::Continue => CONTINUE,
            Value::Error(_) => ERROR,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Only `benar` and strictly positive integers are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n > 0,
            _ => false,
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey {
                kind: INTEGER,
                value: *n as u64,
            }),
            Value::Boolean(b) => Some(HashKey {
                kind: BOOLEAN,
                value: u64::from(*b),
            }),
            Value::Str(s) => Some(HashKey {
                kind: STRING,
                value: digest(s),
            }),
            _ => None,
        }
    }

    pub fn is_iterable(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Array(_) | Value::Hash(_))
    }

    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

fn digest(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => f.write_str(if *b { "benar" } else { "salah" }),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("nihil"),
            Value::Array(elements) => {
                let rendered: Vec<String> = elements.iter().map(Value::inspect).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Hash(hash) => {
                let rendered: Vec<String> = hash
                    .pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Function(function) => {
                write!(f, "fn({}) {{\n{}\n}}", function.params.join(", "), function.body)
            }
            Value::Builtin(_) => f.write_str("builtin function"),
            Value::Return(inner) => write!(f, "{}", inner),
            Value::Break => f.write_str("usai"),
            Value::Continue => f.write_str("lanjut"),
            Value::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => {
                a.pairs.len() == b.pairs.len()
                    && a.pairs.iter().all(|(key, pair)| {
                        b.pairs
                            .get(key)
                            .is_some_and(|other| other.value == pair.value)
                    })
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::Break, Value::Break) => true,
            (Value::Continue, Value::Continue) => true,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}
