//! Dynamic value representation.
//!
//! [`Value`] is what flows through checks, signatures and wrapped calls.
//! Scalars compare by value; functions and objects compare by identity, so
//! two structurally equal records are still different values.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::id::SignatureId;
use crate::object::Object;

/// Runtime type category of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Function,
    Object,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Undefined => "undefined",
            TypeTag::Null => "null",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Function => "function",
            TypeTag::Object => "object",
        }
    }

    /// Undefined and null both count as "no value".
    pub fn is_absent(&self) -> bool {
        matches!(self, TypeTag::Undefined | TypeTag::Null)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undefined" => Ok(TypeTag::Undefined),
            "null" => Ok(TypeTag::Null),
            "boolean" => Ok(TypeTag::Boolean),
            "number" => Ok(TypeTag::Number),
            "string" => Ok(TypeTag::String),
            "function" => Ok(TypeTag::Function),
            "object" => Ok(TypeTag::Object),
            other => Err(ContractError::UnknownTypeTag { tag: other.into() }),
        }
    }
}

/// The callable shape shared by domain methods, stubs and wrapped functions:
/// a receiver plus positional arguments.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, ContractError> + Send + Sync;

/// A shareable callable with pointer identity.
///
/// A function produced by `Signature::check` remembers that signature's id,
/// which is how re-wrapping with the same signature is detected.
#[derive(Clone)]
pub struct Function {
    inner: Arc<NativeFn>,
    contract: Option<SignatureId>,
}

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        Function {
            inner: Arc::new(f),
            contract: None,
        }
    }

    /// Creates a function marked as enforcing the given signature.
    pub fn with_contract<F>(contract: SignatureId, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        Function {
            inner: Arc::new(f),
            contract: Some(contract),
        }
    }

    /// A function that ignores its input and returns undefined.
    pub fn noop() -> Self {
        Function::new(|_, _| Ok(Value::Undefined))
    }

    /// The signature this function enforces, if it was produced by one.
    pub fn contract(&self) -> Option<SignatureId> {
        self.contract
    }

    /// Calls the function with an undefined receiver.
    pub fn call(&self, args: &[Value]) -> Result<Value, ContractError> {
        self.call_with(&Value::Undefined, args)
    }

    pub fn call_with(&self, receiver: &Value, args: &[Value]) -> Result<Value, ContractError> {
        (self.inner)(receiver, args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::as_ptr(&self.inner) as *const () == Arc::as_ptr(&other.inner) as *const ()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

/// A dynamic value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Function),
    Object(Arc<dyn Object>),
}

impl Value {
    /// Wraps an [`Object`] implementation into a fresh value.
    pub fn object<T: Object>(object: T) -> Value {
        Value::Object(Arc::new(object))
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Undefined => TypeTag::Undefined,
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Function(_) => TypeTag::Function,
            Value::Object(_) => TypeTag::Object,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.type_tag().is_absent()
    }

    /// Strict identity: scalars by value, functions and objects by pointer.
    /// `NaN` is not identical to itself.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }

    /// Looks up a named member. Non-objects have no members.
    pub fn member(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(object) => object.member(name),
            _ => None,
        }
    }

    /// Like [`member`](Self::member), but missing members read as undefined.
    pub fn get(&self, name: &str) -> Value {
        self.member(name).unwrap_or_default()
    }

    /// Calls the named member with this value as the receiver.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ContractError> {
        match self.member(name) {
            Some(Value::Function(function)) => function.call_with(self, args),
            Some(other) if !other.is_absent() => Err(ContractError::NotInvocable {
                name: name.to_string(),
                found: other.type_tag(),
            }),
            _ => Err(ContractError::MissingMethod {
                name: name.to_string(),
            }),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Object>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Downcasts an object value to its concrete implementation.
    pub fn downcast<T: Object>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Short rendering used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => format!("{:?}", s),
            Value::Function(_) => "function".to_string(),
            Value::Object(o) => format!("[object {}]", o.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl<T: Object> From<Arc<T>> for Value {
    fn from(object: Arc<T>) -> Self {
        Value::Object(object)
    }
}
