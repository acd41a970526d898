//! Contract errors.
//!
//! [`ContractError`] is the single error type of the engine. It covers
//! contract-definition mistakes (raised while building an interface), shape
//! errors (raised by `Interface::check`), call-time argument and return
//! violations, and spy verification failures. Values that triggered a
//! violation are rendered with [`Value::describe`](crate::Value::describe) so
//! the error stays serializable.

use serde::{Deserialize, Serialize};

use crate::value::TypeTag;

/// Errors produced while building or enforcing contracts.
///
/// Call-time violations nest: a failing argument check is reported as
/// [`ContractError::Argument`] whose `source` is the step's own failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ContractError {
    /// An interface method name starts with the reserved internal prefix.
    #[error("interfaces may not declare methods starting with \"{prefix}\": {name}")]
    ReservedMethodName { name: String, prefix: String },

    /// The same method name was declared twice while building one interface.
    #[error("duplicate method name in interface {interface}: {name}")]
    DuplicateMethod { interface: String, name: String },

    /// A required method is absent on the checked value.
    #[error("required method missing: {name}")]
    MissingMethod { name: String },

    /// A required member exists but is not a function.
    #[error("method not invocable: {name} is {found}")]
    NotInvocable { name: String, found: TypeTag },

    /// A positional argument step rejected the argument at `index`.
    #[error("argument {index} rejected: {source}")]
    Argument {
        index: usize,
        source: Box<ContractError>,
    },

    /// The whole-argument-list step rejected the call.
    #[error("argument list rejected: {source}")]
    Arguments { source: Box<ContractError> },

    /// A return step rejected the produced value.
    #[error("return value rejected: {source}")]
    Return { source: Box<ContractError> },

    #[error("value must be defined, got {found}")]
    Undefined { found: TypeTag },

    #[error("expected a value of type {expected}, got {actual}")]
    TypeMismatch { expected: TypeTag, actual: TypeTag },

    #[error("{actual} is not one of the allowed values")]
    NotEqual { actual: String },

    /// No alternative of an `either` check accepted the value.
    #[error("none of {tried} alternatives matched")]
    NoAlternative { tried: usize },

    /// More than one alternative of an `either` check accepted the value.
    #[error("ambiguous value: {matched} of {tried} alternatives matched")]
    Ambiguous { matched: usize, tried: usize },

    /// A `returns_self` step saw something other than the receiver.
    #[error("expected the receiver to be returned, got {actual}")]
    NotSelf { actual: String },

    /// A spy method expectation was never satisfied.
    #[error("expected calls to {method} did not happen")]
    UnresolvedExpectation { method: String },

    /// A spy method was called more often than its expectation allows.
    #[error("call limit exceeded: at most {max} call(s) allowed")]
    CallLimitExceeded { max: u32 },

    #[error("unknown type tag: '{tag}'")]
    UnknownTypeTag { tag: String },

    /// Free-form failure raised by user predicates and domain methods.
    #[error("{message}")]
    Failed { message: String },
}

impl ContractError {
    /// Shorthand for [`ContractError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        ContractError::Failed {
            message: message.into(),
        }
    }

    /// Strips argument/return wrappers and returns the innermost cause.
    pub fn root_cause(&self) -> &ContractError {
        match self {
            ContractError::Argument { source, .. }
            | ContractError::Arguments { source }
            | ContractError::Return { source } => source.root_cause(),
            other => other,
        }
    }

    /// True for violations raised while a wrapped call was running, as
    /// opposed to definition, shape and verification errors.
    pub fn is_call_violation(&self) -> bool {
        matches!(
            self,
            ContractError::Argument { .. }
                | ContractError::Arguments { .. }
                | ContractError::Return { .. }
                | ContractError::CallLimitExceeded { .. }
        )
    }
}
