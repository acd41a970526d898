//! Composable value checks.
//!
//! A [`Check`] is an ordered pipeline of [`Step`]s. Each step sees the value
//! produced by the previous one and may reject it, replace it, or leave it
//! alone. Checks are used standalone, as signature argument/return steps, and
//! nested inside each other.

use std::fmt;
use std::sync::Arc;

use precaution_core::{ContractError, TypeTag, Value};

use crate::interface::Interface;
use crate::signature::Signature;

/// A single validation or transformation applied to a value.
///
/// Returning `Ok(Some(v))` replaces the value with `v`; `Ok(None)` keeps it.
pub trait Step: Send + Sync {
    fn apply(&self, value: &Value) -> Result<Option<Value>, ContractError>;
}

struct Predicate<F>(F);

impl<F> Step for Predicate<F>
where
    F: Fn(&Value) -> Result<Option<Value>, ContractError> + Send + Sync,
{
    fn apply(&self, value: &Value) -> Result<Option<Value>, ContractError> {
        (self.0)(value)
    }
}

/// An ordered pipeline of steps.
///
/// Built by value; once moved into a signature or another check it is never
/// modified again.
#[derive(Clone, Default)]
pub struct Check {
    steps: Vec<Arc<dyn Step>>,
}

impl Check {
    pub fn new() -> Self {
        Check::default()
    }

    /// Appends a closure step.
    pub fn predicate<F>(self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Option<Value>, ContractError> + Send + Sync + 'static,
    {
        self.step(Predicate(f))
    }

    /// Appends any [`Step`], including another `Check`.
    pub fn step<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Rejects undefined and null.
    pub fn is_defined(self) -> Self {
        self.predicate(|value| {
            if value.is_absent() {
                Err(ContractError::Undefined {
                    found: value.type_tag(),
                })
            } else {
                Ok(None)
            }
        })
    }

    /// Requires the value to satisfy `interface`; the checked object replaces
    /// the value.
    pub fn has_interface(self, interface: &Interface) -> Self {
        let interface = interface.clone();
        self.predicate(move |value| interface.check(value).map(Some))
    }

    /// Requires a function; the function wrapped by `signature` replaces it.
    pub fn has_signature(self, signature: &Signature) -> Self {
        let signature = signature.clone();
        self.predicate(move |value| match value {
            Value::Function(function) => Ok(Some(Value::Function(signature.check(function)))),
            other => Err(ContractError::TypeMismatch {
                expected: TypeTag::Function,
                actual: other.type_tag(),
            }),
        })
    }

    /// Requires the type category `tag`. Absent values always pass.
    pub fn has_type_of(self, tag: TypeTag) -> Self {
        self.predicate(move |value| {
            let actual = value.type_tag();
            if actual.is_absent() || actual == tag {
                Ok(None)
            } else {
                Err(ContractError::TypeMismatch {
                    expected: tag,
                    actual,
                })
            }
        })
    }

    /// Requires the value to be strictly identical to one of `options`.
    pub fn equals<I, V>(self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let options: Vec<Value> = options.into_iter().map(Into::into).collect();
        self.predicate(move |value| {
            if options.iter().any(|option| option.strict_eq(value)) {
                Ok(None)
            } else {
                Err(ContractError::NotEqual {
                    actual: value.describe(),
                })
            }
        })
    }

    /// Requires exactly one of `checks` to accept the value and adopts that
    /// check's result. Every alternative runs against the original value.
    pub fn either<I>(self, checks: I) -> Self
    where
        I: IntoIterator<Item = Check>,
    {
        let alternatives: Vec<Check> = checks.into_iter().collect();
        self.predicate(move |value| {
            let tried = alternatives.len();
            let mut accepted: Vec<Value> = alternatives
                .iter()
                .filter_map(|alternative| alternative.run(value.clone()).ok())
                .collect();
            match accepted.len() {
                1 => Ok(accepted.pop()),
                0 => Err(ContractError::NoAlternative { tried }),
                matched => Err(ContractError::Ambiguous { matched, tried }),
            }
        })
    }

    /// Runs every step in order and returns the final value.
    pub fn run(&self, value: Value) -> Result<Value, ContractError> {
        let mut current = value;
        for step in &self.steps {
            if let Some(replacement) = step.apply(&current)? {
                current = replacement;
            }
        }
        Ok(current)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Step for Check {
    fn apply(&self, value: &Value) -> Result<Option<Value>, ContractError> {
        self.run(value.clone()).map(Some)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Shorthand for `Check::new().predicate(f)`.
pub fn predicate<F>(f: F) -> Check
where
    F: Fn(&Value) -> Result<Option<Value>, ContractError> + Send + Sync + 'static,
{
    Check::new().predicate(f)
}
