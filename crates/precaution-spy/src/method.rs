//! Spied methods: call handlers, call recording and call-count expectations.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use precaution_core::{ContractError, Function, Value};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call-count expectation on one [`SpyMethod`].
///
/// `remaining` counts calls still required and may go negative once the
/// lower bound is met. `allowed` counts calls still permitted when an upper
/// bound was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    remaining: i64,
    allowed: Option<u32>,
    max: Option<u32>,
}

impl Expectation {
    fn new(at_least: u32, at_most: Option<u32>) -> Self {
        Expectation {
            remaining: i64::from(at_least),
            allowed: at_most,
            max: at_most,
        }
    }

    /// True once the lower bound has been satisfied.
    pub fn is_resolved(&self) -> bool {
        self.remaining <= 0
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    fn exhausted(&self) -> bool {
        self.allowed == Some(0)
    }

    fn record(&mut self) {
        self.remaining -= 1;
        if let Some(allowed) = self.allowed.as_mut() {
            *allowed -= 1;
        }
    }
}

/// The recorded behavior of one spied method.
///
/// Built by value, then handed to [`Spy::method_with`](crate::Spy::method_with).
/// Every handler runs on every call, in registration order; the call returns
/// the last handler's result, or undefined when there are none.
#[derive(Default)]
pub struct SpyMethod {
    handlers: Vec<Function>,
    expectations: Mutex<Vec<Expectation>>,
    calls: Mutex<Vec<Vec<Value>>>,
}

impl SpyMethod {
    pub fn new() -> Self {
        SpyMethod::default()
    }

    /// Appends a call handler.
    pub fn when_called<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        self.handlers.push(Function::new(handler));
        self
    }

    /// Appends a handler that always returns `value`.
    pub fn returns(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.when_called(move |_, _| Ok(value.clone()))
    }

    /// Requires at least `at_least` calls and, when `at_most` is given, fails
    /// any call past that many.
    pub fn must_be_called(mut self, at_least: u32, at_most: Option<u32>) -> Self {
        self.expectations
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Expectation::new(at_least, at_most));
        self
    }

    /// Runs one call: enforces upper bounds, records the arguments, then
    /// runs every handler.
    ///
    /// A call rejected by an upper bound is not recorded and runs no handler.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, ContractError> {
        {
            let mut expectations = lock(&self.expectations);
            if let Some(limit) = expectations.iter().find(|e| e.exhausted()) {
                return Err(ContractError::CallLimitExceeded {
                    max: limit.max.unwrap_or_default(),
                });
            }
            for expectation in expectations.iter_mut() {
                expectation.record();
            }
        }
        lock(&self.calls).push(args.to_vec());

        let mut result = Value::Undefined;
        for handler in &self.handlers {
            result = handler.call_with(receiver, args)?;
        }
        Ok(result)
    }

    /// True iff every expectation has resolved.
    pub fn verify(&self) -> bool {
        lock(&self.expectations).iter().all(Expectation::is_resolved)
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Argument lists of every accepted call, oldest first.
    pub fn calls(&self) -> Vec<Vec<Value>> {
        lock(&self.calls).clone()
    }

    pub fn expectations(&self) -> Vec<Expectation> {
        lock(&self.expectations).clone()
    }
}

impl fmt::Debug for SpyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpyMethod")
            .field("handlers", &self.handlers.len())
            .field("expectations", &*lock(&self.expectations))
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn call(method: &SpyMethod) -> Result<Value, ContractError> {
        method.invoke(&Value::Undefined, &[])
    }

    #[test]
    fn no_handlers_returns_undefined() {
        let method = SpyMethod::new();
        assert_eq!(call(&method).unwrap(), Value::Undefined);
        assert!(method.verify());
    }

    #[test]
    fn all_handlers_run_and_last_wins() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let method = SpyMethod::new()
            .when_called(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::from("first"))
            })
            .returns("second");

        assert_eq!(call(&method).unwrap(), Value::from("second"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_errors_propagate() {
        let method = SpyMethod::new()
            .when_called(|_, _| Err(ContractError::failed("boom")))
            .returns(1);
        assert_eq!(call(&method), Err(ContractError::failed("boom")));
    }

    #[test]
    fn handlers_see_receiver_and_arguments() {
        let method = SpyMethod::new().when_called(|this, args| {
            assert_eq!(this, &Value::from("me"));
            Ok(args.get(1).cloned().unwrap_or_default())
        });
        let result = method
            .invoke(&Value::from("me"), &[Value::from(1), Value::from(2)])
            .unwrap();
        assert_eq!(result, Value::from(2));
    }

    #[test]
    fn must_be_called_twice() {
        let method = SpyMethod::new().must_be_called(2, None);
        call(&method).unwrap();
        assert!(!method.verify());
        call(&method).unwrap();
        assert!(method.verify());
        call(&method).unwrap();
        assert!(method.verify());
    }

    #[test]
    fn upper_bound_fails_inside_the_call() {
        let method = SpyMethod::new().must_be_called(1, Some(2));
        call(&method).unwrap();
        call(&method).unwrap();
        assert_eq!(
            call(&method),
            Err(ContractError::CallLimitExceeded { max: 2 })
        );
        assert_eq!(method.call_count(), 2);
        assert!(method.verify());
    }

    #[test]
    fn zero_upper_bound_forbids_calls() {
        let method = SpyMethod::new().must_be_called(0, Some(0));
        assert!(method.verify());
        assert!(call(&method).unwrap_err().is_call_violation());
    }

    #[test]
    fn every_expectation_must_resolve() {
        let method = SpyMethod::new()
            .must_be_called(1, None)
            .must_be_called(3, None);
        call(&method).unwrap();
        assert!(!method.verify());
        let remaining: Vec<i64> = method.expectations().iter().map(|e| e.remaining()).collect();
        assert_eq!(remaining, vec![0, 2]);
    }

    #[test]
    fn records_calls() {
        let method = SpyMethod::new();
        method.invoke(&Value::Undefined, &[Value::from(1)]).unwrap();
        method.invoke(&Value::Undefined, &[]).unwrap();
        assert_eq!(method.calls(), vec![vec![Value::from(1)], vec![]]);
    }
}
