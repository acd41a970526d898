//! Per-callable contracts.
//!
//! A [`Signature`] describes what a function accepts and returns: ordered
//! positional argument steps, an optional whole-argument-list step, and
//! ordered return steps. [`Signature::check`] wraps a [`Function`] so that
//! every call runs the contract.
//!
//! # Call protocol
//!
//! 1. Positional steps run against the actual arguments in index order. A
//!    replacement substitutes that argument; `None` keeps it. Arguments past
//!    the declared steps pass through untouched. A step whose position has no
//!    argument still runs (against undefined) but adds nothing to the call.
//! 2. The whole-argument-list step sees the substituted list. It validates
//!    only.
//! 3. The wrapped function runs with the substituted arguments and the
//!    original receiver.
//! 4. Return steps run in order over the result, threading replacements.
//!    `returns_self` is resolved through the receiver's
//!    [`SelfIdentity`](precaution_core::SelfIdentity).

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use precaution_core::{ContractError, Function, SelfIdentity, SignatureId, Value};

use crate::check::Step;

type ArgumentsFn = dyn Fn(&[Value]) -> Result<(), ContractError> + Send + Sync;

type Arguments = SmallVec<[Value; 4]>;

enum ReturnStep {
    Value(Arc<dyn Step>),
    SelfIdentity,
}

struct SignatureInner {
    id: SignatureId,
    argument: SmallVec<[Arc<dyn Step>; 4]>,
    arguments: Option<Arc<ArgumentsFn>>,
    returns: Vec<ReturnStep>,
}

/// An immutable, shareable per-callable contract.
#[derive(Clone)]
pub struct Signature {
    inner: Arc<SignatureInner>,
}

impl Signature {
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    /// A signature with no constraints at all.
    pub fn unconstrained() -> Signature {
        SignatureBuilder::default().build()
    }

    pub fn id(&self) -> SignatureId {
        self.inner.id
    }

    /// Number of declared positional argument steps.
    pub fn argument_count(&self) -> usize {
        self.inner.argument.len()
    }

    /// Identity comparison.
    pub fn is(&self, other: &Signature) -> bool {
        self.inner.id == other.inner.id
    }

    /// Wraps `function` so every call enforces this signature.
    ///
    /// A function already produced by this signature is returned as is.
    pub fn check(&self, function: &Function) -> Function {
        if function.contract() == Some(self.id()) {
            return function.clone();
        }
        let signature = self.clone();
        let target = function.clone();
        Function::with_contract(self.id(), move |receiver, args| {
            signature.enforce(&target, receiver, args)
        })
    }

    fn enforce(
        &self,
        target: &Function,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Value, ContractError> {
        tracing::trace!("signature {} invoked with {} argument(s)", self.id(), args.len());
        let args = self.check_arguments(args)?;
        let result = target.call_with(receiver, &args)?;
        self.check_return(receiver, result)
    }

    fn check_arguments(&self, args: &[Value]) -> Result<Arguments, ContractError> {
        let mut checked = Arguments::with_capacity(args.len());
        for (index, step) in self.inner.argument.iter().enumerate() {
            let original = args.get(index).cloned().unwrap_or_default();
            let replacement = step.apply(&original).map_err(|err| {
                tracing::debug!("signature {} rejected argument {}: {}", self.id(), index, err);
                ContractError::Argument {
                    index,
                    source: Box::new(err),
                }
            })?;
            if index < args.len() {
                checked.push(replacement.unwrap_or(original));
            }
        }
        if args.len() > checked.len() {
            checked.extend(args[checked.len()..].iter().cloned());
        }

        if let Some(whole) = &self.inner.arguments {
            whole(checked.as_slice()).map_err(|err| {
                tracing::debug!("signature {} rejected argument list: {}", self.id(), err);
                ContractError::Arguments {
                    source: Box::new(err),
                }
            })?;
        }
        Ok(checked)
    }

    fn check_return(&self, receiver: &Value, result: Value) -> Result<Value, ContractError> {
        let mut current = result;
        for step in &self.inner.returns {
            let outcome = match step {
                ReturnStep::Value(step) => step
                    .apply(&current)
                    .map(|replacement| replacement.unwrap_or(current)),
                ReturnStep::SelfIdentity => resolve_self(receiver, current),
            };
            current = outcome.map_err(|err| {
                tracing::debug!("signature {} rejected return value: {}", self.id(), err);
                ContractError::Return {
                    source: Box::new(err),
                }
            })?;
        }
        Ok(current)
    }
}

/// Resolves a `returns_self` step against the calling context.
fn resolve_self(receiver: &Value, value: Value) -> Result<Value, ContractError> {
    let identity = match receiver {
        Value::Object(object) => object.self_identity(),
        _ => SelfIdentity::Receiver,
    };
    match identity {
        SelfIdentity::Receiver if value.strict_eq(receiver) => Ok(value),
        SelfIdentity::Delegate(delegate) if value.strict_eq(&delegate) => Ok(receiver.clone()),
        SelfIdentity::Any => Ok(receiver.clone()),
        _ => Err(ContractError::NotSelf {
            actual: value.describe(),
        }),
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("id", &self.inner.id)
            .field("arguments", &self.inner.argument.len())
            .field("whole_list", &self.inner.arguments.is_some())
            .field("returns", &self.inner.returns.len())
            .finish()
    }
}

/// Builder for [`Signature`].
#[derive(Default)]
pub struct SignatureBuilder {
    argument: SmallVec<[Arc<dyn Step>; 4]>,
    arguments: Option<Arc<ArgumentsFn>>,
    returns: Vec<ReturnStep>,
}

impl SignatureBuilder {
    /// Appends a positional argument step.
    pub fn argument<S: Step + 'static>(mut self, step: S) -> Self {
        self.argument.push(Arc::new(step));
        self
    }

    /// Sets the whole-argument-list step, replacing any earlier one.
    pub fn arguments<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), ContractError> + Send + Sync + 'static,
    {
        self.arguments = Some(Arc::new(f));
        self
    }

    /// Appends a return step.
    pub fn returns<S: Step + 'static>(mut self, step: S) -> Self {
        self.returns.push(ReturnStep::Value(Arc::new(step)));
        self
    }

    /// Appends a step requiring the call to return its receiver.
    pub fn returns_self(mut self) -> Self {
        self.returns.push(ReturnStep::SelfIdentity);
        self
    }

    pub fn build(self) -> Signature {
        Signature {
            inner: Arc::new(SignatureInner {
                id: SignatureId::fresh(),
                argument: self.argument,
                arguments: self.arguments,
                returns: self.returns,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{predicate, Check};
    use precaution_core::{Record, TypeTag};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn first_argument() -> Function {
        Function::new(|_, args| Ok(args.first().cloned().unwrap_or_default()))
    }

    fn positive() -> Check {
        predicate(|v| {
            if v.as_number().map_or(true, |n| n <= 0.0) {
                Err(ContractError::failed("must be positive"))
            } else {
                Ok(None)
            }
        })
    }

    #[test]
    fn argument_step_rejects_call() {
        let fun = Signature::builder()
            .argument(positive())
            .build()
            .check(&Function::new(|_, _| Ok(Value::from(1))));
        let err = fun.call(&[Value::from(0)]).unwrap_err();
        assert_eq!(
            err,
            ContractError::Argument {
                index: 0,
                source: Box::new(ContractError::failed("must be positive")),
            }
        );
        assert_eq!(fun.call(&[Value::from(1)]).unwrap(), Value::from(1));
    }

    #[test]
    fn argument_step_replacement_is_used() {
        let fun = Signature::builder()
            .argument(predicate(|_| Ok(Some(Value::from(2)))))
            .build()
            .check(&first_argument());
        assert_eq!(fun.call(&[Value::from(1)]).unwrap(), Value::from(2));
    }

    #[test]
    fn argument_step_without_replacement_keeps_argument() {
        let fun = Signature::builder()
            .argument(predicate(|_| Ok(None)))
            .build()
            .check(&first_argument());
        assert_eq!(fun.call(&[Value::from(1)]).unwrap(), Value::from(1));
    }

    #[test]
    fn extra_arguments_pass_through() {
        // Encodes (arity, third argument) so both are visible in the result.
        let seen = Function::new(|_, args| {
            let third = args.get(2).and_then(Value::as_number).unwrap_or(0.0);
            Ok(Value::from(args.len() as f64 * 100.0 + third))
        });
        let fun = Signature::builder()
            .argument(predicate(|_| Ok(Some(Value::from(9)))))
            .build()
            .check(&seen);
        let result = fun
            .call(&[Value::from(1), Value::from(2), Value::from(3)])
            .unwrap();
        assert_eq!(result, Value::from(303));
    }

    #[test]
    fn missing_argument_is_checked_as_undefined() {
        let arity = Function::new(|_, args| Ok(Value::from(args.len() as f64)));
        let fun = Signature::builder()
            .argument(Check::new())
            .argument(Check::new().is_defined())
            .build()
            .check(&arity);
        let err = fun.call(&[Value::from(1)]).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &ContractError::Undefined {
                found: TypeTag::Undefined
            }
        );

        let lenient = Signature::builder()
            .argument(Check::new())
            .argument(predicate(|_| Ok(Some(Value::from("ignored")))))
            .build()
            .check(&arity);
        assert_eq!(lenient.call(&[Value::from(1)]).unwrap(), Value::from(1));
    }

    #[test]
    fn custom_step_types_are_accepted() {
        struct Toggle(Arc<AtomicBool>);

        impl Step for Toggle {
            fn apply(&self, _: &Value) -> Result<Option<Value>, ContractError> {
                if self.0.load(Ordering::SeqCst) {
                    Err(ContractError::failed("toggled"))
                } else {
                    Ok(None)
                }
            }
        }

        let flag = Arc::new(AtomicBool::new(false));
        let fun = Signature::builder()
            .argument(Toggle(flag.clone()))
            .build()
            .check(&Function::new(|_, _| Ok(Value::from(1))));
        assert_eq!(fun.call(&[]).unwrap(), Value::from(1));
        flag.store(true, Ordering::SeqCst);
        assert!(fun.call(&[]).is_err());
    }

    #[test]
    fn whole_argument_list_step() {
        let fun = Signature::builder()
            .arguments(|args| {
                if args.len() != 1 {
                    Err(ContractError::failed("expected exactly one argument"))
                } else {
                    Ok(())
                }
            })
            .build()
            .check(&Function::new(|_, _| Ok(Value::from(1))));
        assert!(matches!(
            fun.call(&[]),
            Err(ContractError::Arguments { .. })
        ));
        assert_eq!(fun.call(&[Value::from(1)]).unwrap(), Value::from(1));
    }

    #[test]
    fn whole_argument_list_sees_substituted_arguments() {
        let fun = Signature::builder()
            .argument(predicate(|_| Ok(Some(Value::from("replaced")))))
            .arguments(|args| {
                if args[0] == Value::from("replaced") {
                    Ok(())
                } else {
                    Err(ContractError::failed("saw original"))
                }
            })
            .build()
            .check(&first_argument());
        assert_eq!(fun.call(&[Value::from(1)]).unwrap(), Value::from("replaced"));
    }

    #[test]
    fn last_whole_list_step_wins() {
        let fun = Signature::builder()
            .arguments(|_| Err(ContractError::failed("first")))
            .arguments(|_| Ok(()))
            .build()
            .check(&Function::noop());
        assert!(fun.call(&[]).is_ok());
    }

    #[test]
    fn return_steps_chain() {
        let fun = Signature::builder()
            .returns(positive())
            .returns(predicate(|v| Ok(Some(Value::from(v.as_number().unwrap_or(0.0) * 2.0)))))
            .build()
            .check(&first_argument());
        assert!(matches!(
            fun.call(&[Value::from(0)]),
            Err(ContractError::Return { .. })
        ));
        assert_eq!(fun.call(&[Value::from(1)]).unwrap(), Value::from(2));
    }

    #[test]
    fn underlying_failure_propagates_unchanged() {
        let fun = Signature::builder()
            .returns(positive())
            .build()
            .check(&Function::new(|_, _| Err(ContractError::failed("domain"))));
        assert_eq!(fun.call(&[]), Err(ContractError::failed("domain")));
    }

    #[test]
    fn returns_self_on_plain_receiver() {
        let signature = Signature::builder().returns_self().build();
        let me = signature.check(&Function::new(|this, _| Ok(this.clone())));
        let other = signature.check(&Function::new(|_, _| Ok(Value::from(1))));
        let receiver = Record::builder().build();

        assert!(me.call_with(&receiver, &[]).unwrap().strict_eq(&receiver));
        assert_eq!(
            other.call_with(&receiver, &[]).unwrap_err().root_cause(),
            &ContractError::NotSelf {
                actual: "1".into()
            }
        );
    }

    #[test]
    fn check_is_idempotent_for_the_same_signature() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let signature = Signature::builder()
            .argument(predicate(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }))
            .build();

        let once = signature.check(&Function::noop());
        let twice = signature.check(&once);
        assert!(once.ptr_eq(&twice));

        twice.call(&[Value::from(1)]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_signatures_stack() {
        let a = Signature::builder().build();
        let b = Signature::builder().build();
        assert!(!a.is(&b));

        let wrapped = b.check(&a.check(&Function::noop()));
        assert_eq!(wrapped.contract(), Some(b.id()));
    }

    #[test]
    fn rejection_message_names_position_and_cause() {
        let fun = Signature::builder()
            .argument(Check::new())
            .argument(Check::new().has_type_of(TypeTag::Number))
            .build()
            .check(&Function::noop());
        let err = fun.call(&[Value::Null, Value::from("two")]).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"argument 1 rejected: expected a value of type number, got string"
        );
    }

    #[test]
    fn debug_shows_shape() {
        let signature = Signature::builder()
            .argument(Check::new())
            .returns_self()
            .build();
        let rendered = format!("{:?}", signature);
        assert!(rendered.contains("arguments: 1"));
        assert!(rendered.contains("returns: 1"));
        assert_eq!(signature.argument_count(), 1);
    }
}
