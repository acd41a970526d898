//! The object model contracts are checked against.
//!
//! Anything exposing named members can be checked: implement [`Object`] for a
//! domain type, or build a [`Record`], the stock duck-typed object holding an
//! ordered set of fields and methods.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use crate::error::ContractError;
use crate::value::{Function, Value};

/// How a `returns_self` contract resolves "the receiver" when an object of
/// this kind is the calling context.
#[derive(Debug, Clone)]
pub enum SelfIdentity {
    /// The returned value must be identical to the receiver itself.
    Receiver,
    /// The returned value must be identical to the wrapped value; the
    /// receiver is handed back in its place.
    Delegate(Value),
    /// Any returned value is accepted; the receiver is handed back.
    Any,
}

/// A value with invocable named members.
///
/// Only `member`, `member_names` and `as_any` are required. The remaining
/// methods let wrappers and test doubles take part in contract enforcement.
pub trait Object: Send + Sync + 'static {
    /// Returns the member called `name`, if present.
    fn member(&self, name: &str) -> Option<Value>;

    /// Names of all members, in a stable order.
    fn member_names(&self) -> Vec<String>;

    /// Identity resolver used by `returns_self` when this object is the
    /// receiver of a wrapped call.
    fn self_identity(&self) -> SelfIdentity {
        SelfIdentity::Receiver
    }

    /// Called by `Interface::check` for every required method before the
    /// shape is validated. Test doubles install stubs here.
    fn fulfill(&self, _method: &str) {}

    /// Name used when the object is rendered in diagnostics.
    fn type_name(&self) -> &str {
        "Object"
    }

    fn as_any(&self) -> &dyn Any;
}

/// A plain object with an immutable, insertion-ordered set of members.
#[derive(Clone, Default)]
pub struct Record {
    members: IndexMap<String, Value>,
}

impl Record {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.members.iter()).finish()
    }
}

impl Object for Record {
    fn member(&self, name: &str) -> Option<Value> {
        self.members.get(name).cloned()
    }

    fn member_names(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    fn type_name(&self) -> &str {
        "Record"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builder for [`Record`]. A later member with the same name replaces the
/// earlier one.
#[derive(Default)]
pub struct RecordBuilder {
    members: IndexMap<String, Value>,
}

impl RecordBuilder {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    /// Adds a method. The closure receives the record itself as receiver.
    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        self.field(name, Function::new(f))
    }

    pub fn build_record(self) -> Record {
        Record {
            members: self.members,
        }
    }

    /// Builds the record and wraps it into an object value.
    pub fn build(self) -> Value {
        Value::object(self.build_record())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A domain object with its own state, implemented by hand.
    struct Counter {
        count: AtomicU64,
        bump: Function,
    }

    impl Counter {
        fn new() -> Self {
            Counter {
                count: AtomicU64::new(0),
                bump: Function::new(|this, _| {
                    let counter = this
                        .downcast::<Counter>()
                        .ok_or_else(|| ContractError::failed("receiver is not a counter"))?;
                    let n = counter.count.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(Value::Number(n as f64))
                }),
            }
        }
    }

    impl Object for Counter {
        fn member(&self, name: &str) -> Option<Value> {
            match name {
                "bump" => Some(Value::Function(self.bump.clone())),
                _ => None,
            }
        }

        fn member_names(&self) -> Vec<String> {
            vec!["bump".to_string()]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn record_members_in_insertion_order() {
        let record = Record::builder()
            .field("b", 1)
            .field("a", 2)
            .method("c", |_, _| Ok(Value::Null))
            .build_record();
        assert_eq!(record.member_names(), vec!["b", "a", "c"]);
        assert_eq!(record.len(), 3);
        assert!(record.member("missing").is_none());
    }

    #[test]
    fn later_member_replaces_earlier() {
        let record = Record::builder().field("a", 1).field("a", 2).build_record();
        assert_eq!(record.len(), 1);
        assert_eq!(record.member("a"), Some(Value::from(2)));
    }

    #[test]
    fn custom_object_keeps_state() {
        let counter = Value::object(Counter::new());
        assert_eq!(counter.invoke("bump", &[]).unwrap(), Value::from(1));
        assert_eq!(counter.invoke("bump", &[]).unwrap(), Value::from(2));
        assert_eq!(counter.type_tag(), crate::value::TypeTag::Object);
    }

    #[test]
    fn default_identity_is_receiver() {
        let record = Record::default();
        assert!(matches!(record.self_identity(), SelfIdentity::Receiver));
    }

    #[test]
    fn downcast_to_concrete_type() {
        let value = Record::builder().field("x", 1).build();
        assert!(value.downcast::<Record>().is_some());
        assert!(value.downcast::<Counter>().is_none());
        assert!(Value::from(1).downcast::<Record>().is_none());
    }
}
