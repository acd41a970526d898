//! Runtime contracts for duck-typed objects.
//!
//! Contracts are built from three layers:
//!
//! - [`Check`]: an ordered pipeline of value steps.
//! - [`Signature`]: argument, argument-list and return steps for one callable.
//! - [`Interface`]: required method names, each bound to a signature.
//!
//! [`Interface::check`] attaches an interface to a value and returns a
//! [`CheckedObject`] exposing only the required methods, each enforcing its
//! signature on every call.
//!
//! # Usage
//!
//! ```
//! use precaution_check::{Check, Interface, Signature, TypeTag, Value, Record};
//!
//! let adder = Interface::named("Adder")
//!     .method_with(
//!         "add",
//!         Signature::builder()
//!             .argument(Check::new().is_defined().has_type_of(TypeTag::Number))
//!             .build(),
//!     )
//!     .unwrap()
//!     .build();
//!
//! let target = Record::builder()
//!     .method("add", |_, args| {
//!         let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
//!         Ok(Value::from(n + 1.0))
//!     })
//!     .build();
//!
//! let checked = adder.check(&target).unwrap();
//! assert_eq!(checked.invoke("add", &[Value::from(1)]).unwrap(), Value::from(2));
//! assert!(checked.invoke("add", &[Value::from("one")]).is_err());
//! ```

pub mod check;
pub mod checked;
pub mod config;
pub mod interface;
pub mod signature;

pub use check::{predicate, Check, Step};
pub use checked::CheckedObject;
pub use config::{ContractConfig, UNNAMED};
pub use interface::{Interface, InterfaceBuilder};
pub use signature::{Signature, SignatureBuilder};

// The value model is part of this crate's API surface.
pub use precaution_core::{
    ContractError, Function, InterfaceId, Object, Record, RecordBuilder, SelfIdentity,
    SignatureId, TypeTag, Value,
};
