//! Auto-stubbing test doubles that satisfy any interface.
//!
//! A [`Spy`] answers [`Object::fulfill`](precaution_core::Object::fulfill) by
//! installing a stub for every method an interface asks for, so checking a
//! spy against any interface succeeds. Stubs are backed by [`SpyMethod`]s,
//! which record calls, run handlers and track call-count expectations.
//!
//! ```
//! use precaution_core::Value;
//! use precaution_spy::{spy, SpyMethod};
//!
//! let double = spy();
//! double.method_with("save", SpyMethod::new().returns(true).must_be_called(1, None));
//! assert!(double.verify().is_err());
//!
//! let value = Value::from(double.clone());
//! assert_eq!(value.invoke("save", &[]).unwrap(), Value::from(true));
//! assert!(double.verify().is_ok());
//! ```

mod method;
mod spy;

pub use method::{Expectation, SpyMethod};
pub use spy::{spy, Spy};
