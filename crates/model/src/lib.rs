//! Object graph model shared by the kwire codec crates.
//!
//! Everything the envelope codec walks lives here: qualified wire names, the per-property
//! descriptors that drive encode and decode order, and the [`Value`] sum type that a decoded
//! document materializes into. Objects and sequences are shared handles, so two slots of a
//! decoded graph can hold the same instance.

#![warn(missing_docs)]

/// Property access errors.
pub mod error;
/// Qualified wire names and local type keys.
pub mod name;
/// Serializable objects and their shared handle.
pub mod object;
/// Property descriptors and flags.
pub mod property;
/// Runtime-declared property bags.
pub mod record;
/// Ordered, resizable value sequences.
pub mod sequence;
/// The value sum type.
pub mod value;

pub use error::PropertyError;
pub use name::{TypeKey, WireName};
pub use object::{ObjectRef, Serializable};
pub use property::{PropertyFlags, PropertyInfo};
pub use record::{Record, RecordSchema};
pub use sequence::{Sequence, SequenceRef};
pub use value::{CustomRef, CustomValue, Opaque, Scalar, Value};
