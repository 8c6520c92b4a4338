//! Type-descriptor algebra and proxy synthesis for the Tether object
//! bridge.
//!
//! A [`TypeDescriptor`] states what shape a wire value should have and is
//! built either directly or inferred from a [`TypeSignature`]. Applying a
//! descriptor with [`TypeDescriptor::transform`] is a pure shape check;
//! turning the result into usable host values is the [`ProxyFactory`]'s
//! job, which wraps kernel handles in [`ObjectProxy`]/[`SequenceProxy`]
//! views resolved through an explicit [`ProxyRegistry`].

pub mod descriptor;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod signature;

pub use descriptor::{ANY, SimpleType, TypeDescriptor};
pub use error::MarshalError;
pub use proxy::{HostValue, ObjectProxy, ProxyFactory, SequenceProxy};
pub use registry::ProxyRegistry;
pub use signature::TypeSignature;
