use thiserror::Error;

use tether_bridge::BridgeError;

#[derive(Debug, Error)]
pub enum MarshalError {
    /// A descriptor was built over an incompatible shape. Fails at
    /// construction, never at use.
    #[error("Illegal descriptor construction: {0}")]
    DescriptorConstruction(String),

    /// A wire value's runtime shape disagrees with the descriptor applied
    /// to it during transform.
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: &'static str },

    /// A type signature cannot be mapped to any descriptor.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// No concrete proxy association exists for an abstract type being
    /// materialized from a handle.
    #[error("Cannot create a proxy for {0}: no concrete proxy type is registered")]
    ProxyUnavailable(String),

    /// An operation intentionally unimplemented in this core.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// A proxy operation failed in the forwarding channel underneath.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
