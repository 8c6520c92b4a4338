use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The forwarding channel itself failed. Never retried by this crate.
    #[error("Bridge channel I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge channel serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A failure reported by the kernel, surfaced as-is.
    #[error("Kernel error: {0}")]
    Kernel(String),

    /// The kernel answered with something the protocol does not allow here.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// A host-side contract violation: use of a deleted handle, double
    /// deletion, double completion of a callback, or a malformed
    /// completion. Rejected explicitly, never silently tolerated.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Staging a module bundle for the kernel failed.
    #[error("Failed to stage module bundle: {0}")]
    Extraction(String),

    /// An operation intentionally unimplemented in this core.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}
