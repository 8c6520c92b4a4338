//! Wire model for the Tether object bridge.
//!
//! Everything that crosses the kernel boundary is defined here: [`Handle`]
//! (an opaque reference to an object living in the kernel), [`WireValue`]
//! (the closed universe of value shapes the channel carries), and the
//! request/response API types exchanged with the kernel.
//!
//! This crate is pure data: no I/O, no transport, no proxies.

pub mod api;
pub mod handle;
pub mod value;

pub use api::{Callback, KernelRequest, KernelResponse, Override};
pub use handle::Handle;
pub use value::WireValue;
