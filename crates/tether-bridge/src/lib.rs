//! Call-forwarding façade for the Tether object bridge.
//!
//! [`BridgeClient`] turns host-side operations (construction, property
//! access, method invocation, callback completion, module loading) into
//! blocking request/response exchanges with the kernel over a
//! [`KernelTransport`]. One channel, strict request ordering, no
//! pipelining; concurrency is achieved by running independent clients over
//! independent channels, never by overlapping calls on one.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tether_bridge::{BridgeClient, StdioTransport};
//! use tether_wire::WireValue;
//!
//! # fn run() -> Result<(), tether_bridge::BridgeError> {
//! let transport = StdioTransport::spawn("tether-kernel", &[])?;
//! let client = BridgeClient::new(transport);
//!
//! client.load_module("acme-widgets", "1.2.3", std::path::Path::new("/tmp/bundle.tgz"))?;
//!
//! let widget = client.create_object("acme-widgets.Widget", vec![WireValue::from(42i64)], vec![], vec![])?;
//! let label = client.get_property(&widget, "label")?;
//!
//! client.delete_object(&widget)?;
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod callback;
pub mod client;
pub mod error;
pub mod transport;

pub use bundle::StagedBundle;
pub use callback::CallbackRegistry;
pub use client::BridgeClient;
pub use error::BridgeError;
pub use transport::{KernelTransport, StdioTransport};
