use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::value::WireValue;

/// Declares a method the host intends to implement itself.
///
/// When a method is declared as an override, the kernel routes calls to it
/// back to the host as a pending [`Callback`] instead of executing
/// kernel-side logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub method: String,
    /// Opaque host data echoed back with the callback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl Override {
    pub fn method(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            cookie: None,
        }
    }
}

/// One outstanding asynchronous invocation awaiting host-side completion.
///
/// The kernel suspends the original remote call until the host reports an
/// outcome via `complete`: exactly once per cbid, with either an error or
/// a result but never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    pub cbid: String,
    pub objref: Handle,
    pub method: String,
    #[serde(default)]
    pub args: Vec<WireValue>,
}

/// A request forwarded to the kernel.
///
/// Tag names follow the kernel api verbs (`load`, `create`, `del`, `get`,
/// `set`, `sget`, `sset`, `invoke`, `sinvoke`, `complete`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "api", rename_all = "lowercase")]
pub enum KernelRequest {
    Load {
        name: String,
        version: String,
        tarball: String,
    },
    Create {
        fqn: String,
        args: Vec<WireValue>,
        overrides: Vec<Override>,
        interfaces: Vec<String>,
    },
    Del {
        objref: Handle,
    },
    Get {
        objref: Handle,
        property: String,
    },
    Set {
        objref: Handle,
        property: String,
        value: WireValue,
    },
    Sget {
        fqn: String,
        property: String,
    },
    Sset {
        fqn: String,
        property: String,
        value: WireValue,
    },
    Invoke {
        objref: Handle,
        method: String,
        args: Vec<WireValue>,
    },
    Sinvoke {
        fqn: String,
        method: String,
        args: Vec<WireValue>,
    },
    Complete {
        cbid: String,
        err: Option<String>,
        result: Option<WireValue>,
    },
}

impl KernelRequest {
    /// The api verb, for logging.
    pub fn api(&self) -> &'static str {
        match self {
            KernelRequest::Load { .. } => "load",
            KernelRequest::Create { .. } => "create",
            KernelRequest::Del { .. } => "del",
            KernelRequest::Get { .. } => "get",
            KernelRequest::Set { .. } => "set",
            KernelRequest::Sget { .. } => "sget",
            KernelRequest::Sset { .. } => "sset",
            KernelRequest::Invoke { .. } => "invoke",
            KernelRequest::Sinvoke { .. } => "sinvoke",
            KernelRequest::Complete { .. } => "complete",
        }
    }
}

/// A response from the kernel: a plain result, a pending callback, or a
/// kernel-reported failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KernelResponse {
    Callback { callback: Callback },
    Error { error: String },
    Ok { ok: WireValue },
}
