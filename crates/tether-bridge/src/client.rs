use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tether_wire::{Callback, Handle, KernelRequest, KernelResponse, Override, WireValue};

use crate::bundle::StagedBundle;
use crate::callback::CallbackRegistry;
use crate::error::BridgeError;
use crate::transport::KernelTransport;

/// The call-forwarding façade over one kernel channel.
///
/// Every public operation is a blocking round-trip: the calling thread
/// holds the channel until the kernel responds. The transport mutex
/// serializes requests, so operations issued through one client are
/// observed by the kernel in issue order. No pipelining, no reordering.
///
/// The client also enforces the host side of the handle contract: a handle
/// that was deleted through this client is rejected on any later use, and
/// a callback cbid can be completed at most once.
pub struct BridgeClient {
    transport: Mutex<Box<dyn KernelTransport>>,
    deleted: Mutex<HashSet<String>>,
    /// (name, version) pairs already loaded; repeat loads are skipped.
    loaded: Mutex<HashSet<(String, String)>>,
    callbacks: CallbackRegistry,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BridgeClient {
    pub fn new(transport: impl KernelTransport + 'static) -> Self {
        Self {
            transport: Mutex::new(Box::new(transport)),
            deleted: Mutex::new(HashSet::new()),
            loaded: Mutex::new(HashSet::new()),
            callbacks: CallbackRegistry::new(),
        }
    }

    /// Load a unit of remote code into the kernel, identified by
    /// name+version. Idempotent per (name, version): repeats are skipped
    /// client-side without touching the channel.
    pub fn load_module(
        &self,
        name: &str,
        version: &str,
        bundle_path: &Path,
    ) -> Result<(), BridgeError> {
        let key = (name.to_string(), version.to_string());
        if lock(&self.loaded).contains(&key) {
            tracing::debug!(name, version, "Module already loaded");
            return Ok(());
        }

        tracing::info!(name, version, path = %bundle_path.display(), "Loading module");

        let response = self.roundtrip(KernelRequest::Load {
            name: name.to_string(),
            version: version.to_string(),
            tarball: bundle_path.display().to_string(),
        })?;
        self.expect_ok(response)?;

        lock(&self.loaded).insert(key);
        Ok(())
    }

    /// Stage `bytes` as a temporary bundle, load it, and delete the staged
    /// copy. Deletion happens on every exit path, success or failure.
    pub fn load_module_bundle(
        &self,
        name: &str,
        version: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), BridgeError> {
        let staged = StagedBundle::stage(file_name, bytes)?;
        self.load_module(name, version, staged.path())
    }

    /// Create a remote object and return its handle.
    ///
    /// `overrides` names methods the host implements itself; the kernel
    /// routes calls to those back as pending callbacks instead of running
    /// kernel-side logic.
    pub fn create_object(
        &self,
        fqn: &str,
        args: Vec<WireValue>,
        overrides: Vec<Override>,
        interfaces: Vec<String>,
    ) -> Result<Handle, BridgeError> {
        tracing::info!(fqn, "Creating remote object");

        let response = self.roundtrip(KernelRequest::Create {
            fqn: fqn.to_string(),
            args,
            overrides,
            interfaces,
        })?;

        match self.expect_ok(response)? {
            WireValue::Handle(handle) => {
                tracing::debug!(fqn, %handle, "Remote object created");
                Ok(handle)
            }
            other => Err(BridgeError::Protocol(format!(
                "create returned a {} instead of an object reference",
                other.shape()
            ))),
        }
    }

    /// Release the kernel-side object. The handle is dead afterwards: any
    /// further operation naming it (including a second delete) is a
    /// contract violation this client rejects.
    pub fn delete_object(&self, handle: &Handle) -> Result<(), BridgeError> {
        self.ensure_live(handle)?;

        let response = self.roundtrip(KernelRequest::Del {
            objref: handle.clone(),
        })?;
        self.expect_ok(response)?;

        lock(&self.deleted).insert(handle.id().to_string());
        tracing::debug!(%handle, "Remote object deleted");
        Ok(())
    }

    pub fn get_property(&self, handle: &Handle, property: &str) -> Result<WireValue, BridgeError> {
        self.ensure_live(handle)?;
        let response = self.roundtrip(KernelRequest::Get {
            objref: handle.clone(),
            property: property.to_string(),
        })?;
        self.expect_ok(response)
    }

    pub fn set_property(
        &self,
        handle: &Handle,
        property: &str,
        value: WireValue,
    ) -> Result<(), BridgeError> {
        self.ensure_live(handle)?;
        let response = self.roundtrip(KernelRequest::Set {
            objref: handle.clone(),
            property: property.to_string(),
            value,
        })?;
        self.expect_ok(response).map(|_| ())
    }

    pub fn get_static_property(&self, fqn: &str, property: &str) -> Result<WireValue, BridgeError> {
        let response = self.roundtrip(KernelRequest::Sget {
            fqn: fqn.to_string(),
            property: property.to_string(),
        })?;
        self.expect_ok(response)
    }

    pub fn set_static_property(
        &self,
        fqn: &str,
        property: &str,
        value: WireValue,
    ) -> Result<(), BridgeError> {
        let response = self.roundtrip(KernelRequest::Sset {
            fqn: fqn.to_string(),
            property: property.to_string(),
            value,
        })?;
        self.expect_ok(response).map(|_| ())
    }

    pub fn call_method(
        &self,
        handle: &Handle,
        method: &str,
        args: Vec<WireValue>,
    ) -> Result<WireValue, BridgeError> {
        self.ensure_live(handle)?;
        let response = self.roundtrip(KernelRequest::Invoke {
            objref: handle.clone(),
            method: method.to_string(),
            args,
        })?;
        self.expect_ok(response)
    }

    pub fn call_static_method(
        &self,
        fqn: &str,
        method: &str,
        args: Vec<WireValue>,
    ) -> Result<WireValue, BridgeError> {
        let response = self.roundtrip(KernelRequest::Sinvoke {
            fqn: fqn.to_string(),
            method: method.to_string(),
            args,
        })?;
        self.expect_ok(response)
    }

    /// Report the outcome of a host-side override back to the kernel.
    ///
    /// Exactly one of `error`/`result` must be present, and each cbid may
    /// be completed at most once; anything else is a contract violation.
    pub fn complete_callback(
        &self,
        cbid: &str,
        error: Option<String>,
        result: Option<WireValue>,
    ) -> Result<(), BridgeError> {
        if error.is_some() == result.is_some() {
            return Err(BridgeError::ContractViolation(format!(
                "completion of callback {cbid} must carry exactly one of error or result"
            )));
        }
        if self.callbacks.is_completed(cbid) {
            return Err(BridgeError::ContractViolation(format!(
                "callback {cbid} completed twice"
            )));
        }

        tracing::debug!(cbid, failed = error.is_some(), "Completing callback");

        let response = self.roundtrip(KernelRequest::Complete {
            cbid: cbid.to_string(),
            err: error,
            result,
        })?;
        self.expect_ok(response)?;

        self.callbacks.mark_completed(cbid);
        Ok(())
    }

    /// Callbacks the kernel reported and the host has not completed yet.
    pub fn pending_callbacks(&self) -> Vec<Callback> {
        self.callbacks.pending()
    }

    /// Begin an asynchronous method call. Async scheduling is a bounded
    /// extension point, not part of this core.
    pub fn begin_async_method(
        &self,
        _handle: &Handle,
        _method: &str,
        _args: Vec<WireValue>,
    ) -> Result<WireValue, BridgeError> {
        Err(BridgeError::NotImplemented("asynchronous method begin"))
    }

    /// Await an asynchronous method result. See [`Self::begin_async_method`].
    pub fn end_async_method(&self, _promise: &WireValue) -> Result<WireValue, BridgeError> {
        Err(BridgeError::NotImplemented("asynchronous method end"))
    }

    fn roundtrip(&self, request: KernelRequest) -> Result<KernelResponse, BridgeError> {
        tracing::trace!(api = request.api(), "Forwarding request");
        lock(&self.transport).roundtrip(&request)
    }

    /// Unwrap a kernel response, surfacing kernel errors and recording any
    /// pending callback the kernel handed back. Synchronous callback
    /// dispatch has no scheduler in this core, so a callback-bearing
    /// response is itself a NotImplemented outcome for the blocked call.
    fn expect_ok(&self, response: KernelResponse) -> Result<WireValue, BridgeError> {
        match response {
            KernelResponse::Ok { ok } => Ok(ok),
            KernelResponse::Error { error } => Err(BridgeError::Kernel(error)),
            KernelResponse::Callback { callback } => {
                tracing::warn!(cbid = %callback.cbid, "Kernel suspended the call on a pending callback");
                self.callbacks.register(callback)?;
                Err(BridgeError::NotImplemented("synchronous callback dispatch"))
            }
        }
    }

    fn ensure_live(&self, handle: &Handle) -> Result<(), BridgeError> {
        if lock(&self.deleted).contains(handle.id()) {
            return Err(BridgeError::ContractViolation(format!(
                "use of deleted {handle}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Scripted kernel stand-in: pops one canned response per round-trip
    /// and records every request it saw.
    pub(crate) struct ScriptedTransport {
        responses: Vec<KernelResponse>,
        pub requests: Arc<Mutex<Vec<KernelRequest>>>,
    }

    impl ScriptedTransport {
        pub fn new(mut responses: Vec<KernelResponse>) -> Self {
            responses.reverse();
            Self {
                responses,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl KernelTransport for ScriptedTransport {
        fn roundtrip(&mut self, request: &KernelRequest) -> Result<KernelResponse, BridgeError> {
            lock(&self.requests).push(request.clone());
            self.responses
                .pop()
                .ok_or_else(|| BridgeError::Protocol("kernel closed the channel".into()))
        }
    }

    fn ok(value: WireValue) -> KernelResponse {
        KernelResponse::Ok { ok: value }
    }

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    #[test]
    fn create_returns_the_minted_handle() {
        init_logging();
        let client = BridgeClient::new(ScriptedTransport::new(vec![ok(WireValue::Handle(
            Handle::new("obj-1"),
        ))]));

        let handle = client
            .create_object("acme.widgets.Widget", vec![WireValue::from(42i64)], vec![], vec![])
            .unwrap();
        assert_eq!(handle, Handle::new("obj-1"));
    }

    #[test]
    fn create_without_an_object_reference_is_a_protocol_error() {
        let client = BridgeClient::new(ScriptedTransport::new(vec![ok(WireValue::from(1i64))]));

        let err = client
            .create_object("acme.widgets.Widget", vec![], vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, BridgeError::Protocol(_)));
    }

    #[test]
    fn kernel_errors_are_surfaced_as_is() {
        let client = BridgeClient::new(ScriptedTransport::new(vec![KernelResponse::Error {
            error: "Module acme not found. Was it loaded?".into(),
        }]));

        let err = client
            .call_static_method("acme.widgets.Widget", "make", vec![])
            .unwrap_err();
        match err {
            BridgeError::Kernel(message) => {
                assert_eq!(message, "Module acme not found. Was it loaded?")
            }
            other => panic!("expected kernel error, got {other:?}"),
        }
    }

    #[test]
    fn operations_work_until_delete_then_are_rejected() {
        let handle = Handle::new("obj-1");
        let client = BridgeClient::new(ScriptedTransport::new(vec![
            ok(WireValue::from("hello")),
            ok(WireValue::Null),
        ]));

        // Behavior before deletion is unaffected.
        assert_eq!(
            client.get_property(&handle, "x").unwrap(),
            WireValue::from("hello")
        );

        client.delete_object(&handle).unwrap();

        // Every post-delete use is an explicit contract violation, without
        // touching the channel.
        for err in [
            client.get_property(&handle, "x").unwrap_err(),
            client.set_property(&handle, "x", WireValue::Null).unwrap_err(),
            client.call_method(&handle, "m", vec![]).unwrap_err(),
            client.delete_object(&handle).unwrap_err(),
        ] {
            assert!(matches!(err, BridgeError::ContractViolation(_)));
        }
    }

    #[test]
    fn load_module_is_idempotent_per_name_and_version() {
        let transport = ScriptedTransport::new(vec![ok(WireValue::Null), ok(WireValue::Null)]);
        let requests = transport.requests.clone();
        let client = BridgeClient::new(transport);

        let path = Path::new("/tmp/acme-widgets@1.2.3.tgz");
        client.load_module("acme-widgets", "1.2.3", path).unwrap();
        client.load_module("acme-widgets", "1.2.3", path).unwrap();

        // Only one load crossed the channel.
        assert_eq!(lock(&requests).len(), 1);

        // A different version is a different unit.
        client.load_module("acme-widgets", "2.0.0", path).unwrap();
        assert_eq!(lock(&requests).len(), 2);
    }

    #[test]
    fn load_module_bundle_cleans_up_the_staged_copy() {
        let transport = ScriptedTransport::new(vec![ok(WireValue::Null)]);
        let requests = transport.requests.clone();
        let client = BridgeClient::new(transport);

        client
            .load_module_bundle("acme-widgets", "1.2.3", "acme-widgets@1.2.3.tgz", b"bytes")
            .unwrap();

        let staged_path = match &lock(&requests)[0] {
            KernelRequest::Load { tarball, .. } => tarball.clone(),
            other => panic!("expected load request, got {other:?}"),
        };
        assert!(!Path::new(&staged_path).exists());
    }

    #[test]
    fn completing_a_callback_twice_is_rejected() {
        let client = BridgeClient::new(ScriptedTransport::new(vec![ok(WireValue::Null)]));

        client
            .complete_callback("cb-1", None, Some(WireValue::from(7i64)))
            .unwrap();

        let err = client
            .complete_callback("cb-1", None, Some(WireValue::from(7i64)))
            .unwrap_err();
        assert!(matches!(err, BridgeError::ContractViolation(_)));
    }

    #[test]
    fn completion_must_carry_exactly_one_outcome() {
        let client = BridgeClient::new(ScriptedTransport::new(vec![]));

        let both = client
            .complete_callback(
                "cb-1",
                Some("boom".into()),
                Some(WireValue::from(7i64)),
            )
            .unwrap_err();
        assert!(matches!(both, BridgeError::ContractViolation(_)));

        let neither = client.complete_callback("cb-1", None, None).unwrap_err();
        assert!(matches!(neither, BridgeError::ContractViolation(_)));
    }

    #[test]
    fn callback_responses_are_registered_and_not_dispatched() {
        let callback = Callback {
            cbid: "cb-9".into(),
            objref: Handle::new("obj-1"),
            method: "onTick".into(),
            args: vec![WireValue::from(1i64)],
        };
        let client = BridgeClient::new(ScriptedTransport::new(vec![
            KernelResponse::Callback {
                callback: callback.clone(),
            },
            ok(WireValue::Null),
        ]));

        let err = client
            .call_method(&Handle::new("obj-1"), "tick", vec![])
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotImplemented(_)));

        assert_eq!(client.pending_callbacks(), vec![callback]);

        // The pending callback can still be completed.
        client
            .complete_callback("cb-9", None, Some(WireValue::Null))
            .unwrap();
        assert!(client.pending_callbacks().is_empty());
    }

    #[test]
    fn async_method_stubs_signal_not_implemented() {
        let client = BridgeClient::new(ScriptedTransport::new(vec![]));
        let handle = Handle::new("obj-1");

        assert!(matches!(
            client.begin_async_method(&handle, "compute", vec![]),
            Err(BridgeError::NotImplemented(_))
        ));
        assert!(matches!(
            client.end_async_method(&WireValue::Null),
            Err(BridgeError::NotImplemented(_))
        ));
    }
}
