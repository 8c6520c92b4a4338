//! End-to-end session over a scripted kernel: load a module, construct an
//! object, read members through descriptors, and materialize a remote
//! collection as a live sequence proxy. The script is raw JSON lines, the
//! way a real kernel answers on its stdout.

use std::sync::{Arc, Mutex};

use tether_bridge::{BridgeClient, BridgeError, KernelTransport};
use tether_marshal::{HostValue, ProxyFactory, ProxyRegistry, TypeDescriptor, TypeSignature};
use tether_wire::{Handle, KernelRequest, KernelResponse, WireValue};

struct ScriptedKernel {
    responses: Mutex<Vec<KernelResponse>>,
    requests: Arc<Mutex<Vec<KernelRequest>>>,
}

impl ScriptedKernel {
    /// Build a kernel that answers each request with the next scripted
    /// JSON line.
    fn new(lines: &[&str]) -> (Self, Arc<Mutex<Vec<KernelRequest>>>) {
        let mut responses: Vec<KernelResponse> = lines
            .iter()
            .map(|line| serde_json::from_str(line).expect("scripted response must parse"))
            .collect();
        responses.reverse();
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                responses: Mutex::new(responses),
                requests: Arc::clone(&requests),
            },
            requests,
        )
    }
}

impl KernelTransport for ScriptedKernel {
    fn roundtrip(&mut self, request: &KernelRequest) -> Result<KernelResponse, BridgeError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| BridgeError::Protocol("script exhausted".to_string()))
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn full_session_against_a_scripted_kernel() {
    init_logging();

    let (kernel, requests) = ScriptedKernel::new(&[
        r#"{"ok":null}"#,
        r#"{"ok":{"$ref":"Widget@10001"}}"#,
        r#"{"ok":"hello"}"#,
        r#"{"ok":{"$ref":"Array@10002"}}"#,
        r#"{"ok":3}"#,
        r#"{"ok":null}"#,
    ]);
    let client = Arc::new(BridgeClient::new(kernel));

    let mut registry = ProxyRegistry::new();
    registry.register_concrete("acme-widgets.Widget");
    let factory = Arc::new(ProxyFactory::new(Arc::clone(&client), registry));

    client
        .load_module("acme-widgets", "1.2.3", std::path::Path::new("/tmp/acme.tgz"))
        .unwrap();

    let handle = client
        .create_object(
            "acme-widgets.Widget",
            vec![WireValue::from(42i64)],
            vec![],
            vec![],
        )
        .unwrap();
    assert_eq!(handle, Handle::new("Widget@10001"));

    let widget = factory
        .new_proxy(
            &TypeDescriptor::simple("acme-widgets.Widget").unwrap(),
            handle.clone(),
        )
        .unwrap();
    let widget = widget.as_object().unwrap();

    let x = widget
        .get("x", &TypeDescriptor::simple("string").unwrap())
        .unwrap();
    assert_eq!(x, HostValue::Value(WireValue::from("hello")));

    let returns = TypeDescriptor::infer(&TypeSignature::parameterized(
        "list",
        vec![TypeSignature::named("number")],
    ))
    .unwrap();
    let list = widget.call("makeList", vec![], &returns).unwrap();
    let list = list.as_sequence().expect("sequence proxy over the remote list");
    assert_eq!(list.handle(), &Handle::new("Array@10002"));
    assert_eq!(list.len().unwrap(), 3);

    client.delete_object(&handle).unwrap();
    let reuse = client.get_property(&handle, "x");
    assert!(matches!(reuse, Err(BridgeError::ContractViolation(_))));

    let recorded = requests.lock().unwrap();
    let verbs: Vec<&str> = recorded.iter().map(KernelRequest::api).collect();
    assert_eq!(verbs, ["load", "create", "get", "invoke", "get", "del"]);
}

#[test]
fn kernel_reported_errors_surface_without_poisoning_the_session() {
    init_logging();

    let (kernel, _requests) = ScriptedKernel::new(&[
        r#"{"error":"no such method: frobnicate"}"#,
        r#"{"ok":"still alive"}"#,
    ]);
    let client = BridgeClient::new(kernel);
    let handle = Handle::new("Widget@1");

    let err = client.call_method(&handle, "frobnicate", vec![]).unwrap_err();
    assert!(matches!(err, BridgeError::Kernel(message) if message.contains("frobnicate")));

    // The channel stays usable for the next exchange.
    let value = client.get_property(&handle, "x").unwrap();
    assert_eq!(value, WireValue::from("still alive"));
}
