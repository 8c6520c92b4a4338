use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use tether_bridge::BridgeClient;
use tether_wire::{Handle, WireValue};

use crate::descriptor::{ANY, TypeDescriptor};
use crate::error::MarshalError;
use crate::registry::ProxyRegistry;

/// Builds host-side views over wire values coming back from the kernel.
///
/// The factory owns the proxy registry and a shared [`BridgeClient`];
/// proxies it produces keep a reference back to it so their own results
/// can be materialized the same way.
pub struct ProxyFactory {
    client: Arc<BridgeClient>,
    registry: ProxyRegistry,
}

impl ProxyFactory {
    pub fn new(client: Arc<BridgeClient>, registry: ProxyRegistry) -> Self {
        Self { client, registry }
    }

    pub fn client(&self) -> &BridgeClient {
        &self.client
    }

    /// Turn a wire value into its host-side form under a descriptor.
    ///
    /// Handles become proxies via [`ProxyFactory::new_proxy`]. Containers
    /// are shape-checked by [`TypeDescriptor::transform`] first, then
    /// walked so every nested handle is materialized against its element
    /// descriptor. Scalars pass through as plain values.
    pub fn realize(
        self: &Arc<Self>,
        descriptor: &TypeDescriptor,
        value: WireValue,
    ) -> Result<HostValue, MarshalError> {
        match value {
            WireValue::Handle(handle) => self.new_proxy(descriptor, handle),
            other => {
                let checked = descriptor.transform(other)?;
                self.materialize(descriptor, checked)
            }
        }
    }

    fn materialize(
        self: &Arc<Self>,
        descriptor: &TypeDescriptor,
        value: WireValue,
    ) -> Result<HostValue, MarshalError> {
        match (descriptor, value) {
            (TypeDescriptor::ListOf(element), WireValue::Sequence(items)) => items
                .into_iter()
                .map(|item| self.realize(element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(HostValue::List),
            (TypeDescriptor::MapOf(element), WireValue::Map(entries)) => entries
                .into_iter()
                .map(|(key, entry)| self.realize(element, entry).map(|entry| (key, entry)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(HostValue::Map),
            (_, WireValue::Handle(handle)) => self.new_proxy(descriptor, handle),
            (_, other) => Ok(HostValue::Value(other)),
        }
    }

    /// Wrap a kernel handle in the proxy the descriptor calls for.
    ///
    /// Simple descriptors produce an [`ObjectProxy`] whose concrete type
    /// is resolved through the registry (`any` skips resolution and stays
    /// untyped). A sequence descriptor produces a live [`SequenceProxy`]
    /// over the remote collection. Map-backed proxies are not part of this
    /// core.
    pub fn new_proxy(
        self: &Arc<Self>,
        descriptor: &TypeDescriptor,
        handle: Handle,
    ) -> Result<HostValue, MarshalError> {
        match descriptor {
            TypeDescriptor::Simple(simple) => {
                let fqn = if simple.is_any() {
                    ANY.to_string()
                } else {
                    self.registry.resolve(simple.name())?.to_string()
                };
                tracing::debug!(fqn = %fqn, handle = %handle, "Synthesizing object proxy");
                Ok(HostValue::Object(ObjectProxy {
                    handle,
                    fqn,
                    factory: Arc::clone(self),
                }))
            }
            TypeDescriptor::ListOf(element) => Ok(HostValue::Sequence(SequenceProxy {
                handle,
                element: (**element).clone(),
                factory: Arc::clone(self),
            })),
            TypeDescriptor::MapOf(_) => {
                Err(MarshalError::NotImplemented("map-backed proxy synthesis"))
            }
        }
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// A host-side view of a remote object: a handle, the resolved proxy type
/// name, and a way back to the factory so member access returns host
/// values rather than raw wire values.
///
/// Identity is the handle. Two proxies over the same handle compare equal
/// even if created separately.
#[derive(Clone)]
pub struct ObjectProxy {
    handle: Handle,
    fqn: String,
    factory: Arc<ProxyFactory>,
}

impl ObjectProxy {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// The proxy type name this handle was materialized as; [`ANY`] for an
    /// untyped proxy.
    pub fn type_name(&self) -> &str {
        &self.fqn
    }

    pub fn get(
        &self,
        property: &str,
        descriptor: &TypeDescriptor,
    ) -> Result<HostValue, MarshalError> {
        let raw = self.factory.client.get_property(&self.handle, property)?;
        self.factory.realize(descriptor, raw)
    }

    pub fn set(&self, property: &str, value: WireValue) -> Result<(), MarshalError> {
        self.factory
            .client
            .set_property(&self.handle, property, value)?;
        Ok(())
    }

    pub fn call(
        &self,
        method: &str,
        args: Vec<WireValue>,
        returns: &TypeDescriptor,
    ) -> Result<HostValue, MarshalError> {
        let raw = self.factory.client.call_method(&self.handle, method, args)?;
        self.factory.realize(returns, raw)
    }
}

impl fmt::Debug for ObjectProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("handle", &self.handle)
            .field("fqn", &self.fqn)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ObjectProxy {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.fqn == other.fqn
    }
}

/// A live view over a remote sequence, reached through its handle rather
/// than by copying elements across.
///
/// Only size queries are forwarded in this core; positional access and
/// mutation return [`MarshalError::NotImplemented`] so a caller hits a
/// clear error instead of silently stale data.
#[derive(Clone)]
pub struct SequenceProxy {
    handle: Handle,
    element: TypeDescriptor,
    factory: Arc<ProxyFactory>,
}

impl SequenceProxy {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn element(&self) -> &TypeDescriptor {
        &self.element
    }

    /// Number of elements in the remote sequence, read through its
    /// `length` property.
    pub fn len(&self) -> Result<usize, MarshalError> {
        let raw = self.factory.client.get_property(&self.handle, "length")?;
        raw.as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| MarshalError::TypeMismatch {
                expected: "number".to_string(),
                got: raw.shape(),
            })
    }

    pub fn is_empty(&self) -> Result<bool, MarshalError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, _index: usize) -> Result<HostValue, MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy indexed get"))
    }

    pub fn set(&self, _index: usize, _value: WireValue) -> Result<(), MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy indexed set"))
    }

    pub fn insert(&self, _index: usize, _value: WireValue) -> Result<(), MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy insertion"))
    }

    pub fn remove(&self, _index: usize) -> Result<HostValue, MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy removal"))
    }

    pub fn index_of(&self, _value: &WireValue) -> Result<Option<usize>, MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy search"))
    }

    pub fn slice(&self, _from: usize, _to: usize) -> Result<SequenceProxy, MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy sub-range view"))
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<HostValue>, MarshalError> {
        Err(MarshalError::NotImplemented("sequence proxy iteration"))
    }
}

impl fmt::Debug for SequenceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceProxy")
            .field("handle", &self.handle)
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl PartialEq for SequenceProxy {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.element == other.element
    }
}

/// A wire value after materialization: plain data stays data, handles
/// become proxies, containers carry materialized elements.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    Value(WireValue),
    Object(ObjectProxy),
    List(Vec<HostValue>),
    Map(IndexMap<String, HostValue>),
    Sequence(SequenceProxy),
}

impl HostValue {
    pub fn as_value(&self) -> Option<&WireValue> {
        match self {
            HostValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectProxy> {
        match self {
            HostValue::Object(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, HostValue>> {
        match self {
            HostValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceProxy> {
        match self {
            HostValue::Sequence(proxy) => Some(proxy),
            _ => None,
        }
    }
}
