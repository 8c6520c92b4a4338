use serde::{Deserialize, Serialize};

/// The JSON object key that marks a wire object as a handle.
pub const REF_KEY: &str = "$ref";

/// An opaque reference to an object living in the remote kernel.
///
/// A handle is a pure value: it wraps a single identifier minted by the
/// kernel, and equality and hashing consider that identifier only. The
/// host never destroys a handle implicitly; destruction is the explicit
/// `delete_object` operation on the bridge client, and any use after that
/// is a contract violation.
///
/// On the wire a handle is the object `{"$ref": "<id>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    #[serde(rename = "$ref")]
    id: String,
}

impl Handle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The identifier minted by the kernel.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle<{}>", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::hash::{BuildHasher, RandomState};

    #[test]
    fn equality_is_by_identifier_only() {
        let a = Handle::new("obj-1");
        let b = Handle::new("obj-1");
        let c = Handle::new("obj-2");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hashing_is_by_identifier_only() {
        let state = RandomState::new();
        assert_eq!(
            state.hash_one(Handle::new("obj-1")),
            state.hash_one(Handle::new("obj-1"))
        );

        let mut set = HashSet::new();
        set.insert(Handle::new("obj-1"));
        set.insert(Handle::new("obj-1"));
        set.insert(Handle::new("obj-2"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serializes_as_ref_object() {
        let json = serde_json::to_value(Handle::new("obj-7")).unwrap();
        assert_eq!(json, serde_json::json!({ "$ref": "obj-7" }));

        let back: Handle = serde_json::from_value(json).unwrap();
        assert_eq!(back, Handle::new("obj-7"));
    }
}
