use std::collections::{HashMap, HashSet};

use crate::error::MarshalError;

/// Explicit table of which host proxy type stands in for each bridged
/// type name.
///
/// Resolution is a plain table lookup: abstract names map to the concrete
/// proxy registered for them, concrete names resolve to themselves, and
/// everything else is a hard [`MarshalError::ProxyUnavailable`]. There is
/// no runtime discovery and no fallback chain.
#[derive(Debug, Default)]
pub struct ProxyRegistry {
    interfaces: HashMap<String, String>,
    concrete: HashSet<String>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate an abstract (interface or abstract-class) type name with
    /// the concrete proxy that represents it. Re-registration replaces the
    /// previous association.
    pub fn register_interface(
        &mut self,
        abstract_fqn: impl Into<String>,
        proxy_fqn: impl Into<String>,
    ) {
        let abstract_fqn = abstract_fqn.into();
        let proxy_fqn = proxy_fqn.into();
        tracing::debug!(
            abstract_fqn = %abstract_fqn,
            proxy_fqn = %proxy_fqn,
            "Registering interface proxy"
        );
        self.interfaces.insert(abstract_fqn, proxy_fqn);
    }

    /// Mark a type name as directly instantiable; it resolves to itself.
    pub fn register_concrete(&mut self, fqn: impl Into<String>) {
        self.concrete.insert(fqn.into());
    }

    pub fn resolve<'a>(&'a self, fqn: &'a str) -> Result<&'a str, MarshalError> {
        if let Some(proxy_fqn) = self.interfaces.get(fqn) {
            return Ok(proxy_fqn);
        }
        if self.concrete.contains(fqn) {
            return Ok(fqn);
        }
        Err(MarshalError::ProxyUnavailable(fqn.to_string()))
    }
}
