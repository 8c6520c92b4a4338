use std::fmt;

/// Base names that identify an ordered-sequence type in a signature.
const LIST_BASES: [&str; 2] = ["list", "array"];

/// Base names that identify a string-keyed mapping type in a signature.
const MAP_BASES: [&str; 1] = ["map"];

/// A possibly-parameterized host-side type, as it appears in a method or
/// property signature of the generated bindings.
///
/// Signatures exist so descriptors can be inferred without runtime
/// introspection: collection shape is decided by the base name, and the
/// relevant type parameter is recursed into (element type for lists,
/// value type for maps; keys are always opaque strings).
#[derive(Clone, Debug, PartialEq)]
pub enum TypeSignature {
    /// A plain (non-generic) type name, e.g. `"string"` or
    /// `"acme-widgets.Widget"`. A bare collection name is "raw" generic
    /// use and maps to the most permissive element descriptor.
    Named(String),
    /// A generic instantiation, e.g. `list<string>` or
    /// `map<string, acme-widgets.Widget>`.
    Parameterized {
        base: String,
        args: Vec<TypeSignature>,
    },
}

impl TypeSignature {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSignature::Named(name.into())
    }

    pub fn parameterized(base: impl Into<String>, args: Vec<TypeSignature>) -> Self {
        TypeSignature::Parameterized {
            base: base.into(),
            args,
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Named(name) => f.write_str(name),
            TypeSignature::Parameterized { base, args } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

pub(crate) fn is_list_base(name: &str) -> bool {
    LIST_BASES.iter().any(|base| name.eq_ignore_ascii_case(base))
}

pub(crate) fn is_map_base(name: &str) -> bool {
    MAP_BASES.iter().any(|base| name.eq_ignore_ascii_case(base))
}
