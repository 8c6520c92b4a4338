use indexmap::IndexMap;

use tether_wire::WireValue;

use crate::error::MarshalError;
use crate::signature::{self, TypeSignature};

/// The dynamic type name that accepts every wire shape.
pub const ANY: &str = "any";

/// A non-collection type: a primitive name, a fully-qualified bridged
/// type, or [`ANY`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleType {
    name: String,
}

impl SimpleType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_any(&self) -> bool {
        self.name == ANY
    }
}

/// A closed description of how a wire value should be checked and
/// materialized: a simple type, a sequence of some element type, or a
/// string-keyed map of some value type.
///
/// Descriptors are self-validating. [`TypeDescriptor::simple`] refuses
/// collection names outright, so a constructed descriptor never
/// misrepresents the shape it stands for.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDescriptor {
    Simple(SimpleType),
    ListOf(Box<TypeDescriptor>),
    MapOf(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Describe a non-collection type by name.
    ///
    /// A list-shaped or map-shaped name is rejected here rather than at
    /// first use: such a value would later be handed a sequence or map and
    /// the mismatch is cheaper to report at construction.
    pub fn simple(name: impl Into<String>) -> Result<Self, MarshalError> {
        let name = name.into();
        if signature::is_list_base(&name) {
            return Err(MarshalError::DescriptorConstruction(format!(
                "cannot describe sequence type {name} as a simple type"
            )));
        }
        if signature::is_map_base(&name) {
            return Err(MarshalError::DescriptorConstruction(format!(
                "cannot describe map type {name} as a simple type"
            )));
        }
        Ok(TypeDescriptor::Simple(SimpleType { name }))
    }

    /// The most permissive descriptor: every wire shape passes through
    /// unchanged.
    pub fn any() -> Self {
        TypeDescriptor::Simple(SimpleType {
            name: ANY.to_string(),
        })
    }

    pub fn list_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::ListOf(Box::new(element))
    }

    pub fn map_of(value: TypeDescriptor) -> Self {
        TypeDescriptor::MapOf(Box::new(value))
    }

    /// Derive a descriptor from a host-side type signature.
    ///
    /// Collection base names become the matching collection descriptor,
    /// recursing into the element parameter (the value parameter for maps;
    /// keys are always strings and carry no descriptor). A bare collection
    /// name defaults its element to [`TypeDescriptor::any`]. Any other
    /// parameterized signature is unsupported.
    pub fn infer(signature: &TypeSignature) -> Result<Self, MarshalError> {
        match signature {
            TypeSignature::Named(name) if signature::is_list_base(name) => {
                Ok(Self::list_of(Self::any()))
            }
            TypeSignature::Named(name) if signature::is_map_base(name) => {
                Ok(Self::map_of(Self::any()))
            }
            TypeSignature::Named(name) => Self::simple(name.clone()),
            TypeSignature::Parameterized { base, args } if signature::is_list_base(base) => {
                match args.as_slice() {
                    [] => Ok(Self::list_of(Self::any())),
                    [element] => Ok(Self::list_of(Self::infer(element)?)),
                    _ => Err(MarshalError::UnsupportedType(signature.to_string())),
                }
            }
            TypeSignature::Parameterized { base, args } if signature::is_map_base(base) => {
                match args.as_slice() {
                    [] => Ok(Self::map_of(Self::any())),
                    [_key, value] => Ok(Self::map_of(Self::infer(value)?)),
                    _ => Err(MarshalError::UnsupportedType(signature.to_string())),
                }
            }
            TypeSignature::Parameterized { .. } => {
                Err(MarshalError::UnsupportedType(signature.to_string()))
            }
        }
    }

    /// Check a wire value against this descriptor and rebuild it with every
    /// element checked in turn.
    ///
    /// Scalars and handles pass through any simple descriptor; sequences
    /// and maps only pass where the descriptor expects them (or under
    /// `any`). Map keys are never touched and both collection kinds keep
    /// their element order. The first mismatch anywhere in the tree aborts
    /// the whole transform.
    pub fn transform(&self, value: WireValue) -> Result<WireValue, MarshalError> {
        match self {
            TypeDescriptor::Simple(simple) => match value {
                WireValue::Sequence(_) | WireValue::Map(_) if !simple.is_any() => {
                    Err(MarshalError::TypeMismatch {
                        expected: simple.name().to_string(),
                        got: value.shape(),
                    })
                }
                other => Ok(other),
            },
            TypeDescriptor::ListOf(element) => match value {
                WireValue::Sequence(items) => items
                    .into_iter()
                    .map(|item| element.transform(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(WireValue::Sequence),
                other => Err(MarshalError::TypeMismatch {
                    expected: "sequence".to_string(),
                    got: other.shape(),
                }),
            },
            TypeDescriptor::MapOf(element) => match value {
                WireValue::Map(entries) => entries
                    .into_iter()
                    .map(|(key, entry)| element.transform(entry).map(|entry| (key, entry)))
                    .collect::<Result<IndexMap<_, _>, _>>()
                    .map(WireValue::Map),
                other => Err(MarshalError::TypeMismatch {
                    expected: "map".to_string(),
                    got: other.shape(),
                }),
            },
        }
    }
}
