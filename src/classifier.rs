//! Member classification boundary.
//!
//! The inference core never inspects structural-type metadata directly; it
//! consumes the pure query results of a [`MemberClassifier`]. How a language
//! binding enumerates a type's members (reflection, codegen, a database
//! catalog) is the host's business. [`DeclaredTypes`] is the in-memory
//! implementation used by tests and by hosts that already hold descriptors.

use std::collections::BTreeMap;

use serde::Serialize;

/// Scalar value types recognized by the inference core.
///
/// Compatibility between a dependent property and a principal key property
/// is plain equality of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarType {
    Bool,
    Int,
    Long,
    Float,
    Decimal,
    String,
    Date,
    DateTime,
    Guid,
    Bytes,
}

impl ScalarType {
    /// Whether values of this type can be generated on insert (used when
    /// marking single-property convention keys as store-generated).
    pub fn supports_value_generation(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Long | ScalarType::Guid)
    }
}

/// Shape of one structural member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberShape {
    /// A scalar-valued member, a candidate property.
    Scalar {
        value_type: ScalarType,
        nullable: bool,
    },
    /// A single reference to another structural type.
    Reference { target: String },
    /// A collection of another structural type.
    Collection { target: String },
}

/// One member of a structural type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub shape: MemberShape,
}

/// A structural type and its members, in declared order.
///
/// Declared order is significant: convention rules that must break ties by
/// "first candidate" use this order, so it must be deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a non-nullable scalar member.
    pub fn scalar(mut self, name: impl Into<String>, value_type: ScalarType) -> Self {
        self.members.push(MemberDescriptor {
            name: name.into(),
            shape: MemberShape::Scalar {
                value_type,
                nullable: false,
            },
        });
        self
    }

    /// Add a nullable scalar member.
    pub fn nullable_scalar(mut self, name: impl Into<String>, value_type: ScalarType) -> Self {
        self.members.push(MemberDescriptor {
            name: name.into(),
            shape: MemberShape::Scalar {
                value_type,
                nullable: true,
            },
        });
        self
    }

    /// Add a reference-shaped member.
    pub fn reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.members.push(MemberDescriptor {
            name: name.into(),
            shape: MemberShape::Reference {
                target: target.into(),
            },
        });
        self
    }

    /// Add a collection-shaped member.
    pub fn collection(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.members.push(MemberDescriptor {
            name: name.into(),
            shape: MemberShape::Collection {
                target: target.into(),
            },
        });
        self
    }
}

/// A scalar member as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarMember {
    pub name: String,
    pub value_type: ScalarType,
    pub nullable: bool,
}

/// An association-shaped member as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationMember {
    pub name: String,
    pub target_type: String,
    pub collection: bool,
}

/// Pure query interface over structural types.
///
/// Implementations must be deterministic: repeated calls with the same
/// arguments return the same members in the same order.
pub trait MemberClassifier {
    /// Whether a structural type with this name is known.
    fn has_type(&self, type_name: &str) -> bool;

    /// Candidate scalar properties of a type, in declared order.
    fn scalar_members(&self, type_name: &str) -> Vec<ScalarMember>;

    /// Candidate navigation-shaped members of a type, in declared order.
    fn navigation_members(&self, type_name: &str) -> Vec<NavigationMember>;

    /// Whether a member is a viable primitive property.
    fn is_viable_property(&self, type_name: &str, member: &str) -> bool {
        self.scalar_members(type_name)
            .iter()
            .any(|m| m.name == member)
    }
}

/// In-memory classifier over a set of declared [`TypeDescriptor`]s.
#[derive(Debug, Clone, Default)]
pub struct DeclaredTypes {
    types: BTreeMap<String, TypeDescriptor>,
}

impl DeclaredTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type descriptor, replacing any previous one of that name.
    pub fn declare(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Chainable form of [`declare`](Self::declare).
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.declare(descriptor);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }
}

impl MemberClassifier for DeclaredTypes {
    fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn scalar_members(&self, type_name: &str) -> Vec<ScalarMember> {
        let Some(descriptor) = self.types.get(type_name) else {
            return Vec::new();
        };
        descriptor
            .members
            .iter()
            .filter_map(|m| match &m.shape {
                MemberShape::Scalar {
                    value_type,
                    nullable,
                } => Some(ScalarMember {
                    name: m.name.clone(),
                    value_type: *value_type,
                    nullable: *nullable,
                }),
                _ => None,
            })
            .collect()
    }

    fn navigation_members(&self, type_name: &str) -> Vec<NavigationMember> {
        let Some(descriptor) = self.types.get(type_name) else {
            return Vec::new();
        };
        descriptor
            .members
            .iter()
            .filter_map(|m| match &m.shape {
                MemberShape::Reference { target } => Some(NavigationMember {
                    name: m.name.clone(),
                    target_type: target.clone(),
                    collection: false,
                }),
                MemberShape::Collection { target } => Some(NavigationMember {
                    name: m.name.clone(),
                    target_type: target.clone(),
                    collection: true,
                }),
                _ => None,
            })
            .collect()
    }
}
