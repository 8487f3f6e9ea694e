//! Type definition model.
//!
//! A [`CilType`] is a value-owned tree node: top-level types live in the module's
//! type list, nested types live in their enclosing type's `nested_types` list. The
//! two ownership slots are structurally exclusive, so moving a type between modules
//! is a plain value move and cannot leave a stale declaring-type back-reference
//! behind.

use crate::metadata::{
    attributes::{CustomAttribute, HasCustomAttributes},
    field::Field,
    flags::{TypeVisibility, TYPE_VISIBILITY_MASK},
    method::Method,
    property::Property,
};

/// Separator between an enclosing type's full name and a nested type's name.
pub const NESTED_SEPARATOR: char = '/';

/// A type definition with its members and nested types.
#[derive(Debug, Clone, PartialEq)]
pub struct CilType {
    /// Raw type flags word
    pub flags: u32,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple type name
    pub name: String,
    /// Owned fields, in declaration order
    pub fields: Vec<Field>,
    /// Owned methods, in declaration order
    pub methods: Vec<Method>,
    /// Owned properties, in declaration order
    pub properties: Vec<Property>,
    /// Types nested inside this one
    pub nested_types: Vec<CilType>,
    /// Attached custom attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl CilType {
    /// An empty type with the given namespace, name, and visibility.
    #[must_use]
    pub fn new(namespace: &str, name: &str, visibility: TypeVisibility) -> Self {
        CilType {
            flags: visibility.bits(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            nested_types: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// Full name of a top-level type: `Namespace.Name`, or just `Name` in the global
    /// namespace. Nested types are addressed through their enclosing type's full name
    /// and [`NESTED_SEPARATOR`]; that path is built during module traversal because a
    /// value-owned node does not know its parent.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// The visibility field of the flags word.
    #[must_use]
    pub fn visibility(&self) -> TypeVisibility {
        TypeVisibility::from_flags(self.flags)
    }

    /// Replace the visibility field, preserving all other flag bits.
    pub fn set_visibility(&mut self, visibility: TypeVisibility) {
        self.flags = visibility.apply(self.flags);
    }

    /// `true` for the maximally visible value of the respective nesting.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility().is_public()
    }

    /// `true` if the flags word carries one of the nested visibility values.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.visibility().is_nested()
    }

    /// First method with the given name; exact match, declaration order.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Mutable variant of [`CilType::find_method`].
    pub fn find_method_mut(&mut self, name: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    /// Index of the first method with the given name.
    #[must_use]
    pub fn method_index(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    /// Raw flags word with the visibility field cleared, as stored on the wire next
    /// to the explicit visibility value.
    #[must_use]
    pub fn modifier_bits(&self) -> u32 {
        self.flags & !TYPE_VISIBILITY_MASK
    }
}

impl HasCustomAttributes for CilType {
    fn custom_attributes(&self) -> &[CustomAttribute] {
        &self.custom_attributes
    }

    fn custom_attributes_mut(&mut self) -> &mut Vec<CustomAttribute> {
        &mut self.custom_attributes
    }
}
