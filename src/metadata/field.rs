//! Field member model.

use crate::metadata::{
    attributes::{CustomAttribute, HasCustomAttributes},
    flags::MemberAccessFlags,
};

/// A field owned by exactly one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Raw field flags word
    pub flags: u32,
    /// Field name
    pub name: String,
    /// Attached custom attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Field {
    /// A field named `name` with the given access value and no other flags.
    #[must_use]
    pub fn new(name: &str, access: MemberAccessFlags) -> Self {
        Field {
            flags: access.bits(),
            name: name.to_string(),
            custom_attributes: Vec::new(),
        }
    }

    /// The access field of the flags word.
    #[must_use]
    pub fn access(&self) -> MemberAccessFlags {
        MemberAccessFlags::from_flags(self.flags)
    }

    /// Replace the access field, preserving all other flag bits.
    pub fn set_access(&mut self, access: MemberAccessFlags) {
        self.flags = access.apply(self.flags);
    }

    /// `true` if the access field is [`MemberAccessFlags::PUBLIC`].
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access() == MemberAccessFlags::PUBLIC
    }

    /// `true` if the field is reserved for the compiler and not referenceable.
    #[must_use]
    pub fn is_compiler_controlled(&self) -> bool {
        self.access() == MemberAccessFlags::COMPILER_CONTROLLED
    }
}

impl HasCustomAttributes for Field {
    fn custom_attributes(&self) -> &[CustomAttribute] {
        &self.custom_attributes
    }

    fn custom_attributes_mut(&mut self) -> &mut Vec<CustomAttribute> {
        &mut self.custom_attributes
    }
}
