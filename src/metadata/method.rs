//! Method member model.
//!
//! A [`Method`] couples a flags word with an optional [`crate::metadata::il::MethodBody`];
//! abstract and runtime-provided methods carry no body. Ownership is by value: a method
//! belongs to the type whose `methods` list holds it, and re-parenting is a removal on
//! one list followed by an insert on another.

use crate::metadata::{
    attributes::{CustomAttribute, HasCustomAttributes},
    flags::{MemberAccessFlags, MethodModifiers},
    il::MethodBody,
};

/// Name of instance constructor methods.
pub const CTOR_NAME: &str = ".ctor";

/// A method owned by exactly one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Raw method flags word
    pub flags: u32,
    /// Method name
    pub name: String,
    /// Executable code, absent for bodyless methods
    pub body: Option<MethodBody>,
    /// Attached custom attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Method {
    /// A bodyless method named `name` with the given access value.
    #[must_use]
    pub fn new(name: &str, access: MemberAccessFlags) -> Self {
        Method {
            flags: access.bits(),
            name: name.to_string(),
            body: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Attach a body to the method, builder-style.
    #[must_use]
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Add modifier bits to the flags word, builder-style.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.flags |= modifiers.bits();
        self
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

    /// `true` if the method is reserved for the compiler and not referenceable.
    #[must_use]
    pub fn is_compiler_controlled(&self) -> bool {
        self.access() == MemberAccessFlags::COMPILER_CONTROLLED
    }

    /// `true` if the method is defined on the type rather than on instances.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & MethodModifiers::STATIC.bits() != 0
    }

    /// `true` if this is an instance constructor.
    #[must_use]
    pub fn is_ctor(&self) -> bool {
        self.name == CTOR_NAME
    }
}

impl HasCustomAttributes for Method {
    fn custom_attributes(&self) -> &[CustomAttribute] {
        &self.custom_attributes
    }

    fn custom_attributes_mut(&mut self) -> &mut Vec<CustomAttribute> {
        &mut self.custom_attributes
    }
}
