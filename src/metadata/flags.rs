//! Attribute flag groups for types and members.
//!
//! The raw `flags` word of every type and member round-trips through the container
//! untouched; the groups here are typed views over the bit ranges the toolchain
//! actually interprets. Values follow ECMA-335 II.23.1.
//!
//! # Key Types
//! - [`TypeVisibility`]: visibility field of a type's flags word
//! - [`MemberAccessFlags`]: access field shared by fields and methods
//! - [`TypeModifiers`], [`MethodModifiers`]: the semantic bits outside the
//!   visibility/access fields

use bitflags::bitflags;

/// Bitmask for the visibility field of a type flags word
pub const TYPE_VISIBILITY_MASK: u32 = 0x0000_0007;
/// Bitmask for the access field of a field/method flags word
pub const MEMBER_ACCESS_MASK: u32 = 0x0000_0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Type visibility values (low three bits of the type flags word)
    pub struct TypeVisibility: u32 {
        /// Not visible outside the module
        const NOT_PUBLIC = 0x0000_0000;
        /// Visible to everyone
        const PUBLIC = 0x0000_0001;
        /// Nested, visible to everyone
        const NESTED_PUBLIC = 0x0000_0002;
        /// Nested, visible only to the enclosing type
        const NESTED_PRIVATE = 0x0000_0003;
        /// Nested, visible to the enclosing type and its sub-types
        const NESTED_FAMILY = 0x0000_0004;
        /// Nested, visible inside the module
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Nested, visible to sub-types inside the module
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Nested, visible to sub-types or anyone inside the module
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;
    }
}

impl TypeVisibility {
    /// Extract the visibility field from a raw type flags word.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & TYPE_VISIBILITY_MASK)
    }

    /// `true` for any of the nested visibility values.
    #[must_use]
    pub fn is_nested(self) -> bool {
        self.bits() >= Self::NESTED_PUBLIC.bits()
    }

    /// `true` for [`TypeVisibility::PUBLIC`] and [`TypeVisibility::NESTED_PUBLIC`],
    /// the maximally visible value for the respective nesting.
    #[must_use]
    pub fn is_public(self) -> bool {
        self == Self::PUBLIC || self == Self::NESTED_PUBLIC
    }

    /// Apply this visibility to a raw type flags word, preserving all other bits.
    #[must_use]
    pub fn apply(self, flags: u32) -> u32 {
        (flags & !TYPE_VISIBILITY_MASK) | self.bits()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Member access values (low three bits of a field or method flags word)
    pub struct MemberAccessFlags: u32 {
        /// Member not referenceable; reserved for the compiler
        const COMPILER_CONTROLLED = 0x0000_0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0000_0001;
        /// Accessible by sub-types only in this module
        const FAM_AND_ASSEM = 0x0000_0002;
        /// Accessible by anyone in the module
        const ASSEM = 0x0000_0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0000_0004;
        /// Accessible by sub-types anywhere, plus anyone in the module
        const FAM_OR_ASSEM = 0x0000_0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0000_0006;
    }
}

impl MemberAccessFlags {
    /// Extract the access field from a raw member flags word.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & MEMBER_ACCESS_MASK)
    }

    /// Apply this access value to a raw member flags word, preserving all other bits.
    #[must_use]
    pub fn apply(self, flags: u32) -> u32 {
        (flags & !MEMBER_ACCESS_MASK) | self.bits()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Semantic type flags outside the visibility field
    pub struct TypeModifiers: u32 {
        /// Type is abstract
        const ABSTRACT = 0x0000_0080;
        /// Type cannot be derived from
        const SEALED = 0x0000_0100;
        /// Name is special, the exact meaning encoded in the name itself
        const SPECIAL_NAME = 0x0000_0400;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Semantic method flags outside the access field
    pub struct MethodModifiers: u32 {
        /// Method is defined on the type, not on instances
        const STATIC = 0x0000_0010;
        /// Method cannot be overridden
        const FINAL = 0x0000_0020;
        /// Method is virtual
        const VIRTUAL = 0x0000_0040;
        /// Name is special, the exact meaning encoded in the name itself
        const SPECIAL_NAME = 0x0000_0800;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_extraction_ignores_high_bits() {
        let flags = TypeModifiers::SEALED.bits() | TypeVisibility::NESTED_PRIVATE.bits();
        let vis = TypeVisibility::from_flags(flags);
        assert_eq!(vis, TypeVisibility::NESTED_PRIVATE);
        assert!(vis.is_nested());
        assert!(!vis.is_public());
    }

    #[test]
    fn visibility_apply_preserves_other_bits() {
        let flags = TypeModifiers::SEALED.bits() | TypeVisibility::NOT_PUBLIC.bits();
        let updated = TypeVisibility::PUBLIC.apply(flags);
        assert_eq!(TypeVisibility::from_flags(updated), TypeVisibility::PUBLIC);
        assert_ne!(updated & TypeModifiers::SEALED.bits(), 0);
    }

    #[test]
    fn member_access_roundtrip() {
        let flags = MethodModifiers::STATIC.bits() | MemberAccessFlags::PRIVATE.bits();
        assert_eq!(
            MemberAccessFlags::from_flags(flags),
            MemberAccessFlags::PRIVATE
        );

        let widened = MemberAccessFlags::PUBLIC.apply(flags);
        assert_eq!(
            MemberAccessFlags::from_flags(widened),
            MemberAccessFlags::PUBLIC
        );
        assert_ne!(widened & MethodModifiers::STATIC.bits(), 0);
    }
}
