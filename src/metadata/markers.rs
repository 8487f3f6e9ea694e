//! Well-known marker attribute registry.
//!
//! Patch state is encoded in the binary itself through marker attributes: the mere
//! presence of an attribute of a known kind on a type or member is the signal. The
//! registry resolves the well-known names once and hands out typed operations for
//! tagging, querying, and synthesizing the marker attribute types, so no lookup
//! chain has to be repeated at the call sites.

use crate::metadata::{
    attributes::{CustomAttribute, HasCustomAttributes},
    flags::{MemberAccessFlags, TypeModifiers, TypeVisibility},
    il::{Instruction, MethodBody},
    method::{Method, CTOR_NAME},
    typedef::CilType,
};

/// The marker attribute kinds the toolchain understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Tags a type or member that was added by the patcher
    Injected,
    /// Carries the patch descriptor on the patched method
    Patched,
    /// Excludes a member from transplantation
    Ignored,
}

/// Resolved well-known marker attribute names.
///
/// The reference toolchain strips the namespace from its marker attribute types
/// before injecting them, so the full names here are deliberately namespace-less.
#[derive(Debug, Clone)]
pub struct MarkerRegistry {
    injected: &'static str,
    patched: &'static str,
    ignored: &'static str,
}

impl MarkerRegistry {
    /// The registry over the built-in marker names.
    #[must_use]
    pub fn new() -> Self {
        MarkerRegistry {
            injected: "InjectedAttribute",
            patched: "PatchedAttribute",
            ignored: "PatcherIgnoredAttribute",
        }
    }

    /// Full name of the attribute type backing `kind`.
    #[must_use]
    pub fn full_name(&self, kind: MarkerKind) -> &'static str {
        match kind {
            MarkerKind::Injected => self.injected,
            MarkerKind::Patched => self.patched,
            MarkerKind::Ignored => self.ignored,
        }
    }

    /// A fresh zero-argument marker instance of `kind`.
    #[must_use]
    pub fn attribute(&self, kind: MarkerKind) -> CustomAttribute {
        CustomAttribute::marker(self.full_name(kind))
    }

    /// `true` if `item` carries the marker of `kind`.
    pub fn is_marked<T: HasCustomAttributes + ?Sized>(&self, item: &T, kind: MarkerKind) -> bool {
        item.has_attribute(self.full_name(kind))
    }

    /// Attach the marker of `kind` to `item` unless it is already present.
    pub fn mark<T: HasCustomAttributes + ?Sized>(&self, item: &mut T, kind: MarkerKind) {
        if !self.is_marked(item, kind) {
            item.custom_attributes_mut().push(self.attribute(kind));
        }
    }

    /// Synthesize the attribute type definition backing `kind`.
    ///
    /// The type is a sealed public class with a public instance constructor whose body
    /// immediately returns; that is all an attribute type needs to be decodable.
    #[must_use]
    pub fn build_attribute_type(&self, kind: MarkerKind) -> CilType {
        let mut ty = CilType::new("", self.full_name(kind), TypeVisibility::PUBLIC);
        ty.flags |= TypeModifiers::SEALED.bits();

        let ctor = Method::new(CTOR_NAME, MemberAccessFlags::PUBLIC)
            .with_body(MethodBody::new(vec![Instruction::ret()]));
        ty.methods.push(ctor);

        ty
    }
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        MarkerRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_is_idempotent() {
        let registry = MarkerRegistry::new();
        let mut ty = CilType::new("", "Payload", TypeVisibility::PUBLIC);

        registry.mark(&mut ty, MarkerKind::Injected);
        registry.mark(&mut ty, MarkerKind::Injected);

        assert!(registry.is_marked(&ty, MarkerKind::Injected));
        assert_eq!(ty.custom_attributes.len(), 1);
        assert!(!registry.is_marked(&ty, MarkerKind::Ignored));
    }

    #[test]
    fn synthesized_attribute_type_shape() {
        let registry = MarkerRegistry::new();
        let ty = registry.build_attribute_type(MarkerKind::Patched);

        assert_eq!(ty.full_name(), "PatchedAttribute");
        assert!(ty.is_public());
        assert_ne!(ty.flags & TypeModifiers::SEALED.bits(), 0);

        let ctor = ty.find_method(CTOR_NAME).unwrap();
        assert!(ctor.is_public());
        assert_eq!(ctor.body.as_ref().unwrap().len(), 1);
    }
}
