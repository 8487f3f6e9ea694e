//! Member visibility normalizer.
//!
//! Walks every type in a module's flattened enumeration and widens the visibility
//! of non-public types, fields, methods, and property accessors. The walk mutates
//! in place and reports what it changed through [`PublicizeSummary`]; running it a
//! second time on the same module finds nothing left to widen.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilpatch::{publicizer, Module};
//! use std::path::Path;
//!
//! let mut module = Module::from_file(Path::new("Game.cmod"))?;
//! let summary = publicizer::publicize(&mut module);
//! println!("{summary}");
//! # Ok::<(), cilpatch::Error>(())
//! ```

use std::fmt;

use crate::metadata::{
    flags::{MemberAccessFlags, TypeVisibility},
    module::Module,
    typedef::CilType,
};

/// Counters of what one publicize run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicizeSummary {
    /// Types whose visibility was widened
    pub classes: u64,
    /// Methods whose access was widened
    pub methods: u64,
    /// Fields whose access was widened
    pub fields: u64,
    /// Properties with at least one widened accessor
    pub properties: u64,
}

impl PublicizeSummary {
    /// Total number of widened items.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.classes + self.methods + self.fields + self.properties
    }

    /// `true` if the run changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for PublicizeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Publicized classes: {}", self.classes)?;
        writeln!(f, "Publicized methods: {}", self.methods)?;
        writeln!(f, "Publicized fields: {}", self.fields)?;
        write!(f, "Publicized properties: {}", self.properties)
    }
}

/// Widen the visibility of everything non-public in `module`.
///
/// Types become `public` (`nested public` for nested types); fields and methods
/// become `public` unless they are compiler-controlled; property accessors are
/// widened individually, with the property counted at most once. The flattened
/// enumeration already covers nested types, so no separate recursion pass exists.
pub fn publicize(module: &mut Module) -> PublicizeSummary {
    let mut summary = PublicizeSummary::default();

    module.visit_types_mut(|ty| publicize_type(ty, &mut summary));

    log::debug!(
        "publicize changed {} items in module '{}'",
        summary.total(),
        module.name
    );
    summary
}

fn publicize_type(ty: &mut CilType, summary: &mut PublicizeSummary) {
    if !ty.is_public() {
        let widened = if ty.is_nested() {
            TypeVisibility::NESTED_PUBLIC
        } else {
            TypeVisibility::PUBLIC
        };

        log::debug!("publicizing type {}", ty.full_name());
        ty.set_visibility(widened);
        summary.classes += 1;
    }

    for field in &mut ty.fields {
        if field.is_compiler_controlled() {
            continue;
        }

        if !field.is_public() {
            field.set_access(MemberAccessFlags::PUBLIC);
            summary.fields += 1;
        }
    }

    for method in &mut ty.methods {
        if method.is_compiler_controlled() {
            continue;
        }

        if !method.is_public() {
            method.set_access(MemberAccessFlags::PUBLIC);
            summary.methods += 1;
        }
    }

    // Split borrow: accessor methods live in the sibling methods list
    let CilType {
        methods,
        properties,
        ..
    } = ty;

    for property in properties {
        let mut widened = false;

        for accessor in [property.getter.as_deref(), property.setter.as_deref()]
            .into_iter()
            .flatten()
        {
            // A dangling accessor name is treated as already handled, not an error
            let Some(method) = methods.iter_mut().find(|m| m.name == accessor) else {
                continue;
            };

            if !method.is_public() {
                method.set_access(MemberAccessFlags::PUBLIC);
                widened = true;
            }
        }

        if widened {
            summary.properties += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        field::Field,
        flags::{MemberAccessFlags, TypeVisibility},
        method::Method,
        property::Property,
    };

    fn hidden_module() -> Module {
        let mut ty = CilType::new("Game", "Internals", TypeVisibility::NOT_PUBLIC);
        ty.fields
            .push(Field::new("_state", MemberAccessFlags::PRIVATE));
        ty.fields
            .push(Field::new("_backing", MemberAccessFlags::COMPILER_CONTROLLED));
        ty.methods
            .push(Method::new("Tick", MemberAccessFlags::ASSEM));
        ty.methods
            .push(Method::new("get_State", MemberAccessFlags::COMPILER_CONTROLLED));
        ty.properties
            .push(Property::new("State", Some("get_State"), None));

        let mut nested = CilType::new("", "Worker", TypeVisibility::NESTED_PRIVATE);
        nested
            .methods
            .push(Method::new("Run", MemberAccessFlags::PRIVATE));
        ty.nested_types.push(nested);

        let mut module = Module::new("Hidden");
        module.add_type(ty);
        module
    }

    #[test]
    fn widens_types_members_and_accessors() {
        let mut module = hidden_module();
        let summary = publicize(&mut module);

        assert_eq!(summary.classes, 2);
        assert_eq!(summary.fields, 1);
        assert_eq!(summary.methods, 2);
        // The compiler-controlled accessor is skipped by the method pass but still
        // widened through its property
        assert_eq!(summary.properties, 1);

        let ty = module.find_type("Game.Internals").unwrap();
        assert!(ty.is_public());
        assert_eq!(
            ty.nested_types[0].visibility(),
            TypeVisibility::NESTED_PUBLIC
        );
        assert!(ty.find_method("get_State").unwrap().is_public());
        assert!(ty.fields[0].is_public());
        // Compiler-controlled fields keep their access
        assert!(ty.fields[1].is_compiler_controlled());
    }

    #[test]
    fn second_run_changes_nothing() {
        let mut module = hidden_module();
        let first = publicize(&mut module);
        assert!(!first.is_empty());

        let second = publicize(&mut module);
        assert!(second.is_empty());
        assert_eq!(second, PublicizeSummary::default());
    }

    #[test]
    fn dangling_accessor_is_skipped() {
        let mut ty = CilType::new("", "Odd", TypeVisibility::PUBLIC);
        ty.properties
            .push(Property::new("Ghost", Some("get_Ghost"), None));

        let mut module = Module::new("Odd");
        module.add_type(ty);

        let summary = publicize(&mut module);
        assert_eq!(summary.properties, 0);
    }
}
