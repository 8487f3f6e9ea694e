//! The injection engine.
//!
//! Locates the well-known target method, injects the bootstrap payload, inserts
//! the call instruction that triggers it, and records a [`PatchDescriptor`] so the
//! whole operation can be reversed instruction-for-instruction. All state lives in
//! an explicit [`Patcher`] context threaded through every operation; there is no
//! process-wide mutable state.
//!
//! # State machine
//!
//! A module is either `Unpatched` (no descriptor on the target method) or `Patched`
//! (descriptor present). [`PatchMode`] selects the transition:
//!
//! | Mode         | Precondition | Effect                                   |
//! |--------------|--------------|------------------------------------------|
//! | `Info`       | —            | report descriptor, never write           |
//! | `Patch`      | unpatched    | inject payload, insert call, attach descriptor |
//! | `UnPatch`    | patched      | reverse of `Patch`, byte-for-byte        |
//! | `RePatch`    | patched      | `UnPatch` then `Patch`                   |
//! | `ForcePatch` | —            | `UnPatch` if patched, then always `Patch`|
//!
//! Target discovery precedes mode dispatch: a module without the well-known
//! type/method fails every mode with [`crate::Error::TargetNotFound`] before any
//! mutation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilpatch::{patcher::{Patcher, PatchMode}, Module};
//! use std::path::Path;
//!
//! let mut module = Module::from_file(Path::new("Game.cmod"))?;
//! let outcome = Patcher::new(&mut module).run(PatchMode::Patch)?;
//! if outcome.requires_write() {
//!     let bytes = module.to_bytes()?;
//!     // hand bytes to the temp-file + rename sequence
//! }
//! # Ok::<(), cilpatch::Error>(())
//! ```

pub mod descriptor;

pub use descriptor::PatchDescriptor;

use crate::{
    bootstrap,
    metadata::{
        attributes::HasCustomAttributes,
        il::{Instruction, MethodRef},
        markers::{MarkerKind, MarkerRegistry},
        module::Module,
        typedef::{CilType, NESTED_SEPARATOR},
    },
    Error, Result,
};

/// Simple name of the well-known type the call is injected into.
pub const TARGET_TYPE_NAME: &str = "StartupScreenController";
/// Name of the well-known method the call is injected into.
pub const TARGET_METHOD_NAME: &str = "Awake";

/// Index the bootstrap call is inserted at; the injected call executes before any
/// of the target method's original logic.
pub const IL_INDEX: usize = 0;

/// The operation modes of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PatchMode {
    /// Inject the bootstrap call; fails if already patched
    Patch,
    /// Wipe any existing patch, then inject
    ForcePatch,
    /// Reverse and re-apply an existing patch
    RePatch,
    /// Reverse an existing patch; fails if not patched
    UnPatch,
    /// Report the patch state without writing
    Info,
}

/// Where the engine looks for the well-known target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    /// Simple name of the target type
    pub type_name: String,
    /// Name of the target method
    pub method_name: String,
}

impl Default for PatchTarget {
    fn default() -> Self {
        PatchTarget {
            type_name: TARGET_TYPE_NAME.to_string(),
            method_name: TARGET_METHOD_NAME.to_string(),
        }
    }
}

/// What one engine run did, and whether the module needs writing back.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    /// The module was patched; the attached descriptor is returned
    Patched(PatchDescriptor),
    /// The module was unpatched
    Unpatched,
    /// Read-only state report; `None` means the module is not patched
    Info(Option<PatchDescriptor>),
}

impl PatchOutcome {
    /// `true` if the module graph was mutated and must be serialized.
    #[must_use]
    pub fn requires_write(&self) -> bool {
        !matches!(self, PatchOutcome::Info(_))
    }
}

/// Explicit engine context: the module under mutation, the target coordinates, and
/// the resolved marker registry.
pub struct Patcher<'a> {
    module: &'a mut Module,
    target: PatchTarget,
    markers: MarkerRegistry,
}

impl<'a> Patcher<'a> {
    /// An engine over `module` with the well-known default target.
    pub fn new(module: &'a mut Module) -> Self {
        Patcher {
            module,
            target: PatchTarget::default(),
            markers: MarkerRegistry::new(),
        }
    }

    /// An engine over `module` with an explicit target.
    pub fn with_target(module: &'a mut Module, target: PatchTarget) -> Self {
        Patcher {
            module,
            target,
            markers: MarkerRegistry::new(),
        }
    }

    /// Execute one mode transition.
    ///
    /// # Errors
    /// Returns [`crate::Error::TargetNotFound`] if the well-known target is absent
    /// (every mode), [`crate::Error::AlreadyPatched`] / [`crate::Error::NotPatched`]
    /// on precondition violations, and [`crate::Error::Patch`] if the mutation
    /// sequence itself fails.
    pub fn run(&mut self, mode: PatchMode) -> Result<PatchOutcome> {
        // Discovery first: a missing target fails every mode before any mutation
        let state = self.info()?;
        log::debug!(
            "mode {mode} on module '{}', currently {}",
            self.module.name,
            if state.is_some() { "patched" } else { "unpatched" }
        );

        match mode {
            PatchMode::Info => Ok(PatchOutcome::Info(state)),
            PatchMode::Patch => {
                if state.is_some() {
                    return Err(Error::AlreadyPatched);
                }

                self.patch().map(PatchOutcome::Patched)
            }
            PatchMode::UnPatch => {
                if state.is_none() {
                    return Err(Error::NotPatched);
                }

                self.unpatch()?;
                Ok(PatchOutcome::Unpatched)
            }
            PatchMode::RePatch => {
                if state.is_none() {
                    return Err(Error::NotPatched);
                }

                // If patch fails after unpatch succeeded the module is left
                // unpatched; the caller sees the error and skips the write-back
                self.unpatch()?;
                self.patch().map(PatchOutcome::Patched)
            }
            PatchMode::ForcePatch => {
                if state.is_some() {
                    self.unpatch()?;
                }

                self.patch().map(PatchOutcome::Patched)
            }
        }
    }

    /// Read the patch state of the target method.
    ///
    /// # Errors
    /// Returns [`crate::Error::TargetNotFound`] if the target is absent, or
    /// [`crate::Error::Malformed`] if a descriptor attribute is present but does not
    /// decode.
    pub fn info(&self) -> Result<Option<PatchDescriptor>> {
        let path = self.locate_target()?;
        let ty = self
            .module
            .find_type(&path)
            .ok_or_else(|| Error::TypeNotFound(path.clone()))?;
        let method = ty
            .find_method(&self.target.method_name)
            .ok_or_else(|| self.target_not_found())?;

        match method.find_attribute(self.markers.full_name(MarkerKind::Patched)) {
            None => Ok(None),
            Some(attribute) => PatchDescriptor::from_attribute(attribute).map(Some),
        }
    }

    fn target_not_found(&self) -> Error {
        Error::TargetNotFound {
            type_name: self.target.type_name.clone(),
            method_name: self.target.method_name.clone(),
        }
    }

    /// Full path of the first type matching the target's simple name, verified to
    /// hold the target method.
    fn locate_target(&self) -> Result<String> {
        fn find_path(types: &[CilType], prefix: Option<&str>, name: &str) -> Option<String> {
            for ty in types {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}{NESTED_SEPARATOR}{}", ty.name),
                    None => ty.full_name(),
                };

                if ty.name == name {
                    return Some(path);
                }

                if let Some(found) = find_path(&ty.nested_types, Some(&path), name) {
                    return Some(found);
                }
            }

            None
        }

        let path = find_path(&self.module.types, None, &self.target.type_name)
            .ok_or_else(|| self.target_not_found())?;

        let ty = self
            .module
            .find_type(&path)
            .ok_or_else(|| Error::TypeNotFound(path.clone()))?;
        if ty.find_method(&self.target.method_name).is_none() {
            return Err(self.target_not_found());
        }

        Ok(path)
    }

    /// The forward mutation sequence.
    fn patch(&mut self) -> Result<PatchDescriptor> {
        let path = self.locate_target()?;

        // The marker attribute types must exist in the target module so the
        // attributes stay decodable; each is itself tagged injected so unpatch
        // can find and remove them again
        self.inject_marker_type(MarkerKind::Injected);
        self.inject_marker_type(MarkerKind::Patched);

        let mut payload = bootstrap::build_method();
        self.markers.mark(&mut payload, MarkerKind::Injected);
        let payload_name = payload.name.clone();

        let method_name = self.target.method_name.clone();
        let markers = self.markers.clone();
        let ty = self
            .module
            .find_type_mut(&path)
            .ok_or_else(|| Error::TypeNotFound(path.clone()))?;

        let Some(target_index) = ty.method_index(&method_name) else {
            return Err(Error::Patch(format!(
                "target method '{method_name}' vanished during patching"
            )));
        };
        ty.methods.insert(target_index + 1, payload);

        let call = Instruction::call(MethodRef::new(&path, &payload_name));
        let method = ty
            .find_method_mut(&method_name)
            .ok_or_else(|| Error::Patch(format!("target method '{method_name}' vanished")))?;

        let Some(body) = method.body.as_mut() else {
            return Err(Error::Patch(format!(
                "target method '{method_name}' has no body to patch"
            )));
        };
        body.instructions.insert(IL_INDEX, call);

        let start = IL_INDEX as i32;
        let descriptor = PatchDescriptor::current(start, start + 1);
        method
            .custom_attributes
            .push(descriptor.to_attribute(markers.full_name(MarkerKind::Patched)));

        log::debug!("patched '{path}::{method_name}' ({descriptor})");
        Ok(descriptor)
    }

    /// The reverse mutation sequence, exact inverse of [`Patcher::patch`].
    fn unpatch(&mut self) -> Result<()> {
        let Some(descriptor) = self.info()? else {
            return Err(Error::NotPatched);
        };
        let path = self.locate_target()?;

        self.eject_injected_types();

        let method_name = self.target.method_name.clone();
        let markers = self.markers.clone();
        let ty = self
            .module
            .find_type_mut(&path)
            .ok_or_else(|| Error::TypeNotFound(path.clone()))?;
        eject_injected_members(ty, &markers);

        let method = ty
            .find_method_mut(&method_name)
            .ok_or_else(|| Error::Patch(format!("target method '{method_name}' vanished")))?;

        let Some(body) = method.body.as_mut() else {
            return Err(Error::Patch(format!(
                "target method '{method_name}' has no body to unpatch"
            )));
        };

        let Ok(start) = usize::try_from(descriptor.start_index) else {
            return Err(Error::Patch(format!(
                "descriptor start index {} is negative",
                descriptor.start_index
            )));
        };
        let Ok(count) = usize::try_from(descriptor.len()) else {
            return Err(Error::Patch("descriptor range overflows".to_string()));
        };
        let Some(end) = start.checked_add(count) else {
            return Err(Error::Patch("descriptor range overflows".to_string()));
        };
        if end > body.instructions.len() {
            return Err(Error::Patch(format!(
                "descriptor range [{start}, {end}) exceeds body length {}",
                body.instructions.len()
            )));
        }
        body.instructions.drain(start..end);

        method.remove_attribute(markers.full_name(MarkerKind::Patched));

        log::debug!("unpatched '{path}::{method_name}'");
        Ok(())
    }

    /// Add the attribute type backing `kind` to the module unless it already exists.
    fn inject_marker_type(&mut self, kind: MarkerKind) {
        let full_name = self.markers.full_name(kind);
        if self.module.find_type(full_name).is_some() {
            return;
        }

        let mut ty = self.markers.build_attribute_type(kind);
        // Members tagged ignored are never transplanted into the target module
        eject_ignored_members(&mut ty, &self.markers);
        self.markers.mark(&mut ty, MarkerKind::Injected);
        self.module.add_type(ty);
    }

    /// Remove every top-level type tagged injected.
    fn eject_injected_types(&mut self) {
        let markers = self.markers.clone();
        self.module
            .retain_types(|ty| !markers.is_marked(ty, MarkerKind::Injected));
    }
}

/// Remove every member of `ty` tagged injected.
fn eject_injected_members(ty: &mut CilType, markers: &MarkerRegistry) {
    eject_members(ty, markers, MarkerKind::Injected);
}

/// Remove every member of `ty` tagged ignored.
fn eject_ignored_members(ty: &mut CilType, markers: &MarkerRegistry) {
    eject_members(ty, markers, MarkerKind::Ignored);
}

fn eject_members(ty: &mut CilType, markers: &MarkerRegistry, kind: MarkerKind) {
    ty.fields.retain(|f| !markers.is_marked(f, kind));
    ty.properties.retain(|p| !markers.is_marked(p, kind));
    ty.methods.retain(|m| !markers.is_marked(m, kind));
    ty.nested_types.retain(|t| !markers.is_marked(t, kind));
}
