//! Bootstrap payload and loader discovery.
//!
//! Two halves of the same contract. [`build_method`] synthesizes the method the
//! patcher injects into the target binary: its body carries the discovery
//! parameters (scan directory, entry type, entry method) as string loads followed
//! by a call to the host intrinsic that performs the scan when the patched binary
//! starts. [`locate_entry`] and [`run`] implement that scan natively, so preflight
//! tooling and the host runtime share one algorithm: enumerate companion images,
//! tolerate unloadable candidates, and select the first module exposing the
//! well-known non-public static entry point.

use std::path::{Path, PathBuf};

use crate::{
    metadata::{
        flags::{MemberAccessFlags, MethodModifiers},
        il::{Instruction, MethodBody, MethodRef},
        method::Method,
        module::{Module, MODULE_EXTENSION},
    },
    Result,
};

/// Relative directory scanned for companion modules at target-process start.
pub const LOADER_DIR: &str = "modhost/bin";
/// Full name of the well-known loader entry type.
pub const LOADER_TYPE_NAME: &str = "ModHost.CoreModule";
/// Name of the well-known loader entry method.
pub const LOADER_METHOD_NAME: &str = "Initialize";
/// Name of the injected bootstrap method.
pub const BOOTSTRAP_METHOD_NAME: &str = "ModHostBootstrap";

/// Type exposing the host intrinsic the payload calls.
pub const INTRINSIC_TYPE_NAME: &str = "System.Runtime";
/// Name of the host intrinsic the payload calls.
pub const INTRINSIC_METHOD_NAME: &str = "BootstrapModules";

/// Synthesize the bootstrap payload method.
///
/// The method is private static so it never widens the target type's surface; the
/// injection engine tags it and inserts the call instruction that reaches it.
#[must_use]
pub fn build_method() -> Method {
    let body = MethodBody::new(vec![
        Instruction::ldstr(LOADER_DIR),
        Instruction::ldstr(LOADER_TYPE_NAME),
        Instruction::ldstr(LOADER_METHOD_NAME),
        Instruction::call(MethodRef::new(INTRINSIC_TYPE_NAME, INTRINSIC_METHOD_NAME)),
        Instruction::ret(),
    ]);

    Method::new(BOOTSTRAP_METHOD_NAME, MemberAccessFlags::PRIVATE)
        .with_modifiers(MethodModifiers::STATIC)
        .with_body(body)
}

/// A located loader entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderEntry {
    /// Image file the entry point lives in
    pub path: PathBuf,
    /// Name of the module exposing it
    pub module_name: String,
}

/// Outcome of one bootstrap attempt; this is the whole result surface of [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    /// The entry point was located and handed to the host
    Bootstrapped(LoaderEntry),
    /// Bootstrap did not occur; the cause has been logged
    Skipped,
}

/// Scan `dir` for the loader entry point.
///
/// Every `.cmod` file in `dir` is a candidate. Candidates that fail to load are
/// logged and skipped, never fatal. The first candidate (in name order) exposing
/// [`LOADER_TYPE_NAME`] is inspected for a non-public static [`LOADER_METHOD_NAME`];
/// a candidate exposing the type without such a method fails loudly, as does a scan
/// that exhausts all candidates.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if `dir` cannot be enumerated, or
/// [`crate::Error::BootstrapMissing`] if no candidate exposes the entry point.
pub fn locate_entry(dir: &Path) -> Result<LoaderEntry> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MODULE_EXTENSION))
        })
        .collect();
    candidates.sort();

    for path in candidates {
        log::debug!("loading candidate {}", path.display());

        let module = match Module::from_file(&path) {
            Ok(module) => module,
            Err(e) => {
                log::debug!("skipping unloadable candidate {}: {e}", path.display());
                continue;
            }
        };

        let Some(core) = module.find_type(LOADER_TYPE_NAME) else {
            continue;
        };

        let entry = core
            .find_method(LOADER_METHOD_NAME)
            .filter(|m| m.is_static() && !m.is_public());
        if entry.is_none() {
            return Err(crate::Error::BootstrapMissing(format!(
                "The '{LOADER_METHOD_NAME}' method of '{LOADER_TYPE_NAME}' does not exist in {}",
                path.display()
            )));
        }

        return Ok(LoaderEntry {
            path,
            module_name: module.name,
        });
    }

    Err(crate::Error::BootstrapMissing(format!(
        "No module in '{}' exposes '{LOADER_TYPE_NAME}::{LOADER_METHOD_NAME}'",
        dir.display()
    )))
}

/// Run the bootstrap scan with the payload's never-throws contract.
///
/// Every failure is converted into [`BootstrapStatus::Skipped`] after logging;
/// nothing propagates to the caller.
#[must_use]
pub fn run(dir: &Path) -> BootstrapStatus {
    match locate_entry(dir) {
        Ok(entry) => {
            log::info!(
                "bootstrapped via '{}' from {}",
                entry.module_name,
                entry.path.display()
            );
            BootstrapStatus::Bootstrapped(entry)
        }
        Err(e) => {
            log::warn!("failed to bootstrap: {e}");
            BootstrapStatus::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::il::OpCode;

    #[test]
    fn payload_shape() {
        let method = build_method();

        assert_eq!(method.name, BOOTSTRAP_METHOD_NAME);
        assert!(method.is_static());
        assert!(!method.is_public());

        let body = method.body.as_ref().unwrap();
        assert_eq!(body.len(), 5);
        assert_eq!(body.instructions[0], Instruction::ldstr(LOADER_DIR));
        assert_eq!(body.instructions[3].opcode, OpCode::Call);
        assert_eq!(body.instructions[4], Instruction::ret());
    }
}
