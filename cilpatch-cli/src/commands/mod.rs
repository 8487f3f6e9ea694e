//! Subcommand implementations and the file plumbing they share.
//!
//! The engine only reads and writes byte buffers; everything path-shaped lives
//! here: extension checks, reading the input fully into memory, and the safe
//! temp-file-then-rename sequence that keeps a failed write from corrupting the
//! original image.

pub mod patch;
pub mod publicize;

use std::{fs, path::Path};

use anyhow::anyhow;
use cilpatch::prelude::*;

use crate::exit::{CliResult, ExitCode, Failure};

/// Validate the path and load the module image into memory.
///
/// Failure phases map onto distinct exit codes: wrong extension, missing file,
/// unreadable file, unparseable image.
pub fn load_module(path: &Path) -> CliResult<Module> {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODULE_EXTENSION));
    if !has_extension {
        return Err(Failure::new(
            ExitCode::InvalidExtension,
            anyhow!(
                "'{}' does not carry the .{MODULE_EXTENSION} extension",
                path.display()
            ),
        ));
    }

    if !path.exists() {
        return Err(Failure::new(
            ExitCode::InputNotFound,
            anyhow!("module image '{}' was not found", path.display()),
        ));
    }

    let data = fs::read(path).map_err(|e| {
        Failure::new(
            ExitCode::UnreadableInput,
            anyhow::Error::new(e).context("read: failed to read the module image"),
        )
    })?;

    log::debug!("read {} bytes from {}", data.len(), path.display());
    Module::from_bytes(&data).map_err(|e| Failure::engine("parse: not a valid module image", e))
}

/// Serialize `module` and replace `path` through a temporary sibling file.
///
/// The image is written fully to `<path>.tmp` first; only after a complete write
/// does the sequence remove the destination and rename the temporary into place.
/// A failure before the rename leaves the original untouched.
pub fn write_module(module: &Module, path: &Path) -> CliResult {
    let bytes = module
        .to_bytes()
        .map_err(|e| Failure::engine("write: failed to serialize the module", e))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                Failure::new(
                    ExitCode::TempWriteFailed,
                    anyhow::Error::new(e).context("write: failed to create the output directory"),
                )
            })?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &bytes).map_err(|e| {
        Failure::new(
            ExitCode::TempWriteFailed,
            anyhow::Error::new(e).context(format!(
                "write: failed to write the temporary image '{}'",
                temp_path.display()
            )),
        )
    })?;

    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            // Clean the temporary up; the original stays in place
            let _ = fs::remove_file(&temp_path);
            return Err(Failure::new(
                ExitCode::ReplaceFailed,
                anyhow::Error::new(e).context("finalize: failed to remove the original image"),
            ));
        }
    }

    fs::rename(&temp_path, path).map_err(|e| {
        Failure::new(
            ExitCode::ReplaceFailed,
            anyhow::Error::new(e).context("finalize: failed to rename the temporary image"),
        )
    })?;

    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// `<stem><suffix>.<ext>` next to `path`.
pub fn suffixed_path(path: &Path, suffix: &str) -> std::path::PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!("{stem}{suffix}.{MODULE_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixed_path_keeps_directory_and_extension() {
        let path = Path::new("managed/Game.cmod");
        assert_eq!(
            suffixed_path(path, "_publicized"),
            Path::new("managed/Game_publicized.cmod")
        );
    }

    #[test]
    fn wrong_extension_is_rejected_before_reading() {
        let err = load_module(Path::new("Game.dll")).unwrap_err();
        assert_eq!(err.code, ExitCode::InvalidExtension);
    }

    #[test]
    fn missing_input_is_its_own_code() {
        let err = load_module(Path::new("absent.cmod")).unwrap_err();
        assert_eq!(err.code, ExitCode::InputNotFound);
    }
}
