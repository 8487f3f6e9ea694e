use std::{path::Path, str::FromStr};

use anyhow::anyhow;
use cilpatch::patcher::{PatchMode, PatchOutcome, Patcher};
use serde_json::json;

use crate::{
    app::GlobalOptions,
    commands::{load_module, write_module},
    exit::{CliResult, ExitCode, Failure},
    output,
};

/// Run one patch mode against `path`, replacing it in place unless `output` is set.
pub fn run(path: &Path, output: Option<&Path>, mode: &str, opts: &GlobalOptions) -> CliResult {
    let Ok(mode) = PatchMode::from_str(mode) else {
        return Err(Failure::new(
            ExitCode::InvalidMode,
            anyhow!("invalid patch mode '{mode}'"),
        ));
    };

    let mut module = load_module(path)?;

    let outcome = Patcher::new(&mut module)
        .run(mode)
        .map_err(|e| Failure::engine("mutate: patch operation failed", e))?;

    match &outcome {
        PatchOutcome::Info(None) => {
            return Err(Failure::new(
                ExitCode::NotPatched,
                anyhow!("module is not patched"),
            ));
        }
        PatchOutcome::Info(Some(descriptor)) => {
            output::emit(
                opts,
                json!({
                    "patched": true,
                    "version": descriptor.version.clone(),
                    "start_index": descriptor.start_index,
                    "end_index": descriptor.end_index,
                }),
                || {
                    println!("Acquired patch info:");
                    println!("- Version: {}", descriptor.version);
                    println!("- Start index: {}", descriptor.start_index);
                    println!("- End index: {}", descriptor.end_index);
                },
            );
            return Ok(());
        }
        PatchOutcome::Patched(_) | PatchOutcome::Unpatched => {}
    }

    let output_path = output.unwrap_or(path);
    write_module(&module, output_path)?;

    match outcome {
        PatchOutcome::Patched(descriptor) => output::emit(
            opts,
            json!({
                "mode": mode.to_string(),
                "version": descriptor.version.clone(),
                "start_index": descriptor.start_index,
                "end_index": descriptor.end_index,
                "output": output_path.display().to_string(),
            }),
            || println!("Successfully patched the module ({descriptor})."),
        ),
        PatchOutcome::Unpatched => output::emit(
            opts,
            json!({
                "mode": mode.to_string(),
                "output": output_path.display().to_string(),
            }),
            || println!("Successfully unpatched the module."),
        ),
        PatchOutcome::Info(_) => unreachable!("info never reaches the write path"),
    }

    Ok(())
}
