use std::path::Path;

use cilpatch::publicizer;
use serde_json::json;

use crate::{
    app::GlobalOptions,
    commands::{load_module, suffixed_path, write_module},
    exit::CliResult,
    output,
};

/// Publicize `path`, writing the widened module next to it (or to `output`).
pub fn run(path: &Path, output: Option<&Path>, opts: &GlobalOptions) -> CliResult {
    let mut module = load_module(path)?;

    let summary = publicizer::publicize(&mut module);

    let output_path = match output {
        Some(output) => output.to_path_buf(),
        None => suffixed_path(path, "_publicized"),
    };
    write_module(&module, &output_path)?;

    output::emit(
        opts,
        json!({
            "output": output_path.display().to_string(),
            "classes": summary.classes,
            "methods": summary.methods,
            "fields": summary.fields,
            "properties": summary.properties,
        }),
        || {
            println!("Publicize result -");
            println!("{summary}");
            println!("Written to {}", output_path.display());
        },
    );

    Ok(())
}
