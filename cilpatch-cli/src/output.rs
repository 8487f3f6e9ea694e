use crate::app::GlobalOptions;

/// Print `json` (if `--json`) or run `human` for human-readable output.
pub fn emit(opts: &GlobalOptions, json: serde_json::Value, human: impl FnOnce()) {
    if opts.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json).expect("JSON value always serializes")
        );
    } else {
        human();
    }
}
