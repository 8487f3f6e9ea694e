//! Process exit codes and the failure type commands report through.
//!
//! The codes are a closed enumeration; scripts built around the tool match on
//! them, so every failure path maps to exactly one.

use cilpatch::Error;

/// The closed set of process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The requested operation completed.
    Success = 0,
    /// The command line did not parse.
    InvalidArguments = 1,
    /// The input module image does not exist.
    InputNotFound = 2,
    /// The input module image could not be read or parsed.
    UnreadableInput = 3,
    /// The input path does not carry the module image extension.
    InvalidExtension = 4,
    /// The requested patch mode does not exist.
    InvalidMode = 6,
    /// The module is not patched.
    NotPatched = 7,
    /// The module is already patched and patching was not forced.
    AlreadyPatched = 8,
    /// The mutation sequence failed.
    PatchException = 10,
    /// The temporary output file could not be written.
    TempWriteFailed = 64,
    /// The module graph could not be serialized.
    BuildFailed = 65,
    /// The original file could not be replaced by the temporary output.
    ReplaceFailed = 66,
}

impl ExitCode {
    /// The numeric process exit code.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Map an engine error onto its exit code.
pub fn code_for(error: &Error) -> ExitCode {
    match error {
        Error::Malformed { .. }
        | Error::OutOfBounds
        | Error::NotSupported
        | Error::Empty
        | Error::FileError(_) => ExitCode::UnreadableInput,
        Error::AlreadyPatched => ExitCode::AlreadyPatched,
        Error::NotPatched => ExitCode::NotPatched,
        Error::TargetNotFound { .. }
        | Error::TypeNotFound(_)
        | Error::Patch(_)
        | Error::BootstrapMissing(_) => ExitCode::PatchException,
    }
}

/// A failed command: which exit code to terminate with, and why.
#[derive(Debug)]
pub struct Failure {
    /// The exit code to terminate with
    pub code: ExitCode,
    /// The cause chain, reported to stderr
    pub error: anyhow::Error,
}

impl Failure {
    /// A failure with an explicit code.
    pub fn new(code: ExitCode, error: impl Into<anyhow::Error>) -> Self {
        Failure {
            code,
            error: error.into(),
        }
    }

    /// A failure whose code is derived from the engine error, with a phase label
    /// prepended to the cause chain.
    pub fn engine(phase: &'static str, error: Error) -> Self {
        let code = code_for(&error);
        Failure {
            code,
            error: anyhow::Error::new(error).context(phase),
        }
    }
}

/// Result alias for command implementations.
pub type CliResult<T = ()> = Result<T, Failure>;
