use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into three groups that callers usually handle differently:
///
/// ## Format errors
/// - [`Error::Malformed`] - Corrupted or invalid module image structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the image boundaries
/// - [`Error::NotSupported`] - Unsupported image format or format version
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors while reading an image
///
/// All of these abort before any mutation has taken place.
///
/// ## Patch state errors
/// - [`Error::TargetNotFound`] - The well-known patch target type/method is absent
/// - [`Error::AlreadyPatched`] - Patch requested on a module that carries a patch descriptor
/// - [`Error::NotPatched`] - Unpatch/RePatch requested on a module without a descriptor
///
/// State preconditions are checked before the mutation sequence starts, so a failed
/// precondition leaves the in-memory module untouched.
///
/// ## Mutation and discovery errors
/// - [`Error::Patch`] - Unexpected failure inside the patch/unpatch mutation sequence
/// - [`Error::TypeNotFound`] - A required type lookup failed mid-operation
/// - [`Error::BootstrapMissing`] - No companion module exposes the bootstrap entry point
///
/// # Examples
///
/// ```rust
/// use cilpatch::{Error, Module};
///
/// match Module::from_bytes(&[0xFF; 8]) {
///     Ok(_) => unreachable!(),
///     Err(Error::NotSupported) => { /* not a module image */ }
///     Err(e) => panic!("unexpected error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The image is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the image.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The provided data is not a supported module image.
    #[error("This file format is not supported!")]
    NotSupported,

    /// The provided input is empty.
    #[error("The provided input is empty")]
    Empty,

    /// Error while accessing the provided file.
    #[error("Error while accessing the file - {0}")]
    FileError(#[from] std::io::Error),

    /// A type lookup by full name failed.
    #[error("Type '{0}' was not found in the module")]
    TypeNotFound(String),

    /// The well-known patch target could not be located in the module.
    #[error("Patch target '{type_name}::{method_name}' was not found in the module")]
    TargetNotFound {
        /// Simple name of the well-known target type
        type_name: String,
        /// Name of the well-known target method
        method_name: String,
    },

    /// The module already carries a patch descriptor.
    #[error("The module is already patched")]
    AlreadyPatched,

    /// The module does not carry a patch descriptor.
    #[error("The module is not patched")]
    NotPatched,

    /// An unexpected failure occurred during the patch or unpatch mutation sequence.
    #[error("Patch operation failed - {0}")]
    Patch(String),

    /// No module in the scanned directory exposes the bootstrap entry point.
    #[error("The bootstrap entry point was not found - {0}")]
    BootstrapMissing(String),
}

/// `Result<T, Error>`
///
/// Provides a custom `Result` type, defaulting the error to the crate [`crate::Error`] type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_error_carries_location() {
        let err = malformed_error!("bad tag {:#04x}", 0xFFu8);
        match err {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "bad tag 0xff");
                assert!(file.ends_with("error.rs"));
            }
            _ => panic!("expected Malformed"),
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::FileError(_)));
    }
}
