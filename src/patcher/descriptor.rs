//! The reversible patch descriptor.
//!
//! A [`PatchDescriptor`] is the persisted `{version, start_index, end_index}` tuple
//! that makes the injection reversible: it is attached to the patched method as a
//! custom attribute and decoded back when the patch state is queried or undone.
//! The indices are 0-based positions into that method's instruction list and are
//! only meaningful while the descriptor stays attached to it.

use std::fmt;

use crate::{
    metadata::attributes::{CustomAttribute, CustomAttributeArgument},
    Result,
};

/// Decoded patch state of one patched method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDescriptor {
    /// Tool version that produced the patch
    pub version: String,
    /// Index of the first injected instruction
    pub start_index: i32,
    /// Index one past the last injected instruction
    pub end_index: i32,
}

impl PatchDescriptor {
    /// A descriptor for the current tool version covering `[start_index, end_index)`.
    #[must_use]
    pub fn current(start_index: i32, end_index: i32) -> Self {
        PatchDescriptor {
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_index,
            end_index,
        }
    }

    /// Number of instructions the descriptor covers.
    ///
    /// Widened to `i64` so the subtraction cannot overflow on hostile index pairs.
    #[must_use]
    pub fn len(&self) -> i64 {
        i64::from(self.end_index) - i64::from(self.start_index)
    }

    /// `true` if the descriptor covers no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a descriptor from its carrier attribute.
    ///
    /// The attribute must carry exactly three fixed arguments of element types
    /// (string, i32, i32). Anything else is a malformed carrier, reported as a
    /// descriptive [`crate::Error::Malformed`] rather than surfacing as an
    /// unrelated decoding failure downstream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] on argument count or element type
    /// mismatch, or if the decoded indices violate `start_index <= end_index`.
    pub fn from_attribute(attribute: &CustomAttribute) -> Result<PatchDescriptor> {
        let args = attribute.expect_args(3)?;

        let version = args[0].as_string()?.to_string();
        let start_index = args[1].as_i4()?;
        let end_index = args[2].as_i4()?;

        if start_index > end_index {
            return Err(malformed_error!(
                "Descriptor start index {} exceeds end index {}",
                start_index,
                end_index
            ));
        }

        Ok(PatchDescriptor {
            version,
            start_index,
            end_index,
        })
    }

    /// Encode the descriptor into a carrier attribute of type `ctor_type`.
    #[must_use]
    pub fn to_attribute(&self, ctor_type: &str) -> CustomAttribute {
        CustomAttribute::with_args(
            ctor_type,
            vec![
                CustomAttributeArgument::String(self.version.clone()),
                CustomAttributeArgument::I4(self.start_index),
                CustomAttributeArgument::I4(self.end_index),
            ],
        )
    }
}

impl fmt::Display for PatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version {}, instructions [{}, {})",
            self.version, self.start_index, self.end_index
        )
    }
}
