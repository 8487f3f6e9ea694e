//! # cilpatch Prelude
//!
//! A curated selection of the most frequently used types from across the library,
//! allowing for convenient glob imports.
//!
//! ```rust,no_run
//! use cilpatch::prelude::*;
//!
//! let module = Module::from_file("Game.cmod".as_ref())?;
//! println!("{} types", module.type_count());
//! # Ok::<(), cilpatch::Error>(())
//! ```

/// The main error type for all cilpatch operations
pub use crate::Error;

/// The result type used throughout cilpatch
pub use crate::Result;

/// Module loading, mutation, and serialization
pub use crate::metadata::module::{Module, MODULE_EXTENSION};

/// Type definitions and members
pub use crate::metadata::{
    field::Field, method::Method, property::Property, typedef::CilType,
};

/// Flag views over the raw attribute words
pub use crate::metadata::flags::{MemberAccessFlags, MethodModifiers, TypeModifiers, TypeVisibility};

/// Instruction streams
pub use crate::metadata::il::{Instruction, MethodBody, MethodRef, OpCode, Operand};

/// Custom attributes and the attribute-carrier seam
pub use crate::metadata::attributes::{
    CustomAttribute, CustomAttributeArgument, HasCustomAttributes,
};

/// The well-known marker registry
pub use crate::metadata::markers::{MarkerKind, MarkerRegistry};

/// The visibility normalizer
pub use crate::publicizer::{publicize, PublicizeSummary};

/// The injection engine
pub use crate::patcher::{PatchDescriptor, PatchMode, PatchOutcome, PatchTarget, Patcher};

/// Bootstrap payload and discovery
pub use crate::bootstrap::{BootstrapStatus, LoaderEntry};

/// Low-level parsing utilities
pub use crate::{File, Parser};
