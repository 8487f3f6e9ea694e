// Copyright 2025 The cilpatch contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # cilpatch
//!
//! A toolchain for modifying compact managed module images at the binary level:
//! a **publicizer** that strips member-visibility restrictions across an entire
//! type graph, and a **patcher** that surgically injects a bootstrap call into an
//! existing method body, records enough metadata to reverse the operation, and
//! supports idempotent re-patching.
//!
//! ## Features
//!
//! - **Lossless module model** - Load a module image into a mutable object graph
//!   and serialize it back without losing anything that was not explicitly changed
//! - **Visibility normalization** - Widen every non-public type, field, method, and
//!   property accessor in one pass, with change counters
//! - **Reversible injection** - Insert a bootstrap call at the start of a
//!   well-known method and undo it instruction-for-instruction later
//! - **Patch state machine** - `patch` / `forcepatch` / `repatch` / `unpatch` /
//!   `info` transitions with strict preconditions
//! - **Bootstrap discovery** - The scan the injected payload triggers: enumerate
//!   companion images, tolerate unloadable candidates, select the well-known entry
//!   point
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cilpatch::prelude::*;
//! use std::path::Path;
//!
//! let mut module = Module::from_file(Path::new("Game.cmod"))?;
//!
//! let outcome = Patcher::new(&mut module).run(PatchMode::Patch)?;
//! if outcome.requires_write() {
//!     let mut out = Vec::new();
//!     module.write_to(&mut out)?;
//!     // hand `out` to a temp-file + rename sequence
//! }
//! # Ok::<(), cilpatch::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - the in-memory object model and the image format
//! - [`publicizer`] - the member visibility normalizer
//! - [`patcher`] - the injection engine and its patch descriptor
//! - [`bootstrap`] - payload synthesis and loader discovery
//! - [`Error`] and [`Result`] - crate-wide error handling
//!
//! The engine only ever writes to streams; reading a path into memory and the
//! safe temp-file-then-rename replacement of the original file are the caller's
//! responsibility, which keeps a failed write from ever corrupting the input.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// The in-memory object model for a managed module and its image format.
pub mod metadata;

/// The member visibility normalizer.
pub mod publicizer;

/// The injection engine: patch state machine and patch descriptor.
pub mod patcher;

/// Bootstrap payload synthesis and loader discovery.
pub mod bootstrap;

/// The crate-wide error type.
///
/// # Example
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
pub use error::Error;

/// The crate-wide result alias.
pub use error::Result;

/// The root of the module object model.
///
/// # Example
///
/// ```rust,no_run
/// use cilpatch::Module;
/// let module = Module::from_file(std::path::Path::new("Game.cmod"))?;
/// println!("{} types", module.type_count());
/// # Ok::<(), cilpatch::Error>(())
/// ```
pub use metadata::module::Module;

/// Low-level file and memory parsing utilities.
pub use file::{File, Parser};
