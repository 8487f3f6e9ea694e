//! The module graph and its load/save entry points.
//!
//! [`Module`] is the root of the in-memory object model: an ordered collection of
//! types (unique by full name), parsed from a compact module image and serialized
//! back to one. The graph is exclusively owned by a single invocation, mutated in
//! place, and discarded after serialization; there is no shared or static state.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilpatch::Module;
//! use std::path::Path;
//!
//! let module = Module::from_file(Path::new("StartupModule.cmod"))?;
//! println!("{} holds {} types", module.name, module.type_count());
//! # Ok::<(), cilpatch::Error>(())
//! ```

use std::{io::Write, path::Path};

use crate::{
    file::File,
    metadata::{
        read,
        typedef::{CilType, NESTED_SEPARATOR},
        write,
    },
    Result,
};

/// Conventional file extension of a compact module image, without the dot.
pub const MODULE_EXTENSION: &str = "cmod";

/// One managed module: the unit of loading, mutation, and serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module name, conventionally the file stem
    pub name: String,
    /// Module version identifier
    pub mvid: uguid::Guid,
    /// Top-level types, in declaration order
    pub types: Vec<CilType>,
}

impl Module {
    /// An empty module with the given name and a zero Mvid.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            mvid: uguid::Guid::ZERO,
            types: Vec::new(),
        }
    }

    /// Set the module version identifier, builder-style.
    #[must_use]
    pub fn with_mvid(mut self, mvid: uguid::Guid) -> Self {
        self.mvid = mvid;
        self
    }

    /// Load a module image from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be accessed, or any of
    /// the format errors of [`Module::from_bytes`] if its contents are not a valid
    /// module image.
    pub fn from_file(path: &Path) -> Result<Module> {
        let file = File::from_file(path)?;
        read::read_module(file.data())
    }

    /// Parse a module image from a byte buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input, [`crate::Error::NotSupported`]
    /// for an unknown magic or format version, and [`crate::Error::Malformed`] /
    /// [`crate::Error::OutOfBounds`] for structural damage.
    pub fn from_bytes(data: &[u8]) -> Result<Module> {
        read::read_module(data)
    }

    /// Serialize the module to a fresh byte buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the graph violates a wire constraint
    /// (e.g. an instruction operand not matching its opcode), or
    /// [`crate::Error::OutOfBounds`] if a count exceeds the encodable range.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write::write_module(self, &mut out)?;
        Ok(out)
    }

    /// Serialize the module into a writer.
    ///
    /// The engine only writes to streams; path handling, temporary files, and the
    /// replace-original sequence belong to the caller.
    ///
    /// # Errors
    /// Returns the serialization errors of [`Module::to_bytes`], or
    /// [`crate::Error::FileError`] if the writer fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Append a top-level type to the module.
    pub fn add_type(&mut self, ty: CilType) {
        self.types.push(ty);
    }

    /// Remove the first top-level type matching `full_name`, returning it.
    pub fn remove_type(&mut self, full_name: &str) -> Option<CilType> {
        let index = self.types.iter().position(|t| t.full_name() == full_name)?;
        Some(self.types.remove(index))
    }

    /// Keep only the top-level types satisfying the predicate.
    pub fn retain_types<F: FnMut(&CilType) -> bool>(&mut self, predicate: F) {
        self.types.retain(predicate);
    }

    /// Number of types in the flattened enumeration, nested types included.
    #[must_use]
    pub fn type_count(&self) -> usize {
        let mut count = 0;
        self.visit_types(|_| count += 1);
        count
    }

    /// Visit every type in pre-order: each top-level type, then its nested types.
    pub fn visit_types<F: FnMut(&CilType)>(&self, mut visitor: F) {
        fn walk<F: FnMut(&CilType)>(ty: &CilType, visitor: &mut F) {
            visitor(ty);
            for nested in &ty.nested_types {
                walk(nested, visitor);
            }
        }

        for ty in &self.types {
            walk(ty, &mut visitor);
        }
    }

    /// Mutable variant of [`Module::visit_types`].
    pub fn visit_types_mut<F: FnMut(&mut CilType)>(&mut self, mut visitor: F) {
        fn walk<F: FnMut(&mut CilType)>(ty: &mut CilType, visitor: &mut F) {
            visitor(ty);
            for nested in &mut ty.nested_types {
                walk(nested, visitor);
            }
        }

        for ty in &mut self.types {
            walk(ty, &mut visitor);
        }
    }

    /// Exact full-name lookup, first match in pre-order.
    ///
    /// Nested types are addressed as `Enclosing/Nested` (their enclosing type's full
    /// name, the separator, then each nesting level's simple name). Absence is not an
    /// error; callers decide severity.
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<&CilType> {
        fn find_in<'a>(
            types: &'a [CilType],
            prefix: Option<&str>,
            full_name: &str,
        ) -> Option<&'a CilType> {
            for ty in types {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}{NESTED_SEPARATOR}{}", ty.name),
                    None => ty.full_name(),
                };

                if path == full_name {
                    return Some(ty);
                }

                if let Some(found) = find_in(&ty.nested_types, Some(&path), full_name) {
                    return Some(found);
                }
            }

            None
        }

        find_in(&self.types, None, full_name)
    }

    /// Mutable variant of [`Module::find_type`].
    pub fn find_type_mut(&mut self, full_name: &str) -> Option<&mut CilType> {
        fn find_in<'a>(
            types: &'a mut [CilType],
            prefix: Option<&str>,
            full_name: &str,
        ) -> Option<&'a mut CilType> {
            for ty in types {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}{NESTED_SEPARATOR}{}", ty.name),
                    None => ty.full_name(),
                };

                if path == full_name {
                    return Some(ty);
                }

                if let Some(found) = find_in(&mut ty.nested_types, Some(&path), full_name) {
                    return Some(found);
                }
            }

            None
        }

        find_in(&mut self.types, None, full_name)
    }

    /// Simple-name lookup, first match in the flattened pre-order enumeration.
    #[must_use]
    pub fn find_type_by_name(&self, name: &str) -> Option<&CilType> {
        fn find_in<'a>(types: &'a [CilType], name: &str) -> Option<&'a CilType> {
            for ty in types {
                if ty.name == name {
                    return Some(ty);
                }

                if let Some(found) = find_in(&ty.nested_types, name) {
                    return Some(found);
                }
            }

            None
        }

        find_in(&self.types, name)
    }

    /// Mutable variant of [`Module::find_type_by_name`].
    pub fn find_type_by_name_mut(&mut self, name: &str) -> Option<&mut CilType> {
        fn find_in<'a>(types: &'a mut [CilType], name: &str) -> Option<&'a mut CilType> {
            for ty in types {
                if ty.name == name {
                    return Some(ty);
                }

                if let Some(found) = find_in(&mut ty.nested_types, name) {
                    return Some(found);
                }
            }

            None
        }

        find_in(&mut self.types, name)
    }
}
