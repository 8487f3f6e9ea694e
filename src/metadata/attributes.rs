//! Custom attribute model.
//!
//! A [`CustomAttribute`] is an annotation attached to a type or member, referencing
//! its constructor type by full name and carrying a fixed ordered list of typed
//! constructor arguments. Attribute presence is the sole source of truth for the
//! toolchain's marker state (injected / patched / ignored); the argument payload
//! only matters for the patch descriptor.
//!
//! Argument values are tagged on the wire with their ECMA-335 element type code,
//! which is what [`CustomAttributeArgument::element_type`] exposes.

use crate::Result;

/// `ELEMENT_TYPE_BOOLEAN`
pub const ELEMENT_TYPE_BOOLEAN: u8 = 0x02;
/// `ELEMENT_TYPE_I4`
pub const ELEMENT_TYPE_I4: u8 = 0x08;
/// `ELEMENT_TYPE_I8`
pub const ELEMENT_TYPE_I8: u8 = 0x0A;
/// `ELEMENT_TYPE_R8`
pub const ELEMENT_TYPE_R8: u8 = 0x0D;
/// `ELEMENT_TYPE_STRING`
pub const ELEMENT_TYPE_STRING: u8 = 0x0E;

/// A single fixed custom attribute argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Signed 32-bit integer
    I4(i32),
    /// Signed 64-bit integer
    I8(i64),
    /// 64-bit floating point
    R8(f64),
    /// UTF-8 string
    String(String),
}

impl CustomAttributeArgument {
    /// The ECMA element type code this argument is tagged with on the wire.
    #[must_use]
    pub fn element_type(&self) -> u8 {
        match self {
            CustomAttributeArgument::Bool(_) => ELEMENT_TYPE_BOOLEAN,
            CustomAttributeArgument::I4(_) => ELEMENT_TYPE_I4,
            CustomAttributeArgument::I8(_) => ELEMENT_TYPE_I8,
            CustomAttributeArgument::R8(_) => ELEMENT_TYPE_R8,
            CustomAttributeArgument::String(_) => ELEMENT_TYPE_STRING,
        }
    }

    /// Decode the argument as `i32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the argument is not an `I4`.
    pub fn as_i4(&self) -> Result<i32> {
        match self {
            CustomAttributeArgument::I4(value) => Ok(*value),
            other => Err(malformed_error!(
                "Expected I4 attribute argument, found element type {:#04x}",
                other.element_type()
            )),
        }
    }

    /// Decode the argument as a string slice.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the argument is not a `String`.
    pub fn as_string(&self) -> Result<&str> {
        match self {
            CustomAttributeArgument::String(value) => Ok(value),
            other => Err(malformed_error!(
                "Expected String attribute argument, found element type {:#04x}",
                other.element_type()
            )),
        }
    }
}

/// An attribute instance attached to a type or member.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    /// Full name of the attribute constructor's declaring type
    pub ctor_type: String,
    /// Fixed arguments from the constructor signature
    pub fixed_args: Vec<CustomAttributeArgument>,
}

impl CustomAttribute {
    /// A zero-argument marker instance of the attribute type `ctor_type`.
    #[must_use]
    pub fn marker(ctor_type: &str) -> Self {
        CustomAttribute {
            ctor_type: ctor_type.to_string(),
            fixed_args: Vec::new(),
        }
    }

    /// An instance of `ctor_type` with the given fixed arguments.
    #[must_use]
    pub fn with_args(ctor_type: &str, fixed_args: Vec<CustomAttributeArgument>) -> Self {
        CustomAttribute {
            ctor_type: ctor_type.to_string(),
            fixed_args,
        }
    }

    /// `true` if this attribute's constructor type matches `full_name`.
    #[must_use]
    pub fn is(&self, full_name: &str) -> bool {
        self.ctor_type == full_name
    }

    /// Require exactly `count` fixed arguments.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] on a count mismatch.
    pub fn expect_args(&self, count: usize) -> Result<&[CustomAttributeArgument]> {
        if self.fixed_args.len() != count {
            return Err(malformed_error!(
                "Attribute '{}' carries {} fixed arguments, expected {}",
                self.ctor_type,
                self.fixed_args.len(),
                count
            ));
        }

        Ok(&self.fixed_args)
    }
}

/// Seam for everything that can carry custom attributes.
///
/// Types, fields, methods, and properties all expose their attribute list through
/// this trait so marker tagging and queries are written once.
pub trait HasCustomAttributes {
    /// The attached attributes.
    fn custom_attributes(&self) -> &[CustomAttribute];

    /// Mutable access to the attached attributes.
    fn custom_attributes_mut(&mut self) -> &mut Vec<CustomAttribute>;

    /// First attached attribute whose constructor type matches `full_name`.
    fn find_attribute(&self, full_name: &str) -> Option<&CustomAttribute> {
        self.custom_attributes().iter().find(|a| a.is(full_name))
    }

    /// `true` if any attached attribute matches `full_name`.
    fn has_attribute(&self, full_name: &str) -> bool {
        self.find_attribute(full_name).is_some()
    }

    /// Remove every attached attribute matching `full_name`.
    fn remove_attribute(&mut self, full_name: &str) {
        self.custom_attributes_mut().retain(|a| !a.is(full_name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_has_no_args() {
        let attr = CustomAttribute::marker("InjectedAttribute");
        assert!(attr.is("InjectedAttribute"));
        assert!(!attr.is("PatchedAttribute"));
        assert!(attr.expect_args(0).is_ok());
        assert!(attr.expect_args(3).is_err());
    }

    #[test]
    fn typed_accessors_enforce_element_type() {
        let arg = CustomAttributeArgument::String("1.0.0".into());
        assert_eq!(arg.as_string().unwrap(), "1.0.0");
        assert!(arg.as_i4().is_err());

        let arg = CustomAttributeArgument::I4(7);
        assert_eq!(arg.as_i4().unwrap(), 7);
        assert_eq!(arg.element_type(), ELEMENT_TYPE_I4);
    }
}
