//! Property member model.
//!
//! Properties do not carry code themselves; they name their accessor methods, which
//! live in the declaring type's method list. The visibility normalizer widens the
//! accessors, not the property.

use crate::metadata::attributes::{CustomAttribute, HasCustomAttributes};

/// A property owned by exactly one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Name of the getter method on the declaring type, if any
    pub getter: Option<String>,
    /// Name of the setter method on the declaring type, if any
    pub setter: Option<String>,
    /// Attached custom attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Property {
    /// A property named `name` with the given accessor method names.
    #[must_use]
    pub fn new(name: &str, getter: Option<&str>, setter: Option<&str>) -> Self {
        Property {
            name: name.to_string(),
            getter: getter.map(str::to_string),
            setter: setter.map(str::to_string),
            custom_attributes: Vec::new(),
        }
    }
}

impl HasCustomAttributes for Property {
    fn custom_attributes(&self) -> &[CustomAttribute] {
        &self.custom_attributes
    }

    fn custom_attributes_mut(&mut self) -> &mut Vec<CustomAttribute> {
        &mut self.custom_attributes
    }
}
