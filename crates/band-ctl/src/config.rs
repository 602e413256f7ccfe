//! Hierarchical configuration source
//!
//! Band settings are described by a device-tree-like structure: named nodes
//! carrying key/value properties and named children. The loader only needs
//! the small read surface of [`ConfigNode`]; [`ConfigTree`] is an in-memory
//! implementation used by simulations and tests, and (with the `serde`
//! feature) for loading descriptions from files.

use std::collections::BTreeMap;

use crate::error::PropertyError;

/// Read access to one node of the configuration hierarchy
pub trait ConfigNode {
    /// The node's own name
    fn name(&self) -> &str;

    /// Whether the property exists, whatever its value
    fn has_property(&self, key: &str) -> bool;

    /// Read a single unsigned 64-bit value
    ///
    /// Returns `Ok(None)` when the property is absent.
    fn read_u64(&self, key: &str) -> Result<Option<u64>, PropertyError>;

    /// Read a variable-length array of 32-bit cells
    ///
    /// Returns `Ok(None)` when the property is absent.
    fn read_u32_array(&self, key: &str) -> Result<Option<Vec<u32>>, PropertyError>;

    /// Look up a direct child by exact name
    fn child(&self, name: &str) -> Option<&Self>;
}

/// A property value in a [`ConfigTree`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum PropertyValue {
    /// Present without a payload
    Flag(bool),
    Number(u64),
    Array(Vec<u64>),
    /// Free-form reference, e.g. a line controller and offset
    Text(String),
}

impl PropertyValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Flag(_) => "flag",
            Self::Number(_) => "number",
            Self::Array(_) => "array",
            Self::Text(_) => "text",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        Self::Number(v)
    }
}

impl From<Vec<u32>> for PropertyValue {
    fn from(v: Vec<u32>) -> Self {
        Self::Array(v.into_iter().map(u64::from).collect())
    }
}

impl From<&[u32]> for PropertyValue {
    fn from(v: &[u32]) -> Self {
        Self::Array(v.iter().copied().map(u64::from).collect())
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// In-memory configuration node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigTree {
    name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    properties: BTreeMap<String, PropertyValue>,
    #[cfg_attr(feature = "serde", serde(default))]
    children: Vec<ConfigTree>,
}

impl ConfigTree {
    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style property insertion
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Builder-style child insertion
    pub fn with_child(mut self, child: ConfigTree) -> Self {
        self.children.push(child);
        self
    }

    /// Insert or replace a property
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Remove a property, returning its old value
    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    /// Append a child node
    pub fn add_child(&mut self, child: ConfigTree) {
        self.children.push(child);
    }

    /// Remove the first child named `name`
    pub fn remove_child(&mut self, name: &str) -> Option<ConfigTree> {
        let index = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(index))
    }

    /// Mutable access to the first child named `name`
    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigTree> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn children(&self) -> &[ConfigTree] {
        &self.children
    }
}

impl ConfigNode for ConfigTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn read_u64(&self, key: &str) -> Result<Option<u64>, PropertyError> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(PropertyValue::Number(v)) => Ok(Some(*v)),
            Some(other) => Err(PropertyError::TypeMismatch {
                expected: "number",
                found: other.kind(),
            }),
        }
    }

    fn read_u32_array(&self, key: &str) -> Result<Option<Vec<u32>>, PropertyError> {
        let cells: &[u64] = match self.properties.get(key) {
            None => return Ok(None),
            Some(PropertyValue::Array(cells)) => cells.as_slice(),
            Some(PropertyValue::Number(v)) => std::slice::from_ref(v),
            Some(other) => {
                return Err(PropertyError::TypeMismatch {
                    expected: "array",
                    found: other.kind(),
                })
            }
        };

        cells
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                u32::try_from(value).map_err(|_| PropertyError::OutOfRange { value, index })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigTree {
        ConfigTree::new("phy")
            .with_property("band-ctl-0-gpio", "gpio0 12")
            .with_child(
                ConfigTree::new("band_a")
                    .with_property("adi,lo-freq-min", 100u64)
                    .with_property("adi,gpio-settings", vec![1u32, 2]),
            )
    }

    #[test]
    fn test_reads() {
        let tree = sample();
        assert!(tree.has_property("band-ctl-0-gpio"));
        assert!(!tree.has_property("band-ctl-1-gpio"));

        let band = tree.child("band_a").unwrap();
        assert_eq!(band.name(), "band_a");
        assert_eq!(band.read_u64("adi,lo-freq-min"), Ok(Some(100)));
        assert_eq!(band.read_u64("adi,lo-freq-max"), Ok(None));
        assert_eq!(band.read_u32_array("adi,gpio-settings"), Ok(Some(vec![1, 2])));
        assert_eq!(band.read_u32_array("adi,lo-freq-min"), Ok(Some(vec![100])));
        assert!(tree.child("band_b").is_none());
    }

    #[test]
    fn test_type_mismatch() {
        let tree = sample();
        assert_eq!(
            tree.read_u64("band-ctl-0-gpio"),
            Err(PropertyError::TypeMismatch {
                expected: "number",
                found: "text",
            })
        );
    }

    #[test]
    fn test_wide_cell_rejected() {
        let tree = ConfigTree::new("n").with_property("cells", PropertyValue::Array(vec![1, 1 << 40]));
        assert_eq!(
            tree.read_u32_array("cells"),
            Err(PropertyError::OutOfRange {
                value: 1 << 40,
                index: 1,
            })
        );
    }

    #[test]
    fn test_remove_child() {
        let mut tree = sample();
        assert!(tree.remove_child("band_a").is_some());
        assert!(tree.remove_child("band_a").is_none());
        assert!(tree.children().is_empty());
    }
}
