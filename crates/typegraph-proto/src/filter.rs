//! Flat, string-keyed search filters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Filter parameters narrowing a type or entity listing.
///
/// No parameter is mandatory. Consumers ignore keys they do not understand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Parameter name to values.
    #[serde(default)]
    pub params: BTreeMap<String, Vec<String>>,
}

impl SearchFilter {
    /// Create an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(name.into()).or_default().push(value.into());
        self
    }

    /// First value of a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a parameter.
    pub fn param_values(&self, name: &str) -> &[String] {
        self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.params.values().all(Vec::is_empty)
    }

    /// Flatten into `(name, value)` pairs, one per value.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.clone(), v.clone())))
            .collect()
    }
}
