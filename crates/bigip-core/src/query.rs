//! Convenience builders for HTTP query parameters.
//!
//! iControl REST uses OData-style options on collection endpoints (`$select`, `$filter`,
//! `$top`, `$skip`) plus `expandSubcollections`.

use std::fmt::Display;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
    }

    /// Append using a mapping function when the value is present.
    pub fn push_opt_with<T, F>(&mut self, key: &'static str, value: Option<T>, mut map: F)
    where
        F: FnMut(T) -> String,
    {
        if let Some(value) = value {
            self.pairs.push((key, map(value)));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Options accepted by every collection endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    /// Restrict the returned properties (`$select=name,fullPath`).
    pub select: Vec<String>,
    /// Only return objects from this partition (`$filter=partition eq Tenant`).
    pub partition: Option<String>,
    /// Inline sub-collections such as pool members.
    pub expand_subcollections: Option<bool>,
    /// Page size.
    pub top: Option<u32>,
    /// Page offset.
    pub skip: Option<u32>,
}

impl CollectionQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a property.
    #[must_use]
    pub fn with_select(mut self, field: impl Into<String>) -> Self {
        self.select.push(field.into());
        self
    }

    /// Filter by partition.
    #[must_use]
    pub fn in_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// Expand sub-collections inline.
    #[must_use]
    pub const fn expand_subcollections(mut self, expand: bool) -> Self {
        self.expand_subcollections = Some(expand);
        self
    }

    /// Set page size and offset.
    #[must_use]
    pub const fn with_page(mut self, top: u32, skip: u32) -> Self {
        self.top = Some(top);
        self.skip = Some(skip);
        self
    }

    /// Convert to URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        if !self.select.is_empty() {
            params.push("$select", self.select.join(","));
        }
        params.push_opt_with("$filter", self.partition.as_deref(), |p| {
            format!("partition eq {p}")
        });
        params.push_opt("expandSubcollections", self.expand_subcollections);
        params.push_opt("$top", self.top);
        params.push_opt("$skip", self.skip);
        params.into_pairs()
    }
}
