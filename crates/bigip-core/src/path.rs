//! Partition path utilities.
//!
//! BIG-IP identifies configuration objects by a *full path* such as `/Common/www.example.com`
//! or `/Tenant/app.app/pool1`. When a full path is used as a REST URL segment every `/` is
//! replaced with `~`, giving `~Common~www.example.com`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::Error;

/// Separator used by full paths in configuration objects.
pub const PATH_SEPARATOR: char = '/';
/// Separator used when a full path is embedded in a REST URL.
pub const URI_SEPARATOR: char = '~';
/// Partition every BIG-IP system ships with.
pub const DEFAULT_PARTITION: &str = "Common";

/// Errors that can occur when parsing a full path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FullPathError {
    /// The path was empty.
    #[error("full path cannot be empty")]
    Empty,
    /// The path did not start with a separator, so it carries no partition.
    #[error("full path `{0}` is missing a partition")]
    MissingPartition(String),
    /// The path only named a partition.
    #[error("full path `{0}` is missing an object name")]
    MissingName(String),
    /// A component was empty, for example two adjacent separators or a trailing separator.
    #[error("full path `{0}` contains an empty component")]
    EmptyComponent(String),
    /// A component contained `/` or `~`.
    #[error("full path component `{component}` contains invalid character `{character}`")]
    InvalidCharacter {
        /// Offending component.
        component: String,
        /// Offending character.
        character: char,
    },
}

impl From<FullPathError> for Error {
    fn from(err: FullPathError) -> Self {
        Error::InvalidPath(err.to_string())
    }
}

/// Strongly-typed BIG-IP full path (`/Partition[/folder...]/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullPath {
    partition: String,
    folders: Vec<String>,
    name: String,
}

impl FullPath {
    /// Creates a full path for an object directly inside `partition`.
    ///
    /// # Errors
    ///
    /// Returns [`FullPathError`] when either component is empty or contains `/` or `~`.
    pub fn new(
        partition: impl Into<String>,
        name: impl Into<String>,
    ) -> std::result::Result<Self, FullPathError> {
        let partition = partition.into();
        let name = name.into();
        let described = format!("{PATH_SEPARATOR}{partition}{PATH_SEPARATOR}{name}");
        check_component(&partition, &described)?;
        check_component(&name, &described)?;
        Ok(Self {
            partition,
            folders: Vec::new(),
            name,
        })
    }

    /// Creates a full path inside the `Common` partition.
    ///
    /// # Errors
    ///
    /// Returns [`FullPathError`] when `name` is empty or contains `/` or `~`.
    pub fn in_common(name: impl Into<String>) -> std::result::Result<Self, FullPathError> {
        Self::new(DEFAULT_PARTITION, name)
    }

    /// Appends a folder (for example an iApp `*.app` folder) between partition and name.
    ///
    /// # Errors
    ///
    /// Returns [`FullPathError`] when `folder` is empty or contains `/` or `~`.
    pub fn with_folder(
        mut self,
        folder: impl Into<String>,
    ) -> std::result::Result<Self, FullPathError> {
        let folder = folder.into();
        check_component(&folder, &self.to_string())?;
        self.folders.push(folder);
        Ok(self)
    }

    /// Parses a full path in either slash (`/P/N`) or tilde (`~P~N`) notation.
    ///
    /// # Errors
    ///
    /// Returns [`FullPathError`] when the input is empty, lacks a partition or name, or contains
    /// empty components.
    pub fn parse(input: impl AsRef<str>) -> std::result::Result<Self, FullPathError> {
        let raw = input.as_ref().trim();
        let mut chars = raw.chars();
        let separator = match chars.next() {
            None => return Err(FullPathError::Empty),
            Some(ch @ (PATH_SEPARATOR | URI_SEPARATOR)) => ch,
            Some(_) => return Err(FullPathError::MissingPartition(raw.to_string())),
        };

        let mut components = Vec::new();
        for component in chars.as_str().split(separator) {
            check_component(component, raw)?;
            components.push(component.to_string());
        }

        if components.len() < 2 {
            return Err(FullPathError::MissingName(raw.to_string()));
        }

        let name = components.pop().unwrap_or_default();
        let partition = components.remove(0);

        Ok(Self {
            partition,
            folders: components,
            name,
        })
    }

    /// Partition containing the object.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Folders between partition and name, outermost first.
    #[must_use]
    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the object lives in the `Common` partition.
    #[must_use]
    pub fn is_common(&self) -> bool {
        self.partition == DEFAULT_PARTITION
    }

    /// Renders the path with `~` separators for use as a URL segment.
    #[must_use]
    pub fn to_uri_segment(&self) -> String {
        self.join(URI_SEPARATOR)
    }

    fn join(&self, separator: char) -> String {
        let mut out = String::new();
        for component in std::iter::once(&self.partition)
            .chain(self.folders.iter())
            .chain(std::iter::once(&self.name))
        {
            out.push(separator);
            out.push_str(component);
        }
        out
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(PATH_SEPARATOR))
    }
}

impl FromStr for FullPath {
    type Err = FullPathError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FullPath {
    type Error = FullPathError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// A component is non-empty and free of both separators.
fn check_component(component: &str, path: &str) -> std::result::Result<(), FullPathError> {
    if component.is_empty() {
        return Err(FullPathError::EmptyComponent(path.to_string()));
    }
    match component
        .chars()
        .find(|ch| matches!(*ch, PATH_SEPARATOR | URI_SEPARATOR))
    {
        Some(character) => Err(FullPathError::InvalidCharacter {
            component: component.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

impl TryFrom<&str> for FullPath {
    type Error = FullPathError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FullPath> for String {
    fn from(value: FullPath) -> Self {
        value.to_string()
    }
}

/// Converts an object name or full path into its URL segment form.
///
/// Bare names pass through untouched; every `/` becomes `~`.
#[must_use]
pub fn escape_name(name: &str) -> String {
    name.replace(PATH_SEPARATOR, &URI_SEPARATOR.to_string())
}

/// Converts a URL segment back into slash notation.
#[must_use]
pub fn unescape_name(segment: &str) -> String {
    segment.replace(URI_SEPARATOR, &PATH_SEPARATOR.to_string())
}
