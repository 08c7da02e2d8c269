//! Hierarchical registry key names.

use crate::{RegistryError, RegistryResult};
use std::fmt;

/// Separator used when rendering a path, matching native registry notation.
pub const PATH_SEPARATOR: char = '\\';

/// A validated, hierarchical registry key name such as
/// `software\mono\asp.net\4.0\autogenkeys\1a2b3c4d-0`.
///
/// Components are non-empty, contain no path separators or NUL bytes,
/// and are never `.` or `..`, so every backend can map them to its own
/// namespace without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryPath {
    components: Vec<String>,
}

impl RegistryPath {
    /// Build a path from its components.
    pub fn new<I, S>(components: I) -> RegistryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        if components.is_empty() {
            return Err(RegistryError::InvalidPath("path has no components".to_string()));
        }
        for component in &components {
            validate_component(component)?;
        }
        Ok(Self { components })
    }

    /// Parse a `\`-separated path.
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        Self::new(raw.split(PATH_SEPARATOR))
    }

    /// Return a new path with `component` appended.
    pub fn join(&self, component: &str) -> RegistryResult<Self> {
        validate_component(component)?;
        let mut components = self.components.clone();
        components.push(component.to_string());
        Ok(Self { components })
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(component)?;
            first = false;
        }
        Ok(())
    }
}

fn validate_component(component: &str) -> RegistryResult<()> {
    if component.is_empty() {
        return Err(RegistryError::InvalidPath("empty path component".to_string()));
    }
    if component == "." || component == ".." {
        return Err(RegistryError::InvalidPath(format!(
            "relative path component: {component}"
        )));
    }
    if component.contains(['\\', '/', '\0']) {
        return Err(RegistryError::InvalidPath(format!(
            "path component contains a separator: {component:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path = RegistryPath::parse(r"software\mono\asp.net").unwrap();
        assert_eq!(path.components(), &["software", "mono", "asp.net"]);
        assert_eq!(path.to_string(), r"software\mono\asp.net");
    }

    #[test]
    fn join_appends_component() {
        let base = RegistryPath::new(["software", "mono"]).unwrap();
        let joined = base.join("asp.net").unwrap();
        assert_eq!(joined.to_string(), r"software\mono\asp.net");
        assert_eq!(base.components().len(), 2);
    }

    #[test]
    fn rejects_traversal_and_separators() {
        assert!(RegistryPath::new(Vec::<String>::new()).is_err());
        assert!(RegistryPath::parse(r"software\\mono").is_err());
        assert!(RegistryPath::new(["software", ".."]).is_err());
        assert!(RegistryPath::new(["."]).is_err());
        assert!(RegistryPath::new(["a/b"]).is_err());
        assert!(RegistryPath::new(["nul\0"]).is_err());

        let base = RegistryPath::new(["software"]).unwrap();
        assert!(matches!(
            base.join("../etc"),
            Err(RegistryError::InvalidPath(_))
        ));
    }
}
