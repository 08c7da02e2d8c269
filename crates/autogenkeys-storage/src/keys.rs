//! Registry value names.

/// Names of the values written under each key location.
pub struct ValueNames;

impl ValueNames {
    /// Key bytes (binary)
    pub const AUTO_GEN_KEY: &'static str = "AutoGenKey";

    /// Creation time in ticks (qword)
    pub const AUTO_GEN_KEY_CREATION_TIME: &'static str = "AutoGenKeyCreationTime";

    /// Record format version (dword)
    pub const AUTO_GEN_KEY_FORMAT: &'static str = "AutoGenKeyFormat";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_names_are_unique() {
        let names = [
            ValueNames::AUTO_GEN_KEY,
            ValueNames::AUTO_GEN_KEY_CREATION_TIME,
            ValueNames::AUTO_GEN_KEY_FORMAT,
        ];
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
