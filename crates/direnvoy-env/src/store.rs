// ABOUTME: Target environment mapping that imports are merged into
// ABOUTME: Reports whether each mutation actually changed anything

use std::collections::HashMap;

/// The environment mapping an import applies to.
///
/// Usually seeded from the parent process environment; imports are additive,
/// so entries absent from an import are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvStore {
    vars: HashMap<String, String>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the calling process environment.
    pub fn from_process_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Set a variable, returning whether the stored value changed.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        if self.vars.get(&name) == Some(&value) {
            return false;
        }
        self.vars.insert(name, value);
        true
    }

    /// Remove a variable, returning whether it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned copy of the mapping, for handing to a spawned process.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.vars.clone()
    }
}

impl FromIterator<(String, String)> for EnvStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let mut store = EnvStore::new();
        assert!(store.set("FOO", "bar"));
        assert!(!store.set("FOO", "bar"));
        assert!(store.set("FOO", "baz"));
        assert_eq!(store.get("FOO"), Some("baz"));
    }

    #[test]
    fn test_unset_reports_existence() {
        let mut store: EnvStore = [("FOO".to_string(), "bar".to_string())]
            .into_iter()
            .collect();
        assert!(store.unset("FOO"));
        assert!(!store.unset("FOO"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_process_env_is_populated() {
        // PATH is present in any reasonable test environment
        let store = EnvStore::from_process_env();
        assert!(store.contains("PATH"));
    }
}
