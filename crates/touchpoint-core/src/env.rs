use std::collections::BTreeMap;

/// Environment variables with case-insensitive name lookup.
///
/// Names are lowercased once when the map is built. If two names differ only
/// by case, the one that sorts first byte-wise is kept, so lookups never
/// depend on iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment. Non-UTF-8 entries are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Returns the value of `name`, ignoring ASCII and Unicode case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let sorted: BTreeMap<String, String> = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        let mut vars = BTreeMap::new();
        for (key, value) in sorted {
            vars.entry(key.to_lowercase()).or_insert(value);
        }
        Self { vars }
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;

    #[test]
    fn lookup_ignores_case() {
        let env: Environment = [("ALLUSERSPROFILE", r"C:\ProgramData")].into_iter().collect();

        assert_eq!(env.get("allusersprofile"), Some(r"C:\ProgramData"));
        assert_eq!(env.get("AllUsersProfile"), Some(r"C:\ProgramData"));
        assert_eq!(env.get("APPDATA"), None);
    }

    #[test]
    fn case_duplicates_resolve_to_first_sorted_name() {
        let env: Environment = [("home", "/lower"), ("HOME", "/upper"), ("Home", "/mixed")]
            .into_iter()
            .collect();

        assert_eq!(env.len(), 1);
        assert_eq!(env.get("home"), Some("/upper"));
    }
}
