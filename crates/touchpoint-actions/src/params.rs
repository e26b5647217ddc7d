use std::collections::BTreeMap;

use touchpoint_platform::ConfigStore;

/// Parameter bag handed to an action by the engine.
///
/// String values are keyed by parameter name. The configuration manipulator
/// is carried in its own slot because it is a live handle, not a value.
#[derive(Default)]
pub struct Parameters<'a> {
    values: BTreeMap<String, String>,
    manipulator: Option<&'a mut dyn ConfigStore>,
}

impl<'a> Parameters<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_manipulator(mut self, manipulator: &'a mut dyn ConfigStore) -> Self {
        self.manipulator = Some(manipulator);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn manipulator(&mut self) -> Option<&mut (dyn ConfigStore + 'a)> {
        self.manipulator.as_deref_mut()
    }

    pub fn manipulator_ref(&self) -> Option<&(dyn ConfigStore + 'a)> {
        self.manipulator.as_deref()
    }
}

impl<'a> Extend<(String, String)> for Parameters<'a> {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}
