use std::{
    collections::BTreeMap,
    env,
    sync::{OnceLock, RwLock},
};

use touchpoint_core::keys::{OS_NAME_PROPERTY, USER_DIR_PROPERTY, USER_HOME_PROPERTY};
use touchpoint_platform::SystemProperties;

static TABLE: OnceLock<RwLock<BTreeMap<String, String>>> = OnceLock::new();

/// Handle to the process-wide property table.
///
/// The table is seeded on first use with `user.home`, `os.name` and
/// `user.dir` taken from the running process. Every handle sees the same
/// values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProperties;

impl ProcessProperties {
    fn table() -> &'static RwLock<BTreeMap<String, String>> {
        TABLE.get_or_init(|| RwLock::new(seed()))
    }
}

impl SystemProperties for ProcessProperties {
    fn get(&self, key: &str) -> Option<String> {
        let table = Self::table()
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut table = Self::table()
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table.insert(key.to_string(), value.to_string());
    }
}

fn seed() -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert(OS_NAME_PROPERTY.to_string(), env::consts::OS.to_string());

    if let Some(home) = dirs::home_dir() {
        values.insert(
            USER_HOME_PROPERTY.to_string(),
            home.to_string_lossy().to_string(),
        );
    }
    if let Ok(cwd) = env::current_dir() {
        values.insert(
            USER_DIR_PROPERTY.to_string(),
            cwd.to_string_lossy().to_string(),
        );
    }
    values
}

#[cfg(test)]
mod tests {
    use super::ProcessProperties;
    use touchpoint_core::keys::{OS_NAME_PROPERTY, USER_HOME_PROPERTY};
    use touchpoint_platform::SystemProperties;

    #[test]
    fn table_is_seeded_with_os_name() {
        assert_eq!(
            ProcessProperties.get(OS_NAME_PROPERTY).as_deref(),
            Some(std::env::consts::OS)
        );
    }

    #[test]
    fn table_is_seeded_with_user_home() {
        let expected = dirs::home_dir().map(|home| home.to_string_lossy().to_string());

        assert_eq!(ProcessProperties.get(USER_HOME_PROPERTY), expected);
    }

    #[test]
    fn values_are_shared_between_handles() {
        let writer = ProcessProperties;
        let reader = ProcessProperties;

        writer.set("touchpoint.test.shared", "yes");

        assert_eq!(reader.get("touchpoint.test.shared").as_deref(), Some("yes"));
    }
}
