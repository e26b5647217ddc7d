use touchpoint_core::{
    ErrorCode, Outcome, TouchpointError,
    keys::{P2HOME_KEY, P2HOME_OVERRIDE_PROPERTY, PARAM_MANIPULATOR},
    resolve_detailed,
};
use touchpoint_platform::PlatformError;
use tracing::{info, warn};

use crate::{HostContext, Parameters, ProvisioningAction};

/// Stores the resolved p2 home directory in `config.ini`.
///
/// `execute` never overwrites an existing value; `undo` removes the key.
#[derive(Clone)]
pub struct SetConfigValue {
    host: HostContext,
    key: String,
    override_property: String,
}

impl SetConfigValue {
    pub const NAME: &'static str = "setp2home";

    pub fn new(host: HostContext) -> Self {
        Self {
            host,
            key: P2HOME_KEY.to_string(),
            override_property: P2HOME_OVERRIDE_PROPERTY.to_string(),
        }
    }

    /// Configuration key to write instead of the default p2 home key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// System property consulted for a user-forced directory.
    pub fn with_override_property(mut self, property: impl Into<String>) -> Self {
        self.override_property = property.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn apply(&self, params: &mut Parameters<'_>) -> Result<(), TouchpointError> {
        let config = params
            .manipulator()
            .ok_or_else(|| TouchpointError::missing_parameter(PARAM_MANIPULATOR))?;

        if config.contains(&self.key) {
            info!(key = %self.key, "property already present in configuration; leaving it");
            return Ok(());
        }

        let input = self.host.resolution_input(&self.override_property);
        let resolution = resolve_detailed(&input, self.host.probe.as_ref());
        if resolution.path.is_unknown() {
            warn!(key = %self.key, "p2 home directory unknown; storing empty value");
        }
        let value = resolution.path.as_str();

        config.set(&self.key, value);
        config.persist(true).map_err(|err| {
            persistence_error("error saving property into configuration data", &self.key, err)
        })?;
        self.host.properties.set(&self.key, value);

        info!(
            key = %self.key,
            value,
            source = resolution.source.map(|source| source.as_str()).unwrap_or("none"),
            "stored p2 home directory"
        );
        Ok(())
    }

    fn revert(&self, params: &mut Parameters<'_>) -> Result<(), TouchpointError> {
        let config = params
            .manipulator()
            .ok_or_else(|| TouchpointError::missing_parameter(PARAM_MANIPULATOR))?;

        if config.remove(&self.key).is_none() {
            info!(key = %self.key, "property not present in configuration; nothing to remove");
            return Ok(());
        }

        config.persist(true).map_err(|err| {
            persistence_error("error removing property from configuration data", &self.key, err)
        })?;

        info!(key = %self.key, "removed p2 home directory");
        Ok(())
    }
}

impl ProvisioningAction for SetConfigValue {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, params: &mut Parameters<'_>) -> Outcome {
        self.apply(params).into()
    }

    fn undo(&self, params: &mut Parameters<'_>) -> Outcome {
        self.revert(params).into()
    }
}

fn persistence_error(action: &str, key: &str, err: PlatformError) -> TouchpointError {
    tracing::error!(error = %err, key, "{action}");
    TouchpointError {
        code: ErrorCode::PersistenceFailure,
        message: format!("{action} ({key})"),
        detail: Some(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::SetConfigValue;
    use crate::{HostContext, Parameters, ProvisioningAction};
    use std::{
        collections::{BTreeMap, BTreeSet},
        io,
        path::{Path, PathBuf},
        sync::Arc,
    };
    use touchpoint_core::{Environment, ErrorCode, Severity, WritabilityProbe};
    use touchpoint_platform::{
        ConfigStore, MapProperties, MemoryConfig, PlatformError, SystemProperties,
    };

    #[derive(Default)]
    struct FakeProbe {
        writable: BTreeSet<PathBuf>,
    }

    impl WritabilityProbe for FakeProbe {
        fn exists(&self, path: &Path) -> bool {
            self.writable.contains(path)
        }

        fn is_writable(&self, path: &Path) -> bool {
            self.writable.contains(path)
        }
    }

    struct FailingConfig {
        entries: BTreeMap<String, String>,
    }

    impl ConfigStore for FailingConfig {
        fn contains(&self, key: &str) -> bool {
            self.entries.contains_key(key)
        }

        fn get(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: &str) {
            self.entries.insert(key.to_string(), value.to_string());
        }

        fn remove(&mut self, key: &str) -> Option<String> {
            self.entries.remove(key)
        }

        fn entries(&self) -> BTreeMap<String, String> {
            self.entries.clone()
        }

        fn persist(&mut self, _with_backup: bool) -> Result<(), PlatformError> {
            Err(PlatformError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "config.ini is read-only",
            )))
        }
    }

    fn host(writable: &[&str], props: Arc<MapProperties>) -> HostContext {
        let probe = FakeProbe {
            writable: writable.iter().map(PathBuf::from).collect(),
        };
        HostContext::new(Arc::new(probe), props, Environment::new(), "linux")
    }

    #[test]
    fn execute_stores_resolved_directory_and_mirrors_property() {
        let props = Arc::new(MapProperties::from_iter([("user.home", "/home/dev")]));
        let action = SetConfigValue::new(host(&["/var"], props.clone()));
        let mut config = MemoryConfig::new();

        let outcome = action.execute(&mut Parameters::new().with_manipulator(&mut config));

        assert!(outcome.is_ok());
        assert_eq!(config.get("com.example.p2home").as_deref(), Some("/var"));
        assert_eq!(config.persist_calls(), &[true]);
        assert_eq!(props.get("com.example.p2home").as_deref(), Some("/var"));
    }

    #[test]
    fn execute_does_not_overwrite_existing_value() {
        let props = Arc::new(MapProperties::new());
        let action = SetConfigValue::new(host(&["/var"], props.clone()));
        let mut config: MemoryConfig = [("com.example.p2home", "/custom")].into_iter().collect();

        let outcome = action.execute(&mut Parameters::new().with_manipulator(&mut config));

        assert!(outcome.is_ok());
        assert_eq!(config.get("com.example.p2home").as_deref(), Some("/custom"));
        assert!(config.persist_calls().is_empty());
        assert_eq!(props.get("com.example.p2home"), None);
    }

    #[test]
    fn execute_honors_override_property() {
        let props = Arc::new(MapProperties::from_iter([("install.p2.home", "/opt/forced")]));
        let action = SetConfigValue::new(host(&["/var"], props));
        let mut config = MemoryConfig::new();

        action.execute(&mut Parameters::new().with_manipulator(&mut config));

        assert_eq!(config.get("com.example.p2home").as_deref(), Some("/opt/forced"));
    }

    #[test]
    fn execute_stores_empty_value_when_unresolved() {
        let action = SetConfigValue::new(host(&[], Arc::new(MapProperties::new())));
        let mut config = MemoryConfig::new();

        let outcome = action.execute(&mut Parameters::new().with_manipulator(&mut config));

        assert!(outcome.is_ok());
        assert_eq!(config.get("com.example.p2home").as_deref(), Some(""));
    }

    #[test]
    fn custom_key_is_used() {
        let action = SetConfigValue::new(host(&["/var"], Arc::new(MapProperties::new())))
            .with_key("custom.home");
        let mut config = MemoryConfig::new();

        action.execute(&mut Parameters::new().with_manipulator(&mut config));

        assert_eq!(action.key(), "custom.home");
        assert!(config.contains("custom.home"));
        assert!(!config.contains("com.example.p2home"));
    }

    #[test]
    fn missing_manipulator_is_reported() {
        let action = SetConfigValue::new(host(&["/var"], Arc::new(MapProperties::new())));

        let outcome = action.execute(&mut Parameters::new());

        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.code, Some(ErrorCode::MissingParameter));
        assert!(outcome.message.unwrap_or_default().contains("manipulator"));
    }

    #[test]
    fn persistence_failure_is_wrapped_with_cause() {
        let props = Arc::new(MapProperties::new());
        let action = SetConfigValue::new(host(&["/var"], props.clone()));
        let mut config = FailingConfig {
            entries: BTreeMap::new(),
        };

        let outcome = action.execute(&mut Parameters::new().with_manipulator(&mut config));

        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.code, Some(ErrorCode::PersistenceFailure));
        assert!(outcome.message.unwrap_or_default().contains("com.example.p2home"));
        assert!(outcome.detail.unwrap_or_default().contains("read-only"));
        assert_eq!(props.get("com.example.p2home"), None);
    }

    #[test]
    fn undo_failure_is_wrapped_with_cause() {
        let action = SetConfigValue::new(host(&[], Arc::new(MapProperties::new())));
        let mut config = FailingConfig {
            entries: BTreeMap::from([("com.example.p2home".to_string(), "/var".to_string())]),
        };

        let outcome = action.undo(&mut Parameters::new().with_manipulator(&mut config));

        assert_eq!(outcome.code, Some(ErrorCode::PersistenceFailure));
    }

    #[test]
    fn execute_then_undo_restores_configuration() {
        let action = SetConfigValue::new(host(&["/var"], Arc::new(MapProperties::new())));
        let mut config: MemoryConfig = [("eclipse.product", "demo")].into_iter().collect();
        let before = config.entries();

        assert!(action.execute(&mut Parameters::new().with_manipulator(&mut config)).is_ok());
        assert!(action.undo(&mut Parameters::new().with_manipulator(&mut config)).is_ok());

        assert_eq!(config.entries(), before);
    }

    #[test]
    fn undo_without_key_is_a_no_op() {
        let action = SetConfigValue::new(host(&[], Arc::new(MapProperties::new())));
        let mut config = MemoryConfig::new();

        let outcome = action.undo(&mut Parameters::new().with_manipulator(&mut config));

        assert!(outcome.is_ok());
        assert!(config.persist_calls().is_empty());
    }
}
