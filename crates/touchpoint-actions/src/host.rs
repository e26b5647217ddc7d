use std::{env, sync::Arc};

use touchpoint_core::{
    Environment, ResolutionInput, WritabilityProbe, is_windows_like,
    keys::{USER_DIR_PROPERTY, USER_HOME_PROPERTY},
};
use touchpoint_platform::SystemProperties;

/// Capabilities and ambient state supplied by the host engine.
#[derive(Clone)]
pub struct HostContext {
    /// Filesystem existence and writability checks.
    pub probe: Arc<dyn WritabilityProbe + Send + Sync>,
    /// Process-wide property table.
    pub properties: Arc<dyn SystemProperties>,
    /// Environment captured when the host started.
    pub environment: Environment,
    /// Host OS name, e.g. `linux` or `win32`.
    pub os_name: String,
}

impl HostContext {
    pub fn new(
        probe: Arc<dyn WritabilityProbe + Send + Sync>,
        properties: Arc<dyn SystemProperties>,
        environment: Environment,
        os_name: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            properties,
            environment,
            os_name: os_name.into(),
        }
    }

    pub fn is_windows_like(&self) -> bool {
        is_windows_like(&self.os_name)
    }

    /// Snapshots everything the resolver reads.
    ///
    /// `override_property` names the system property holding a user-forced
    /// directory. Without a `user.dir` property the process working
    /// directory is used.
    pub fn resolution_input(&self, override_property: &str) -> ResolutionInput {
        ResolutionInput {
            override_directory: self.properties.get(override_property),
            is_windows_like: self.is_windows_like(),
            environment: self.environment.clone(),
            user_home_directory: self.properties.get(USER_HOME_PROPERTY),
            working_directory: self
                .properties
                .get(USER_DIR_PROPERTY)
                .or_else(current_dir)
                .unwrap_or_else(|| ".".to_string()),
        }
    }
}

fn current_dir() -> Option<String> {
    env::current_dir()
        .ok()
        .map(|dir| dir.to_string_lossy().to_string())
}
