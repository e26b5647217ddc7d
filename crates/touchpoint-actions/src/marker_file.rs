use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use touchpoint_core::{
    ErrorCode, Outcome, TouchpointError,
    keys::{P2HOME_KEY, PARAM_ARTIFACT_LOCATION, PARAM_INCOMING_FILE, USER_HOME_PROPERTY},
};
use tracing::{debug, info, warn};

use crate::{HostContext, Parameters, ProvisioningAction};

/// File the marker text is appended to.
pub const MARKER_FILE_NAME: &str = "minimalTouchpoint.txt";

/// Appends the `incomingFile` parameter to a marker file under the p2 home directory.
///
/// The directory is taken from the configuration's p2 home key when a
/// manipulator is supplied and has it, otherwise from `user.home`.
#[derive(Clone)]
pub struct MarkerFileAction {
    host: HostContext,
    home_key: String,
    file_name: String,
}

impl MarkerFileAction {
    pub const NAME: &'static str = "marker";

    pub fn new(host: HostContext) -> Self {
        Self {
            host,
            home_key: P2HOME_KEY.to_string(),
            file_name: MARKER_FILE_NAME.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Directory the marker file is written to for these parameters.
    pub fn target_dir(&self, params: &Parameters<'_>) -> Result<PathBuf, TouchpointError> {
        let from_config = match params.manipulator_ref() {
            Some(config) => {
                for (key, value) in config.entries() {
                    debug!(key = %key, value = %value, "config property");
                }
                let home = config.get(&self.home_key);
                if let Some(home) = &home {
                    info!(key = %self.home_key, path = %home, "using p2 home from configuration");
                }
                home
            }
            None => {
                info!("no manipulator provided");
                None
            }
        };

        let dir = match from_config {
            Some(dir) => dir,
            None => {
                let home = self
                    .host
                    .properties
                    .get(USER_HOME_PROPERTY)
                    .ok_or_else(|| TouchpointError::missing_parameter(USER_HOME_PROPERTY))?;
                info!(path = %home, "falling back to user.home");
                home
            }
        };

        Ok(PathBuf::from(dir))
    }

    fn append_marker(&self, params: &Parameters<'_>) -> Result<(), TouchpointError> {
        let marker = required(params, PARAM_INCOMING_FILE)?;
        let artifact_location = required(params, PARAM_ARTIFACT_LOCATION)?;
        info!(marker, artifact_location, "appending marker");

        let dir = self.target_dir(params)?;
        let file = dir.join(&self.file_name);
        let probe = self.host.probe.as_ref();

        if !probe.exists(&dir) {
            info!(path = %dir.display(), "creating marker directory");
            fs::create_dir_all(&dir).map_err(|err| io_error("create directory", &dir, err))?;
        }

        if !probe.exists(&file) {
            info!(path = %file.display(), "creating marker file");
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file)
                .map_err(|err| io_error("create file", &file, err))?;
        }

        if !probe.is_writable(&file) {
            warn!(path = %file.display(), "no permission to write marker file");
            return Err(TouchpointError {
                code: ErrorCode::PermissionDenied,
                message: format!("no permission to write {}", file.display()),
                detail: None,
            });
        }

        let mut handle = OpenOptions::new()
            .append(true)
            .open(&file)
            .map_err(|err| io_error("open file", &file, err))?;
        writeln!(handle, "{marker}").map_err(|err| io_error("write", &file, err))?;

        info!(path = %file.display(), "marker appended");
        Ok(())
    }
}

impl ProvisioningAction for MarkerFileAction {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, params: &mut Parameters<'_>) -> Outcome {
        self.append_marker(params).into()
    }

    fn undo(&self, _params: &mut Parameters<'_>) -> Outcome {
        info!("marker file is left in place on undo");
        Outcome::ok()
    }
}

fn required<'p>(params: &'p Parameters<'_>, key: &str) -> Result<&'p str, TouchpointError> {
    params.get(key).ok_or_else(|| {
        tracing::error!(parameter = key, "required parameter missing");
        TouchpointError::missing_parameter(key)
    })
}

fn io_error(action: &str, path: &Path, err: io::Error) -> TouchpointError {
    tracing::error!(error = %err, path = %path.display(), "{action} failed");
    TouchpointError {
        code: ErrorCode::IoFailure,
        message: format!("{action} failed: {}", path.display()),
        detail: Some(err.to_string()),
    }
}
