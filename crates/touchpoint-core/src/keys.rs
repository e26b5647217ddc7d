//! Well-known names shared between actions and their hosts.

/// Configuration key holding the resolved p2 home directory.
pub const P2HOME_KEY: &str = "com.example.p2home";

/// System property a user may set at install time to force the p2 home directory.
pub const P2HOME_OVERRIDE_PROPERTY: &str = "install.p2.home";

/// Parameter carrying the artifact location supplied by the engine.
pub const PARAM_ARTIFACT_LOCATION: &str = "artifact.location";

/// Parameter carrying the marker text for the marker file action.
pub const PARAM_INCOMING_FILE: &str = "incomingFile";

/// System property naming the current user's home directory.
pub const USER_HOME_PROPERTY: &str = "user.home";

/// System property naming the host operating system.
pub const OS_NAME_PROPERTY: &str = "os.name";

/// System property naming the process working directory.
pub const USER_DIR_PROPERTY: &str = "user.dir";

/// Name under which the configuration manipulator is reported when absent.
pub const PARAM_MANIPULATOR: &str = "manipulator";
