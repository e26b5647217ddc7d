//! Touchpoint actions invoked by the provisioning engine at install and uninstall time.

mod host;
mod marker_file;
mod params;
mod registry;
mod set_config_value;

pub use host::HostContext;
pub use marker_file::{MARKER_FILE_NAME, MarkerFileAction};
pub use params::Parameters;
pub use registry::ActionRegistry;
pub use set_config_value::SetConfigValue;

use touchpoint_core::Outcome;

/// Install-time unit of work with an inverse.
///
/// Both methods run to completion on the calling thread and report failures
/// through the returned [`Outcome`] rather than panicking.
pub trait ProvisioningAction {
    /// Name the engine uses to look the action up.
    fn name(&self) -> &'static str;

    /// Performs the action.
    fn execute(&self, params: &mut Parameters<'_>) -> Outcome;

    /// Reverts what `execute` did.
    fn undo(&self, params: &mut Parameters<'_>) -> Outcome;
}
