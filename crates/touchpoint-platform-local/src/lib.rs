//! Local-machine backends for the touchpoint capability traits.

mod config_ini;
mod fs_probe;
mod properties;

pub use config_ini::{ConfigIni, backup_path, parse_properties, render_properties};
pub use fs_probe::LocalFs;
pub use properties::ProcessProperties;
