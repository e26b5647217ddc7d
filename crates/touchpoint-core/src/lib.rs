pub mod env;
pub mod errors;
pub mod keys;
pub mod outcome;
pub mod paths;

pub use env::Environment;
pub use errors::{ErrorCode, TouchpointError};
pub use outcome::{Outcome, Severity};
pub use paths::{
    Resolution, ResolutionInput, ResolutionSource, ResolvedPath, WritabilityProbe,
    is_windows_like, resolve, resolve_detailed,
};
