//! Resolution of the p2 home directory.
//!
//! Rules are tried in order and the first one that yields a value wins:
//! 1. the override property, taken verbatim
//! 2. the all-users directory (`%ALLUSERSPROFILE%` or `/var`) when it exists and is writable
//! 3. `<user home>/var` on non-Windows systems
//! 4. `%APPDATA%` on Windows, `$HOME/var` elsewhere
//!
//! The resolver never touches the filesystem itself; existence and
//! writability questions go through [`WritabilityProbe`].

use std::{fmt, path::Path};

use tracing::debug;

use crate::Environment;

const ALL_USERS_VAR: &str = "ALLUSERSPROFILE";
const UNIX_ALL_USERS_DIR: &str = "/var";
const WINDOWS_HOME_VAR: &str = "APPDATA";
const UNIX_HOME_VAR: &str = "HOME";
const UNIX_VAR_SUFFIX: &str = "/var";

/// Filesystem questions the resolver needs answered by its host.
pub trait WritabilityProbe {
    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if the current process may write to `path`.
    fn is_writable(&self, path: &Path) -> bool;
}

/// Everything the resolver reads, captured once at the call boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionInput {
    /// Value of the override property, if the user set one.
    pub override_directory: Option<String>,
    /// Whether the host OS follows Windows conventions.
    pub is_windows_like: bool,
    /// Process environment.
    pub environment: Environment,
    /// Current user's home directory, when known.
    pub user_home_directory: Option<String>,
    /// Base directory for turning relative results into absolute ones.
    pub working_directory: String,
}

/// Outcome of a resolution: an absolute directory or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    Found(String),
    Unknown,
}

impl ResolvedPath {
    /// Returns the path, or the empty string when unresolved.
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedPath::Found(path) => path,
            ResolvedPath::Unknown => "",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ResolvedPath::Unknown)
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Explicit override property.
    Override,
    /// Shared all-users directory.
    AllUsers,
    /// `<user home>/var`.
    UserHome,
    /// `APPDATA` or `HOME` environment variable.
    Environment,
}

impl ResolutionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionSource::Override => "override",
            ResolutionSource::AllUsers => "all_users",
            ResolutionSource::UserHome => "user_home",
            ResolutionSource::Environment => "environment",
        }
    }
}

/// Resolved path together with the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: ResolvedPath,
    /// `None` when no rule produced a value.
    pub source: Option<ResolutionSource>,
}

/// Returns true for OS names that follow Windows path conventions.
pub fn is_windows_like(os_name: &str) -> bool {
    let os = os_name.to_lowercase();
    os.contains("win") && !os.contains("darwin")
}

/// Computes the p2 home directory for `input`.
pub fn resolve(input: &ResolutionInput, probe: &dyn WritabilityProbe) -> ResolvedPath {
    resolve_detailed(input, probe).path
}

/// Like [`resolve`], but also reports which rule matched.
pub fn resolve_detailed(input: &ResolutionInput, probe: &dyn WritabilityProbe) -> Resolution {
    let candidate = override_dir(input, probe)
        .map(|value| (value, ResolutionSource::Override))
        .or_else(|| all_users_dir(input, probe).map(|value| (value, ResolutionSource::AllUsers)))
        .or_else(|| user_home_var_dir(input).map(|value| (value, ResolutionSource::UserHome)))
        .or_else(|| environment_dir(input).map(|value| (value, ResolutionSource::Environment)));

    match candidate {
        Some((value, source)) if !value.trim().is_empty() => {
            let path = to_absolute(&value, input);
            debug!(path = %path, source = source.as_str(), "resolved p2 home directory");
            Resolution {
                path: ResolvedPath::Found(path),
                source: Some(source),
            }
        }
        _ => {
            debug!("p2 home directory could not be resolved");
            Resolution {
                path: ResolvedPath::Unknown,
                source: None,
            }
        }
    }
}

/// A present override always wins, even when blank or missing on disk.
fn override_dir(input: &ResolutionInput, probe: &dyn WritabilityProbe) -> Option<String> {
    let value = input.override_directory.as_ref()?;
    let exists = probe.exists(Path::new(value));
    debug!(path = %value, exists, "using override directory");
    Some(value.clone())
}

fn all_users_dir(input: &ResolutionInput, probe: &dyn WritabilityProbe) -> Option<String> {
    let candidate = if input.is_windows_like {
        input.environment.get(ALL_USERS_VAR)?.to_string()
    } else {
        UNIX_ALL_USERS_DIR.to_string()
    };

    let path = Path::new(&candidate);
    if !probe.exists(path) {
        debug!(path = %candidate, "all-users directory does not exist");
        return None;
    }
    if !probe.is_writable(path) {
        debug!(path = %candidate, "all-users directory is not writable");
        return None;
    }

    Some(to_absolute(&candidate, input))
}

fn user_home_var_dir(input: &ResolutionInput) -> Option<String> {
    if input.is_windows_like {
        return None;
    }
    let home = input.user_home_directory.as_ref()?;
    Some(format!("{home}{UNIX_VAR_SUFFIX}"))
}

fn environment_dir(input: &ResolutionInput) -> Option<String> {
    if input.is_windows_like {
        input.environment.get(WINDOWS_HOME_VAR).map(str::to_string)
    } else {
        input
            .environment
            .get(UNIX_HOME_VAR)
            .map(|home| format!("{home}{UNIX_VAR_SUFFIX}"))
    }
}

fn to_absolute(value: &str, input: &ResolutionInput) -> String {
    let windows = input.is_windows_like;
    let cwd = input.working_directory.as_str();
    if is_absolute(value, windows) {
        return normalize(value, windows);
    }

    if windows {
        // `\dir` is rooted on the working directory's drive.
        if value.starts_with(|ch: char| is_separator(ch, true)) {
            return normalize(&format!("{}{value}", drive_prefix(cwd)), true);
        }
        // `D:dir` is relative to D's working directory, which is only known
        // when it is the current drive. Otherwise the drive root is used.
        if let Some((drive, rest)) = split_drive(value) {
            let joined = match split_drive(cwd) {
                Some((cwd_drive, _)) if cwd_drive.eq_ignore_ascii_case(&drive) => {
                    join(cwd, rest, true)
                }
                _ => format!("{drive}:\\{rest}"),
            };
            return normalize(&joined, true);
        }
    }

    normalize(&join(cwd, value, windows), windows)
}

fn join(base: &str, value: &str, windows: bool) -> String {
    let base = base.trim_end_matches(|ch: char| is_separator(ch, windows));
    format!("{base}{}{value}", separator(windows))
}

/// Splits `X:rest` into the drive letter and `rest`.
fn split_drive(path: &str) -> Option<(char, &str)> {
    let mut chars = path.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    if chars.next() != Some(':') {
        return None;
    }
    Some((letter, &path[2..]))
}

/// `C:` for a drive path, `\\server\share` for a UNC path, else empty.
fn drive_prefix(path: &str) -> &str {
    if split_drive(path).is_some() {
        return &path[..2];
    }
    if is_unc(path) {
        let rest = &path[2..];
        let mut seps = rest.match_indices(['\\', '/']).map(|(index, _)| index);
        let _server_end = seps.next();
        return match seps.next() {
            Some(share_end) => &path[..share_end + 2],
            None => path,
        };
    }
    ""
}

fn is_absolute(path: &str, windows: bool) -> bool {
    if !windows {
        return path.starts_with('/');
    }

    let bytes = path.as_bytes();
    let drive_absolute = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    drive_absolute || is_unc(path)
}

fn is_unc(path: &str) -> bool {
    path.starts_with(r"\\") || path.starts_with("//")
}

fn is_separator(ch: char, windows: bool) -> bool {
    ch == '/' || (windows && ch == '\\')
}

fn separator(windows: bool) -> char {
    if windows { '\\' } else { '/' }
}

/// Collapses repeated separators and drops a trailing one, keeping roots intact.
fn normalize(path: &str, windows: bool) -> String {
    let sep = separator(windows);
    let (prefix, rest) = if windows && is_unc(path) {
        (r"\\", &path[2..])
    } else {
        ("", path)
    };

    let mut out = String::with_capacity(path.len());
    out.push_str(prefix);
    let mut previous_was_separator = false;
    for ch in rest.chars() {
        if is_separator(ch, windows) {
            if !previous_was_separator {
                out.push(sep);
            }
            previous_was_separator = true;
        } else {
            out.push(ch);
            previous_was_separator = false;
        }
    }

    if out.len() > prefix.len() + 1 && out.ends_with(sep) && !is_drive_root(&out, windows) {
        out.pop();
    }
    out
}

fn is_drive_root(path: &str, windows: bool) -> bool {
    windows && path.len() == 3 && is_absolute(path, true)
}
