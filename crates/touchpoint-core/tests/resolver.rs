use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use touchpoint_core::{
    Environment, ResolutionInput, ResolutionSource, ResolvedPath, WritabilityProbe, resolve,
    resolve_detailed,
};

#[derive(Default)]
struct FakeProbe {
    existing: BTreeSet<PathBuf>,
    writable: BTreeSet<PathBuf>,
}

impl FakeProbe {
    fn with_dir(mut self, path: &str, writable: bool) -> Self {
        self.existing.insert(PathBuf::from(path));
        if writable {
            self.writable.insert(PathBuf::from(path));
        }
        self
    }
}

impl WritabilityProbe for FakeProbe {
    fn exists(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        self.writable.contains(path)
    }
}

fn unix_input() -> ResolutionInput {
    ResolutionInput {
        override_directory: None,
        is_windows_like: false,
        environment: Environment::new(),
        user_home_directory: None,
        working_directory: "/work".to_string(),
    }
}

fn windows_input(env: &[(&str, &str)]) -> ResolutionInput {
    ResolutionInput {
        override_directory: None,
        is_windows_like: true,
        environment: env.iter().copied().collect(),
        user_home_directory: None,
        working_directory: r"C:\work".to_string(),
    }
}

#[test]
fn override_wins_regardless_of_filesystem_state() {
    let mut input = unix_input();
    input.override_directory = Some("/opt/p2home".to_string());
    input.user_home_directory = Some("/home/dev".to_string());

    let writable_var = FakeProbe::default().with_dir("/var", true);
    let empty = FakeProbe::default();

    assert_eq!(
        resolve(&input, &writable_var),
        ResolvedPath::Found("/opt/p2home".to_string())
    );
    assert_eq!(resolve(&input, &empty), ResolvedPath::Found("/opt/p2home".to_string()));
}

#[test]
fn override_is_not_validated_even_when_missing_on_disk() {
    // The override's existence is only logged; a missing directory is still returned.
    let mut input = unix_input();
    input.override_directory = Some("relative/p2".to_string());

    let resolution = resolve_detailed(&input, &FakeProbe::default());

    assert_eq!(resolution.path, ResolvedPath::Found("/work/relative/p2".to_string()));
    assert_eq!(resolution.source, Some(ResolutionSource::Override));
}

#[test]
fn blank_override_stops_the_chain_with_unknown() {
    let mut input = unix_input();
    input.override_directory = Some("   ".to_string());
    input.user_home_directory = Some("/home/dev".to_string());

    let probe = FakeProbe::default().with_dir("/var", true);

    assert_eq!(resolve(&input, &probe), ResolvedPath::Unknown);
}

#[test]
fn unix_uses_writable_var() {
    let mut input = unix_input();
    input.user_home_directory = Some("/home/dev".to_string());

    let probe = FakeProbe::default().with_dir("/var", true);
    let resolution = resolve_detailed(&input, &probe);

    assert_eq!(resolution.path, ResolvedPath::Found("/var".to_string()));
    assert_eq!(resolution.source, Some(ResolutionSource::AllUsers));
}

#[test]
fn unix_falls_back_to_user_home_when_var_is_read_only() {
    let mut input = unix_input();
    input.user_home_directory = Some("/home/dev".to_string());

    let read_only = FakeProbe::default().with_dir("/var", false);
    let missing = FakeProbe::default();

    assert_eq!(
        resolve(&input, &read_only),
        ResolvedPath::Found("/home/dev/var".to_string())
    );
    assert_eq!(
        resolve(&input, &missing),
        ResolvedPath::Found("/home/dev/var".to_string())
    );
}

#[test]
fn unix_falls_back_to_home_variable_without_user_home() {
    let mut input = unix_input();
    input.environment = [("home", "/srv/builder/")].into_iter().collect();

    let resolution = resolve_detailed(&input, &FakeProbe::default());

    assert_eq!(resolution.path, ResolvedPath::Found("/srv/builder/var".to_string()));
    assert_eq!(resolution.source, Some(ResolutionSource::Environment));
}

#[test]
fn windows_uses_writable_all_users_profile() {
    let input = windows_input(&[
        ("ALLUSERSPROFILE", r"C:\ProgramData"),
        ("APPDATA", r"C:\Users\dev\AppData\Roaming"),
    ]);
    let probe = FakeProbe::default().with_dir(r"C:\ProgramData", true);

    assert_eq!(
        resolve(&input, &probe),
        ResolvedPath::Found(r"C:\ProgramData".to_string())
    );
}

#[test]
fn windows_falls_through_to_appdata_when_all_users_is_read_only() {
    let mut input = windows_input(&[
        ("ALLUSERSPROFILE", r"C:\ProgramData"),
        ("AppData", r"C:\Users\dev\AppData\Roaming"),
    ]);
    // user home never applies on Windows-like systems
    input.user_home_directory = Some(r"C:\Users\dev".to_string());
    let probe = FakeProbe::default().with_dir(r"C:\ProgramData", false);

    let resolution = resolve_detailed(&input, &probe);

    assert_eq!(
        resolution.path,
        ResolvedPath::Found(r"C:\Users\dev\AppData\Roaming".to_string())
    );
    assert_eq!(resolution.source, Some(ResolutionSource::Environment));
}

#[test]
fn environment_lookup_is_case_insensitive() {
    let upper = windows_input(&[("ALLUSERSPROFILE", r"C:\ProgramData")]);
    let lower = windows_input(&[("allusersprofile", r"C:\ProgramData")]);
    let probe = FakeProbe::default().with_dir(r"C:\ProgramData", true);

    assert_eq!(resolve(&upper, &probe), resolve(&lower, &probe));
    assert_eq!(resolve(&lower, &probe).as_str(), r"C:\ProgramData");
}

#[test]
fn nothing_matches_yields_unknown() {
    let windows = windows_input(&[]);
    let unix = unix_input();
    let probe = FakeProbe::default();

    assert_eq!(resolve(&windows, &probe), ResolvedPath::Unknown);
    assert_eq!(resolve(&unix, &probe), ResolvedPath::Unknown);
    assert_eq!(resolve(&unix, &probe).as_str(), "");
}

#[test]
fn blank_appdata_yields_unknown() {
    let input = windows_input(&[("APPDATA", "  ")]);

    assert!(resolve(&input, &FakeProbe::default()).is_unknown());
}

#[test]
fn resolution_is_idempotent() {
    let mut input = unix_input();
    input.user_home_directory = Some("/home/dev".to_string());
    let probe = FakeProbe::default().with_dir("/var", false);

    let first = resolve(&input, &probe);
    let second = resolve(&input, &probe);

    assert_eq!(first, second);
}

#[test]
fn unix_ignores_all_users_profile_variable() {
    let mut input = unix_input();
    input.environment = [("ALLUSERSPROFILE", "/shared/profile")].into_iter().collect();
    input.user_home_directory = Some("/home/dev".to_string());

    let probe = FakeProbe::default()
        .with_dir("/shared/profile", true)
        .with_dir("/var", true);
    let resolution = resolve_detailed(&input, &probe);

    assert_eq!(resolution.path, ResolvedPath::Found("/var".to_string()));
    assert_eq!(resolution.source, Some(ResolutionSource::AllUsers));
}

#[test]
fn windows_never_uses_user_home_directory() {
    let mut input = windows_input(&[]);
    input.user_home_directory = Some(r"C:\Users\dev".to_string());

    assert_eq!(resolve(&input, &FakeProbe::default()), ResolvedPath::Unknown);
}
