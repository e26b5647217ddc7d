use std::path::Path;

use touchpoint_platform::WritabilityProbe;

/// [`WritabilityProbe`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl WritabilityProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[cfg(unix)]
    fn is_writable(&self, path: &Path) -> bool {
        use std::{ffi::CString, os::unix::ffi::OsStrExt};

        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            return false;
        };
        // access(2) checks the effective permissions of this process, including root.
        unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
    }

    #[cfg(not(unix))]
    fn is_writable(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|metadata| !metadata.permissions().readonly())
            .unwrap_or(false)
    }
}
