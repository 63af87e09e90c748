use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Locates executables the way the spawned child's environment would.
pub struct WhichUtil;

impl WhichUtil {
    /// Resolve `command` against the `PATH` value the child will inherit.
    ///
    /// Commands containing a path separator are resolved relative to
    /// `working_directory` and are not searched on `PATH`.
    pub fn which_in(
        command: &str,
        path_var: Option<&OsStr>,
        working_directory: &Path,
    ) -> Result<PathBuf, which::Error> {
        which::which_in(command, path_var, working_directory)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn finds_sh_on_standard_path() {
        let path = OsStr::new("/usr/bin:/bin");
        let found = WhichUtil::which_in("sh", Some(path), Path::new("/")).unwrap();
        assert!(found.ends_with("sh"));
    }

    #[test]
    fn missing_command_is_an_error() {
        let result = WhichUtil::which_in(
            "definitely_not_a_command_xyz_123",
            Some(OsStr::new("/usr/bin:/bin")),
            Path::new("/"),
        );
        assert!(result.is_err());
    }
}
