use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Resolves `executable` the way a shell would.
///
/// Names containing a path separator are checked directly; bare names are
/// searched for in `search_path` (or `PATH` when `None`).
pub fn resolve_executable(executable: &str, search_path: Option<&str>) -> Option<PathBuf> {
    let candidate = Path::new(executable);
    if candidate.components().count() > 1 {
        return is_executable_file(candidate).then(|| candidate.to_path_buf());
    }
    let dirs: OsString = match search_path {
        Some(path) => OsString::from(path),
        None => env::var_os("PATH")?,
    };
    env::split_paths(&dirs)
        .flat_map(|dir| candidate_names(&dir, executable))
        .find(|path| is_executable_file(path))
}

fn candidate_names(dir: &Path, executable: &str) -> Vec<PathBuf> {
    let mut names = vec![dir.join(executable)];
    if cfg!(windows) && Path::new(executable).extension().is_none() {
        names.push(dir.join(format!("{executable}.exe")));
    }
    names
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
