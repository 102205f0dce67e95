#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;

use psn_check::resolve_executable;
use tempfile::tempdir;

#[test]
fn finds_executable_on_custom_search_path() {
    let dir = tempdir().unwrap();
    let tool = dir.path().join("modest");
    fs::write(&tool, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let search = dir.path().to_str().unwrap();
    assert_eq!(resolve_executable("modest", Some(search)), Some(tool));
}

#[test]
fn ignores_non_executable_files() {
    let dir = tempdir().unwrap();
    let tool = dir.path().join("modest");
    fs::write(&tool, "not a program").unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(resolve_executable("modest", dir.path().to_str()), None);
}

#[test]
fn explicit_paths_bypass_the_search_path() {
    let dir = tempdir().unwrap();
    let tool = dir.path().join("checker");
    fs::write(&tool, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o700)).unwrap();

    let explicit = tool.to_str().unwrap();
    assert_eq!(resolve_executable(explicit, Some("")), Some(tool.clone()));
    assert_eq!(
        resolve_executable(dir.path().join("absent").to_str().unwrap(), None),
        None
    );
}

#[test]
fn missing_tool_is_not_resolved() {
    let dir = tempdir().unwrap();
    assert_eq!(resolve_executable("modest", dir.path().to_str()), None);
}
