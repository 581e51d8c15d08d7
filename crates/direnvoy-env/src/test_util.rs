// ABOUTME: Shared test helpers for exercising the import pipeline without direnv installed
// ABOUTME: Fake environment tools are small shell scripts written into tempdirs

use std::path::{Path, PathBuf};

use crate::config::ImportConfig;

/// Write an executable `/bin/sh` script acting as the environment tool.
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-direnv");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();

    path
}

/// Default config pointed at a fake tool.
pub fn fake_tool_config(tool: &Path) -> ImportConfig {
    ImportConfig {
        direnv_path: Some(tool.to_path_buf()),
        ..ImportConfig::default()
    }
}
