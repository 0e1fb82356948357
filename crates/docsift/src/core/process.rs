//! External executable discovery.
//!
//! Legacy Word conversion shells out to `antiword`. Executables are resolved
//! from an explicit configured path first, then the named environment
//! variables, then every directory on `PATH`.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn candidates(program: &str, configured: Option<&Path>, env_vars: &[&str]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push_candidate = |path: PathBuf| {
        if seen.insert(path.clone()) {
            candidates.push(path);
        }
    };

    if let Some(path) = configured {
        push_candidate(path.to_path_buf());
    }

    for var in env_vars {
        if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
            push_candidate(PathBuf::from(value));
        }
    }

    if let Some(prefix) = env::var_os("HOMEBREW_PREFIX") {
        push_candidate(PathBuf::from(prefix).join("bin").join(program));
    }

    if let Some(path_env) = env::var_os("PATH") {
        for dir in env::split_paths(&path_env) {
            push_candidate(dir.join(program));
            push_candidate(dir.join(format!("{}.exe", program)));
        }
    }

    candidates
}

/// First existing regular file among the candidate locations for `program`.
pub fn locate_binary(program: &str, configured: Option<&Path>, env_vars: &[&str]) -> Option<PathBuf> {
    candidates(program, configured, env_vars).into_iter().find(|candidate| {
        fs::metadata(candidate)
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    })
}

/// Pick stderr when it carries anything, stdout otherwise.
pub fn diagnostic_output(stderr: &[u8], stdout: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    String::from_utf8_lossy(stdout).trim().to_string()
}
