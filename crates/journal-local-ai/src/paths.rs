//! Candidate install locations for the llama-server binary.

use std::path::{Path, PathBuf};

/// Ordered list of places llama-server is commonly installed.
///
/// `~` expands to the home directory and `*` to the current user's name.
/// The final bare name falls back to a `PATH` lookup.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    // macOS
    "/usr/local/bin/llama-server",
    "/opt/homebrew/bin/llama-server",
    "/usr/bin/llama-server",
    // Linux
    "/opt/llama.cpp/bin/llama-server",
    "/snap/bin/llama-server",
    "/var/lib/flatpak/exports/bin/llama-server",
    "~/.local/bin/llama-server",
    "/home/*/bin/llama-server",
    // Windows
    "C:\\Program Files\\llama.cpp\\llama-server.exe",
    "C:\\Program Files (x86)\\llama.cpp\\llama-server.exe",
    "C:\\llama.cpp\\llama-server.exe",
    "C:\\Users\\*\\AppData\\Local\\llama.cpp\\llama-server.exe",
    "C:\\Users\\*\\AppData\\Roaming\\llama.cpp\\llama-server.exe",
    "C:\\Users\\*\\llama.cpp\\llama-server.exe",
    // Cargo
    "~/.cargo/bin/llama-server",
    "~/.local/share/cargo/bin/llama-server",
    // PATH
    "llama-server",
];

/// Environment variables consulted, in order, to fill a `*` segment.
pub const USER_DIR_VARS: &[&str] = &["USERPROFILE", "HOME"];

/// The current user's home directory, if it can be determined.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Values of [`USER_DIR_VARS`] that are set and non-empty.
pub fn user_dir_values() -> Vec<String> {
    USER_DIR_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Expand one candidate into the concrete paths to try, in order.
///
/// A leading `~` is replaced by `home` when known. A `*` produces one path
/// per user directory, using its last segment (the user name); with no
/// user directories it produces nothing.
pub fn expand_candidate(candidate: &str, home: Option<&Path>, user_dirs: &[String]) -> Vec<PathBuf> {
    let candidate = match (candidate.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => format!("{}{}", home.display(), rest),
        _ => candidate.to_string(),
    };

    if !candidate.contains('*') {
        return vec![PathBuf::from(candidate)];
    }

    user_dirs
        .iter()
        .filter_map(|dir| user_name_of(dir))
        .map(|user| PathBuf::from(candidate.replacen('*', &user, 1)))
        .collect()
}

fn user_name_of(dir: &str) -> Option<String> {
    Path::new(dir)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_candidate_unchanged() {
        let paths = expand_candidate("/usr/bin/llama-server", None, &[]);
        assert_eq!(paths, vec![PathBuf::from("/usr/bin/llama-server")]);
    }

    #[test]
    fn test_tilde_expansion() {
        let home = PathBuf::from("/home/ada");
        let paths = expand_candidate("~/.local/bin/llama-server", Some(&home), &[]);
        assert_eq!(paths, vec![PathBuf::from("/home/ada/.local/bin/llama-server")]);
    }

    #[test]
    fn test_tilde_without_home_is_kept() {
        let paths = expand_candidate("~/.cargo/bin/llama-server", None, &[]);
        assert_eq!(paths, vec![PathBuf::from("~/.cargo/bin/llama-server")]);
    }

    #[test]
    fn test_wildcard_uses_each_user_dir() {
        let dirs = vec!["/home/ada".to_string(), "/Users/grace".to_string()];
        let paths = expand_candidate("/home/*/bin/llama-server", None, &dirs);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/home/ada/bin/llama-server"),
                PathBuf::from("/home/grace/bin/llama-server"),
            ]
        );
    }

    #[test]
    fn test_wildcard_without_user_dirs_is_empty() {
        assert!(expand_candidate("/home/*/bin/llama-server", None, &[]).is_empty());
    }

    #[test]
    fn test_bare_name_is_last() {
        assert_eq!(DEFAULT_CANDIDATES.last(), Some(&"llama-server"));
    }
}
