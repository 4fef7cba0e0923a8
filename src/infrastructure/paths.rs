//! Path resolution for data files.
//!
//! The data directory holds the trace file and is the default place to look
//! for `config.toml`, `catalog.json` and `categories.json`.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FACETSYNC_DATA_DIR";

/// Returns the data directory for facetsync files.
///
/// Resolution order:
/// 1. `$FACETSYNC_DATA_DIR`
/// 2. `$XDG_DATA_HOME/facetsync`
/// 3. `~/.local/share/facetsync`
/// 4. `./.facetsync` when no home directory is known
#[must_use]
pub fn get_data_dir() -> PathBuf {
    resolve_data_dir(
        std::env::var(DATA_DIR_ENV).ok(),
        std::env::var("XDG_DATA_HOME").ok(),
        home_dir(),
    )
}

fn resolve_data_dir(
    explicit: Option<String>,
    xdg_data_home: Option<String>,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = explicit.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(expand_tilde_with(&dir, home.as_ref()));
    }
    if let Some(xdg) = xdg_data_home.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(xdg).join("facetsync");
    }
    match home {
        Some(home) => home.join(".local").join("share").join("facetsync"),
        None => PathBuf::from(".facetsync"),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, and all paths when `HOME` is unset, are
/// returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    expand_tilde_with(path, home_dir().as_ref())
}

fn expand_tilde_with(path: &str, home: Option<&PathBuf>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };

    if path == "~" {
        home.display().to_string()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest).display().to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_data_dir(
            Some("/srv/facets".to_string()),
            Some("/xdg".to_string()),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(dir, PathBuf::from("/srv/facets"));
    }

    #[test]
    fn xdg_then_home() {
        assert_eq!(
            resolve_data_dir(None, Some("/xdg".to_string()), Some(PathBuf::from("/home/u"))),
            PathBuf::from("/xdg/facetsync")
        );
        assert_eq!(
            resolve_data_dir(None, Some(String::new()), Some(PathBuf::from("/home/u"))),
            PathBuf::from("/home/u/.local/share/facetsync")
        );
        assert_eq!(resolve_data_dir(None, None, None), PathBuf::from(".facetsync"));
    }

    #[test]
    fn tilde_expansion() {
        let home = PathBuf::from("/home/u");
        assert_eq!(expand_tilde_with("~/data", Some(&home)), "/home/u/data");
        assert_eq!(expand_tilde_with("~", Some(&home)), "/home/u");
        assert_eq!(expand_tilde_with("/abs/~", Some(&home)), "/abs/~");
        assert_eq!(expand_tilde_with("~/data", None), "~/data");
    }
}
