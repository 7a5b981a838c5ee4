// Target path resolution. Everything here takes explicit inputs; the
// `AIRFLOW_HOME` lookup happens in the argument parser, not here.

use crate::error::{BootstrapError, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name SimpleAuthManager looks for under `AIRFLOW_HOME`.
pub const DEFAULT_PASSWORDS_FILE: &str = "simple_auth_manager_passwords.json.generated";

/// Pick the passwords file to write.
///
/// `explicit_path` wins when given. Otherwise the file lives at
/// `base_dir/fixed_filename`. Empty paths count as absent, so an exported
/// but blank `AIRFLOW_HOME` still yields `MissingTarget`. Symlinks in the
/// existing part of the result are resolved.
pub fn resolve_target_path(
    explicit_path: Option<&Path>,
    base_dir: Option<&Path>,
    fixed_filename: &str,
) -> Result<PathBuf> {
    let target = if let Some(path) = non_empty(explicit_path) {
        absolutize(&expand_home(path))?
    } else if let Some(dir) = non_empty(base_dir) {
        absolutize(&expand_home(dir))?.join(fixed_filename)
    } else {
        return Err(BootstrapError::MissingTarget);
    };
    Ok(resolve_links(&target))
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Replace a leading `~` with the current user's home directory. Paths
/// without one, or when the home directory is unknown, come back as-is.
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Make `path` absolute against the working directory and drop `.`/`..`
/// segments. The path does not need to exist yet.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|source| BootstrapError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Follow symlinks in the longest prefix of `path` that exists, then
/// append the components that do not exist yet. Writing through the result
/// updates the real file instead of replacing a link to it.
fn resolve_links(path: &Path) -> PathBuf {
    let mut missing: Vec<&OsStr> = Vec::new();
    let mut current = path;
    loop {
        if let Ok(mut real) = fs::canonicalize(current) {
            real.extend(missing.iter().rev());
            return real;
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_base_dir() {
        let path = resolve_target_path(
            Some(Path::new("/nonexistent-airflow-root/custom.json")),
            Some(Path::new("/nonexistent-airflow-root/home")),
            DEFAULT_PASSWORDS_FILE,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/nonexistent-airflow-root/custom.json"));
    }

    #[test]
    fn base_dir_gets_fixed_filename() {
        let path = resolve_target_path(
            None,
            Some(Path::new("/nonexistent-airflow-root/home")),
            DEFAULT_PASSWORDS_FILE,
        )
        .unwrap();
        assert_eq!(
            path,
            PathBuf::from(
                "/nonexistent-airflow-root/home/simple_auth_manager_passwords.json.generated"
            )
        );
    }

    #[test]
    fn neither_is_a_config_error() {
        let err = resolve_target_path(None, None, DEFAULT_PASSWORDS_FILE).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingTarget));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let err = resolve_target_path(Some(Path::new("")), Some(Path::new("")), "x").unwrap_err();
        assert!(matches!(err, BootstrapError::MissingTarget));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = resolve_target_path(Some(Path::new("a/./b/../c.json")), None, "x").unwrap();
        let cwd = fs::canonicalize(std::env::current_dir().unwrap()).unwrap();
        assert!(path.is_absolute());
        assert_eq!(path, cwd.join("a").join("c.json"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_resolves_to_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("real.json"), "{}").unwrap();
        std::os::unix::fs::symlink(root.join("real.json"), root.join("link.json")).unwrap();

        let path = resolve_target_path(Some(&root.join("link.json")), None, "x").unwrap();
        assert_eq!(path, root.join("real.json"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dir_resolves_for_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("home")).unwrap();

        let path = resolve_target_path(None, Some(&root.join("home")), "passwords.json").unwrap();
        assert_eq!(path, root.join("real").join("passwords.json"));

        let nested = resolve_target_path(Some(&root.join("home/a/b.json")), None, "x").unwrap();
        assert_eq!(nested, root.join("real").join("a").join("b.json"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~/airflow")), home.join("airflow"));
        assert_eq!(expand_home(Path::new("~")), home);
    }

    #[test]
    fn tilde_inside_path_is_left_alone() {
        assert_eq!(expand_home(Path::new("/srv/~/x")), PathBuf::from("/srv/~/x"));
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }
}
