//! Utility functions and helpers

use std::path::{Path, PathBuf};

/// Clean a path by removing . and .. components
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    if path.starts_with('/') {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    }
}

/// Join logical path segments with `/`, independent of the host separator
pub fn join_slash<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = segments
        .into_iter()
        .map(|s| to_slash(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    clean_path(&joined)
}

/// Normalise backslashes to forward slashes
pub fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join a `/`-separated relative directory onto `root` using host separators
pub fn project_path(root: &Path, relative: &str) -> PathBuf {
    to_slash(relative)
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .fold(root.to_path_buf(), |path, seg| path.join(seg))
}

/// Path of `path` relative to `root`, rendered with `/`
pub fn relative_slash(root: &Path, path: &Path) -> Option<String> {
    pathdiff::diff_paths(path, root).map(|p| to_slash(&p.display().to_string()))
}

/// File name with its final extension removed (`home.css` -> `home`)
pub fn without_extension(file: &str) -> String {
    let file = to_slash(file);
    let base = file.rsplit('/').next().unwrap_or(&file);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base[..idx].to_string(),
        _ => base.to_string(),
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("./foo/bar"), "foo/bar");
        assert_eq!(clean_path("foo/../bar"), "bar");
        assert_eq!(clean_path("/foo/./bar/../baz"), "/foo/baz");
    }

    #[test]
    fn test_join_slash() {
        assert_eq!(join_slash(["", "includes/css/", "home"]), "includes/css/home");
        assert_eq!(
            join_slash(["site", "resources\\assets\\css", "a.css"]),
            "site/resources/assets/css/a.css"
        );
    }

    #[test]
    fn test_project_path() {
        let root = Path::new("/srv/site");
        assert_eq!(project_path(root, "includes/css/"), root.join("includes").join("css"));
        assert_eq!(project_path(root, "./includes\\js"), root.join("includes").join("js"));
        assert_eq!(project_path(root, ""), root.to_path_buf());
    }

    #[test]
    fn test_relative_slash() {
        let root = Path::new("/srv/site");
        let file = root.join("includes").join("css").join("home.js");
        assert_eq!(relative_slash(root, &file).as_deref(), Some("includes/css/home.js"));
    }

    #[test]
    fn test_without_extension() {
        assert_eq!(without_extension("home.css"), "home");
        assert_eq!(without_extension("pages/about.page.scss"), "about.page");
        assert_eq!(without_extension(".hidden"), ".hidden");
        assert_eq!(without_extension("README"), "README");
    }

    #[test]
    fn test_format_duration() {
        use std::time::Duration;

        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs_f64(1.5)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5.00s");
    }
}
