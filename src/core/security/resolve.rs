//! Path resolution used by the validator.
//!
//! Resolution happens in two passes. Lexical normalization removes `.`, `..`
//! and redundant separators without touching the filesystem. Soft
//! canonicalization then resolves symlinks through the deepest ancestor that
//! exists and re-attaches the components that do not exist yet, so paths for
//! files about to be created still resolve.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Removes `.`, `..` and repeated separators. `..` never climbs above the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(Component::ParentDir.as_os_str());
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    normalized
}

/// Canonicalizes `path`, tolerating a missing tail.
///
/// The longest existing ancestor is canonicalized by the filesystem; the
/// remaining components are appended unchanged. Errors other than
/// [`io::ErrorKind::NotFound`] are returned as-is.
pub fn soft_canonicalize(path: &Path) -> io::Result<PathBuf> {
    let normalized = normalize_lexically(path);
    let mut existing = normalized.as_path();
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                canonical.extend(missing.iter().rev());
                return Ok(canonical);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(e);
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[test]
    fn test_normalize_collapses_dots_and_separators() {
        assert_eq!(
            normalize_lexically(Path::new("/srv//data/./reports/../q1.csv")),
            PathBuf::from("/srv/data/q1.csv")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_never_climbs_above_root() {
        assert_eq!(
            normalize_lexically(Path::new("/srv/../../../etc/passwd")),
            PathBuf::from("/etc/passwd")
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent_in_relative_path() {
        assert_eq!(
            normalize_lexically(Path::new("../a/./b")),
            Path::new("..").join("a").join("b")
        );
    }

    #[test]
    fn test_soft_canonicalize_existing_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("present.txt");
        fs::write(&file, "x").unwrap();

        let resolved = soft_canonicalize(&file).unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[test]
    fn test_soft_canonicalize_missing_tail() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();

        let resolved = soft_canonicalize(&temp_dir.path().join("new/dir/file.txt")).unwrap();
        assert_eq!(resolved, root.join("new").join("dir").join("file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_soft_canonicalize_follows_symlinked_ancestor() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let link = temp_dir.path().join("escape");
        symlink(outside.path(), &link).unwrap();

        let resolved = soft_canonicalize(&link.join("not-yet.txt")).unwrap();
        assert_eq!(
            resolved,
            outside.path().canonicalize().unwrap().join("not-yet.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_soft_canonicalize_reports_non_directory_parent() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let result = soft_canonicalize(&file.join("child"));
        assert!(result.is_err());
    }
}
