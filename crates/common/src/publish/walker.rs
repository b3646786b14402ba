use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::PublishError;

/// Lazily yield every regular file under `root`, recursing into
/// subdirectories. Symlinks are not followed. Listing failures surface as
/// errors in the sequence; the caller decides whether anything yielded
/// before the failure is kept.
pub fn files(root: &Path) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> {
    WalkDir::new(root).into_iter().filter_map(|entry| match entry {
        Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
        Ok(_) => None,
        Err(err) => Some(Err(err)),
    })
}

/// The forward-slash relative path of `path` under `root`.
///
/// This is the key the file gets in the manifest: no root prefix, no
/// platform separators.
pub fn relative_path(root: &Path, path: &Path) -> Result<String, PublishError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| PublishError::OutsideRoot(path.to_path_buf()))?;
    Ok(relative
        .iter()
        .map(|component| component.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    #[test]
    fn test_walks_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::create_dir_all(root.join("img/icons")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("index.html"), "x").unwrap();
        fs::write(root.join("css/a.css"), "x").unwrap();
        fs::write(root.join("img/icons/a.png"), "x").unwrap();

        let found: BTreeSet<String> = files(root)
            .map(|path| relative_path(root, &path.unwrap()).unwrap())
            .collect();

        let expected: BTreeSet<String> = ["index.html", "css/a.css", "img/icons/a.png"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_yields_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for i in 0..20 {
            fs::write(root.join(format!("f{i}.txt")), "x").unwrap();
        }

        let paths: Vec<PathBuf> = files(root).map(|p| p.unwrap()).collect();
        let unique: BTreeSet<&PathBuf> = paths.iter().collect();
        assert_eq!(paths.len(), 20);
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_relative_path_strips_root() {
        let root = Path::new("/srv/site");
        let path = Path::new("/srv/site/css/a.css");
        assert_eq!(relative_path(root, path).unwrap(), "css/a.css");
    }

    #[test]
    fn test_relative_path_rejects_foreign_path() {
        let root = Path::new("/srv/site");
        let path = Path::new("/etc/passwd");
        assert!(matches!(
            relative_path(root, path),
            Err(PublishError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let results: Vec<_> = files(&missing).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
