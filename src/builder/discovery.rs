//! Source discovery and exclusion filtering.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::util::fs::lexically_normal;

/// Recursively collect every regular file under `root` whose extension is in
/// `extensions` (each written with a leading dot, e.g. `".c"`).
///
/// Entries are visited sorted by file name within each directory, so the
/// result is stable across runs.
pub fn discover(root: &Path, extensions: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if has_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.strip_prefix('.').unwrap_or(wanted) == ext)
}

/// Remove files matched by any exclusion fragment.
///
/// Each fragment is joined to `root` and normalized. A file is excluded when
/// its normalized path equals that path, or lies strictly beneath it. So
/// `"gen/"` silences a whole subtree while `"gen/table.c"` silences one file.
pub fn exclude(root: &Path, files: Vec<PathBuf>, fragments: &[String]) -> Vec<PathBuf> {
    if fragments.is_empty() {
        return files;
    }

    let excluded: Vec<PathBuf> = fragments
        .iter()
        .map(|fragment| lexically_normal(&root.join(fragment)))
        .collect();

    files
        .into_iter()
        .filter(|file| {
            let file = lexically_normal(file);
            let hit = excluded.iter().find(|ex| file == **ex || file.starts_with(ex));
            if let Some(ex) = hit {
                tracing::debug!("excluding {} (matched {})", file.display(), ex.display());
            }
            hit.is_none()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec![".c".to_string(), ".cpp".to_string()]
    }

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for rel in [
            "main.c",
            "util.cpp",
            "notes.txt",
            "util.h",
            "gen/table.c",
            "gen/more/deep.c",
            "generated.c",
        ] {
            touch(tmp.path(), rel);
        }
        tmp
    }

    #[test]
    fn test_discover_filters_by_extension() {
        let tmp = tree();
        let files = discover(tmp.path(), &exts()).unwrap();

        let mut names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                PathBuf::from("gen/more/deep.c"),
                PathBuf::from("gen/table.c"),
                PathBuf::from("generated.c"),
                PathBuf::from("main.c"),
                PathBuf::from("util.cpp"),
            ]
        );
    }

    #[test]
    fn test_discover_accepts_extensions_without_dot() {
        let tmp = tree();
        let files = discover(tmp.path(), &["cpp".to_string()]).unwrap();
        assert_eq!(files, vec![tmp.path().join("util.cpp")]);
    }

    #[test]
    fn test_discover_is_stable() {
        let tmp = tree();
        let first = discover(tmp.path(), &exts()).unwrap();
        let second = discover(tmp.path(), &exts()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_discover_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(&tmp.path().join("missing"), &exts()).is_err());
    }

    #[test]
    fn test_exclude_exact_file() {
        let tmp = tree();
        let files = discover(tmp.path(), &exts()).unwrap();
        let kept = exclude(tmp.path(), files, &["gen/table.c".to_string()]);

        assert!(!kept.contains(&tmp.path().join("gen/table.c")));
        assert!(kept.contains(&tmp.path().join("gen/more/deep.c")));
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_exclude_directory_prefix() {
        let tmp = tree();
        let files = discover(tmp.path(), &exts()).unwrap();
        let kept = exclude(tmp.path(), files, &["gen/".to_string()]);

        assert!(kept.iter().all(|f| !f.starts_with(tmp.path().join("gen"))));
        // A sibling sharing the textual prefix survives
        assert!(kept.contains(&tmp.path().join("generated.c")));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_exclude_normalizes_fragments() {
        let tmp = tree();
        let files = discover(tmp.path(), &exts()).unwrap();
        let kept = exclude(tmp.path(), files, &["./gen/more/../more/".to_string()]);

        assert!(!kept.contains(&tmp.path().join("gen/more/deep.c")));
        assert!(kept.contains(&tmp.path().join("gen/table.c")));
    }

    #[test]
    fn test_exclude_unmatched_fragment_is_noop() {
        let tmp = tree();
        let files = discover(tmp.path(), &exts()).unwrap();
        let kept = exclude(
            tmp.path(),
            files.clone(),
            &["nothing/here/".to_string(), "absent.c".to_string()],
        );
        assert_eq!(kept, files);
    }

    #[test]
    fn test_exclude_never_returns_excluded_files() {
        let tmp = tree();
        let fragments = vec!["gen/more/".to_string(), "main.c".to_string()];
        let kept = exclude(
            tmp.path(),
            discover(tmp.path(), &exts()).unwrap(),
            &fragments,
        );

        for file in &kept {
            assert_ne!(file, &tmp.path().join("main.c"));
            assert!(!file.starts_with(tmp.path().join("gen/more")));
        }
    }
}
