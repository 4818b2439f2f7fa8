//! Zip archive extraction.
//!
//! Cached repository snapshots are unpacked into one directory per
//! archive. Entry paths are rebuilt component by component so a
//! hostile archive cannot escape the destination directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::ZipArchive;

use crate::types::{PersonaError, Result};

/// Extract every `*.zip` under `cache_dir` into `<dest_dir>/<stem>/`.
///
/// One corrupt archive does not abort the batch: it is logged and
/// skipped, and the paths that did extract are returned.
pub fn extract_all(cache_dir: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest_dir)?;

    let mut extracted = Vec::new();
    for entry in fs::read_dir(cache_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("zip") {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let target = dest_dir.join(stem);

        match extract_archive(&path, &target) {
            Ok(()) => {
                info!("Extracted {}", path.display());
                extracted.push(target);
            }
            Err(e) => {
                warn!("Skipping archive {}: {e}", path.display());
            }
        }
    }

    Ok(extracted)
}

/// Unpack a single zip archive into `dest`, creating it if needed.
/// Re-extraction over an existing tree is allowed and overwrites.
pub fn extract_archive(zip_path: &Path, dest: &Path) -> Result<()> {
    let bytes = fs::read(zip_path)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PersonaError::Archive(format!("{}: {e}", zip_path.display())))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| PersonaError::Archive(format!("{}: {e}", zip_path.display())))?;

        let mut out_path = dest.to_path_buf();
        for comp in file.name().split('/') {
            // Drop empty, current-dir, and parent-dir components.
            if comp.is_empty() || comp == "." || comp == ".." {
                continue;
            }
            out_path.push(comp);
        }

        if file.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path)?;
        std::io::copy(&mut file, &mut out)?;
    }

    Ok(())
}

/// Resolve the content root inside an extracted snapshot.
///
/// GitHub archives nest everything under a single `<repo>-<branch>/`
/// directory; when exactly one top-level directory exists (and no
/// loose files), descend into it.
pub fn repo_root(dest: &Path) -> PathBuf {
    let Ok(entries) = fs::read_dir(dest) else {
        return dest.to_path_buf();
    };

    let children: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();

    match children.as_slice() {
        [only] if only.is_dir() => only.clone(),
        _ => dest.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_archive_nested_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("repo.zip");
        write_zip(
            &zip_path,
            &[
                ("repo-main/README.md", "hello"),
                ("repo-main/src/main.py", "def f():\n    pass\n"),
            ],
        );

        let dest = tmp.path().join("out");
        extract_archive(&zip_path, &dest).unwrap();

        assert!(dest.join("repo-main/README.md").exists());
        assert!(dest.join("repo-main/src/main.py").exists());
        assert_eq!(repo_root(&dest), dest.join("repo-main"));
    }

    #[test]
    fn test_extract_archive_sanitizes_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("evil.zip");
        write_zip(&zip_path, &[("../escape.txt", "nope")]);

        let dest = tmp.path().join("out");
        extract_archive(&zip_path, &dest).unwrap();

        assert!(dest.join("escape.txt").exists());
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_all_skips_corrupt_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();

        write_zip(&cache.join("good.zip"), &[("a.txt", "ok")]);
        fs::write(cache.join("bad.zip"), b"this is not a zip file").unwrap();

        let dest = tmp.path().join("out");
        let extracted = extract_all(&cache, &dest).unwrap();

        assert_eq!(extracted, vec![dest.join("good")]);
        assert!(dest.join("good/a.txt").exists());
    }

    #[test]
    fn test_repo_root_flat_layout_stays_put() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("loose.txt"), "x").unwrap();
        assert_eq!(repo_root(tmp.path()), tmp.path());
    }
}
