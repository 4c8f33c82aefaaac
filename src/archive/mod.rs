//! Zip archive helpers for repository zipballs and run artifacts.

use crate::errors::{GitHubError, GitHubResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extracts an archive into `destination` as-is.
pub fn extract(archive: &Path, destination: &Path) -> GitHubResult<()> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    zip.extract(destination)?;
    Ok(())
}

/// Extracts an archive into `destination`, stripping the single top-level
/// directory so the contents merge directly into `destination`.
///
/// Repository zipballs wrap everything in a `{owner}-{repo}-{sha}/` entry;
/// this unwraps it.
pub fn extract_strip_root(archive: &Path, destination: &Path) -> GitHubResult<()> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    if zip.is_empty() {
        return Ok(());
    }

    let root = {
        let first = zip.by_index(0)?;
        match first.name().split('/').next() {
            Some(dir) if !dir.is_empty() => format!("{}/", dir),
            _ => {
                return Err(GitHubError::io(format!(
                    "Archive {} has no top-level directory",
                    archive.display()
                )))
            }
        }
    };

    fs::create_dir_all(destination)?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let stripped = match entry.name().strip_prefix(&root) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => continue,
        };

        let target = destination.join(&stripped);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    Ok(())
}

/// Recursively lists the regular files under `dir`.
pub fn walk_files(dir: &Path) -> GitHubResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> GitHubResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Reads the first line of a file, trailing whitespace trimmed.
pub fn first_line(path: &Path) -> GitHubResult<String> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string())
}

/// Derives an exported variable key from a prefix and a file name:
/// uppercased, with `.`, `/` and `-` normalized to `_`.
pub fn env_key(prefix: &str, file_name: &str) -> String {
    format!("{}_{}", prefix, file_name)
        .to_uppercase()
        .replace(['.', '/', '-'], "_")
}
