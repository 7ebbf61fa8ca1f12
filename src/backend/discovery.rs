use anyhow::{Context, Result};
use dirs::home_dir;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds record files below a base directory that match a set of globs.
pub struct FileDiscovery {
    glob_set: GlobSet,
}

impl FileDiscovery {
    pub fn new(patterns: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob =
                Glob::new(&pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;
            builder.add(glob);
        }

        let glob_set = builder.build().context("Failed to build glob set")?;

        Ok(Self { glob_set })
    }

    pub fn from_pattern(pattern: &str) -> Result<Self> {
        Self::new(vec![pattern.to_string()])
    }

    /// Matching files, most recently modified first.
    pub fn discover_files(&self, base_path: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(base_path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.glob_set.is_match(e.path()))
            .map(|e| e.into_path())
            .collect();

        files.sort_by_cached_key(|path| {
            std::fs::metadata(path)
                .and_then(|m| m.modified())
                .map(std::cmp::Reverse)
                .ok()
        });

        files
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

pub fn default_source_pattern() -> String {
    "~/.local/share/obsterm/**/*.jsonl".to_string()
}

/// Expand `pattern` and list the files it names. A pattern without glob
/// characters names a single file, which is returned only if it exists.
pub fn discover_source_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let expanded_path = expand_tilde(pattern);

    let path_str = expanded_path.to_string_lossy();
    let base_path = if let Some(pos) = path_str.find("**") {
        PathBuf::from(&path_str[..pos])
    } else if let Some(pos) = path_str.find(['*', '?', '[', '{']) {
        Path::new(&path_str[..pos])
            .parent()
            .unwrap_or(Path::new("/"))
            .to_path_buf()
    } else if expanded_path.is_file() {
        return Ok(vec![expanded_path]);
    } else {
        return Ok(Vec::new());
    };

    let discovery = FileDiscovery::from_pattern(&path_str)?;
    Ok(discovery.discover_files(&base_path))
}
