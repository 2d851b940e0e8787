//! Lyric file discovery
//!
//! Scans the input root and its immediate subfolders (one level, mirroring the
//! expected `input/<album>/<song>.txt` layout) for lyric files whose analysis
//! output does not exist yet.

use crate::config::OUTPUT_SUFFIX;
use crate::error::DiscoveryError;
use crate::models::SongTask;
use crate::services::chunker::parse_lyric_lines;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Discovers pending songs and maps them to output paths
#[derive(Debug, Clone)]
pub struct SongScanner {
    input_root: PathBuf,
    output_root: PathBuf,
    extensions: Vec<String>,
}

impl SongScanner {
    /// `extensions` are lowercase, without the leading dot
    pub fn new(input_root: PathBuf, output_root: PathBuf, extensions: Vec<String>) -> Self {
        Self {
            input_root,
            output_root,
            extensions,
        }
    }

    /// Fail fast if the input root cannot be scanned at all
    pub fn check_root(&self) -> Result<(), DiscoveryError> {
        let root = &self.input_root;
        if !root.exists() {
            return Err(DiscoveryError::RootNotFound(root.clone()));
        }
        if !root.is_dir() {
            return Err(DiscoveryError::NotADirectory(root.clone()));
        }
        std::fs::read_dir(root)
            .map(|_| ())
            .map_err(|e| DiscoveryError::Unreadable(root.clone(), e.to_string()))
    }

    /// Folders to scan, relative to the input root
    ///
    /// Immediate subfolders in name order, then the root itself as an empty
    /// path.
    pub fn folders_to_scan(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        self.check_root()?;

        let mut folders = Vec::new();
        let walker = WalkDir::new(&self.input_root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    folders.push(PathBuf::from(entry.file_name()));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Error accessing entry under {}: {}", self.input_root.display(), e);
                }
            }
        }

        folders.push(PathBuf::new());
        Ok(folders)
    }

    /// Songs whose output file does not exist yet
    ///
    /// A subfolder that disappears or cannot be read is skipped with a warning.
    /// Every task gets a distinct output path: when several lyric files in a
    /// folder share a stem (`song.txt`, `song.TXT`, `song.lrc`), the first in
    /// name order is kept and the rest are skipped with a warning.
    pub fn discover(&self) -> Result<Vec<SongTask>, DiscoveryError> {
        let mut tasks = Vec::new();
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for subfolder in self.folders_to_scan()? {
            let folder = self.input_root.join(&subfolder);
            if !folder.is_dir() {
                tracing::warn!("Skipping missing folder {}", folder.display());
                continue;
            }

            let walker = WalkDir::new(&folder)
                .min_depth(1)
                .max_depth(1)
                .follow_links(true)
                .sort_by_file_name();

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Error scanning {}: {}", folder.display(), e);
                        continue;
                    }
                };

                if !entry.file_type().is_file() || !self.is_lyric_file(entry.path()) {
                    continue;
                }

                let song_name = entry.file_name().to_string_lossy().to_string();
                let output_path = self.output_path_for(&subfolder, &song_name);
                if !claimed.insert(output_path.clone()) {
                    tracing::warn!(
                        song = %song_name,
                        "Skipping {}: another lyric file already maps to {}",
                        entry.path().display(),
                        output_path.display()
                    );
                    continue;
                }
                if output_path.exists() {
                    tracing::debug!(song = %song_name, "Already processed, not queued");
                    continue;
                }

                tasks.push(SongTask {
                    song_name,
                    subfolder: subfolder.clone(),
                    input_path: entry.path().to_path_buf(),
                    output_path,
                });
            }
        }

        Ok(tasks)
    }

    /// `<output_root>/<subfolder>/<stem>_analysis.txt`
    pub fn output_path_for(&self, subfolder: &Path, song_name: &str) -> PathBuf {
        let stem = Path::new(song_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| song_name.to_string());
        self.output_root
            .join(subfolder)
            .join(format!("{}{}.txt", stem, OUTPUT_SUFFIX))
    }

    fn is_lyric_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

/// Best-effort batch count for ETA display
///
/// Kept separate from real chunking: an unreadable file counts as 1 batch and
/// the figure never influences what is actually sent.
pub fn estimate_batches(path: &Path, batch_size: usize) -> usize {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_lyric_lines(&content)
            .len()
            .div_ceil(batch_size.max(1))
            .max(1),
        Err(e) => {
            tracing::debug!("Batch estimate fallback for {}: {}", path.display(), e);
            1
        }
    }
}
