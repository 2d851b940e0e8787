//! Temporary input/output trees

use lyra_ai::config::{PipelineConfig, RetryPolicy};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// `<tmp>/original_song` as the input root, `<tmp>/output` as the output root
pub struct LyricTree {
    dir: TempDir,
}

impl LyricTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("original_song")).unwrap();
        Self { dir }
    }

    pub fn input_root(&self) -> PathBuf {
        self.dir.path().join("original_song")
    }

    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Write a lyric file; `subfolder` may be empty for the input root
    pub fn add_song(&self, subfolder: &str, name: &str, content: &str) -> PathBuf {
        let folder = self.input_root().join(subfolder);
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write raw bytes as a lyric file
    pub fn add_song_bytes(&self, subfolder: &str, name: &str, content: &[u8]) -> PathBuf {
        let folder = self.input_root().join(subfolder);
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Pre-existing analysis output
    pub fn add_output(&self, subfolder: &str, name: &str, content: &str) -> PathBuf {
        let folder = self.output_root().join(subfolder);
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn output_path(&self, subfolder: &str, name: &str) -> PathBuf {
        self.output_root().join(subfolder).join(name)
    }

    pub fn read_output(&self, subfolder: &str, name: &str) -> String {
        fs::read_to_string(self.output_path(subfolder, name)).unwrap()
    }

    /// Defaults with this tree's roots and no retries
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_root: self.input_root(),
            output_root: self.output_root(),
            retry: RetryPolicy::none(),
            ..PipelineConfig::default()
        }
    }
}
