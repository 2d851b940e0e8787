//! Test Helper Utilities
//!
//! Shared utilities for testing lyra-ai

#![allow(dead_code)]

pub mod lyric_tree;
pub mod mock_analyzer;

pub use lyric_tree::LyricTree;
pub use mock_analyzer::{expected_analysis, MockAnalyzer};
