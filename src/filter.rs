use crate::error::PipelineError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for selecting snapshot files in the input directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFilterConfig {
    /// Regex patterns a file name must match (at least one)
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,

    /// Regex patterns for file names to skip (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_include_patterns() -> Vec<String> {
    vec![r"\.html$".to_string()]
}

impl Default for InputFilterConfig {
    fn default() -> Self {
        Self {
            include_patterns: default_include_patterns(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// File-name filter built from compiled include/exclude patterns
#[derive(Debug)]
pub struct InputFilter {
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::new(&InputFilterConfig::default()).expect("Default regex patterns should be valid")
    }
}

impl InputFilter {
    /// Create a new filter from configuration
    pub fn new(config: &InputFilterConfig) -> Result<Self, regex::Error> {
        let mut include_regexes = Vec::with_capacity(config.include_patterns.len());
        for pattern in &config.include_patterns {
            include_regexes.push(Regex::new(pattern)?);
        }

        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            include_regexes,
            exclude_regexes,
        })
    }

    /// Determine if a file name should be extracted
    pub fn accepts(&self, file_name: &str) -> bool {
        if self.exclude_regexes.iter().any(|re| re.is_match(file_name)) {
            return false;
        }

        // With no include patterns every remaining name is accepted
        self.include_regexes.is_empty() || self.include_regexes.iter().any(|re| re.is_match(file_name))
    }
}

/// Lists the snapshot files of `dir` accepted by `filter`, sorted by name.
///
/// An empty result is the one fatal condition of a batch run.
pub fn discover_inputs(dir: &Path, filter: &InputFilter) -> Result<Vec<PathBuf>, PipelineError> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if filter.accepts(name) => inputs.push(path),
            Some(name) => ::log::trace!("Skipping {}", name),
            None => ::log::warn!("Skipping non UTF-8 file name: {}", path.display()),
        }
    }

    if inputs.is_empty() {
        return Err(PipelineError::NoInputs {
            dir: dir.to_path_buf(),
        });
    }

    inputs.sort();
    ::log::info!("Found {} snapshot files in {}", inputs.len(), dir.display());
    Ok(inputs)
}
