//! Config - Configuration File Handling
//!
//! Handles parsing and validation of `axonsync.toml` files. The file
//! supplies training and data defaults; command-line flags always win.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CliResult;

// =============================================================================
// File Configuration
// =============================================================================

/// Worker configuration (axonsync.toml).
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Training configuration
    #[serde(default)]
    pub training: TrainingSection,

    /// Data configuration
    #[serde(default)]
    pub data: DataSection,
}

impl FileConfig {
    /// Loads a configuration file from disk.
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

// =============================================================================
// Training Section
// =============================================================================

/// Training defaults.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSection {
    /// Number of epochs
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Total batch size across the group
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Learning rate
    #[serde(default = "default_lr")]
    pub learning_rate: f32,

    /// Shared random seed
    #[serde(default)]
    pub seed: u64,

    /// Reshuffle the training partition each epoch
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_lr(),
            seed: 0,
            shuffle: default_shuffle(),
        }
    }
}

fn default_epochs() -> usize {
    10
}
fn default_batch_size() -> usize {
    64
}
fn default_lr() -> f32 {
    1e-2
}
fn default_shuffle() -> bool {
    true
}

// =============================================================================
// Data Section
// =============================================================================

/// Synthetic dataset and model dimensions.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataSection {
    /// Training set size
    #[serde(default = "default_train_size")]
    pub train_size: usize,

    /// Held-out evaluation set size
    #[serde(default = "default_test_size")]
    pub test_size: usize,

    /// Features per sample
    #[serde(default = "default_features")]
    pub features: usize,

    /// Hidden layer width
    #[serde(default = "default_hidden")]
    pub hidden: usize,

    /// Number of classes
    #[serde(default = "default_classes")]
    pub classes: usize,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            train_size: default_train_size(),
            test_size: default_test_size(),
            features: default_features(),
            hidden: default_hidden(),
            classes: default_classes(),
        }
    }
}

fn default_train_size() -> usize {
    4096
}
fn default_test_size() -> usize {
    1024
}
fn default_features() -> usize {
    16
}
fn default_hidden() -> usize {
    64
}
fn default_classes() -> usize {
    10
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::default();
        assert_eq!(config.training.epochs, 10);
        assert_eq!(config.training.batch_size, 64);
        assert!(config.training.shuffle);
        assert_eq!(config.data.classes, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [training]
            epochs = 3
            shuffle = false
            "#,
        )
        .unwrap();
        assert_eq!(config.training.epochs, 3);
        assert!(!config.training.shuffle);
        assert_eq!(config.training.batch_size, 64);
        assert_eq!(config.data.train_size, 4096);
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result: Result<FileConfig, _> = toml::from_str("[training\nepochs = 3");
        assert!(result.is_err());
    }
}
