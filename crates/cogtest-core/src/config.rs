//! Configuration: per-test question counts and output location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::TestType;

/// Environment variable overriding [`CogtestConfig::output_dir`].
pub const OUTPUT_DIR_ENV: &str = "COGTEST_OUTPUT_DIR";

/// Number of practice and main questions generated for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCounts {
    pub practice: usize,
    pub main: usize,
}

impl TestCounts {
    /// Built-in counts: 3/20 for memory and attention, 5/20 for Stroop.
    pub fn default_for(test_type: TestType) -> Self {
        let practice = match test_type {
            TestType::Memory | TestType::Attention => 3,
            TestType::Stroop => 5,
        };
        Self { practice, main: 20 }
    }
}

/// The `[tests]` table. Missing entries fall back to [`TestCounts::default_for`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<TestCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention: Option<TestCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroop: Option<TestCounts>,
}

/// Top-level cogtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CogtestConfig {
    /// Question counts per test type.
    #[serde(default)]
    pub tests: TestsConfig,
    /// Directory result records are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// User id stamped on records when none is given.
    #[serde(default = "default_user")]
    pub default_user: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./cogtest-results")
}

fn default_user() -> String {
    "anonymous".to_string()
}

impl Default for CogtestConfig {
    fn default() -> Self {
        Self {
            tests: TestsConfig::default(),
            output_dir: default_output_dir(),
            default_user: default_user(),
        }
    }
}

impl CogtestConfig {
    /// Question counts for `test_type`, configured or built-in.
    pub fn counts_for(&self, test_type: TestType) -> TestCounts {
        let configured = match test_type {
            TestType::Memory => self.tests.memory,
            TestType::Attention => self.tests.attention,
            TestType::Stroop => self.tests.stroop,
        };
        configured.unwrap_or_else(|| TestCounts::default_for(test_type))
    }
}

/// Load config from an explicit path, or search the well-known paths.
///
/// Search order without a path:
/// 1. `cogtest.toml` in the current directory
/// 2. `~/.config/cogtest/config.toml`
///
/// `COGTEST_OUTPUT_DIR` overrides the output directory.
pub fn load_config_from(path: Option<&Path>) -> Result<CogtestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cogtest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => CogtestConfig::default(),
    };

    apply_output_dir_override(&mut config, std::env::var(OUTPUT_DIR_ENV).ok());
    Ok(config)
}

/// Parse and validate a TOML config document.
pub fn parse_config(content: &str) -> Result<CogtestConfig> {
    let config: CogtestConfig = toml::from_str(content)?;
    for test_type in TestType::ALL {
        if config.counts_for(test_type).main == 0 {
            anyhow::bail!("tests.{test_type}.main must be at least 1");
        }
    }
    Ok(config)
}

fn apply_output_dir_override(config: &mut CogtestConfig, value: Option<String>) {
    if let Some(dir) = value.filter(|d| !d.trim().is_empty()) {
        config.output_dir = PathBuf::from(dir);
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cogtest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CogtestConfig::default();
        assert_eq!(config.default_user, "anonymous");
        assert_eq!(config.output_dir, PathBuf::from("./cogtest-results"));
        assert_eq!(
            config.counts_for(TestType::Stroop),
            TestCounts {
                practice: 5,
                main: 20
            }
        );
        assert_eq!(config.counts_for(TestType::Memory).practice, 3);
    }

    #[test]
    fn parse_partial_tests_table() {
        let config = parse_config(
            r#"
output_dir = "/tmp/results"

[tests.attention]
practice = 1
main = 4
"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/results"));
        assert_eq!(
            config.counts_for(TestType::Attention),
            TestCounts {
                practice: 1,
                main: 4
            }
        );
        assert_eq!(config.counts_for(TestType::Memory).main, 20);
        assert_eq!(config.default_user, "anonymous");
    }

    #[test]
    fn zero_main_questions_rejected() {
        let err = parse_config("[tests.stroop]\npractice = 0\nmain = 0\n").unwrap_err();
        assert!(err.to_string().contains("tests.stroop.main"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cogtest.toml");
        std::fs::write(&path, "default_user = \"ada\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_user, "ada");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn output_dir_override() {
        let mut config = CogtestConfig::default();
        apply_output_dir_override(&mut config, Some("  ".into()));
        assert_eq!(config.output_dir, default_output_dir());
        apply_output_dir_override(&mut config, Some("/data/cogtest".into()));
        assert_eq!(config.output_dir, PathBuf::from("/data/cogtest"));
    }
}
