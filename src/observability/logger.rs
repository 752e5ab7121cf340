//! Activity log for contents operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Logger for storage operations.
///
/// Writes a markdown-formatted activity log: one section per operation,
/// checkpoint action or failure. Console output goes through `tracing`.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
    log_level: String,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => {
                let mut dir = std::env::temp_dir();
                dir.push("nbvault-logs");
                std::fs::create_dir_all(&dir).with_context(|| {
                    format!("Failed to create log directory: {}", dir.display())
                })?;
                let filename = format!(
                    "contents_{}_{}.md",
                    Utc::now().timestamp_millis(),
                    std::process::id()
                );
                dir.join(filename)
            }
        };

        let log_level = log_level.unwrap_or("INFO").to_uppercase();

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let logger = Self {
            log_file,
            log_level,
        };

        if !logger.log_file.exists() {
            logger.initialize_log_file()?;
        }

        Ok(logger)
    }

    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Contents Activity Log\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    fn append_to_log(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        write!(file, "{}", content).with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    fn is_debug(&self) -> bool {
        self.log_level == "DEBUG"
    }

    /// Log a completed operation. Only recorded at DEBUG level; reads are
    /// too frequent to keep otherwise.
    pub fn log_operation(&self, operation: &str, path: &str) -> Result<()> {
        if !self.is_debug() {
            return Ok(());
        }

        let content = format!(
            "### {} - {}\n\n**Path:** `{}`\n\n",
            operation,
            Utc::now().to_rfc3339(),
            display_path(path)
        );
        self.append_to_log(&content)
    }

    /// Log a checkpoint action (create, restore, delete).
    pub fn log_checkpoint(&self, action: &str, path: &str, checkpoint_id: &str) -> Result<()> {
        let content = format!(
            "### Checkpoint {} - {}\n\n**Path:** `{}`\n**Checkpoint:** {}\n\n",
            action,
            Utc::now().to_rfc3339(),
            display_path(path),
            checkpoint_id
        );
        self.append_to_log(&content)
    }

    /// Log a failed operation.
    pub fn log_error(&self, operation: &str, path: &str, error: &str) -> Result<()> {
        let content = format!(
            "## Error - {}\n\n**Operation:** {}\n**Path:** `{}`\n\n```\n{}\n```\n\n",
            Utc::now().to_rfc3339(),
            operation,
            display_path(path),
            error
        );
        self.append_to_log(&content)?;
        self.error(&format!("{} failed at {}: {}", operation, display_path(path), error));
        Ok(())
    }

    /// Log info message.
    pub fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    /// Log error message.
    pub fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
