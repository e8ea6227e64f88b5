//! Writing generated files, or checking them against what is on disk.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::util::diagnostic::suggestions;
use crate::util::fs::{is_up_to_date, write_atomic};

/// What to do with rendered files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Write files whose content changed.
    #[default]
    Write,
    /// Write nothing; report files whose content would change.
    Check,
}

/// Outcome of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Files written
    pub written: Vec<PathBuf>,
    /// Files that already held the rendered content
    pub unchanged: Vec<PathBuf>,
    /// Files that differ from the rendered content (check mode)
    pub stale: Vec<PathBuf>,
}

impl WriteReport {
    /// Write or check one rendered file.
    pub fn emit(&mut self, path: &Path, contents: &str, mode: WriteMode) -> Result<()> {
        if is_up_to_date(path, contents) {
            debug!("unchanged {}", path.display());
            self.unchanged.push(path.to_path_buf());
            return Ok(());
        }

        match mode {
            WriteMode::Write => {
                write_atomic(path, contents)?;
                info!("wrote {}", path.display());
                self.written.push(path.to_path_buf());
            }
            WriteMode::Check => self.stale.push(path.to_path_buf()),
        }
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len() + self.stale.len()
    }

    /// Fail when any file is out of date.
    pub fn ensure_fresh(&self) -> Result<()> {
        if self.stale.is_empty() {
            return Ok(());
        }
        let files: Vec<String> = self
            .stale
            .iter()
            .map(|p| format!("  {}", p.display()))
            .collect();
        bail!(
            "{} generated file(s) are out of date:\n{}\n{}",
            self.stale.len(),
            files.join("\n"),
            suggestions::OUT_OF_DATE
        );
    }
}
