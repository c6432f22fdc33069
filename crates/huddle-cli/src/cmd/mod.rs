pub mod analyze;
pub mod completions;
pub mod import;
pub mod matches;
pub mod metrics;
pub mod range;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use huddle_core::config::ProjectConfig;
use huddle_core::db::SqliteStore;
use huddle_core::error::ErrorCode;
use huddle_core::lock::MatchLock;
use huddle_core::model::TransitionPattern;

use crate::output::OutputMode;

/// Failures detected by the command layer itself.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no huddle database at {}", .0.display())]
    NotInitialized(PathBuf),
    #[error("match {0} not found")]
    MatchNotFound(i64),
}

impl CommandError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::MatchNotFound(_) => ErrorCode::MatchNotFound,
        }
    }
}

/// Dialogue-act transition selector shared by `metrics` and `range`.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternArgs {
    /// Dialogue-act code of the first utterance (-1 with --target-da -1 for any).
    #[arg(long, allow_negative_numbers = true)]
    pub source_da: Option<i32>,

    /// Dialogue-act code of the following utterance.
    #[arg(long, allow_negative_numbers = true)]
    pub target_da: Option<i32>,
}

impl PatternArgs {
    /// Resolve to a pattern, filling missing codes from `default`.
    pub fn resolve(self, default: TransitionPattern) -> Result<TransitionPattern> {
        let (default_source, default_target) = default.codes();
        let source = self.source_da.unwrap_or(default_source);
        let target = self.target_da.unwrap_or(default_target);
        TransitionPattern::from_codes(source, target)
            .with_context(|| format!("resolve pattern --source-da {source} --target-da {target}"))
    }
}

/// Everything a command handler needs from the invocation.
#[derive(Debug)]
pub struct Context {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub output: OutputMode,
}

impl Context {
    pub fn database_path(&self) -> PathBuf {
        self.config.database_path(&self.root)
    }

    /// Open the store, creating it when absent.
    pub fn open_or_create_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.database_path())
    }

    /// Open an existing store; a missing database is reported as such
    /// rather than silently created.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let path = self.database_path();
        if !path.exists() {
            return Err(CommandError::NotInitialized(path).into());
        }
        SqliteStore::open(&path)
    }

    /// Take the per-match lock with the configured timeout.
    pub fn lock_match(&self, match_id: i64) -> Result<MatchLock> {
        let dir = ProjectConfig::lock_dir(&self.root);
        MatchLock::acquire(&dir, match_id, self.config.lock.timeout())
            .with_context(|| format!("lock match {match_id}"))
    }
}

/// Fail with [`CommandError::MatchNotFound`] unless `match_id` exists.
pub fn require_match(store: &SqliteStore, match_id: i64) -> Result<()> {
    if store.match_exists(match_id)? {
        Ok(())
    } else {
        Err(CommandError::MatchNotFound(match_id).into())
    }
}

/// Format a ratio with three decimals for human output.
pub fn ratio(value: f64) -> String {
    format!("{value:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_args_defaults_and_sentinel() {
        let none = PatternArgs {
            source_da: None,
            target_da: None,
        };
        assert_eq!(
            none.resolve(TransitionPattern::acts(1, 0)).expect("default"),
            TransitionPattern::acts(1, 0)
        );
        assert_eq!(
            none.resolve(TransitionPattern::Any).expect("default"),
            TransitionPattern::Any
        );

        let any = PatternArgs {
            source_da: Some(-1),
            target_da: Some(-1),
        };
        assert_eq!(
            any.resolve(TransitionPattern::acts(1, 0)).expect("any"),
            TransitionPattern::Any
        );
    }

    #[test]
    fn half_sentinel_is_rejected() {
        let half = PatternArgs {
            source_da: Some(-1),
            target_da: None,
        };
        let err = half
            .resolve(TransitionPattern::acts(1, 0))
            .expect_err("half sentinel");
        assert!(err.chain().any(|c| c.is::<huddle_core::model::PatternError>()));
    }

    #[test]
    fn missing_database_is_not_initialized() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ctx = Context {
            root: dir.path().to_path_buf(),
            config: ProjectConfig::default(),
            output: OutputMode::Text,
        };
        let err = ctx.open_store().expect_err("missing db");
        let typed = err.downcast_ref::<CommandError>().expect("typed");
        assert_eq!(typed.code(), ErrorCode::NotInitialized);

        let store = ctx.open_or_create_store().expect("create");
        let err = require_match(&store, 3).expect_err("no match");
        assert!(err.to_string().contains("match 3 not found"));
        assert!(ctx.open_store().is_ok());
    }
}
