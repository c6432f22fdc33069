use std::fmt;

/// Machine-readable error codes surfaced by the CLI and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    MatchNotFound,
    InvalidPattern,
    InvalidTally,
    ImportFailed,
    StoreCorrupt,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::MatchNotFound => "E2001",
            Self::InvalidPattern => "E2002",
            Self::InvalidTally => "E2004",
            Self::ImportFailed => "E3001",
            Self::StoreCorrupt => "E4001",
            Self::StoreWriteFailed => "E4002",
            Self::LockContention => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "No huddle database found",
            Self::ConfigParseError => "Config file parse error",
            Self::MatchNotFound => "Match not found",
            Self::InvalidPattern => "Invalid dialogue-act transition pattern",
            Self::InvalidTally => "Invalid stored role tally",
            Self::ImportFailed => "Match import failed",
            Self::StoreCorrupt => "Corrupt SQLite store",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `huddle import <dir>` to create the database."),
            Self::ConfigParseError => Some("Fix syntax in .huddle/config.toml and retry."),
            Self::MatchNotFound => Some("List imported matches with `huddle matches`."),
            Self::InvalidPattern => {
                Some("Pass two dialogue-act codes, or -1 -1 for all transitions.")
            }
            Self::InvalidTally | Self::StoreCorrupt => {
                Some("Re-run `huddle analyze <match-id>` to regenerate metrics.")
            }
            Self::ImportFailed => {
                Some("Check that the directory contains info.csv and da_result.csv.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `huddle` process finishes with this match.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
