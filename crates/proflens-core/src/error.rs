use std::fmt;

/// Machine-readable error codes for operator-facing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SnapshotUnreadable,
    IndexUnavailable,
    EmptyQuery,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::SnapshotUnreadable => "E3001",
            Self::IndexUnavailable => "E3002",
            Self::EmptyQuery => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SnapshotUnreadable => "Corpus snapshot unreadable",
            Self::IndexUnavailable => "Corpus index unavailable",
            Self::EmptyQuery => "Search query must not be empty",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .proflens/config.toml and retry."),
            Self::SnapshotUnreadable => {
                Some("Check that the corpus snapshot is a JSON array of {id, vector, metadata}.")
            }
            Self::IndexUnavailable => {
                Some("Point [corpus] path or PROFLENS_CORPUS at a seeded snapshot.")
            }
            Self::EmptyQuery => Some("Provide a non-empty query string."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
