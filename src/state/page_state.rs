/// Page state definitions for tracking a URL through the crawl pipeline
///
/// A popped URL moves forward through the stages below and ends in exactly
/// one terminal state: `Accepted` (it received an ID) or `Rejected`.
use std::fmt;
use url::Url;

/// Why a URL was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// The URL redirected elsewhere; the target was queued instead
    Redirected,

    /// Network error, timeout, non-success status or local IO failure
    DownloadFailed,

    /// No parser accepts the downloaded content
    NoParser,

    /// The parser failed to extract text
    ParseFailed,

    /// The extracted text is not in the target language
    LanguageMismatch,

    /// The accepted artifacts could not be moved into place
    CommitFailed,
}

impl RejectReason {
    /// Returns a short machine-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redirected => "redirected",
            Self::DownloadFailed => "download_failed",
            Self::NoParser => "no_parser",
            Self::ParseFailed => "parse_failed",
            Self::LanguageMismatch => "language_mismatch",
            Self::CommitFailed => "commit_failed",
        }
    }

    /// Returns all rejection reasons
    pub fn all() -> [Self; 6] {
        [
            Self::Redirected,
            Self::DownloadFailed,
            Self::NoParser,
            Self::ParseFailed,
            Self::LanguageMismatch,
            Self::CommitFailed,
        ]
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the stage a popped URL has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Taken from the frontier, nothing done yet
    Popped,

    /// Redirects were resolved
    RedirectChecked,

    /// Bytes are saved under a staging name
    Downloaded,

    /// A parser accepted the content
    ParserFound,

    /// Text and links were extracted
    Parsed,

    /// The text passed the language filter
    LanguageAccepted,

    // ===== Terminal States =====
    /// The URL received a permanent ID
    Accepted,

    /// The URL is visited but produced no numbered artifacts
    Rejected(RejectReason),
}

impl PageState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected(_))
    }

    /// Returns true if this is the successful terminal state
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Each active stage may only advance to the following stage or to the
    /// rejection that stage can produce. Terminal states never transition.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use RejectReason::*;

        matches!(
            (self, next),
            (Self::Popped, Self::RedirectChecked)
                | (Self::RedirectChecked, Self::Downloaded)
                | (Self::RedirectChecked, Self::Rejected(Redirected))
                | (Self::RedirectChecked, Self::Rejected(DownloadFailed))
                | (Self::Downloaded, Self::ParserFound)
                | (Self::Downloaded, Self::Rejected(NoParser))
                | (Self::ParserFound, Self::Parsed)
                | (Self::ParserFound, Self::Rejected(ParseFailed))
                | (Self::Parsed, Self::LanguageAccepted)
                | (Self::Parsed, Self::Rejected(LanguageMismatch))
                | (Self::LanguageAccepted, Self::Accepted)
                | (Self::LanguageAccepted, Self::Rejected(CommitFailed))
        )
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Popped => f.write_str("popped"),
            Self::RedirectChecked => f.write_str("redirect_checked"),
            Self::Downloaded => f.write_str("downloaded"),
            Self::ParserFound => f.write_str("parser_found"),
            Self::Parsed => f.write_str("parsed"),
            Self::LanguageAccepted => f.write_str("language_accepted"),
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected(reason) => write!(f, "rejected({})", reason),
        }
    }
}

/// Terminal result of processing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The page received an ID and its artifacts were written
    Accepted {
        url: Url,
        id: u64,
        /// Number of outbound links recorded for the page
        links: usize,
    },

    /// The page was marked visited without an ID
    Rejected { url: Url, reason: RejectReason },
}

impl Outcome {
    /// The URL this outcome belongs to
    pub fn url(&self) -> &Url {
        match self {
            Self::Accepted { url, .. } | Self::Rejected { url, .. } => url,
        }
    }

    /// The terminal page state matching this outcome
    pub fn state(&self) -> PageState {
        match self {
            Self::Accepted { .. } => PageState::Accepted,
            Self::Rejected { reason, .. } => PageState::Rejected(*reason),
        }
    }

    /// The rejection reason, if rejected
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }
}
