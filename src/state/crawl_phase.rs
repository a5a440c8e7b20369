/// Crawl phase definitions for the orchestrator state machine
///
/// A run moves `Idle → Searching → ExpandingAuthors → Searching → … → Done`,
/// one Searching/ExpandingAuthors pair per target URL.
use std::fmt;

/// Represents where the orchestrator is in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// No URL has been processed yet
    Idle,

    /// Running the search call for the URL at this index
    Searching { url_index: usize },

    /// Fetching followers and follower posts for the authors found for this URL
    ExpandingAuthors { url_index: usize },

    /// Every URL has been processed
    Done,
}

impl CrawlPhase {
    /// Returns true if no further work follows this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Index of the URL currently being worked on, if any
    pub fn url_index(&self) -> Option<usize> {
        match self {
            Self::Searching { url_index } | Self::ExpandingAuthors { url_index } => {
                Some(*url_index)
            }
            Self::Idle | Self::Done => None,
        }
    }

    /// Checks whether moving from this phase to `next` is allowed
    ///
    /// Searching always advances to a strictly later URL, and expansion only
    /// follows the search for the same URL.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Searching { .. }) => true,
            (Self::Idle, Self::Done) => true,
            (Self::Searching { url_index: a }, Self::ExpandingAuthors { url_index: b }) => a == b,
            (Self::ExpandingAuthors { url_index: a }, Self::Searching { url_index: b }) => b > a,
            (Self::ExpandingAuthors { .. }, Self::Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Searching { url_index } => write!(f, "searching[{}]", url_index),
            Self::ExpandingAuthors { url_index } => write!(f, "expanding[{}]", url_index),
            Self::Done => write!(f, "done"),
        }
    }
}
