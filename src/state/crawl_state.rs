//! Crawl state definitions for tracking the lifecycle of one run
use std::fmt;

/// Represents the current status of a crawl run
///
/// Transitions: `Idle -> Running` when the seed is enqueued,
/// `Running -> Finishing` when `finish()` is called, and
/// `Running | Finishing -> Finished` once nothing is queued or in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlState {
    /// No run has started yet
    #[default]
    Idle,

    /// Workers are processing tasks and new URLs are accepted
    Running,

    /// `finish()` was called; queued and in-flight tasks drain, follows are refused
    Finishing,

    /// The run is over (terminal)
    Finished,
}

impl CrawlState {
    /// Returns true if `follow` may enqueue new tasks in this state
    pub fn accepts_new_urls(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true once the run has started and not yet finished
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Finishing)
    }

    /// Returns true for the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Finishing)
                | (Self::Running, Self::Finished)
                | (Self::Finishing, Self::Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Finishing => "finishing",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
