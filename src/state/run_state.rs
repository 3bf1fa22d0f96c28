/// Run state definitions for a crawl instance
use std::fmt;

/// Lifecycle of one crawl instance
///
/// ```text
/// Idle --start/resume--> Running --stop requested-----> Stopped
///                                --frontier empty-----> Exhausted
///                                --page budget hit----> BudgetReached
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Created but not started
    Idle,

    /// Inside the crawl loop
    Running,

    // ===== Terminal States =====
    /// Cooperative shutdown was requested
    Stopped,

    /// The frontier ran out of URLs
    Exhausted,

    /// The page budget was reached
    BudgetReached,
}

impl RunState {
    /// Returns true if the crawl loop has ended in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Exhausted | Self::BudgetReached)
    }

    /// Returns the string used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Exhausted => "exhausted",
            Self::BudgetReached => "budget_reached",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
