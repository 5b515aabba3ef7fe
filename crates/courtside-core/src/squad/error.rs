use thiserror::Error;

use super::draft::{DraftState, SlotRef};

/// Why a squad cannot be submitted yet.
///
/// `SquadDraft::validate_for_submit` returns these in a fixed order so the
/// first one is the most relevant to show.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Please select all 8 players (5 starting + 3 bench). {filled} of 8 selected.")]
    IncompleteRoster { filled: usize },

    #[error("Your team value of ${total:.2}M exceeds $100M. Please remove some players.")]
    BudgetExceeded { total: f64 },

    #[error("Please enter a name for your team.")]
    MissingTeamName,

    #[error("Please select a captain for your team.")]
    MissingCaptain,

    #[error("Please select a vice-captain for your team.")]
    MissingViceCaptain,
}

impl ValidationIssue {
    /// Short heading for alerts
    pub fn title(&self) -> &'static str {
        match self {
            ValidationIssue::IncompleteRoster { .. } => "Incomplete Team",
            ValidationIssue::BudgetExceeded { .. } => "Budget Exceeded",
            ValidationIssue::MissingTeamName => "Team Name Required",
            ValidationIssue::MissingCaptain => "Captain Required",
            ValidationIssue::MissingViceCaptain => "Vice-Captain Required",
        }
    }
}

fn first_issue(issues: &[ValidationIssue]) -> String {
    issues
        .first()
        .map(|issue| issue.to_string())
        .unwrap_or_default()
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SquadError {
    #[error("Player {player_id} is already selected ({slot})")]
    DuplicatePlayer { player_id: i64, slot: SlotRef },

    #[error("Player {0} is not in your squad")]
    PlayerNotSelected(i64),

    #[error("Bench slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("The squad cannot be changed while it is {0}")]
    DraftLocked(DraftState),

    #[error("Squad is not ready: {}", first_issue(.0))]
    NotReady(Vec<ValidationIssue>),

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("This squad has already been submitted")]
    AlreadySubmitted,

    /// Submission failed; carries the backend message or a generic one
    #[error("{0}")]
    BackendRejected(String),

    #[error("You need to be signed in to save a team")]
    NotSignedIn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_message_keeps_cents() {
        let issue = ValidationIssue::BudgetExceeded { total: 100.01 };
        assert_eq!(
            issue.to_string(),
            "Your team value of $100.01M exceeds $100M. Please remove some players."
        );
        assert_eq!(issue.title(), "Budget Exceeded");
    }

    #[test]
    fn test_not_ready_shows_first_issue() {
        let err = SquadError::NotReady(vec![
            ValidationIssue::MissingTeamName,
            ValidationIssue::MissingCaptain,
        ]);
        assert_eq!(err.to_string(), "Squad is not ready: Please enter a name for your team.");
    }
}
