use std::fmt;

use tracing::{debug, info, warn};

use crate::api::{ApiError, FantasyBackend};
use crate::models::{FantasyTeam, Player, Position, SquadPayload};

use super::error::{SquadError, ValidationIssue};

/// Bench size. Bench slots take any position.
pub const BENCH_SIZE: usize = 3;

/// Labels shown on the bench slots. Not enforced on assignment.
pub const BENCH_POSITIONS: [Position; BENCH_SIZE] = [
    Position::PointGuard,
    Position::ShootingGuard,
    Position::SmallForward,
];

/// Starting five plus bench
pub const SQUAD_SIZE: usize = Position::ALL.len() + BENCH_SIZE;

/// Squad budget, in millions
pub const BUDGET_CEILING: f64 = 100.0;

/// Budget ceiling in hundredths of a million. Totals are compared in these
/// units so summing prices like 12.3 + 8.7 cannot drift past the limit.
const BUDGET_CEILING_CENTS: i64 = 10_000;

/// Shown when the backend rejects a squad without saying why
const GENERIC_SUBMIT_FAILURE: &str = "There was an error creating your team. Please try again.";

/// Non-finite prices count as unaffordable.
fn to_cents(millions: f64) -> i64 {
    if millions.is_finite() {
        (millions * 100.0).round() as i64
    } else {
        i64::MAX
    }
}

/// Addresses one slot of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRef {
    Starting(Position),
    /// Zero-based bench index, `0..BENCH_SIZE`
    Bench(usize),
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRef::Starting(position) => write!(f, "starting {}", position),
            SlotRef::Bench(index) => write!(f, "bench {}", index + 1),
        }
    }
}

/// A single roster slot. Neither starting nor bench slots check the
/// position of the player they hold.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSlot {
    pub position: Position,
    pub player: Option<Player>,
}

impl TeamSlot {
    fn empty(position: Position) -> Self {
        Self {
            position,
            player: None,
        }
    }

    pub fn player_id(&self) -> Option<i64> {
        self.player.as_ref().map(|p| p.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Captain,
    ViceCaptain,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Captain => f.write_str("captain"),
            Role::ViceCaptain => f.write_str("vice-captain"),
        }
    }
}

/// Outcome of a successful captain or vice-captain assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Assigned,
    /// The player held the other role, which was cleared to keep the two
    /// roles on different players.
    ConflictResolved { cleared: Role },
}

/// Where the draft is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    PartiallyFilled,
    Complete,
    Submitting,
    Submitted,
    SubmissionFailed,
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DraftState::Empty => "empty",
            DraftState::PartiallyFilled => "partially filled",
            DraftState::Complete => "complete",
            DraftState::Submitting => "submitting",
            DraftState::Submitted => "submitted",
            DraftState::SubmissionFailed => "failed to submit",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Submission {
    Idle,
    InFlight,
    Submitted,
    Failed(String),
}

/// An unsaved fantasy squad.
///
/// Invariants held after every operation:
/// - a player id appears in at most one slot;
/// - captain and vice-captain, when set, reference players in a slot;
/// - captain and vice-captain are never the same player.
#[derive(Debug, Clone)]
pub struct SquadDraft {
    starting: [TeamSlot; 5],
    bench: [TeamSlot; BENCH_SIZE],
    team_name: String,
    captain_id: Option<i64>,
    vice_captain_id: Option<i64>,
    submission: Submission,
}

impl Default for SquadDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl SquadDraft {
    pub fn new() -> Self {
        Self {
            starting: Position::ALL.map(TeamSlot::empty),
            bench: BENCH_POSITIONS.map(TeamSlot::empty),
            team_name: String::new(),
            captain_id: None,
            vice_captain_id: None,
            submission: Submission::Idle,
        }
    }

    pub fn starting(&self) -> &[TeamSlot] {
        &self.starting
    }

    pub fn bench(&self) -> &[TeamSlot] {
        &self.bench
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn captain_id(&self) -> Option<i64> {
        self.captain_id
    }

    pub fn vice_captain_id(&self) -> Option<i64> {
        self.vice_captain_id
    }

    pub fn slot(&self, slot: SlotRef) -> Result<&TeamSlot, SquadError> {
        match slot {
            SlotRef::Starting(position) => Ok(&self.starting[position.slot_index()]),
            SlotRef::Bench(index) => self.bench.get(index).ok_or(SquadError::InvalidSlot(index)),
        }
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Result<&mut TeamSlot, SquadError> {
        match slot {
            SlotRef::Starting(position) => Ok(&mut self.starting[position.slot_index()]),
            SlotRef::Bench(index) => self
                .bench
                .get_mut(index)
                .ok_or(SquadError::InvalidSlot(index)),
        }
    }

    fn slot_refs() -> impl Iterator<Item = SlotRef> {
        Position::ALL
            .into_iter()
            .map(SlotRef::Starting)
            .chain((0..BENCH_SIZE).map(SlotRef::Bench))
    }

    /// Selected players, starters first
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.starting
            .iter()
            .chain(self.bench.iter())
            .filter_map(|slot| slot.player.as_ref())
    }

    pub fn filled_count(&self) -> usize {
        self.players().count()
    }

    /// Slot currently holding `player_id`
    pub fn slot_of(&self, player_id: i64) -> Option<SlotRef> {
        Self::slot_refs().find(|slot| {
            self.slot(*slot)
                .map(|s| s.player_id() == Some(player_id))
                .unwrap_or(false)
        })
    }

    pub fn contains(&self, player_id: i64) -> bool {
        self.slot_of(player_id).is_some()
    }

    /// Saturates instead of overflowing on absurd prices.
    fn total_cents(&self) -> i64 {
        self.players()
            .fold(0i64, |total, p| total.saturating_add(to_cents(p.price)))
    }

    /// Sum of selected players' prices, in millions
    pub fn total_price(&self) -> f64 {
        self.total_cents() as f64 / 100.0
    }

    /// Budget left, in millions. Negative when over budget.
    pub fn remaining_budget(&self) -> f64 {
        BUDGET_CEILING_CENTS.saturating_sub(self.total_cents()) as f64 / 100.0
    }

    /// Whether adding `player` on top of the current selection would go over budget
    pub fn would_exceed_budget(&self, player: &Player) -> bool {
        self.total_cents().saturating_add(to_cents(player.price)) > BUDGET_CEILING_CENTS
    }

    pub fn state(&self) -> DraftState {
        match self.submission {
            Submission::InFlight => DraftState::Submitting,
            Submission::Submitted => DraftState::Submitted,
            Submission::Failed(_) => DraftState::SubmissionFailed,
            Submission::Idle => match self.filled_count() {
                0 => DraftState::Empty,
                SQUAD_SIZE => DraftState::Complete,
                _ => DraftState::PartiallyFilled,
            },
        }
    }

    /// Message from the last failed submission
    pub fn submission_error(&self) -> Option<&str> {
        match &self.submission {
            Submission::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn ensure_editable(&self) -> Result<(), SquadError> {
        match self.submission {
            Submission::InFlight | Submission::Submitted => {
                Err(SquadError::DraftLocked(self.state()))
            }
            Submission::Idle | Submission::Failed(_) => Ok(()),
        }
    }

    /// A successful edit after a failed submission returns the draft to editing.
    fn mark_edited(&mut self) {
        if matches!(self.submission, Submission::Failed(_)) {
            self.submission = Submission::Idle;
        }
    }

    fn clear_roles_of(&mut self, player_id: i64) {
        if self.captain_id == Some(player_id) {
            self.captain_id = None;
        }
        if self.vice_captain_id == Some(player_id) {
            self.vice_captain_id = None;
        }
    }

    /// Put `player` in `slot`, returning whoever it displaced.
    ///
    /// Starting slots do not check the player's position. Re-assigning a
    /// player to the slot they already hold changes nothing. A displaced
    /// player loses any captain or vice-captain role.
    pub fn assign_player(
        &mut self,
        slot: SlotRef,
        player: Player,
    ) -> Result<Option<Player>, SquadError> {
        self.ensure_editable()?;
        self.slot(slot)?;

        if let Some(existing) = self.slot_of(player.id) {
            if existing == slot {
                return Ok(None);
            }
            return Err(SquadError::DuplicatePlayer {
                player_id: player.id,
                slot: existing,
            });
        }

        debug!(player_id = player.id, %slot, "Assigning player");
        let displaced = self.slot_mut(slot)?.player.replace(player);
        if let Some(ref previous) = displaced {
            self.clear_roles_of(previous.id);
        }
        self.mark_edited();
        Ok(displaced)
    }

    /// Empty `slot`, returning the player it held. The player loses any role.
    pub fn remove_player(&mut self, slot: SlotRef) -> Result<Option<Player>, SquadError> {
        self.ensure_editable()?;
        let removed = self.slot_mut(slot)?.player.take();
        if let Some(ref player) = removed {
            debug!(player_id = player.id, %slot, "Removed player");
            self.clear_roles_of(player.id);
        }
        self.mark_edited();
        Ok(removed)
    }

    pub fn set_team_name(&mut self, name: impl Into<String>) -> Result<(), SquadError> {
        self.ensure_editable()?;
        self.team_name = name.into();
        self.mark_edited();
        Ok(())
    }

    pub fn set_captain(&mut self, player_id: i64) -> Result<RoleChange, SquadError> {
        self.set_role(Role::Captain, player_id)
    }

    pub fn set_vice_captain(&mut self, player_id: i64) -> Result<RoleChange, SquadError> {
        self.set_role(Role::ViceCaptain, player_id)
    }

    fn set_role(&mut self, role: Role, player_id: i64) -> Result<RoleChange, SquadError> {
        self.ensure_editable()?;
        if !self.contains(player_id) {
            return Err(SquadError::PlayerNotSelected(player_id));
        }

        let (target, other, other_role) = match role {
            Role::Captain => (
                &mut self.captain_id,
                &mut self.vice_captain_id,
                Role::ViceCaptain,
            ),
            Role::ViceCaptain => (
                &mut self.vice_captain_id,
                &mut self.captain_id,
                Role::Captain,
            ),
        };

        let change = if *other == Some(player_id) {
            *other = None;
            RoleChange::ConflictResolved {
                cleared: other_role,
            }
        } else {
            RoleChange::Assigned
        };
        *target = Some(player_id);

        debug!(player_id, %role, ?change, "Role assigned");
        self.mark_edited();
        Ok(change)
    }

    /// Everything that blocks submission, most important first. Empty when ready.
    pub fn validate_for_submit(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let filled = self.filled_count();
        if filled < SQUAD_SIZE {
            issues.push(ValidationIssue::IncompleteRoster { filled });
        }
        if self.total_cents() > BUDGET_CEILING_CENTS {
            issues.push(ValidationIssue::BudgetExceeded {
                total: self.total_price(),
            });
        }
        if self.team_name.trim().is_empty() {
            issues.push(ValidationIssue::MissingTeamName);
        }
        if self.captain_id.is_none() {
            issues.push(ValidationIssue::MissingCaptain);
        }
        if self.vice_captain_id.is_none() {
            issues.push(ValidationIssue::MissingViceCaptain);
        }

        issues
    }

    /// Request body for this draft. Starters follow PG, SG, SF, PF, C order.
    pub fn to_payload(&self, owner_user_id: i64) -> SquadPayload {
        SquadPayload {
            team_name: self.team_name.trim().to_string(),
            owner_user_id,
            starters: self.starting.iter().filter_map(TeamSlot::player_id).collect(),
            bench: self.bench.iter().filter_map(TeamSlot::player_id).collect(),
            captain_player_id: self.captain_id,
            vice_captain_player_id: self.vice_captain_id,
        }
    }

    /// Validate and lock the draft for submission.
    ///
    /// Pair with `finish_submission` once the backend answers. Callers that
    /// drive the request themselves (for example on a spawned task) use
    /// this split; everyone else calls `submit`.
    pub fn begin_submission(&mut self, owner_user_id: i64) -> Result<SquadPayload, SquadError> {
        match self.submission {
            Submission::InFlight => return Err(SquadError::SubmissionInProgress),
            Submission::Submitted => return Err(SquadError::AlreadySubmitted),
            Submission::Idle | Submission::Failed(_) => {}
        }

        let issues = self.validate_for_submit();
        if !issues.is_empty() {
            debug!(count = issues.len(), "Squad not ready for submission");
            return Err(SquadError::NotReady(issues));
        }

        self.submission = Submission::InFlight;
        Ok(self.to_payload(owner_user_id))
    }

    /// Record the backend's answer to a submission started with
    /// `begin_submission`.
    pub fn finish_submission(
        &mut self,
        result: Result<FantasyTeam, ApiError>,
    ) -> Result<FantasyTeam, SquadError> {
        match result {
            Ok(team) => {
                info!(team_name = %team.team_name, "Squad submitted");
                self.submission = Submission::Submitted;
                Ok(team)
            }
            Err(e) => {
                warn!(error = %e, "Squad submission failed");
                let message = e.user_message(GENERIC_SUBMIT_FAILURE);
                self.submission = Submission::Failed(message.clone());
                Err(SquadError::BackendRejected(message))
            }
        }
    }

    /// Unlock a draft whose submission was abandoned before the backend
    /// answered, such as when the submitting future was dropped.
    pub fn abandon_submission(&mut self) {
        if self.submission == Submission::InFlight {
            debug!("Submission abandoned");
            self.submission = Submission::Idle;
        }
    }

    /// Validate, then send the squad to the backend exactly once.
    pub async fn submit(
        &mut self,
        backend: &dyn FantasyBackend,
        owner_user_id: i64,
    ) -> Result<FantasyTeam, SquadError> {
        let payload = self.begin_submission(owner_user_id)?;
        let result = backend.build_squad(&payload).await;
        self.finish_submission(result)
    }
}
