//! Fantasy squad drafting.
//!
//! A `SquadDraft` holds the unsaved selection (starting five, bench of
//! three, captain, vice-captain, team name), enforces that no player is
//! picked twice, reports what still blocks submission, and submits the
//! finished squad to the backend at most once at a time.

pub mod draft;
pub mod error;
pub mod submit;

pub use draft::{
    DraftState, Role, RoleChange, SlotRef, SquadDraft, TeamSlot, BENCH_POSITIONS, BENCH_SIZE,
    BUDGET_CEILING, SQUAD_SIZE,
};
pub use error::{SquadError, ValidationIssue};
pub use submit::submit_for_session;
