use tracing::warn;

use crate::api::FantasyBackend;
use crate::auth::SessionManager;
use crate::models::{FantasyTeam, UserPatch};

use super::draft::SquadDraft;
use super::error::SquadError;

/// Submit `draft` on behalf of the signed-in user.
///
/// On success the cached user is marked as owning a fantasy team. Failing
/// to persist that flag is logged and does not fail the submission; the
/// team already exists on the backend.
pub async fn submit_for_session(
    draft: &mut SquadDraft,
    backend: &dyn FantasyBackend,
    session: &mut SessionManager,
) -> Result<FantasyTeam, SquadError> {
    let owner_user_id = session.user_id().ok_or(SquadError::NotSignedIn)?;
    let team = draft.submit(backend, owner_user_id).await?;

    if let Err(e) = session
        .update_user(&UserPatch::has_fantasy_team(true))
        .await
    {
        warn!(error = %e, "Squad saved but session was not updated");
    }

    Ok(team)
}
