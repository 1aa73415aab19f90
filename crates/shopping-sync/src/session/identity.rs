//! Acting Member
//!
//! There is no sign-in yet. Until there is, the member credited with new
//! items is the first `users` row of the family. Callers pass the result to
//! the synchronizer explicitly so a real authenticated identity can replace
//! this lookup without touching the sync logic.

use crate::domain::Member;
use crate::error::SyncResult;
use crate::gateway::{select_as, RemoteStore, Select};

// TODO: replace with the signed-in member once authentication lands
pub async fn first_family_member(
    store: &dyn RemoteStore,
    family_id: &str,
) -> SyncResult<Option<Member>> {
    let query = Select::from(Member::TABLE).eq("family_id", family_id).limit(1);
    Ok(select_as::<Member>(store, &query).await?.into_iter().next())
}
