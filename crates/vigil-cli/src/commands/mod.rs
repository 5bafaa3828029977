//! Command implementations.

pub mod classify;
pub mod config;
pub mod friend;
pub mod request;
pub mod user;

pub use self::classify::execute_classify;
pub use self::config::execute_config;
pub use self::friend::execute_friend;
pub use self::request::execute_request;
pub use self::user::execute_user;

use crate::error::{CliError, Result};
use std::collections::HashMap;
use vigil_domain::{UserId, UserProfile};
use vigil_friendship::FriendshipService;
use vigil_store::SqliteStore;

/// Friendship service over the CLI's database.
pub type Service = FriendshipService<SqliteStore>;

/// Find the profile `input` refers to, by id or by display name.
pub fn resolve_user(store: &SqliteStore, input: &str) -> Result<UserProfile> {
    if let Ok(id) = UserId::parse(input) {
        return store
            .get_profile(id)?
            .ok_or_else(|| CliError::UnknownUser(input.to_string()));
    }

    let mut matches = store.find_profiles_by_name(input)?;
    match matches.len() {
        0 => Err(CliError::UnknownUser(input.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(CliError::AmbiguousUser {
            name: input.trim().to_string(),
            count,
        }),
    }
}

/// Display names of every known user, for labelling edges.
pub(crate) fn display_names(store: &SqliteStore) -> Result<HashMap<UserId, String>> {
    Ok(store
        .all_profiles()?
        .into_iter()
        .map(|p| (p.id, p.display_name))
        .collect())
}
