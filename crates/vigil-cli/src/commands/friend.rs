//! Friend command implementation.

use super::{resolve_user, Service};
use crate::cli::{FriendAction, FriendArgs};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the friend command.
pub async fn execute_friend(args: FriendArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    match args.action {
        FriendAction::Remove { a, b } => {
            let a = resolve_user(service.store(), &a)?;
            let b = resolve_user(service.store(), &b)?;

            service.remove_friend(a.id, b.id).await?;

            match formatter.format() {
                OutputFormat::Table => println!(
                    "{}",
                    formatter.success(&format!(
                        "{} and {} are no longer friends",
                        a.display_name, b.display_name
                    ))
                ),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "removed": true,
                        "user": a.id,
                        "friend": b.id,
                    }))?
                ),
                OutputFormat::Quiet => {}
            }
            Ok(())
        }
    }
}
