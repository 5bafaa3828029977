//! User command implementation.

use super::Service;
use crate::cli::{UserAction, UserArgs};
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use vigil_domain::{UserId, UserProfile};

/// Execute the user command.
pub async fn execute_user(args: UserArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    match args.action {
        UserAction::Add { name, image } => add_user(service, &name, image, formatter),
        UserAction::List => list_users(service, formatter),
    }
}

/// Create a profile with a fresh id.
fn add_user(service: &Service, name: &str, image: Option<String>, formatter: &Formatter) -> Result<()> {
    let profile = new_profile(name, image)?;
    service.store().upsert_profile(&profile)?;
    tracing::info!(user = %profile.id, name = %profile.display_name, "User added");

    match formatter.format() {
        OutputFormat::Table => println!(
            "{}",
            formatter.success(&format!("User added: {} ({})", profile.display_name, profile.id))
        ),
        _ => println!("{}", formatter.format_profiles(std::slice::from_ref(&profile))?),
    }
    Ok(())
}

/// List every profile.
fn list_users(service: &Service, formatter: &Formatter) -> Result<()> {
    let profiles = service.store().all_profiles()?;
    println!("{}", formatter.format_profiles(&profiles)?);
    Ok(())
}

fn new_profile(name: &str, image: Option<String>) -> Result<UserProfile> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidInput("Display name cannot be empty".to_string()));
    }

    let profile = UserProfile::new(UserId::new(), name);
    Ok(match image {
        Some(url) if !url.trim().is_empty() => profile.with_image(url.trim()),
        _ => profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_trims_input() {
        let profile = new_profile("  Lydia ", Some(" https://img.example/l.png ".into())).unwrap();
        assert_eq!(profile.display_name, "Lydia");
        assert_eq!(profile.image_url.as_deref(), Some("https://img.example/l.png"));

        let bare = new_profile("Lydia", Some("   ".into())).unwrap();
        assert!(bare.image_url.is_none());
    }

    #[test]
    fn test_new_profile_requires_name() {
        assert!(matches!(new_profile("   ", None), Err(CliError::InvalidInput(_))));
    }
}
