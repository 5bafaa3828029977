//! Request command implementation.

use super::{display_names, resolve_user, Service};
use crate::cli::{RequestAction, RequestArgs};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;
use vigil_domain::traits::RelationshipStore;
use vigil_domain::{EdgeId, RelationshipEdge};

/// Execute the request command.
pub async fn execute_request(args: RequestArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    match args.action {
        RequestAction::Send { from, to } => {
            let from = resolve_user(service.store(), &from)?;
            let to = resolve_user(service.store(), &to)?;

            let edge = service.send_friend_request(from.id, to.id).await?;
            let message = format!("Friend request sent from {} to {}", from.display_name, to.display_name);
            print_edge(service, &edge, &message, formatter)
        }
        RequestAction::Accept { edge, by } => {
            let edge = EdgeId::parse(&edge)?;
            let by = resolve_user(service.store(), &by)?;

            let accepted = service.accept_friend_request(edge, by.id).await?;
            let message = format!("{} accepted the request", by.display_name);
            print_edge(service, &accepted, &message, formatter)
        }
        RequestAction::Reject { edge, by } => {
            let edge = EdgeId::parse(&edge)?;
            let by = resolve_user(service.store(), &by)?;

            let rejected = service.reject_friend_request(edge, by.id).await?;
            let message = format!("{} rejected the request", by.display_name);
            print_edge(service, &rejected, &message, formatter)
        }
        RequestAction::List { user } => {
            let user = resolve_user(service.store(), &user)?;
            let edges = service.store().list_edges_touching(user.id).await?;
            let names = display_names(service.store())?;
            println!("{}", formatter.format_edges(&edges, &names)?);
            Ok(())
        }
    }
}

/// Table mode prints a confirmation line above the edge; other modes print
/// the edge alone.
fn print_edge(service: &Service, edge: &RelationshipEdge, message: &str, formatter: &Formatter) -> Result<()> {
    let names = display_names(service.store())?;
    if formatter.format() == OutputFormat::Table {
        println!("{}", formatter.success(message));
    }
    println!("{}", formatter.format_edge(edge, &names)?);
    Ok(())
}
