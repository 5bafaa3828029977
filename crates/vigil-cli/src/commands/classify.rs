//! Classify command implementation.

use super::{resolve_user, Service};
use crate::cli::ClassifyArgs;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the classify command.
pub async fn execute_classify(args: ClassifyArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let user = resolve_user(service.store(), &args.user)?;
    let classification = service.get_classification(user.id).await?;

    if formatter.format() == OutputFormat::Table {
        println!("{}", formatter.info(&format!("Relationships of {}", user.display_name)));
    }
    println!("{}", formatter.format_classification(&classification)?);

    if service.view(user.id).current().stale {
        eprintln!("{}", formatter.warning("Showing a stale classification; the store could not be read"));
    }

    if args.metrics {
        eprintln!("\n{}", service.metrics().summary());
    }
    Ok(())
}
