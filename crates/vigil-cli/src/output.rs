//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use std::collections::HashMap;
use vigil_domain::{Bucket, ClassificationResult, EdgeStatus, RelationshipEdge, UserId, UserProfile};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format user profiles.
    pub fn format_profiles(&self, profiles: &[UserProfile]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(profiles)?),
            OutputFormat::Quiet => Ok(join_ids(profiles.iter().map(|p| p.id.to_string()))),
            OutputFormat::Table => {
                if profiles.is_empty() {
                    return Ok(self.colorize("No users found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Image"]);
                for profile in profiles {
                    builder.push_record([
                        profile.id.to_string(),
                        profile.display_name.clone(),
                        profile.image_url.clone().unwrap_or_default(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format relationship edges, naming the parties where `names` knows them.
    pub fn format_edges(&self, edges: &[RelationshipEdge], names: &HashMap<UserId, String>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(edges)?),
            OutputFormat::Quiet => Ok(join_ids(edges.iter().map(|e| e.id.to_string()))),
            OutputFormat::Table => {
                if edges.is_empty() {
                    return Ok(self.colorize("No requests found.", "yellow"));
                }

                let name_of = |id: &UserId| names.get(id).cloned().unwrap_or_else(|| id.to_string());

                let mut builder = Builder::default();
                builder.push_record(["ID", "From", "To", "Status", "Updated"]);
                for edge in edges {
                    builder.push_record([
                        edge.id.to_string(),
                        name_of(&edge.requester_id),
                        name_of(&edge.recipient_id),
                        self.status(edge.status),
                        edge.updated_at.to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a single edge.
    pub fn format_edge(&self, edge: &RelationshipEdge, names: &HashMap<UserId, String>) -> Result<String> {
        self.format_edges(std::slice::from_ref(edge), names)
    }

    /// Format a classification, one row per classified user.
    pub fn format_classification(&self, result: &ClassificationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Quiet => {
                let lines = Bucket::ALL.iter().flat_map(|bucket| {
                    result
                        .bucket(*bucket)
                        .iter()
                        .map(move |p| format!("{}\t{}", bucket_key(*bucket), p.id))
                });
                Ok(join_ids(lines))
            }
            OutputFormat::Table => {
                if result.is_empty() {
                    return Ok(self.colorize("No other users.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Relationship", "Name", "ID"]);
                for bucket in Bucket::ALL {
                    for profile in result.bucket(bucket) {
                        builder.push_record([
                            self.bucket(bucket),
                            profile.display_name.clone(),
                            profile.id.to_string(),
                        ]);
                    }
                }

                let counts = format!(
                    "{} friends, {} received, {} sent, {} strangers",
                    result.friends.len(),
                    result.pending_received.len(),
                    result.pending_sent.len(),
                    result.strangers.len()
                );
                Ok(format!("{}\n{}", self.render(builder), counts))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn status(&self, status: EdgeStatus) -> String {
        let color = match status {
            EdgeStatus::Pending => "yellow",
            EdgeStatus::Accepted => "green",
            EdgeStatus::Rejected => "red",
        };
        self.colorize(status.as_str(), color)
    }

    fn bucket(&self, bucket: Bucket) -> String {
        let color = match bucket {
            Bucket::Friends => "green",
            Bucket::PendingReceived => "cyan",
            Bucket::PendingSent => "magenta",
            Bucket::Strangers => "",
        };
        self.colorize(bucket.label(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Machine-friendly bucket name used in quiet output.
pub fn bucket_key(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Friends => "friend",
        Bucket::PendingReceived => "received",
        Bucket::PendingSent => "sent",
        Bucket::Strangers => "stranger",
    }
}

fn join_ids(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_domain::classify;

    fn sample() -> (Vec<UserProfile>, Vec<RelationshipEdge>, UserId) {
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let profiles = vec![
            UserProfile::new(a, "Anna"),
            UserProfile::new(b, "Boaz").with_image("https://img.example/b.png"),
            UserProfile::new(c, "Caleb"),
        ];
        let edges = vec![RelationshipEdge::pending(b, a, 1_700_000_000_000)];
        (profiles, edges, a)
    }

    #[test]
    fn test_profiles_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let (profiles, _, _) = sample();

        let output = formatter.format_profiles(&profiles).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(3));
        assert_eq!(parsed[1]["display_name"], "Boaz");
        assert_eq!(parsed[1]["image_url"], "https://img.example/b.png");
    }

    #[test]
    fn test_edges_table_uses_names() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let (profiles, edges, _) = sample();
        let names: HashMap<UserId, String> = profiles.iter().map(|p| (p.id, p.display_name.clone())).collect();

        let output = formatter.format_edges(&edges, &names).unwrap();
        assert!(output.contains("Boaz"));
        assert!(output.contains("Anna"));
        assert!(output.contains("pending"));
    }

    #[test]
    fn test_edges_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let (_, edges, _) = sample();

        let output = formatter.format_edge(&edges[0], &HashMap::new()).unwrap();
        assert_eq!(output, edges[0].id.to_string());
    }

    #[test]
    fn test_classification_formats() {
        let (profiles, edges, a) = sample();
        let result = classify(a, &profiles, &edges);

        let table = Formatter::new(OutputFormat::Table, false).format_classification(&result).unwrap();
        assert!(table.contains("pending received"));
        assert!(table.contains("0 friends, 1 received, 0 sent, 1 strangers"));

        let quiet = Formatter::new(OutputFormat::Quiet, false).format_classification(&result).unwrap();
        assert_eq!(quiet.lines().count(), 2);
        assert!(quiet.starts_with("received\t"));

        let json = Formatter::new(OutputFormat::Json, false).format_classification(&result).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["pending_received"][0]["display_name"], "Boaz");
        assert_eq!(parsed["strangers"][0]["display_name"], "Caleb");
    }

    #[test]
    fn test_empty_results() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_profiles(&[]).unwrap().contains("No users found"));
        assert!(formatter
            .format_classification(&ClassificationResult::empty(UserId::new()))
            .unwrap()
            .contains("No other users"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
