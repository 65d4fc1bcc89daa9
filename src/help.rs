//! Grouped help output for the root command.
//!
//! Commands are listed by group: named groups alphabetically, the default
//! group always last.

use std::collections::BTreeMap;

use crate::commands::DEFAULT_GROUP;

/// One line of the command listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub aliases: &'a [String],
    pub group: &'a str,
}

/// Render the command listing, one section per group.
pub fn render_commands(entries: &[HelpEntry<'_>]) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0) + 2;

    let mut groups: BTreeMap<&str, Vec<&HelpEntry<'_>>> = BTreeMap::new();
    let mut default_group: Vec<&HelpEntry<'_>> = Vec::new();
    for entry in entries {
        if entry.group == DEFAULT_GROUP {
            default_group.push(entry);
        } else {
            groups.entry(entry.group).or_default().push(entry);
        }
    }

    let mut sections: Vec<(String, Vec<&HelpEntry<'_>>)> = groups
        .into_iter()
        .map(|(group, members)| (format!("{}:", group), members))
        .collect();
    if !default_group.is_empty() {
        let heading = if sections.is_empty() {
            "Commands:"
        } else {
            "Other commands:"
        };
        sections.push((heading.to_string(), default_group));
    }

    let mut out = String::new();
    for (index, (heading, mut members)) in sections.into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&heading);
        out.push('\n');

        members.sort_by(|a, b| a.name.cmp(b.name));
        for entry in members {
            out.push_str(&format!("  {:<width$}{}", entry.name, entry.description));
            if !entry.aliases.is_empty() {
                out.push_str(&format!(" ({})", entry.aliases.join(", ")));
            }
            out.push('\n');
        }
    }
    out
}

/// Render the full root help text.
pub fn render_help(name: &str, version: &str, about: &str, entries: &[HelpEntry<'_>]) -> String {
    let mut out = format!("{} {}\n", name, version);
    if !about.is_empty() {
        out.push_str(about);
        out.push('\n');
    }
    out.push_str(&format!("\nUsage: {} <COMMAND> [OPTIONS] [ARGS]...\n\n", name));

    if entries.is_empty() {
        out.push_str("No commands registered.\n");
    } else {
        out.push_str(&render_commands(entries));
    }

    out.push_str("\nOptions:\n");
    out.push_str("  -h, --help     Print help\n");
    out.push_str("  -V, --version  Print version\n");
    out.push_str(&format!(
        "\nRun '{} <COMMAND> --help' for command options.\n",
        name
    ));
    out
}
