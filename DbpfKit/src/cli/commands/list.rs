//! CLI command for listing package resources

use std::path::Path;

use crate::package::{DbpfReader, IndexEntry, ResourceFilter, ResourceMatch};

/// Format byte size for human-readable output
fn format_size(bytes: u32) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}

pub fn execute(
    source: &Path,
    filter: &ResourceFilter,
    detailed: bool,
    json: bool,
    count: bool,
) -> anyhow::Result<()> {
    let reader = DbpfReader::open(source)?;
    let entries: Vec<&IndexEntry> = reader
        .scan(Some(filter as &dyn ResourceMatch))
        .collect();

    if count {
        println!("{}", entries.len());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if !detailed {
        for entry in &entries {
            println!("{}", entry.id);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>10}  {:<18}  ID",
        "OFFSET", "STORED", "SIZE", "COMPRESSION"
    );

    for entry in &entries {
        let size = if entry.is_compressed() {
            format_size(entry.size_decompressed)
        } else {
            format_size(entry.size)
        };
        println!(
            "{:>#10x}  {:>10}  {:>10}  {:<18}  {}",
            entry.offset,
            format_size(entry.size),
            size,
            entry.codec().as_str(),
            entry.id
        );
    }

    let deleted = entries.iter().filter(|e| e.is_deleted()).count();
    println!();
    println!("{} resources ({} deleted)", entries.len(), deleted);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(2048), "2.0K");
        assert_eq!(format_size(3 * 1_048_576), "3.0M");
    }
}
