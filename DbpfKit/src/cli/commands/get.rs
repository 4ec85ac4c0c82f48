//! CLI command for extracting one resource

use std::path::Path;

use anyhow::bail;

use super::FilterArgs;
use crate::package::{DbpfReader, ReaderOptions, ResourceId, ResourceMatch};

pub fn execute(
    source: &Path,
    id: Option<&ResourceId>,
    filter: &FilterArgs,
    output: &Path,
    strict: bool,
) -> anyhow::Result<()> {
    let options = if strict {
        ReaderOptions::strict()
    } else {
        ReaderOptions::default()
    };
    let reader = DbpfReader::open_with_options(source, options)?;

    let filter_value = filter.to_filter();
    let selector: &dyn ResourceMatch = match id {
        Some(id) if filter.is_empty() => id,
        Some(_) => bail!("--id cannot be combined with --group/--instance/--type"),
        None if filter.is_empty() => bail!("give --id or at least one of --group/--instance/--type"),
        None => &filter_value,
    };

    let entry = reader.lookup_one(selector)?;
    let data = reader.extract(entry)?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &data)?;

    tracing::info!("Wrote {} ({} bytes) to {}", entry.id, data.len(), output.display());
    println!("{} -> {} ({} bytes)", entry.id, output.display(), data.len());

    Ok(())
}
