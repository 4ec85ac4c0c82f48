//! Command execution implementations

use super::Commands;
use super::{extract, get, info, list};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Info { source } => info::execute(source),
            Commands::List {
                source,
                filter,
                detailed,
                json,
                count,
            } => list::execute(source, &filter.to_filter(), *detailed, *json, *count),
            Commands::Get {
                source,
                id,
                filter,
                output,
                strict,
            } => get::execute(source, id.as_ref(), filter, output, *strict),
            Commands::Extract {
                source,
                destination,
                filter,
                strict,
                quiet,
            } => extract::execute(source, destination, &filter.to_filter(), *strict, *quiet),
        }
    }
}
