use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::package::{ResourceFilter, ResourceId};
use crate::utils::parse_hex;

pub mod execute;
pub mod extract;
pub mod get;
pub mod info;
pub mod list;

/// Resource id components to filter on; unset components match anything
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Group id (hex, e.g. 0x80000000)
    #[arg(long, value_parser = parse_hex::<u32>)]
    pub group: Option<u32>,

    /// Instance id (hex)
    #[arg(long, value_parser = parse_hex::<u64>)]
    pub instance: Option<u64>,

    /// Type id (hex, e.g. 0x545AC67A)
    #[arg(long = "type", value_parser = parse_hex::<u32>)]
    pub type_id: Option<u32>,
}

impl FilterArgs {
    #[must_use]
    pub fn to_filter(&self) -> ResourceFilter {
        ResourceFilter::new(self.group, self.instance, self.type_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group.is_none() && self.instance.is_none() && self.type_id.is_none()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show package header information
    Info {
        /// Package file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// List package resources
    List {
        /// Package file
        #[arg(short, long)]
        source: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Show detailed info (offset, sizes, compression)
        #[arg(short, long)]
        detailed: bool,

        /// Print entries as JSON
        #[arg(long, conflicts_with_all = ["detailed", "count"])]
        json: bool,

        /// Only show count of matching resources
        #[arg(short, long)]
        count: bool,
    },

    /// Extract a single resource
    Get {
        /// Package file
        #[arg(short, long)]
        source: PathBuf,

        /// Full resource id as group!instance.type (hex)
        #[arg(long)]
        id: Option<ResourceId>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Fail if the decompressed size differs from the index
        #[arg(long)]
        strict: bool,
    },

    /// Extract resources to a directory
    Extract {
        /// Package file
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Fail a resource if its decompressed size differs from the index
        #[arg(long)]
        strict: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}
