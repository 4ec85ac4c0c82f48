//! CLI command for bulk resource extraction

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::cli::progress::{LOOKING_GLASS, PACKAGE, print_done, print_step, simple_bar};
use crate::package::{DbpfReader, IndexEntry, ReaderOptions, ResourceFilter, ResourceMatch};

pub fn execute(
    source: &Path,
    destination: &Path,
    filter: &ResourceFilter,
    strict: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let options = if strict {
        ReaderOptions::strict()
    } else {
        ReaderOptions::default()
    };

    print_step(1, 2, LOOKING_GLASS, "Reading package index...");
    let reader = DbpfReader::open_with_options(source, options)?;

    let entries: Vec<&IndexEntry> = reader
        .scan(Some(filter as &dyn ResourceMatch))
        .filter(|entry| !entry.is_deleted())
        .collect();

    std::fs::create_dir_all(destination)?;

    print_step(
        2,
        2,
        PACKAGE,
        &format!("Extracting {} resources...", entries.len()),
    );

    let pb = (!quiet).then(|| simple_bar(entries.len() as u64, "Extracting"));
    let extracted = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let errors: Vec<String> = entries
        .par_iter()
        .filter_map(|entry| {
            let result = reader.extract(entry).map_err(anyhow::Error::from).and_then(|data| {
                std::fs::write(destination.join(format!("{}.bin", entry.id)), data)?;
                Ok(())
            });

            if let Some(pb) = &pb {
                pb.inc(1);
            }

            match result {
                Ok(()) => {
                    extracted.fetch_add(1, Ordering::SeqCst);
                    None
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!("Failed to extract {}: {}", entry.id, e);
                    Some(format!("{}: {e}", entry.id))
                }
            }
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let extracted = extracted.load(Ordering::SeqCst);
    let failed = failed.load(Ordering::SeqCst);

    println!(
        "Extracted {extracted} resources to {}",
        destination.display()
    );

    if failed > 0 {
        println!("{failed} resources failed:");
        for error in errors.iter().take(10) {
            println!("  {error}");
        }
        if errors.len() > 10 {
            println!("  ... and {} more", errors.len() - 10);
        }
    }

    print_done(started.elapsed());

    if failed > 0 && extracted == 0 {
        anyhow::bail!("no resources could be extracted");
    }

    Ok(())
}
