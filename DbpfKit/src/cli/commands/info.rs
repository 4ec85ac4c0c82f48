//! CLI command for package header information

use std::collections::BTreeMap;
use std::path::Path;

use crate::package::DbpfReader;

pub fn execute(source: &Path) -> anyhow::Result<()> {
    let reader = DbpfReader::open(source)?;
    let header = reader.header();

    println!("File:           {}", source.display());
    println!("Version:        {}.{}", header.major, header.minor);
    println!("Resources:      {}", header.index_count);
    println!(
        "Index:          {:#x} ({} bytes, format {})",
        header.index_offset, header.index_size, header.index_version
    );

    let mut by_codec: BTreeMap<&'static str, usize> = BTreeMap::new();
    for entry in reader.entries() {
        *by_codec.entry(entry.codec().as_str()).or_default() += 1;
    }

    println!();
    println!("{:>8}  COMPRESSION", "COUNT");
    for (codec, count) in &by_codec {
        println!("{count:>8}  {codec}");
    }

    let stored: u64 = reader.entries().iter().map(|e| u64::from(e.size)).sum();
    let unpacked: u64 = reader
        .entries()
        .iter()
        .filter(|e| !e.is_deleted())
        .map(|e| {
            if e.is_compressed() {
                u64::from(e.size_decompressed)
            } else {
                u64::from(e.size)
            }
        })
        .sum();

    println!();
    println!("{stored} bytes stored, {unpacked} bytes unpacked");

    Ok(())
}
