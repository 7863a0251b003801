//! Build-time fingerprint of the on-disk index format
//!
//! Hashes every source file that decides how index data is laid out on
//! disk. The fingerprint is compiled in as `INDEX_FORMAT_HASH`, written to
//! `<index>/format.hash` when an index is built and compared when an index
//! is opened. A mismatch means the index was built by an incompatible
//! version and should be rebuilt with `triscan index`.
//!
//! ## Format-critical files:
//! - src/cache/store.rs: sharded record layout and encoding
//! - src/postings.rs: shard and count record format
//! - src/postings/writer.rs: generation numbering and flushing
//! - src/trigram_path.rs: trigram to path encoding
//! - src/trigram.rs: word splitting and trigram extraction
//! - src/models.rs: persisted records

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const FORMAT_CRITICAL_FILES: &[&str] = &[
    "src/cache/store.rs",
    "src/postings.rs",
    "src/postings/writer.rs",
    "src/trigram_path.rs",
    "src/trigram.rs",
    "src/models.rs",
];

fn main() {
    let format_hash = compute_format_hash();

    println!("cargo:rustc-env=INDEX_FORMAT_HASH={}", format_hash);

    for file in FORMAT_CRITICAL_FILES {
        println!("cargo:rerun-if-changed={}", file);
    }
}

fn compute_format_hash() -> String {
    let mut hasher = blake3::Hasher::new();

    // Sorted for a stable hash
    let files: BTreeSet<&str> = FORMAT_CRITICAL_FILES.iter().copied().collect();

    for file_path in &files {
        let path = Path::new(file_path);
        if !path.exists() {
            panic!("Format-critical file not found: {}", file_path);
        }

        let content = fs::read(path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", file_path, e));

        hasher.update(file_path.as_bytes());
        hasher.update(&content);
    }

    // 64 bits are plenty to tell builds apart
    hasher.finalize().as_bytes()[..8]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}
