//! Write path of the inverted trigram index
//!
//! Each trigram owns an accumulator of pending keys. Once the pending set
//! reaches the flush threshold it is handed to the [`ShardFlusher`] as the
//! next generation shard and the accumulator starts over. `save()` pushes
//! out every non-empty remainder and waits for all shards to hit disk.

use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::flusher::{ShardFlusher, ShardJob};
use crate::document_key::DocumentKey;
use crate::error::Result;

#[derive(Debug, Default)]
struct TrigramAccumulator {
    pending: BTreeSet<DocumentKey>,
    generation: u32,
    total: u64,
}

impl TrigramAccumulator {
    /// Take the pending keys as the next shard, if there are any
    fn take_shard(&mut self, trigram: &str) -> Option<ShardJob> {
        if self.pending.is_empty() {
            return None;
        }

        let keys = std::mem::take(&mut self.pending);
        self.total += keys.len() as u64;
        let job = ShardJob {
            trigram: trigram.to_string(),
            generation: self.generation,
            keys,
            cumulative_count: self.total,
        };
        self.generation += 1;
        Some(job)
    }
}

pub struct TrigramIndexWriter {
    base: PathBuf,
    flush_threshold: usize,
    accumulators: RwLock<HashMap<String, Arc<Mutex<TrigramAccumulator>>>>,
    flusher: ShardFlusher,
}

impl TrigramIndexWriter {
    /// Writer for the namespace directory `base`
    pub fn new(base: impl Into<PathBuf>, flush_threshold: usize, flush_workers: usize) -> Result<Self> {
        let base = base.into();
        let flusher = ShardFlusher::new(&base, flush_workers)?;

        Ok(Self {
            base,
            flush_threshold: flush_threshold.max(1),
            accumulators: RwLock::new(HashMap::new()),
            flusher,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Record `key` in the postings of every trigram in `trigrams`
    pub fn add_trigrams_for_document<'a, I>(&self, key: &DocumentKey, trigrams: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for trigram in trigrams {
            self.add(trigram, key);
        }
    }

    /// Record `key` in the postings of `trigram`
    pub fn add(&self, trigram: &str, key: &DocumentKey) {
        let accumulator = self.accumulator(trigram);
        let mut accumulator = accumulator.lock();

        accumulator.pending.insert(key.clone());
        if accumulator.pending.len() < self.flush_threshold {
            return;
        }

        if let Some(job) = accumulator.take_shard(trigram) {
            log::debug!(
                "Flushing generation {} of '{}' ({} keys)",
                job.generation,
                trigram,
                job.keys.len()
            );
            self.flusher.submit(job);
        }
    }

    fn accumulator(&self, trigram: &str) -> Arc<Mutex<TrigramAccumulator>> {
        if let Some(existing) = self.accumulators.read().get(trigram) {
            return Arc::clone(existing);
        }

        let mut accumulators = self.accumulators.write();
        Arc::clone(accumulators.entry(trigram.to_string()).or_default())
    }

    /// Flush all pending keys and wait until every shard is written
    ///
    /// Calling `save()` again without new `add()` calls writes nothing.
    pub fn save(&self) -> Result<()> {
        let accumulators: Vec<(String, Arc<Mutex<TrigramAccumulator>>)> = self
            .accumulators
            .read()
            .iter()
            .map(|(trigram, acc)| (trigram.clone(), Arc::clone(acc)))
            .collect();

        let mut flushed = 0usize;
        for (trigram, accumulator) in accumulators {
            if let Some(job) = accumulator.lock().take_shard(&trigram) {
                self.flusher.submit(job);
                flushed += 1;
            }
        }

        log::debug!("Saving {:?}: flushed {} remainders", self.base, flushed);
        self.flusher.wait_idle()
    }

    /// Number of distinct trigrams seen by this writer
    pub fn trigram_count(&self) -> usize {
        self.accumulators.read().len()
    }
}
