//! Worker pool writing generation shards off the indexing threads
//!
//! Jobs for the same trigram always go to the same worker, so shards and
//! count files of one trigram are written in submission order. The pool
//! remembers the first failure and reports it from [`ShardFlusher::wait_idle`].

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use super::{CountRecord, ShardRecord, count_path, shard_path, write_json_file};
use crate::document_key::DocumentKey;
use crate::error::{Result, SearchError};

/// A full generation shard ready to be written
#[derive(Debug, Clone)]
pub struct ShardJob {
    pub trigram: String,
    pub generation: u32,
    pub keys: BTreeSet<DocumentKey>,
    /// Keys in all shards of this trigram up to and including this one
    pub cumulative_count: u64,
}

impl ShardJob {
    /// Write the shard, then the updated count file
    pub fn write(self, base: &Path) -> Result<()> {
        let shard = shard_path(base, &self.trigram, self.generation);
        let count = count_path(base, &self.trigram);

        let record = ShardRecord {
            related_documents: self.keys,
            index_generation: self.generation,
            trigram: self.trigram,
        };
        write_json_file(&shard, &record)?;

        write_json_file(
            &count,
            &CountRecord {
                trigram: record.trigram,
                related_documents_count: self.cumulative_count,
            },
        )
    }
}

#[derive(Default)]
struct PoolState {
    in_flight: Mutex<usize>,
    idle: Condvar,
    first_error: Mutex<Option<SearchError>>,
}

impl PoolState {
    fn finish(&self, result: Result<()>) {
        if let Err(e) = result {
            log::warn!("Failed to write trigram shard: {}", e);
            let mut first = self.first_error.lock();
            if first.is_none() {
                *first = Some(e);
            }
        }

        let mut in_flight = self.in_flight.lock();
        *in_flight -= 1;
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }
}

pub struct ShardFlusher {
    base: PathBuf,
    senders: Vec<Sender<ShardJob>>,
    workers: Vec<thread::JoinHandle<()>>,
    state: Arc<PoolState>,
}

impl ShardFlusher {
    /// Start `worker_count` writer threads for the namespace at `base`
    pub fn new(base: impl Into<PathBuf>, worker_count: usize) -> Result<Self> {
        let base = base.into();
        let state = Arc::new(PoolState::default());

        let mut senders = Vec::new();
        let mut workers = Vec::new();
        for worker_id in 0..worker_count.max(1) {
            let (sender, receiver) = unbounded();
            let handle = Self::spawn_worker(worker_id, base.clone(), receiver, Arc::clone(&state))
                .map_err(|e| SearchError::io(&base, e))?;
            senders.push(sender);
            workers.push(handle);
        }

        Ok(Self {
            base,
            senders,
            workers,
            state,
        })
    }

    fn spawn_worker(
        worker_id: usize,
        base: PathBuf,
        receiver: Receiver<ShardJob>,
        state: Arc<PoolState>,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("shard-flusher-{}", worker_id))
            .spawn(move || {
                // Ends once every sender is dropped
                for job in receiver.iter() {
                    log::trace!("Writing shard {} of '{}'", job.generation, job.trigram);
                    state.finish(job.write(&base));
                }
            })
    }

    /// Queue a shard for writing
    pub fn submit(&self, job: ShardJob) {
        *self.state.in_flight.lock() += 1;

        let worker = Self::worker_for(&job.trigram, self.senders.len());
        if let Err(rejected) = self.senders[worker].send(job) {
            // Worker is gone; write on the calling thread instead
            self.state.finish(rejected.into_inner().write(&self.base));
        }
    }

    /// Block until every queued shard is written; return the first failure
    pub fn wait_idle(&self) -> Result<()> {
        let mut in_flight = self.state.in_flight.lock();
        while *in_flight > 0 {
            self.state.idle.wait(&mut in_flight);
        }
        drop(in_flight);

        match self.state.first_error.lock().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn worker_for(trigram: &str, workers: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        trigram.hash(&mut hasher);
        (hasher.finish() % workers as u64) as usize
    }
}

impl Drop for ShardFlusher {
    fn drop(&mut self) {
        self.senders.clear();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
