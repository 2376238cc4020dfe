use crate::error::MonitorError;
use crate::monitoring::entropy;
use crossbeam_channel::{Sender, TrySendError};
use std::path::PathBuf;
use std::thread::JoinHandle;

/// Outcome of sampling one document, reported back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyVerdict {
    pub path: PathBuf,
    pub high_entropy: bool,
}

/// Fixed set of threads that sample documents for entropy.
///
/// The job queue is bounded. When it is full new samples are dropped, so a flood
/// of modifications slows detection rather than event ingestion.
pub struct EntropyPool {
    jobs: Option<Sender<PathBuf>>,
    workers: Vec<JoinHandle<()>>,
    dropped: u64,
}

impl EntropyPool {
    pub fn spawn(
        workers: usize,
        queue_capacity: usize,
        verdicts: Sender<EntropyVerdict>,
    ) -> Result<Self, MonitorError> {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<PathBuf>(queue_capacity.max(1));

        let mut handles = Vec::with_capacity(workers.max(1));
        for id in 0..workers.max(1) {
            let job_rx = job_rx.clone();
            let verdicts = verdicts.clone();
            let handle = std::thread::Builder::new()
                .name(format!("entropy-worker-{}", id))
                .spawn(move || {
                    log::debug!("Entropy worker {} started", id);
                    for path in job_rx.iter() {
                        let high_entropy = entropy::is_high_entropy(&path);
                        if verdicts.send(EntropyVerdict { path, high_entropy }).is_err() {
                            break;
                        }
                    }
                    log::debug!("Entropy worker {} stopped", id);
                });

            match handle {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // Release the threads that did start before reporting.
                    drop(job_tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(MonitorError::Spawn {
                        name: "entropy worker",
                        source,
                    });
                }
            }
        }

        Ok(Self {
            jobs: Some(job_tx),
            workers: handles,
            dropped: 0,
        })
    }

    /// Queues a document for sampling. Returns `false` if it was dropped.
    pub fn submit(&mut self, path: PathBuf) -> bool {
        let Some(jobs) = self.jobs.as_ref() else {
            return false;
        };

        match jobs.try_send(path) {
            Ok(()) => true,
            Err(TrySendError::Full(path)) => {
                self.dropped += 1;
                log::debug!(
                    "Entropy queue full, skipping sample of {} ({} skipped so far)",
                    path.display(),
                    self.dropped
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Closes the queue and waits for every worker to finish its current sample.
    pub fn shutdown(&mut self) {
        if self.jobs.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.join() {
                log::error!("Entropy worker panicked: {:?}", e);
            }
        }
        if self.dropped > 0 {
            log::info!("Entropy pool stopped, {} samples skipped under load", self.dropped);
        }
    }
}

impl Drop for EntropyPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn workers_report_verdicts() {
        let dir = TempDir::new().unwrap();
        let random = dir.path().join("random.pdf");
        let plain = dir.path().join("plain.txt");
        let mut data = vec![0u8; 4096];
        rand::thread_rng().fill_bytes(&mut data);
        std::fs::write(&random, &data).unwrap();
        std::fs::write(&plain, "hello hello hello hello").unwrap();

        let (verdict_tx, verdict_rx) = crossbeam_channel::unbounded();
        let mut pool = EntropyPool::spawn(2, 8, verdict_tx).unwrap();
        assert!(pool.submit(random.clone()));
        assert!(pool.submit(plain.clone()));

        let mut verdicts: Vec<EntropyVerdict> = (0..2)
            .map(|_| verdict_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        verdicts.sort_by(|a, b| a.path.cmp(&b.path));
        pool.shutdown();

        assert_eq!(
            verdicts,
            vec![
                EntropyVerdict { path: plain, high_entropy: false },
                EntropyVerdict { path: random, high_entropy: true },
            ]
        );
    }

    #[test]
    fn full_queue_drops_samples() {
        // Keep the only worker blocked on the verdict channel so the queue fills.
        let (verdict_tx, verdict_rx) = crossbeam_channel::bounded(0);
        let mut pool = EntropyPool::spawn(1, 1, verdict_tx).unwrap();

        let mut accepted = 0;
        for i in 0..10 {
            if pool.submit(PathBuf::from(format!("/nonexistent/{}.txt", i))) {
                accepted += 1;
            }
        }

        assert!(accepted <= 3, "accepted {}", accepted);
        assert_eq!(pool.dropped(), 10 - accepted);

        drop(verdict_rx);
        pool.shutdown();
    }

    #[test]
    fn submit_after_shutdown_is_rejected() {
        let (verdict_tx, _verdict_rx) = crossbeam_channel::unbounded();
        let mut pool = EntropyPool::spawn(1, 4, verdict_tx).unwrap();
        pool.shutdown();
        assert!(!pool.submit(PathBuf::from("/tmp/late.txt")));
    }
}
