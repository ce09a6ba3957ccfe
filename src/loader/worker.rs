// Fetching and decoding happen off the UI thread. The controller queues jobs,
// the main loop submits them here and feeds results back one at a time, so a
// channel only appears once its sample is actually playable.

use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::catalog::{self, Catalog, ListingSource, SoundDescriptor};
use crate::error::{CatalogError, LoadError};

use super::sample_loader::{self, LoadedSound};

#[derive(Clone, Debug)]
pub enum Job {
    ListCatalog,
    LoadSound(SoundDescriptor),
}

#[derive(Debug)]
pub enum JobResult {
    Catalog(Result<Catalog, CatalogError>),
    Sound(Result<LoadedSound, LoadError>),
}

pub struct Worker {
    jobs_tx: Option<Sender<Job>>,
    results_rx: Receiver<JobResult>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(source: Box<dyn ListingSource>, sample_rate: u32) -> Self {
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<Job>();
        let (results_tx, results_rx) = crossbeam_channel::unbounded::<JobResult>();
        let thread = std::thread::spawn(move || run(source, sample_rate, jobs_rx, results_tx));
        Self {
            jobs_tx: Some(jobs_tx),
            results_rx,
            thread: Some(thread),
        }
    }

    pub fn submit(&self, job: Job) {
        let sent = self.jobs_tx.as_ref().is_some_and(|tx| tx.send(job).is_ok());
        if !sent {
            log::error!(target: "loader", "loader thread is gone, job dropped");
        }
    }

    pub fn poll(&self) -> Vec<JobResult> {
        self.results_rx.try_iter().collect()
    }

    #[cfg(test)]
    fn wait(&self) -> Option<JobResult> {
        self.results_rx.recv_timeout(std::time::Duration::from_secs(5)).ok()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.jobs_tx.take(); // closes the queue, run() falls out of its loop
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run(source: Box<dyn ListingSource>, sample_rate: u32, jobs: Receiver<Job>, results: Sender<JobResult>) {
    for job in jobs {
        let result = match job {
            Job::ListCatalog => JobResult::Catalog(catalog::list_sounds(source.as_ref())),
            Job::LoadSound(sound) => JobResult::Sound(sample_loader::load(source.as_ref(), &sound, sample_rate)),
        };
        if results.send(result).is_err() {
            break;
        }
    }
}
