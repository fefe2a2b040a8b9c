/// Fixed-size pool of worker threads fed by a job queue.
///
/// Background work (scene BVH rebuilds) is handed to the pool as boxed
/// closures through an unbounded `crossbeam-channel` queue. A job that
/// panics is logged and does not take its worker down.
///
/// # Example
///
/// ```ignore
/// let pool = WorkerPool::new(2)?;
/// pool.submit(|| println!("on a worker"))?;
/// pool.shutdown(); // drains the queue, then joins
/// ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use crate::config::SpatialConfig;
use crate::error::Result;
use crate::{engine_bail, engine_debug, engine_err, engine_error};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    /// `None` once the pool is shut down
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    thread_count: usize,
}

impl WorkerPool {
    /// Start `thread_count` workers.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for zero threads, `WorkerUnavailable` if the OS
    /// refuses to spawn a thread.
    pub fn new(thread_count: usize) -> Result<Self> {
        if thread_count == 0 {
            engine_bail!("galaxy3d::WorkerPool", InvalidConfig,
                "Worker pool needs at least one thread");
        }

        let (sender, receiver) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(thread_count);

        for index in 0..thread_count {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("galaxy3d-worker-{}", index))
                .spawn(move || worker_loop(receiver))
                .map_err(|e| engine_err!("galaxy3d::WorkerPool", WorkerUnavailable,
                    "Failed to spawn worker {}: {}", index, e))?;
            workers.push(handle);
        }

        engine_debug!("galaxy3d::WorkerPool", "Started {} worker thread(s)", thread_count);

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            thread_count,
        })
    }

    /// Start a pool sized by `config.worker_threads`.
    pub fn from_config(config: &SpatialConfig) -> Result<Self> {
        Self::new(config.worker_threads)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Queue a job.
    ///
    /// # Errors
    ///
    /// `WorkerUnavailable` after `shutdown`.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            engine_bail!("galaxy3d::WorkerPool", WorkerUnavailable, "Worker pool is shut down");
        };
        sender
            .send(Box::new(job))
            .map_err(|_| engine_err!("galaxy3d::WorkerPool", WorkerUnavailable,
                "Worker queue disconnected"))
    }

    /// Close the queue and join every worker. Jobs already queued still run.
    pub fn shutdown(&self) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        drop(sender);

        let current = thread::current().id();
        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            // A job dropping the last handle to its own pool cannot join itself
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                engine_error!("galaxy3d::WorkerPool", "Worker thread terminated abnormally");
            }
        }

        engine_debug!("galaxy3d::WorkerPool", "Worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Receiver<Job>) {
    for job in receiver.iter() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            engine_error!("galaxy3d::WorkerPool", "Worker job panicked: {}", panic_message(&payload));
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
