//! Fixed-size pool of connection workers fed by a bounded channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::http::connection::Connection;
use crate::routing::Router;

/// An accepted connection waiting for a worker.
pub struct Job {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

pub struct WorkerPool {
    tx: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers. The queue holds at most `size` pending jobs;
    /// beyond that [`WorkerPool::submit`] waits.
    pub fn new(size: usize, router: Arc<Router>, read_timeout: Duration) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::channel::<Job>(size);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..size)
            .map(|id| {
                let rx = rx.clone();
                let router = router.clone();
                tokio::spawn(async move {
                    loop {
                        let job = rx.lock().await.recv().await;
                        let Some(job) = job else { break };
                        Connection::new(job.stream, job.peer, router.clone(), read_timeout)
                            .run()
                            .await;
                    }
                    tracing::trace!(worker = id, "worker exiting");
                })
            })
            .collect();

        Self { tx, workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a connection, waiting while the pool is saturated.
    pub async fn submit(&self, job: Job) -> Result<(), mpsc::error::SendError<Job>> {
        self.tx.send(job).await
    }

    /// Stops taking new work. Workers finish what is queued or in flight and
    /// then exit; the returned handles resolve when they do.
    pub fn close(self) -> Vec<JoinHandle<()>> {
        drop(self.tx);
        self.workers
    }
}
