use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::server::pool::{Job, WorkerPool};

/// Binds the listening socket with the given accept backlog.
pub fn bind(addr: SocketAddr, backlog: u32) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}

/// Accepts connections and hands them to `pool` until `shutdown` fires.
///
/// The listener is dropped (closing the port) before this returns, and the
/// pool is closed so workers exit once their queued work is done.
pub async fn run(listener: TcpListener, pool: WorkerPool, mut shutdown: broadcast::Receiver<()>) {
    let local_addr = listener.local_addr().ok();
    info!(addr = ?local_addr, workers = pool.size(), "accept loop started");

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "accept failed");
                    // avoid spinning when out of descriptors
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            },
        };
        debug!(%peer, "accepted connection");

        let submitted = tokio::select! {
            _ = shutdown.recv() => break,
            submitted = pool.submit(Job { stream, peer }) => submitted,
        };
        if submitted.is_err() {
            error!(%peer, "worker pool closed, dropping connection");
            break;
        }
    }

    drop(listener);
    let _workers = pool.close();
    info!(addr = ?local_addr, "accept loop stopped");
}
