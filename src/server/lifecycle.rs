//! Server lifecycle state machine.
//!
//! ```text
//! STOPPED ──start()──▶ STARTING ──bound──▶ RUNNING ──stop()──▶ STOPPING ──▶ STOPPED
//!    ▲                     │
//!    └──── bind failed ────┘
//! ```
//!
//! Every transition happens while holding one async mutex, so concurrent
//! `start()`/`stop()` calls never double-bind or double-close. `stop()` keeps
//! the lock until the accept loop has released the listening socket, which
//! makes a racing `start()` wait for the teardown to finish.

use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::routing::{Router, StaticFiles};
use crate::server::listener;
use crate::server::pool::WorkerPool;
use crate::server::shutdown::Shutdown;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Called once the server is bound, with the server name and local address.
/// A panic in the callback is logged and does not affect the running server.
pub type OnStart = Arc<dyn Fn(&str, SocketAddr) + Send + Sync + 'static>;

struct Running {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    accept_task: JoinHandle<()>,
    sweeper_task: JoinHandle<()>,
}

pub struct WebServer {
    config: Arc<Config>,
    router: Arc<Router>,
    on_start: Option<OnStart>,
    running: Mutex<Option<Running>>,
    state: watch::Sender<ServerState>,
}

impl WebServer {
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let sessions = SessionStore::new(config.session_ttl());
        let static_files = config
            .static_root
            .as_ref()
            .map(|root| StaticFiles::new(root.clone(), config.static_prefix.clone()));
        let router = Router::new(sessions, static_files);

        info!(
            name = %config.name,
            port = config.port,
            static_root = ?config.static_root,
            session_ttl_secs = config.session_ttl_secs,
            "web server configured"
        );

        Ok(Self {
            config: Arc::new(config),
            router: Arc::new(router),
            on_start: None,
            running: Mutex::new(None),
            state: watch::Sender::new(ServerState::Stopped),
        })
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, SocketAddr) + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(f));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handler and error-listener registry. Safe to use while running.
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// True only in `RUNNING`; the transient states read as not running.
    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    /// Receives every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Address the listening socket is bound to, while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// Binds the listening socket and starts accepting in the background.
    ///
    /// A no-op unless the server is stopped. Waits for an in-progress
    /// `stop()` to finish first. A bind failure is returned and leaves the
    /// server stopped.
    pub async fn start(&self) -> Result<(), ServerError> {
        let mut running = self.running.lock().await;

        if self.state() != ServerState::Stopped {
            warn!(name = %self.config.name, state = ?self.state(), "start ignored: server is not stopped");
            return Ok(());
        }
        self.state.send_replace(ServerState::Starting);

        let addr = self.config.listen_addr();
        let bound = listener::bind(addr, self.config.backlog)
            .and_then(|listener| listener.local_addr().map(|local| (listener, local)));
        let (tcp_listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                self.state.send_replace(ServerState::Stopped);
                error!(name = %self.config.name, %addr, error = %source, "failed to bind");
                return Err(ServerError::Bind { addr, source });
            }
        };

        let shutdown = Shutdown::new();
        let pool = WorkerPool::new(
            self.config.worker_pool_size,
            self.router.clone(),
            self.config.read_timeout(),
        );

        self.state.send_replace(ServerState::Running);
        info!(name = %self.config.name, %local_addr, "server running");

        let sweeper_task = tokio::spawn(
            self.router
                .sessions()
                .clone()
                .run_sweeper(self.config.sweep_interval(), shutdown.subscribe()),
        );
        let accept_task = tokio::spawn(listener::run(tcp_listener, pool, shutdown.subscribe()));

        *running = Some(Running {
            local_addr,
            shutdown,
            accept_task,
            sweeper_task,
        });

        if let Some(on_start) = &self.on_start {
            let called = catch_unwind(AssertUnwindSafe(|| on_start(&self.config.name, local_addr)));
            if called.is_err() {
                error!(name = %self.config.name, "on-start callback panicked");
            }
        }
        Ok(())
    }

    /// Closes the listening socket and stops the worker pool from taking new
    /// connections. In-flight connections run to completion.
    ///
    /// A no-op unless the server is running.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;

        if self.state() != ServerState::Running {
            warn!(name = %self.config.name, state = ?self.state(), "stop ignored: server is not running");
            return;
        }
        self.state.send_replace(ServerState::Stopping);
        info!(name = %self.config.name, "stopping server");

        if let Some(r) = running.take() {
            r.shutdown.trigger();
            if let Err(e) = r.accept_task.await {
                error!(name = %self.config.name, error = %e, "accept loop terminated abnormally");
            }
            if let Err(e) = r.sweeper_task.await {
                error!(name = %self.config.name, error = %e, "session sweeper terminated abnormally");
            }
        }

        self.state.send_replace(ServerState::Stopped);
        info!(name = %self.config.name, "server stopped");
    }
}
