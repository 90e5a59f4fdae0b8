//! TCP listener for the channel server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use super::Connection;
use crate::config::ServerConfig;
use crate::script::ScriptEngine;
use crate::{KodamaError, Result};

/// Channel server accepting game client connections.
pub struct ChannelServer {
    listener: TcpListener,
    semaphore: Arc<Semaphore>,
    max_connections: usize,
}

impl ChannelServer {
    /// Bind to the configured address.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Channel server listening on {}", local_addr);

        Ok(Self {
            listener,
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Number of free connection slots.
    pub fn available_connections(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn active_connections(&self) -> usize {
        self.max_connections - self.semaphore.available_permits()
    }

    /// Accept the next connection, waiting for a free slot first.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit)> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| KodamaError::Io(std::io::Error::other("semaphore closed")))?;

        let (stream, addr) = self.listener.accept().await?;
        debug!("Accepted connection from {}", addr);

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Accept connections forever, one lane per connection.
    pub async fn run(self, engine: Arc<ScriptEngine>) -> Result<()> {
        loop {
            match self.accept().await {
                Ok((stream, addr, permit)) => {
                    tokio::spawn(serve(stream, addr, permit, Arc::clone(&engine)));
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Drive one client lane; the slot is held until the lane closes.
async fn serve(stream: TcpStream, addr: SocketAddr, permit: ConnectionPermit, engine: Arc<ScriptEngine>) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }
    Connection::new(addr, engine).run(stream).await;
    drop(permit);
}

/// An occupied connection slot, released on drop.
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
