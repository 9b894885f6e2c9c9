//! TCP server loop.
//!
//! Accepts one connection at a time, runs it through a `Session`, and folds
//! successful sessions into the process-wide `Histogram`. The shutdown flag
//! is only consulted between sessions.

use crate::config::Config;
use crate::error::ServerError;
use crate::histogram::Histogram;
use crate::session::{Session, SessionOutcome};
use crate::shutdown::Shutdown;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::os::unix::io::AsRawFd;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const LISTENER_TOKEN: Token = Token(0);

/// Server instance
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    poll: Poll,
    events: Events,
    idle_poll_interval: Duration,
    /// Receive buffer shared by every session.
    chunk: Vec<u8>,
    histogram: Histogram,
}

impl Server {
    /// Bind and listen on the configured address.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let listen = config.listen_addr();
        let bind_error = |source| ServerError::Bind {
            addr: listen.clone(),
            source,
        };

        let addr = resolve(&listen).map_err(bind_error)?;
        let listener = create_listener(addr, config.backlog).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let poll = Poll::new().map_err(ServerError::Poll)?;
        poll.registry()
            .register(
                &mut SourceFd(&listener.as_raw_fd()),
                LISTENER_TOKEN,
                Interest::READABLE,
            )
            .map_err(ServerError::Poll)?;

        info!(address = %local_addr, backlog = config.backlog, "Server listening");

        Ok(Server {
            listener,
            local_addr,
            poll,
            events: Events::with_capacity(8),
            idle_poll_interval: Duration::from_millis(config.idle_poll_interval_ms),
            chunk: vec![0u8; config.chunk_size],
            histogram: Histogram::new(),
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve connections until shutdown is requested while idle.
    ///
    /// Returns the accumulated histogram on shutdown. Any error is fatal and
    /// the histogram is discarded with the server.
    pub fn run(mut self, shutdown: Shutdown) -> Result<Histogram, ServerError> {
        loop {
            if shutdown.is_requested() {
                info!(
                    total = self.histogram.total(),
                    "Shutdown requested, stopping server"
                );
                return Ok(self.histogram);
            }

            if let Some((stream, peer)) = self.accept()? {
                self.serve(stream, peer)?;
            }
        }
    }

    /// Accept one pending connection, or wait for readiness and return `None`.
    ///
    /// The wait ends on a new connection, a signal, or the idle interval so
    /// the caller can re-check the shutdown flag.
    fn accept(&mut self) -> Result<Option<(TcpStream, SocketAddr)>, ServerError> {
        match self.listener.accept() {
            Ok(pair) => return Ok(Some(pair)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(None),
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                return Err(ServerError::Accept(e));
            }
        }

        match self
            .poll
            .poll(&mut self.events, Some(self.idle_poll_interval))
        {
            Ok(()) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => {
                error!(error = %e, "Failed to wait for connections");
                Err(ServerError::Poll(e))
            }
        }
    }

    /// Run one session to completion. The connection closes when it returns.
    fn serve(&mut self, stream: TcpStream, peer: SocketAddr) -> Result<(), ServerError> {
        debug!(peer = %peer, "New connection");
        stream.set_nonblocking(false).map_err(ServerError::Session)?;

        let mut session = Session::new(stream);
        let outcome = session.run(&mut self.chunk).map_err(|e| {
            error!(peer = %peer, error = %e, "Fatal error during session");
            ServerError::Session(e)
        })?;

        match outcome {
            SessionOutcome::Success {
                delta,
                count,
                bytes,
            } => {
                self.histogram.merge(&delta);
                debug!(peer = %peer, bytes, count, "Session complete");
            }
            SessionOutcome::Aborted { state, error } => {
                warn!(peer = %peer, state = ?state, error = %error, "Session aborted");
            }
        }
        Ok(())
    }
}

fn resolve(listen: &str) -> io::Result<SocketAddr> {
    listen.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no address found for '{listen}'"),
        )
    })
}

fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}
