//! Listener abstraction shared by listener wrappers.
//!
//! # Responsibilities
//! - Describe "something that accepts TCP connections" as a trait object
//! - Let wrappers layer behavior over a plain `TcpListener`
//!
//! # Design Decisions
//! - Poll-based so wrappers stay plain structs without boxed futures
//! - Wrappers own the listener they wrap; the outermost one is handed
//!   to the HTTP layer

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use tokio::net::{TcpListener, TcpStream};

/// A source of accepted connections.
pub trait Accept: Send {
    /// Poll for the next accepted connection.
    fn poll_accept(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<(TcpStream, SocketAddr)>>;

    /// The address this listener is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Accept for TcpListener {
    fn poll_accept(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<(TcpStream, SocketAddr)>> {
        TcpListener::poll_accept(self, cx)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

/// Accept one connection from any listener.
pub async fn accept(listener: &mut dyn Accept) -> io::Result<(TcpStream, SocketAddr)> {
    poll_fn(|cx| listener.poll_accept(cx)).await
}
