//! `listeners.proxy_protocol`: accepts PROXY protocol (v1) headers from
//! trusted upstreams.
//!
//! ```text
//! proxy_protocol {
//!     timeout 2s
//!     allow 10.0.0.0/8 192.168.0.0/16
//! }
//! ```
//!
//! # Responsibilities
//! - Parse the header read timeout and the trusted source ranges
//! - Read and strip the PROXY header of each trusted connection, reporting
//!   the client address it carries as the peer
//! - Pass untrusted connections through untouched; their bytes are never
//!   interpreted as a header
//!
//! # Design Decisions
//! - An empty allow list trusts every source
//! - Ranges are validated at parse time so bad CIDRs fail the config load
//! - Trusted peers must send a header; a missing, malformed or late header
//!   drops that connection and accepting continues with the next one
//! - Headers are read one byte at a time so no request bytes are consumed
//! - A zero timeout falls back to `DEFAULT_HEADER_TIMEOUT`

use std::fmt;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::str::FromStr;
use std::task::{ready, Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::directive::{Dispenser, ParseError};
use crate::modules::{ListenerWrapper, Module, ModuleId, UnmarshalDirectives};
use crate::net::Accept;
use crate::values::Duration;

/// Header timeout used when none is configured.
pub const DEFAULT_HEADER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Longest possible v1 header, CRLF included.
const MAX_V1_HEADER: usize = 107;

/// An IP network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid CIDR address '{s}': missing prefix length"))?;
        let addr: IpAddr = addr
            .parse()
            .map_err(|e| format!("invalid CIDR address '{s}': {e}"))?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        let prefix: u8 = prefix
            .parse()
            .ok()
            .filter(|p| *p <= max)
            .ok_or_else(|| format!("invalid CIDR address '{s}': bad prefix length"))?;
        Ok(Self { addr, prefix })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyProtocol {
    /// How long to wait for the PROXY header; zero uses the default.
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub timeout: Duration,

    /// Source ranges allowed to send PROXY headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
}

impl ProxyProtocol {
    pub const ID: &'static str = "listeners.proxy_protocol";

    fn allowed_ranges(&self) -> Vec<Cidr> {
        // Entries were validated when parsed; anything unparseable came
        // from hand-written JSON and is skipped with a warning.
        self.allow
            .iter()
            .filter_map(|range| match range.parse() {
                Ok(cidr) => Some(cidr),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring proxy_protocol allow entry");
                    None
                }
            })
            .collect()
    }
}

impl Module for ProxyProtocol {
    fn id(&self) -> ModuleId {
        ModuleId::new(Self::ID)
    }

    fn encode(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn as_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalDirectives> {
        Some(self)
    }

    fn as_listener_wrapper(&self) -> Option<&dyn ListenerWrapper> {
        Some(self)
    }

    fn into_listener_wrapper(self: Box<Self>) -> Option<Box<dyn ListenerWrapper>> {
        Some(self)
    }
}

impl UnmarshalDirectives for ProxyProtocol {
    fn unmarshal_directives(&mut self, d: &mut Dispenser) -> Result<(), ParseError> {
        while d.next() {
            if d.next_arg() {
                return Err(d.arg_err());
            }

            let nesting = d.nesting();
            while d.next_block(nesting) {
                let option = d.val().to_string();
                match option.as_str() {
                    "timeout" => {
                        let Some(args) = d.all_args(1) else {
                            return Err(d.arg_err());
                        };
                        self.timeout = Duration::parse(&args[0]).map_err(|e| {
                            d.err(format!("parsing proxy_protocol timeout duration: {e}"))
                        })?;
                    }
                    "allow" => {
                        let ranges = d.remaining_args();
                        if ranges.is_empty() {
                            return Err(d.arg_err());
                        }
                        for range in ranges {
                            range.parse::<Cidr>().map_err(|e| d.err(e))?;
                            self.allow.push(range);
                        }
                    }
                    _ => {
                        return Err(d.err(format!("unrecognized proxy_protocol option '{option}'")))
                    }
                }
            }
        }
        Ok(())
    }
}

impl ListenerWrapper for ProxyProtocol {
    fn wrap_listener(&self, inner: Box<dyn Accept>) -> Box<dyn Accept> {
        Box::new(ProxyProtocolListener {
            inner,
            timeout: self.timeout,
            allow: self.allowed_ranges(),
            pending: None,
        })
    }
}

type PendingHeader = Pin<Box<dyn Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send>>;

/// Listener stripping PROXY headers from trusted peers.
pub struct ProxyProtocolListener {
    inner: Box<dyn Accept>,
    timeout: Duration,
    allow: Vec<Cidr>,
    pending: Option<PendingHeader>,
}

impl ProxyProtocolListener {
    pub fn is_trusted(&self, ip: IpAddr) -> bool {
        self.allow.is_empty() || self.allow.iter().any(|cidr| cidr.contains(ip))
    }

    pub fn header_timeout(&self) -> std::time::Duration {
        self.timeout
            .to_std()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_HEADER_TIMEOUT)
    }
}

impl Accept for ProxyProtocolListener {
    fn poll_accept(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<(TcpStream, SocketAddr)>> {
        loop {
            if let Some(pending) = self.pending.as_mut() {
                let result = ready!(pending.as_mut().poll(cx));
                self.pending = None;
                match result {
                    Ok((stream, client)) => return Poll::Ready(Ok((stream, client))),
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping connection without a valid PROXY header");
                        continue;
                    }
                }
            }

            let (stream, peer) = ready!(self.inner.poll_accept(cx))?;
            if !self.is_trusted(peer.ip()) {
                tracing::debug!(peer_addr = %peer, "Untrusted peer, PROXY header not read");
                return Poll::Ready(Ok((stream, peer)));
            }
            self.pending = Some(Box::pin(read_proxy_header(stream, peer, self.header_timeout())));
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

fn invalid_data(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// Parse one v1 header line, CRLF included.
///
/// Returns the client address it carries, or `None` for `PROXY UNKNOWN`.
pub fn parse_v1_header(line: &str) -> Result<Option<SocketAddr>, String> {
    let line = line
        .strip_suffix("\r\n")
        .ok_or_else(|| "PROXY header is not terminated by CRLF".to_string())?;
    let mut parts = line.split(' ');
    if parts.next() != Some("PROXY") {
        return Err("missing PROXY signature".to_string());
    }

    match parts.next() {
        Some("UNKNOWN") => Ok(None),
        Some(family @ ("TCP4" | "TCP6")) => {
            let fields: Vec<&str> = parts.collect();
            let [source, _destination, source_port, _destination_port] = fields.as_slice() else {
                return Err(format!("malformed {family} PROXY header"));
            };
            let ip: IpAddr = source
                .parse()
                .map_err(|e| format!("invalid PROXY source address '{source}': {e}"))?;
            if ip.is_ipv4() != (family == "TCP4") {
                return Err(format!("PROXY source address '{source}' does not match {family}"));
            }
            let port: u16 = source_port
                .parse()
                .map_err(|e| format!("invalid PROXY source port '{source_port}': {e}"))?;
            Ok(Some(SocketAddr::new(ip, port)))
        }
        other => Err(format!("unsupported PROXY family '{}'", other.unwrap_or(""))),
    }
}

async fn read_header_line(stream: &mut TcpStream) -> io::Result<String> {
    let mut line = Vec::with_capacity(MAX_V1_HEADER);
    while !line.ends_with(b"\r\n") {
        if line.len() >= MAX_V1_HEADER {
            return Err(invalid_data("PROXY header too long"));
        }
        line.push(stream.read_u8().await?);
    }
    String::from_utf8(line).map_err(|_| invalid_data("PROXY header is not ASCII"))
}

async fn read_proxy_header(
    mut stream: TcpStream,
    peer: SocketAddr,
    limit: std::time::Duration,
) -> io::Result<(TcpStream, SocketAddr)> {
    let line = tokio::time::timeout(limit, read_header_line(&mut stream))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "timed out waiting for PROXY header"))??;
    let client = parse_v1_header(&line).map_err(invalid_data)?.unwrap_or(peer);
    tracing::debug!(peer_addr = %peer, client_addr = %client, "PROXY header accepted");
    Ok((stream, client))
}
