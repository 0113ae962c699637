//! The `servers` global option.
//!
//! ```text
//! servers [<listener_address>] {
//!     listener_wrappers {
//!         <module> [args...] [{ ...module options... }]
//!     }
//!     timeouts {
//!         read_body   <duration>
//!         read_header <duration>
//!         write       <duration>
//!         idle        <duration>
//!     }
//!     max_header_size <size>
//!     protocol {
//!         allow_h2c
//!         experimental_http3
//!         strict_sni_host
//!     }
//! }
//! ```
//!
//! # Design Decisions
//! - Any malformed entry fails the whole load; no partial option sets
//! - Listener wrapper modules parse their own segment; this parser only
//!   checks that they can do so and that they wrap listeners
//! - `strict_sni_host` can only be switched on here, never explicitly off

use crate::directive::{Capability, Dispenser, Location, ParseError};
use crate::http::HttpServer;
use crate::modules::{ModuleId, ModuleRegistry, RawModule, LISTENER_NAMESPACE, LISTENER_WRAPPER_KEY};
use crate::values::{parse_bytes, Duration, TriState};

/// Overrides for the servers matching one `servers` entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerOptions {
    /// Exact listener address this entry is restricted to; empty for all.
    pub listener_address: String,

    pub listener_wrappers_raw: Vec<RawModule>,
    pub read_timeout: Duration,
    pub read_header_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_header_bytes: usize,
    pub allow_h2c: bool,
    pub experimental_http3: bool,
    pub strict_sni_host: TriState,
}

impl ServerOptions {
    pub fn is_unscoped(&self) -> bool {
        self.listener_address.is_empty()
    }

    /// Whether this entry applies to `server` on its own terms.
    pub fn matches(&self, server: &HttpServer) -> bool {
        self.is_unscoped() || server.listens_on(&self.listener_address)
    }

    /// Overwrite every transport field of `server` with this entry's values.
    pub fn apply_to(&self, server: &mut HttpServer) {
        let ServerOptions {
            listener_address: _,
            listener_wrappers_raw,
            read_timeout,
            read_header_timeout,
            write_timeout,
            idle_timeout,
            max_header_bytes,
            allow_h2c,
            experimental_http3,
            strict_sni_host,
        } = self;

        server.listener_wrappers_raw = listener_wrappers_raw.clone();
        server.read_timeout = *read_timeout;
        server.read_header_timeout = *read_header_timeout;
        server.write_timeout = *write_timeout;
        server.idle_timeout = *idle_timeout;
        server.max_header_bytes = *max_header_bytes;
        server.allow_h2c = *allow_h2c;
        server.experimental_http3 = *experimental_http3;
        server.strict_sni_host = *strict_sni_host;
    }
}

/// Parse one `servers` directive from `d`.
pub fn parse_server_options(
    d: &mut Dispenser,
    registry: &ModuleRegistry,
) -> Result<ServerOptions, ParseError> {
    let mut opts = ServerOptions::default();

    while d.next() {
        if d.next_arg() {
            opts.listener_address = d.val().to_string();
            if d.next_arg() {
                return Err(d.arg_err());
            }
        }

        let nesting = d.nesting();
        while d.next_block(nesting) {
            let option = d.val().to_string();
            match option.as_str() {
                "listener_wrappers" => {
                    parse_listener_wrappers(d, registry, &mut opts.listener_wrappers_raw)?
                }
                "timeouts" => parse_timeouts(d, &mut opts)?,
                "max_header_size" => {
                    let Some(args) = d.all_args(1) else {
                        return Err(d.arg_err());
                    };
                    let size = parse_bytes(&args[0])
                        .map_err(|e| d.err(format!("parsing max_header_size: {e}")))?;
                    opts.max_header_bytes = usize::try_from(size)
                        .map_err(|_| d.err(format!("max_header_size {size} is too large")))?;
                }
                "protocol" => parse_protocol(d, &mut opts)?,
                _ => return Err(d.err(format!("unrecognized servers option '{option}'"))),
            }
        }
    }

    tracing::debug!(
        listener_address = %opts.listener_address,
        listener_wrappers = opts.listener_wrappers_raw.len(),
        "Parsed servers options"
    );
    Ok(opts)
}

fn missing_capability(at: &Location, id: &ModuleId, capability: Capability) -> ParseError {
    ParseError::MissingCapability {
        at: at.clone(),
        module: id.to_string(),
        capability,
    }
}

fn parse_listener_wrappers(
    d: &mut Dispenser,
    registry: &ModuleRegistry,
    wrappers: &mut Vec<RawModule>,
) -> Result<(), ParseError> {
    let nesting = d.nesting();
    while d.next_block(nesting) {
        let at = d.location();
        let name = d.val().to_string();
        let id = ModuleId::in_namespace(LISTENER_NAMESPACE, &name);

        let info = registry
            .get_module(id.as_str())
            .map_err(|source| ParseError::ModuleNotFound {
                at: at.clone(),
                name: name.clone(),
                source,
            })?;
        let mut module = info.instantiate();

        let unmarshaler = module
            .as_unmarshaler()
            .ok_or_else(|| missing_capability(&at, &id, Capability::DirectiveParsing))?;
        unmarshaler.unmarshal_directives(&mut d.new_from_next_segment())?;

        if module.as_listener_wrapper().is_none() {
            return Err(missing_capability(&at, &id, Capability::ListenerWrapping));
        }

        let raw = RawModule::encode(&*module, LISTENER_WRAPPER_KEY).map_err(|source| {
            ParseError::Encode {
                at: at.clone(),
                module: id.to_string(),
                source,
            }
        })?;
        tracing::debug!(module = %id, "Listener wrapper configured");
        wrappers.push(raw);
    }
    Ok(())
}

fn parse_timeouts(d: &mut Dispenser, opts: &mut ServerOptions) -> Result<(), ParseError> {
    let nesting = d.nesting();
    while d.next_block(nesting) {
        let key = d.val().to_string();
        let target = match key.as_str() {
            "read_body" => &mut opts.read_timeout,
            "read_header" => &mut opts.read_header_timeout,
            "write" => &mut opts.write_timeout,
            "idle" => &mut opts.idle_timeout,
            _ => return Err(d.err(format!("unrecognized timeouts option '{key}'"))),
        };

        let Some(args) = d.all_args(1) else {
            return Err(d.arg_err());
        };
        *target = Duration::parse(&args[0])
            .map_err(|e| d.err(format!("parsing {key} timeout duration: {e}")))?;
    }
    Ok(())
}

fn expect_no_args(d: &mut Dispenser) -> Result<(), ParseError> {
    if d.next_arg() {
        return Err(d.arg_err());
    }
    Ok(())
}

fn parse_protocol(d: &mut Dispenser, opts: &mut ServerOptions) -> Result<(), ParseError> {
    let nesting = d.nesting();
    while d.next_block(nesting) {
        let flag = d.val().to_string();
        match flag.as_str() {
            "allow_h2c" => {
                expect_no_args(d)?;
                opts.allow_h2c = true;
            }
            "experimental_http3" => {
                expect_no_args(d)?;
                opts.experimental_http3 = true;
            }
            "strict_sni_host" => {
                expect_no_args(d)?;
                opts.strict_sni_host = TriState::True;
            }
            _ => return Err(d.err(format!("unrecognized protocol option '{flag}'"))),
        }
    }
    Ok(())
}
