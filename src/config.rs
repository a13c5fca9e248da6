/*!
 * Server configuration
 *
 * Deliberately minimal: the wire-format size ceilings are protocol
 * constants (see [`crate::parser`]), not deployment knobs, so the only
 * thing worth configuring here is where to listen.
 */

use std::net::{SocketAddr, ToSocketAddrs};

use anyhow::{Context, Result};

/// Default bind address: the conventional Redis-compatible port.
pub const DEFAULT_ADDR: &str = "0.0.0.0:7379";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
}

impl Config {
    /// Build from process arguments: `argv[1]` as the bind address if
    /// present, else [`DEFAULT_ADDR`].
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let addr = args.into_iter().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let bind = addr
            .to_socket_addrs()
            .with_context(|| format!("invalid bind address: {addr}"))?
            .next()
            .with_context(|| format!("could not resolve bind address: {addr}"))?;
        Ok(Self { bind })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_ADDR.to_socket_addrs().unwrap().next().unwrap(),
        }
    }
}
