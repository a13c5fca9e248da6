/*!
 * Command sink — the seam to an external dispatcher
 *
 * The parser only recognizes requests; interpreting them is an external
 * collaborator's job (see spec.md §1). `CommandSink` is the minimal
 * trait a caller implements to receive what the parser produces.
 */

use crate::command::Command;
use std::net::SocketAddr;

/// Receives commands as the network glue recognizes them.
pub trait CommandSink {
    fn on_command(&mut self, peer: SocketAddr, cmd: Command);
}

/// Default sink used by the bundled binary: logs each command at `info`
/// and does nothing else. A real deployment would replace this with a
/// dispatcher that interprets `cmd.argv()`.
#[derive(Debug, Default)]
pub struct LoggingSink {
    pub count: u64,
}

impl CommandSink for LoggingSink {
    fn on_command(&mut self, peer: SocketAddr, cmd: Command) {
        self.count += 1;
        log::info!("{peer}: {cmd}");
    }
}
