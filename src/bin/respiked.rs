/*!
 * respiked — demo server binary
 *
 * Wires together logging, configuration, and the network glue. Every
 * recognized command is logged and otherwise ignored: command dispatch
 * is an external collaborator, not part of this crate.
 */

use anyhow::Result;
use respiked::{config::Config, net, sink::LoggingSink};

fn main() -> Result<()> {
    env_logger::init();

    let cfg = Config::from_args(std::env::args())?;
    log::info!("respiked listening on {}", cfg.bind);

    net::run(cfg.bind, LoggingSink::default())
}
