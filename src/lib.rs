// Core modules for respiked
pub mod command; // Command value type (argv + flow)
pub mod parser; // the streaming RESP request parser
pub mod sink; // CommandSink trait + default LoggingSink
pub mod config; // Config (bind address)
pub mod net; // bind_reuseport + run (thin mio event loop)

// Re-export all public items from modules for easier access
pub use command::*;
pub use config::*;
pub use net::*;
pub use parser::*;
pub use sink::*;
