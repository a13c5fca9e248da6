//! Feeds stdin to a `Parser` in small, arbitrary chunks and prints every
//! recognized command. Useful for poking at the parser by hand:
//!
//!     printf '*2\r\n$4\r\nPING\r\n$0\r\n\r\n' | cargo run --example feed

use respiked::parser::Parser;
use std::io::{self, Read};

fn main() -> io::Result<()> {
    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;

    let mut parser = Parser::new();
    // Feed in small chunks to exercise the re-entrant contract even for
    // input that would easily fit in one call.
    for chunk in input.chunks(7) {
        parser.parse(chunk);
        while let Some(cmd) = parser.take_cmd() {
            println!("{cmd}");
        }
        if let Some(e) = parser.err() {
            eprintln!("error: {e}");
            break;
        }
    }
    Ok(())
}
