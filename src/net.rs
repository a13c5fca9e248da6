/*!
 * Network glue
 *
 * A minimal `mio` event loop that demonstrates the parser as a stream
 * consumer: one [`Parser`](crate::parser::Parser) and one read buffer
 * per connection, draining recognized commands into a [`CommandSink`]
 * after every readable event. This is intentionally thin — no response
 * is written back, and no command is interpreted (see spec.md §1); a
 * real server built on this crate supplies both.
 */

use crate::parser::Parser;
use crate::sink::CommandSink;
use anyhow::Result;
use bytes::BytesMut;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use std::collections::HashMap;
use std::io::Read;
use std::net::SocketAddr;

const READ_BUF: usize = 4096;

pub fn bind_reuseport(addr: SocketAddr) -> Result<TcpListener> {
    Ok(TcpListener::bind(addr)?)
}

struct Conn {
    sock: TcpStream,
    peer: SocketAddr,
    rbuf: BytesMut,
    parser: Parser,
}

/// Run the event loop, feeding every connection's bytes to its own
/// parser and handing completed commands to `sink`. Blocks forever
/// (or until a fatal I/O setup error).
pub fn run(addr: SocketAddr, mut sink: impl CommandSink) -> Result<()> {
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(1024);
    let mut listener = bind_reuseport(addr)?;
    const LISTENER: Token = Token(0);

    poll.registry()
        .register(&mut listener, LISTENER, Interest::READABLE)?;

    let mut conns: HashMap<usize, Conn> = HashMap::new();
    let mut next_tok: usize = 1;

    loop {
        poll.poll(&mut events, None)?;

        for ev in events.iter() {
            match ev.token() {
                LISTENER => loop {
                    match listener.accept() {
                        Ok((mut sock, peer)) => {
                            sock.set_nodelay(true).ok();
                            let tok = next_tok;
                            next_tok += 1;
                            poll.registry()
                                .register(&mut sock, Token(tok), Interest::READABLE)?;
                            conns.insert(
                                tok,
                                Conn {
                                    sock,
                                    peer,
                                    rbuf: BytesMut::with_capacity(READ_BUF),
                                    parser: Parser::new(),
                                },
                            );
                            log::debug!("accepted connection {peer}");
                        }
                        Err(ref e) if would_block(e) => break,
                        Err(e) => {
                            log::warn!("accept error: {e}");
                            break;
                        }
                    }
                },
                Token(t) => {
                    let mut should_remove = false;
                    if let Some(conn) = conns.get_mut(&t) {
                        let mut tmp = [0u8; READ_BUF];
                        loop {
                            match conn.sock.read(&mut tmp) {
                                Ok(0) => {
                                    should_remove = true;
                                    break;
                                }
                                Ok(n) => conn.rbuf.extend_from_slice(&tmp[..n]),
                                Err(ref e) if would_block(e) => break,
                                Err(_) => {
                                    should_remove = true;
                                    break;
                                }
                            }
                        }

                        if !conn.rbuf.is_empty() {
                            conn.parser.parse(&conn.rbuf);
                            conn.rbuf.clear();
                            while let Some(cmd) = conn.parser.take_cmd() {
                                sink.on_command(conn.peer, cmd);
                            }
                            if let Some(e) = conn.parser.err() {
                                log::warn!("{}: protocol error: {e}", conn.peer);
                                should_remove = true;
                            }
                        }
                    }
                    if should_remove {
                        if let Some(conn) = conns.remove(&t) {
                            log::debug!("closed connection {}", conn.peer);
                        }
                    }
                }
            }
        }
    }
}

#[inline]
fn would_block(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
    )
}
