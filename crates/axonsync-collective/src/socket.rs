//! Socket Backend - TCP Ring Collective Backend
//!
//! Implements the collective contract over plain TCP using a ring
//! all-reduce: a reduce-scatter phase in which each rank accumulates one
//! chunk of the buffer, followed by an all-gather phase that circulates
//! the fully-reduced chunks. Bandwidth per rank is independent of the
//! world size.
//!
//! Ring construction happens once at startup: every rank binds a listener,
//! publishes the bound address through the rendezvous store, connects to
//! its right neighbour and accepts from its left. I/O failures surface as
//! transport errors through the work handle that owns the collective;
//! frame-length disagreement surfaces as a shape mismatch.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use axonsync_core::{Error, Result, RunConfig};

use crate::backend::{Backend, ReduceOp};
use crate::store::{Store, FORMATION_TIMEOUT};

const RING_IO_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_RETRY: Duration = Duration::from_millis(50);

// =============================================================================
// SocketBackend
// =============================================================================

/// TCP ring collective backend.
pub struct SocketBackend {
    rank: usize,
    world_size: usize,
    /// Stream to the right neighbour, `(rank + 1) % world_size`.
    right: Option<Mutex<TcpStream>>,
    /// Stream from the left neighbour, `(rank - 1) % world_size`.
    left: Option<Mutex<TcpStream>>,
}

impl SocketBackend {
    /// Builds the ring for this rank, exchanging addresses through the
    /// rendezvous store.
    pub fn connect(store: &dyn Store, config: &RunConfig) -> Result<Self> {
        let rank = config.rank;
        let world_size = config.world_size;

        let bind_addr = match &config.interface {
            Some(interface) => interface.clone(),
            None => default_interface_addr(),
        };
        let listener = TcpListener::bind((bind_addr.as_str(), 0))?;
        let local_addr = listener.local_addr()?;
        store.set(&ring_key(rank), local_addr.to_string().as_bytes())?;
        info!(rank, %local_addr, "ring endpoint published");

        if world_size == 1 {
            return Ok(Self {
                rank,
                world_size,
                right: None,
                left: None,
            });
        }

        let right_rank = (rank + 1) % world_size;
        let right_addr = String::from_utf8(store.get(&ring_key(right_rank), FORMATION_TIMEOUT)?)
            .map_err(|_| Error::transport("non-utf8 ring address"))?;
        let right = ring_connect(&right_addr)?;
        let left = ring_accept(&listener)?;
        for stream in [&right, &left] {
            stream.set_read_timeout(Some(RING_IO_TIMEOUT))?;
            stream.set_write_timeout(Some(RING_IO_TIMEOUT))?;
            stream.set_nodelay(true)?;
        }
        debug!(rank, right_rank, "ring links established");

        Ok(Self {
            rank,
            world_size,
            right: Some(Mutex::new(right)),
            left: Some(Mutex::new(left)),
        })
    }

    fn chunk_range(&self, index: usize, len: usize) -> (usize, usize) {
        let chunk_size = len.div_ceil(self.world_size);
        let start = (index * chunk_size).min(len);
        let end = ((index + 1) * chunk_size).min(len);
        (start, end)
    }

    fn exchange(&self, data: &[f32], send_chunk: usize, recv_chunk: usize) -> Result<Vec<f32>> {
        let (send_start, send_end) = self.chunk_range(send_chunk, data.len());
        let (recv_start, recv_end) = self.chunk_range(recv_chunk, data.len());

        // Both streams are exclusively owned by the worker that runs
        // collectives, so the locks never contend.
        {
            let mut right = self.right.as_ref().unwrap().lock();
            write_chunk(&mut right, &data[send_start..send_end])?;
        }
        let received = {
            let mut left = self.left.as_ref().unwrap().lock();
            read_chunk(&mut left)?
        };
        if received.len() != recv_end - recv_start {
            return Err(Error::ShapeMismatch {
                expected: recv_end - recv_start,
                actual: received.len(),
            });
        }
        Ok(received)
    }
}

impl Backend for SocketBackend {
    fn name(&self) -> &str {
        "socket"
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn all_reduce(&self, data: &mut [f32], op: ReduceOp) -> Result<()> {
        let n = self.world_size;
        if n == 1 {
            return Ok(());
        }

        // Phase 1: reduce-scatter. After n-1 steps rank r holds the fully
        // reduced chunk (r + 1) % n.
        for step in 0..n - 1 {
            let send_chunk = (self.rank + n - step) % n;
            let recv_chunk = (self.rank + 2 * n - step - 1) % n;
            let received = self.exchange(data, send_chunk, recv_chunk)?;
            let (recv_start, _) = self.chunk_range(recv_chunk, data.len());
            for (offset, value) in received.into_iter().enumerate() {
                let slot = &mut data[recv_start + offset];
                *slot = op.apply(*slot, value);
            }
        }

        // Phase 2: all-gather. Circulate the reduced chunks around the ring.
        for step in 0..n - 1 {
            let send_chunk = (self.rank + 1 + n - step) % n;
            let recv_chunk = (self.rank + n - step) % n;
            let received = self.exchange(data, send_chunk, recv_chunk)?;
            let (recv_start, _) = self.chunk_range(recv_chunk, data.len());
            data[recv_start..recv_start + received.len()].copy_from_slice(&received);
        }

        Ok(())
    }

    fn barrier(&self) -> Result<()> {
        let mut token = [0.0f32];
        self.all_reduce(&mut token, ReduceOp::Sum)
    }
}

// =============================================================================
// Ring Construction Helpers
// =============================================================================

fn ring_key(rank: usize) -> String {
    format!("rank/{rank}/addr")
}

fn ring_connect(addr: &str) -> Result<TcpStream> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|_| Error::transport(format!("invalid ring address `{addr}`")))?;
    let deadline = Instant::now() + FORMATION_TIMEOUT;
    loop {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                if Instant::now() >= deadline {
                    return Err(Error::transport(format!(
                        "cannot reach ring neighbour {addr}: {e}"
                    )));
                }
                std::thread::sleep(CONNECT_RETRY);
            }
        }
    }
}

fn ring_accept(listener: &TcpListener) -> Result<TcpStream> {
    listener.set_nonblocking(true)?;
    let deadline = Instant::now() + FORMATION_TIMEOUT;
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(Error::transport("ring neighbour never connected"));
                }
                std::thread::sleep(CONNECT_RETRY);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Picks the local address of the default-route interface.
///
/// Falls back to loopback when the host has no routable interface.
#[must_use]
pub fn default_interface_addr() -> String {
    let probe = || -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    probe().unwrap_or_else(|_| "127.0.0.1".to_string())
}

// =============================================================================
// Wire Helpers
// =============================================================================

fn write_chunk(stream: &mut TcpStream, chunk: &[f32]) -> Result<()> {
    let mut frame = Vec::with_capacity(4 + chunk.len() * 4);
    frame.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    for value in chunk {
        frame.extend_from_slice(&value.to_le_bytes());
    }
    stream.write_all(&frame)?;
    Ok(())
}

fn read_chunk(stream: &mut TcpStream) -> Result<Vec<f32>> {
    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let mut payload = vec![0u8; len * 4];
    stream.read_exact(&mut payload)?;
    Ok(payload
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TcpStore;

    fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn ring_world(world_size: usize) -> Vec<std::thread::JoinHandle<()>> {
        let port = free_port();
        (0..world_size)
            .map(|rank| {
                std::thread::spawn(move || {
                    let config = RunConfig::new("127.0.0.1", port, world_size, rank)
                        .interface("127.0.0.1")
                        .validate()
                        .unwrap();
                    let store: Box<dyn Store> = if rank == 0 {
                        Box::new(TcpStore::serve("127.0.0.1", port).unwrap())
                    } else {
                        Box::new(TcpStore::client(format!("127.0.0.1:{port}")))
                    };
                    let backend = SocketBackend::connect(store.as_ref(), &config).unwrap();

                    let mut data = vec![(rank + 1) as f32; 10];
                    backend.all_reduce(&mut data, ReduceOp::Sum).unwrap();
                    let expected: f32 = (1..=world_size).map(|r| r as f32).sum();
                    assert_eq!(data, vec![expected; 10]);

                    backend.barrier().unwrap();
                })
            })
            .collect()
    }

    #[test]
    fn test_ring_all_reduce_two_ranks() {
        for handle in ring_world(2) {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_ring_all_reduce_four_ranks() {
        for handle in ring_world(4) {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_single_rank_short_circuits() {
        let port = free_port();
        let config = RunConfig::new("127.0.0.1", port, 1, 0)
            .interface("127.0.0.1")
            .validate()
            .unwrap();
        let store = TcpStore::serve("127.0.0.1", port).unwrap();
        let backend = SocketBackend::connect(&store, &config).unwrap();

        let mut data = vec![3.0, 4.0];
        backend.all_reduce(&mut data, ReduceOp::Sum).unwrap();
        assert_eq!(data, vec![3.0, 4.0]);
    }

    #[test]
    fn test_default_interface_addr_is_parseable() {
        let addr = default_interface_addr();
        assert!(addr.parse::<std::net::IpAddr>().is_ok());
    }
}
