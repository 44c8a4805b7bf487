//! Rendezvous Store - Group Formation Key/Value Store
//!
//! A shared key/value store reachable by all ranks, used only while the
//! group forms: rank 0 hosts it, every rank publishes its own keys and
//! reads the others'. It has no role once the process group exists.
//!
//! The wire protocol is a one-shot, length-prefixed request per
//! connection: `SET key value` stores a value, `GET key` returns it if
//! present. Blocking reads are implemented client-side by polling with
//! backoff until a bounded deadline.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use axonsync_core::{Error, Result};

/// Bound on the whole group-formation window.
pub const FORMATION_TIMEOUT: Duration = Duration::from_secs(100);

const OP_SET: u8 = 1;
const OP_GET: u8 = 2;

const STATUS_OK: u8 = 1;
const STATUS_MISSING: u8 = 0;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Store Trait
// =============================================================================

/// Contract for the rendezvous key/value store.
pub trait Store: Send + Sync {
    /// Stores a value under a key, overwriting any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns the value under a key, blocking until it is published or
    /// the timeout elapses with [`Error::Rendezvous`].
    ///
    /// [`Error::Rendezvous`]: axonsync_core::Error::Rendezvous
    fn get(&self, key: &str, timeout: Duration) -> Result<Vec<u8>>;
}

// =============================================================================
// TcpStore
// =============================================================================

/// TCP-backed rendezvous store.
///
/// Rank 0 constructs it with [`TcpStore::serve`], which binds a listener
/// and services requests on a background thread; every other rank uses
/// [`TcpStore::client`]. The server half is torn down when the store is
/// dropped.
pub struct TcpStore {
    endpoint: String,
    server: Option<StoreServer>,
}

impl TcpStore {
    /// Hosts the store on the given port and returns a handle that also
    /// acts as a client of itself.
    pub fn serve(endpoint: impl Into<String>, port: u16) -> Result<Self> {
        let server = StoreServer::spawn(port)?;
        Ok(Self {
            endpoint: format!("{}:{}", endpoint.into(), port),
            server: Some(server),
        })
    }

    /// Connects to a store hosted by rank 0.
    pub fn client(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            server: None,
        }
    }

    /// Returns true if this handle hosts the store.
    #[must_use]
    pub fn is_server(&self) -> bool {
        self.server.is_some()
    }

    fn request(&self, frame: &[u8], deadline: Instant) -> Result<Vec<u8>> {
        let mut stream = connect_with_retry(&self.endpoint, deadline)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.write_all(frame)?;
        let mut status = [0u8; 1];
        stream.read_exact(&mut status)?;
        if status[0] == STATUS_MISSING {
            return Ok(Vec::new());
        }
        let len = read_u32(&mut stream)? as usize;
        let mut value = vec![0u8; len];
        stream.read_exact(&mut value)?;
        Ok(value)
    }
}

impl Store for TcpStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(9 + key.len() + value.len());
        frame.push(OP_SET);
        frame.extend_from_slice(&(key.len() as u32).to_le_bytes());
        frame.extend_from_slice(key.as_bytes());
        frame.extend_from_slice(&(value.len() as u32).to_le_bytes());
        frame.extend_from_slice(value);
        self.request(&frame, Instant::now() + FORMATION_TIMEOUT)?;
        debug!(key, len = value.len(), "published rendezvous key");
        Ok(())
    }

    fn get(&self, key: &str, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut frame = Vec::with_capacity(5 + key.len());
        frame.push(OP_GET);
        frame.extend_from_slice(&(key.len() as u32).to_le_bytes());
        frame.extend_from_slice(key.as_bytes());
        loop {
            match self.request(&frame, deadline) {
                Ok(value) if !value.is_empty() => return Ok(value),
                Ok(_) => {}
                Err(Error::Rendezvous { .. }) => {
                    return Err(Error::rendezvous(key, timeout));
                }
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(Error::rendezvous(key, timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

// =============================================================================
// Server Half
// =============================================================================

struct StoreServer {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StoreServer {
    fn spawn(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let thread = std::thread::Builder::new()
            .name("axonsync-store".into())
            .spawn(move || serve_loop(&listener, &flag))
            .map_err(|e| Error::transport(e.to_string()))?;
        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }
}

impl Drop for StoreServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn serve_loop(listener: &TcpListener, shutdown: &AtomicBool) {
    // Requests are serviced one at a time; formation traffic is tiny.
    let mut entries: HashMap<String, Vec<u8>> = HashMap::new();
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(e) = handle_request(stream, &mut entries) {
                    debug!(error = %e, "rendezvous request failed");
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                debug!(error = %e, "rendezvous accept failed");
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

fn handle_request(mut stream: TcpStream, entries: &mut HashMap<String, Vec<u8>>) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;

    let mut op = [0u8; 1];
    stream.read_exact(&mut op)?;
    let key_len = read_u32(&mut stream)? as usize;
    let mut key = vec![0u8; key_len];
    stream.read_exact(&mut key)?;
    let key = String::from_utf8(key).map_err(|_| Error::transport("non-utf8 store key"))?;

    match op[0] {
        OP_SET => {
            let value_len = read_u32(&mut stream)? as usize;
            let mut value = vec![0u8; value_len];
            stream.read_exact(&mut value)?;
            entries.insert(key, value);
            stream.write_all(&[STATUS_OK])?;
            stream.write_all(&0u32.to_le_bytes())?;
        }
        OP_GET => match entries.get(&key) {
            Some(value) => {
                stream.write_all(&[STATUS_OK])?;
                stream.write_all(&(value.len() as u32).to_le_bytes())?;
                stream.write_all(value)?;
            }
            None => {
                stream.write_all(&[STATUS_MISSING])?;
            }
        },
        other => return Err(Error::transport(format!("unknown store opcode {other}"))),
    }
    Ok(())
}

// =============================================================================
// Wire Helpers
// =============================================================================

fn read_u32(stream: &mut TcpStream) -> Result<u32> {
    let mut bytes = [0u8; 4];
    stream.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn connect_with_retry(endpoint: &str, deadline: Instant) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = std::net::ToSocketAddrs::to_socket_addrs(endpoint)
        .map_err(|e| Error::transport(format!("cannot resolve `{endpoint}`: {e}")))?
        .collect();
    let addr = addrs
        .first()
        .ok_or_else(|| Error::transport(format!("no address for `{endpoint}`")))?;
    let started = Instant::now();
    loop {
        match TcpStream::connect_timeout(addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(_) if Instant::now() < deadline => {
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(Error::Rendezvous {
                    key: format!("store@{endpoint} ({e})"),
                    waited: started.elapsed(),
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn free_port() -> u16 {
        // Bind to an ephemeral port, release it, and reuse the number.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_set_then_get() {
        let port = free_port();
        let store = TcpStore::serve("127.0.0.1", port).unwrap();
        store.set("rank/0/addr", b"10.0.0.1:4242").unwrap();
        let value = store.get("rank/0/addr", Duration::from_secs(5)).unwrap();
        assert_eq!(value, b"10.0.0.1:4242");
    }

    #[test]
    fn test_client_sees_server_keys() {
        let port = free_port();
        let server = TcpStore::serve("127.0.0.1", port).unwrap();
        server.set("world_size", &4u64.to_le_bytes()).unwrap();

        let client = TcpStore::client(format!("127.0.0.1:{port}"));
        assert!(!client.is_server());
        let value = client.get("world_size", Duration::from_secs(5)).unwrap();
        assert_eq!(value, 4u64.to_le_bytes());
    }

    #[test]
    fn test_get_blocks_until_published() {
        let port = free_port();
        let server = TcpStore::serve("127.0.0.1", port).unwrap();
        let client = TcpStore::client(format!("127.0.0.1:{port}"));

        let publisher = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            server.set("late", b"value").unwrap();
            server
        });
        let value = client.get("late", Duration::from_secs(5)).unwrap();
        assert_eq!(value, b"value");
        publisher.join().unwrap();
    }

    #[test]
    fn test_missing_key_times_out() {
        let port = free_port();
        let store = TcpStore::serve("127.0.0.1", port).unwrap();
        let err = store.get("never", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, Error::Rendezvous { .. }));
    }
}
