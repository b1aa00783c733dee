//! Outbound byte sinks for the capture stream.
//!
//! The analyzer attaches over a stream transport and the bridge only
//! ever writes to it. Both sinks block without timeout while waiting
//! for the consumer: whether anyone is listening is the operator's
//! concern, not the bridge's.

use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::info;

use crate::error::SinkError;

/// Write-only transport handed to the capture bridge.
pub trait ByteSink {
    /// Block until the downstream consumer attaches.
    fn wait_for_consumer(&mut self) -> Result<(), SinkError>;

    /// Write the whole buffer or fail. A partial write is a failure:
    /// the consumer cannot recover record framing from a truncated
    /// record, so the stream is dead either way.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError>;
}

impl<T: ByteSink + ?Sized> ByteSink for Box<T> {
    fn wait_for_consumer(&mut self) -> Result<(), SinkError> {
        (**self).wait_for_consumer()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        (**self).write_all(bytes)
    }
}

/// TCP sink: bind, then block in accept until the analyzer connects
/// (e.g. `wireshark -k -i TCP@host:port`).
pub struct TcpSink {
    listener: TcpListener,
    stream: Option<TcpStream>,
}

impl TcpSink {
    pub fn open(addr: SocketAddr) -> Result<Self, SinkError> {
        let listener = TcpListener::bind(addr).map_err(SinkError::Open)?;
        Ok(Self {
            listener,
            stream: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SinkError> {
        self.listener.local_addr().map_err(SinkError::Open)
    }
}

impl ByteSink for TcpSink {
    fn wait_for_consumer(&mut self) -> Result<(), SinkError> {
        let (stream, peer) = self.listener.accept().map_err(SinkError::Accept)?;
        info!("analyzer connected from {}", peer);
        self.stream = Some(stream);
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            SinkError::Write(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no consumer attached",
            ))
        })?;
        stream.write_all(bytes).map_err(SinkError::Write)
    }
}

/// Named-pipe sink (unix): creates a FIFO and blocks opening it for
/// write until a reader attaches, which doubles as the handshake
/// (e.g. `wireshark -k -i /tmp/beaconpipe.fifo`).
#[cfg(unix)]
pub use fifo::FifoSink;

#[cfg(unix)]
mod fifo {
    use std::ffi::CString;
    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::os::unix::ffi::OsStrExt;
    use std::path::PathBuf;

    use tracing::info;

    use crate::error::SinkError;

    use super::ByteSink;

    pub struct FifoSink {
        path: PathBuf,
        pipe: Option<File>,
    }

    impl FifoSink {
        /// Create the FIFO node. An already existing FIFO at the path is
        /// reused.
        pub fn open(path: PathBuf) -> Result<Self, SinkError> {
            let cpath = CString::new(path.as_os_str().as_bytes())
                .map_err(|e| SinkError::Open(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;
            let rc = unsafe { libc::mkfifo(cpath.as_ptr(), 0o644) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::EEXIST) {
                    return Err(SinkError::Open(err));
                }
            }
            Ok(Self { path, pipe: None })
        }
    }

    impl ByteSink for FifoSink {
        fn wait_for_consumer(&mut self) -> Result<(), SinkError> {
            info!("waiting for analyzer on pipe {:?}", self.path);
            // Opening a FIFO for write blocks until a reader opens it.
            let pipe = OpenOptions::new()
                .write(true)
                .open(&self.path)
                .map_err(SinkError::Accept)?;
            info!("analyzer attached to {:?}", self.path);
            self.pipe = Some(pipe);
            Ok(())
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
            let pipe = self.pipe.as_mut().ok_or_else(|| {
                SinkError::Write(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "no consumer attached",
                ))
            })?;
            pipe.write_all(bytes).map_err(SinkError::Write)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::{IpAddr, Ipv4Addr};

    mod tcp_tests {
        use super::*;

        #[test]
        fn accepts_consumer_and_delivers_bytes() {
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
            let mut sink = TcpSink::open(addr).unwrap();
            let bound = sink.local_addr().unwrap();

            let reader = std::thread::spawn(move || {
                let mut stream = TcpStream::connect(bound).unwrap();
                let mut received = Vec::new();
                stream.read_to_end(&mut received).unwrap();
                received
            });

            sink.wait_for_consumer().unwrap();
            sink.write_all(b"beacon").unwrap();
            drop(sink);

            assert_eq!(reader.join().unwrap(), b"beacon");
        }

        #[test]
        fn write_before_handshake_fails() {
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
            let mut sink = TcpSink::open(addr).unwrap();
            assert!(matches!(sink.write_all(b"x"), Err(SinkError::Write(_))));
        }
    }
}
