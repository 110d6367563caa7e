use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{write_frame, EndpointInfo, LineAccumulator, Transport};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Device link over a Unix domain socket.
///
/// Used to reach a firmware simulator, or a bridge daemon that owns the
/// real USB device. One line per transfer, like the bulk endpoints.
pub struct SocketTransport {
    stream: Option<UnixStream>,
    lines: LineAccumulator,
    endpoints: EndpointInfo,
    peer: String,
}

impl SocketTransport {
    /// Connect to a listening device socket (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Open {
            target: path.display().to_string(),
            source: e,
        })?;
        debug!(?path, "connected to device socket");
        Ok(Self::from_stream(stream, path.display().to_string()))
    }

    fn from_stream(stream: UnixStream, peer: String) -> Self {
        Self {
            stream: Some(stream),
            lines: LineAccumulator::new(),
            endpoints: EndpointInfo::default(),
            peer,
        }
    }

    /// Override the reported endpoint info (e.g. a smaller MTU).
    pub fn with_endpoints(mut self, endpoints: EndpointInfo) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Socket path or peer label of this link.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn stream_mut(&mut self) -> Result<&mut UnixStream> {
        self.stream.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for SocketTransport {
    fn endpoints(&self) -> EndpointInfo {
        self.endpoints
    }

    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream_mut()?;
        stream
            .set_write_timeout(Some(timeout.max(Duration::from_millis(1))))
            .map_err(TransportError::Io)?;
        write_frame(stream, frame, timeout)
    }

    fn receive(&mut self, max_len: usize, timeout: Duration) -> Result<Bytes> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
        self.lines.read_line(stream, max_len, timeout, |s, remaining| {
            s.set_read_timeout(Some(remaining)).map_err(TransportError::Io)
        })
    }

    fn discard_input(&mut self) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
        stream.set_nonblocking(true).map_err(TransportError::Io)?;
        let dropped = self.lines.discard(&mut *stream);
        stream.set_nonblocking(false).map_err(TransportError::Io)?;
        dropped
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            debug!(peer = %self.peer, "device socket closed");
        }
    }

    fn transport_name(&self) -> &'static str {
        "unix-socket"
    }
}

impl std::fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketTransport")
            .field("peer", &self.peer)
            .field("open", &self.stream.is_some())
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// Listening side of a device socket.
///
/// The simulator binds one of these and answers each accepted link.
/// The socket file is removed on drop, but only while it is still the
/// file this listener created.
pub struct DeviceSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl DeviceSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// `sockaddr_un.sun_path` capacity.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on `path`, replacing a stale socket file.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |path: &Path, source: std::io::Error| TransportError::Bind {
            path: path.to_path_buf(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(
                    &path,
                    std::io::Error::new(
                        ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                ));
            }
            debug!(?path, "removing stale device socket");
            std::fs::remove_file(&path).map_err(|e| bind_err(&path, e))?;
        }

        let listener = UnixListener::bind(&path).map_err(|e| bind_err(&path, e))?;
        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(|e| bind_err(&path, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| bind_err(&path, e))?;

        let created = std::fs::symlink_metadata(&path).map_err(|e| bind_err(&path, e))?;
        info!(?path, "device socket listening");

        Ok(Self {
            listener,
            path,
            created_inode: Some((created.dev(), created.ino())),
        })
    }

    /// Wait up to `timeout` for a link. Returns `Ok(None)` when none arrived.
    pub fn accept_timeout(&self, timeout: Duration) -> Result<Option<SocketTransport>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).map_err(TransportError::Accept)?;
                    debug!(path = ?self.path, "accepted device link");
                    return Ok(Some(SocketTransport::from_stream(
                        stream,
                        self.path.display().to_string(),
                    )));
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeviceSocket {
    fn drop(&mut self) {
        let Some((expected_dev, expected_ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "cleaning up device socket");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}
