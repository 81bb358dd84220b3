use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{LinkError, Result};
use crate::traits::Datagram;

/// Unix datagram socket carrying link units.
///
/// Datagram sockets keep unit boundaries, which is what the fragmenting link
/// needs from its lower channel. A bound socket removes its path on drop.
#[derive(Debug)]
pub struct UnixDatagramChannel {
    socket: UnixDatagram,
    bound: Option<BoundPath>,
}

#[derive(Debug)]
struct BoundPath {
    path: PathBuf,
    dev: u64,
    ino: u64,
}

impl UnixDatagramChannel {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// An unnamed, connected pair of sockets.
    pub fn pair() -> Result<(Self, Self)> {
        let (a, b) = UnixDatagram::pair()?;
        Ok((Self::from_socket(a), Self::from_socket(b)))
    }

    /// An unnamed socket, to be pointed at a bound one with
    /// [`connect`](Self::connect).
    pub fn unbound() -> Result<Self> {
        Ok(Self::from_socket(UnixDatagram::unbound()?))
    }

    fn from_socket(socket: UnixDatagram) -> Self {
        Self {
            socket,
            bound: None,
        }
    }

    /// Bind to a filesystem path.
    ///
    /// A stale socket at `path` is removed first; any other kind of file is
    /// left alone and reported as a bind error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bind_err = |path: &PathBuf, source: io::Error| LinkError::Bind {
            path: path.clone(),
            source,
        };

        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(LinkError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| bind_err(&path, e))?;
            if !metadata.file_type().is_socket() {
                return Err(bind_err(
                    &path,
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                ));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(|e| bind_err(&path, e))?;
        }

        let socket = UnixDatagram::bind(&path).map_err(|e| bind_err(&path, e))?;
        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(|e| bind_err(&path, e))?;
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| bind_err(&path, e))?;

        info!(?path, "bound unix datagram socket");
        Ok(Self {
            socket,
            bound: Some(BoundPath {
                path,
                dev: metadata.dev(),
                ino: metadata.ino(),
            }),
        })
    }

    /// Fix the peer address for subsequent sends and receives.
    pub fn connect(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.socket
            .connect(path)
            .map_err(|source| LinkError::Connect {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, "connected unix datagram socket");
        Ok(())
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_write_timeout(timeout).map_err(Into::into)
    }

    /// The path this socket is bound to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.bound.as_ref().map(|bound| bound.path.as_path())
    }
}

impl Datagram for UnixDatagramChannel {
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(unit)?;
        if sent != unit.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram send ({sent} of {} bytes)", unit.len()),
            ));
        }
        Ok(())
    }

    fn recv_unit(&mut self, max_len: usize) -> io::Result<Bytes> {
        let mut buf = vec![0u8; max_len];
        let received = self.socket.recv(&mut buf)?;
        buf.truncate(received);
        Ok(Bytes::from(buf))
    }
}

impl Drop for UnixDatagramChannel {
    fn drop(&mut self) {
        let Some(bound) = &self.bound else {
            return;
        };
        match std::fs::symlink_metadata(&bound.path) {
            Ok(metadata)
                if metadata.file_type().is_socket()
                    && metadata.dev() == bound.dev
                    && metadata.ino() == bound.ino =>
            {
                debug!(path = ?bound.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&bound.path);
            }
            Ok(_) => debug!(path = ?bound.path, "socket path identity changed; skipping cleanup"),
            Err(_) => {}
        }
    }
}
