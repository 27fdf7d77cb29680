// SPDX-License-Identifier: GPL-3.0-only

//! X11 display allocation: lock files plus paired Unix listeners.
//!
//! A display number is claimed by exclusively creating `.X<n>-lock` and
//! binding both the abstract and filesystem variants of
//! `<socket_dir>/X<n>`. The directories are parameterized so tests can run
//! against a scratch directory; production uses the conventional paths.

use std::fs;
use std::io::Write;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::PathBuf;

use nix::sys::socket::{
    AddressFamily, Backlog, SockFlag, SockType, UnixAddr, bind, listen, socket,
};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_DISPLAYS: i32 = 32;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("no free X11 display in 0..{0}")]
    NoFreeDisplay(i32),
    #[error("failed to create socket directory {path}: {source}")]
    SocketDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where lock files and sockets are created.
#[derive(Debug, Clone)]
pub struct DisplayDirs {
    pub lock_dir: PathBuf,
    pub socket_dir: PathBuf,
}

impl Default for DisplayDirs {
    fn default() -> Self {
        Self {
            lock_dir: PathBuf::from("/tmp"),
            socket_dir: PathBuf::from("/tmp/.X11-unix"),
        }
    }
}

impl DisplayDirs {
    fn lock_path(&self, display: i32) -> PathBuf {
        self.lock_dir.join(format!(".X{display}-lock"))
    }

    fn socket_path(&self, display: i32) -> PathBuf {
        self.socket_dir.join(format!("X{display}"))
    }
}

/// A claimed display: the number plus both listening descriptors
/// (abstract first, filesystem second).
#[derive(Debug)]
pub struct DisplaySockets {
    pub display: i32,
    pub fds: [OwnedFd; 2],
}

fn open_socket(addr: &UnixAddr) -> nix::Result<OwnedFd> {
    let fd = socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::SOCK_CLOEXEC,
        None,
    )?;
    bind(fd.as_raw_fd(), addr)?;
    listen(&fd, Backlog::new(1)?)?;
    Ok(fd)
}

/// Claim the first free display number and listen on its sockets.
pub fn open_display_sockets(dirs: &DisplayDirs) -> Result<DisplaySockets, SocketError> {
    fs::create_dir_all(&dirs.socket_dir).map_err(|source| SocketError::SocketDir {
        path: dirs.socket_dir.clone(),
        source,
    })?;

    for display_num in 0..MAX_DISPLAYS {
        let lock_path = dirs.lock_path(display_num);
        let mut lock = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(lock) => lock,
            // taken (or unreadable); probe the next display
            Err(_) => continue,
        };
        // conventional X lock format: the owning pid, width 10
        let _ = write!(lock, "{:>10}\n", std::process::id());
        drop(lock);

        let socket_path = dirs.socket_path(display_num);
        let name = socket_path.to_string_lossy().into_owned();

        let abstract_fd = match UnixAddr::new_abstract(name.as_bytes())
            .and_then(|addr| open_socket(&addr))
        {
            Ok(fd) => fd,
            Err(err) => {
                warn!(display = display_num, "failed to bind abstract socket: {err}");
                let _ = fs::remove_file(&lock_path);
                continue;
            }
        };

        // a stale socket from a crashed server may still be on disk
        let _ = fs::remove_file(&socket_path);
        let fs_fd = match UnixAddr::new(&socket_path).and_then(|addr| open_socket(&addr)) {
            Ok(fd) => fd,
            Err(err) => {
                warn!(
                    display = display_num,
                    "failed to bind {}: {err}",
                    socket_path.display()
                );
                let _ = fs::remove_file(&lock_path);
                continue;
            }
        };

        debug!(display = display_num, "claimed X11 display");
        return Ok(DisplaySockets {
            display: display_num,
            fds: [abstract_fd, fs_fd],
        });
    }

    Err(SocketError::NoFreeDisplay(MAX_DISPLAYS))
}

/// Remove the lock file and the filesystem socket for a display.
pub fn unlink_display_sockets(dirs: &DisplayDirs, display: i32) {
    let _ = fs::remove_file(dirs.lock_path(display));
    let _ = fs::remove_file(dirs.socket_path(display));
}
