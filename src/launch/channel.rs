//! Frame-oriented writer over the socket shared with the helper. Every
//! payload is one JSON document terminated by a single NUL byte; the
//! helper consumes frames in arrival order, the spec always first.

use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::socket::{self, MsgFlags};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to encode payload for the helper")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write frame to the helper socket")]
    Write(#[source] nix::Error),
    #[error("helper socket accepts no more data")]
    Closed,
    #[error("failed to wait for the helper socket to drain")]
    Poll(#[source] nix::Error),
}

type Result<T> = std::result::Result<T, ChannelError>;

#[derive(Debug)]
pub struct SpecChannel {
    socket: OwnedFd,
}

impl SpecChannel {
    pub fn new(socket: OwnedFd) -> Self {
        Self { socket }
    }

    /// Serialize `payload` and write it as one `<json>\0` frame. The
    /// caller holds a unique reference, which keeps frames of concurrent
    /// writers from interleaving by construction.
    pub fn send<T: Serialize>(&mut self, payload: &T) -> Result<()> {
        let mut frame = serde_json::to_vec(payload)?;
        frame.push(0);
        self.write_all(&frame)
    }

    /// Write the whole buffer, retrying on `EINTR` and short writes and
    /// polling when the kernel buffer of the non-blocking socket is full.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match socket::send(self.socket.as_raw_fd(), buf, MsgFlags::MSG_NOSIGNAL) {
                Ok(0) => return Err(ChannelError::Closed),
                Ok(written) => buf = &buf[written..],
                Err(Errno::EINTR) => continue,
                Err(Errno::EAGAIN) => self.wait_writable()?,
                Err(err) => return Err(ChannelError::Write(err)),
            }
        }
        Ok(())
    }

    fn wait_writable(&self) -> Result<()> {
        let mut fds = [PollFd::new(self.socket.as_fd(), PollFlags::POLLOUT)];
        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) | Err(Errno::EINTR) => Ok(()),
            Err(err) => Err(ChannelError::Poll(err)),
        }
    }
}
