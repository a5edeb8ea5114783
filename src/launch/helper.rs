//! Spawning the container helper: socket pair, fork, exec, reaping.

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::{kill, raise, Signal};
use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use super::channel::SpecChannel;
use crate::error::{Error, Result};
use crate::spec::Runtime;

pub const DEFAULT_HELPER_PATH: &str = "/usr/bin/ll-box";

/// A running helper process and the retained channel to it.
#[derive(Debug)]
pub struct Helper {
    pub pid: Pid,
    pub channel: SpecChannel,
}

/// Fork the helper and stream the spec to it. The helper receives the
/// child side of the socket pair as its sole argument and reads the spec
/// frame from it; the parent keeps the other side for exec injection.
pub fn spawn(helper_path: &Path, spec: &Runtime) -> Result<Helper> {
    if !helper_path.is_file() {
        return Err(Error::HelperExec(helper_path.to_owned()));
    }

    let (child_socket, parent_socket) = socketpair(
        AddressFamily::Unix,
        SockType::Stream,
        None,
        SockFlag::SOCK_NONBLOCK,
    )
    .map_err(Error::SocketSetup)?;

    let launcher_pid = unistd::getpid();

    match unsafe { unistd::fork() }.map_err(Error::Fork)? {
        ForkResult::Parent { child } => {
            drop(child_socket);
            tracing::debug!(helper = ?helper_path, pid = %child, "helper forked");

            let mut channel = SpecChannel::new(parent_socket);
            if let Err(err) = channel.send(spec) {
                // the run is already lost, do not leak the helper
                let _ = kill(child, Signal::SIGKILL);
                let _ = waitpid(child, None);
                return Err(err.into());
            }
            Ok(Helper {
                pid: child,
                channel,
            })
        }
        ForkResult::Child => {
            // die with the launcher instead of reparenting; the pid check
            // closes the race of the parent exiting before prctl ran
            let _ = prctl::set_death_signal(libc::SIGKILL as isize);
            if unistd::getppid() != launcher_pid {
                let _ = raise(Signal::SIGKILL);
            }
            drop(parent_socket);

            // only the launcher side stays non-blocking; the helper gets
            // a descriptor it can block on
            let _ = fcntl(child_socket.as_raw_fd(), FcntlArg::F_SETFL(OFlag::empty()));

            let code = match exec_helper(helper_path, &child_socket) {
                Err(errno) => {
                    tracing::error!(helper = ?helper_path, %errno, "failed to exec helper");
                    127
                }
                Ok(infallible) => match infallible {},
            };
            unsafe { libc::_exit(code) }
        }
    }
}

fn exec_helper(
    helper_path: &Path,
    socket: &OwnedFd,
) -> nix::Result<std::convert::Infallible> {
    let helper =
        CString::new(helper_path.as_os_str().as_bytes()).map_err(|_| Errno::EINVAL)?;
    let socket_arg =
        CString::new(socket.as_raw_fd().to_string()).map_err(|_| Errno::EINVAL)?;
    unistd::execvp(&helper, &[helper.clone(), socket_arg])
}

/// Wait until the helper exits, retrying on `EINTR`. A signal death maps
/// to the conventional `128 + signo` code.
pub fn wait(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(Error::Wait(err)),
        }
    }
}

/// Ask the helper to shut down, then reap it. A helper that is already
/// gone is not an error.
pub fn terminate(pid: Pid) -> Result<i32> {
    match kill(pid, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => return Err(Error::Wait(err)),
    }
    wait(pid)
}
