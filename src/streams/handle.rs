//! Stream handles held by the bundle
//!
//! Each handle is either a real process stream, an in-memory buffer, or (for
//! output) the write end of a pager pipe.

use std::io::{self, Read, Write};
use std::process::ChildStdin;

use super::buffer::SharedBuffer;
use crate::tty;

/// Raw OS handle type for a stream
#[cfg(unix)]
pub type RawStreamHandle = std::os::fd::RawFd;
#[cfg(windows)]
pub type RawStreamHandle = std::os::windows::io::RawHandle;

/// Readable side of the bundle
#[derive(Debug)]
pub enum InputStream {
    Stdin(io::Stdin),
    Buffer(SharedBuffer),
    /// Released after being read to completion
    Closed,
}

impl InputStream {
    /// Whether the handle is a terminal; buffers never are
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Stdin(stdin) => tty::is_terminal(stdin),
            Self::Buffer(_) | Self::Closed => false,
        }
    }

    /// Release the handle. In-memory input stays readable.
    pub fn close(&mut self) {
        if matches!(self, Self::Stdin(_)) {
            *self = Self::Closed;
        }
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stdin(stdin) => stdin.read(buf),
            Self::Buffer(buffer) => buffer.read(buf),
            Self::Closed => Ok(0),
        }
    }
}

/// Writable side of the bundle (output and error output)
#[derive(Debug)]
pub enum OutputStream {
    Stdout(io::Stdout),
    Stderr(io::Stderr),
    Buffer(SharedBuffer),
    /// Input pipe of a running pager
    Pager(ChildStdin),
    /// Pager pipe after the pager was stopped
    Closed,
}

impl OutputStream {
    /// Whether the handle is a terminal; buffers and pipes never are
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Stdout(stdout) => tty::is_terminal(stdout),
            Self::Stderr(stderr) => tty::is_terminal(stderr),
            Self::Buffer(_) | Self::Pager(_) | Self::Closed => false,
        }
    }

    /// Second handle to the same destination, when the destination is shareable
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            Self::Stdout(_) => Some(Self::Stdout(io::stdout())),
            Self::Stderr(_) => Some(Self::Stderr(io::stderr())),
            Self::Buffer(buffer) => Some(Self::Buffer(buffer.clone())),
            Self::Pager(_) | Self::Closed => None,
        }
    }

    /// Raw OS handle for process streams
    #[cfg(unix)]
    pub fn raw_handle(&self) -> Option<RawStreamHandle> {
        use std::os::fd::AsRawFd;

        match self {
            Self::Stdout(stdout) => Some(stdout.as_raw_fd()),
            Self::Stderr(stderr) => Some(stderr.as_raw_fd()),
            Self::Buffer(_) | Self::Pager(_) | Self::Closed => None,
        }
    }

    /// Raw OS handle for process streams
    #[cfg(windows)]
    pub fn raw_handle(&self) -> Option<RawStreamHandle> {
        use std::os::windows::io::AsRawHandle;

        match self {
            Self::Stdout(stdout) => Some(stdout.as_raw_handle()),
            Self::Stderr(stderr) => Some(stderr.as_raw_handle()),
            Self::Buffer(_) | Self::Pager(_) | Self::Closed => None,
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(stdout) => stdout.write(buf),
            Self::Stderr(stderr) => stderr.write(buf),
            Self::Buffer(buffer) => buffer.write(buf),
            Self::Pager(pipe) => pipe.write(buf),
            Self::Closed => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "output stream closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(stdout) => stdout.flush(),
            Self::Stderr(stderr) => stderr.flush(),
            Self::Buffer(buffer) => buffer.flush(),
            Self::Pager(pipe) => pipe.flush(),
            Self::Closed => Ok(()),
        }
    }
}
