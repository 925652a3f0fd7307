//! In-memory stream stand-ins
//!
//! A `SharedBuffer` is a cloneable byte buffer: the bundle writes through one
//! clone while a test holds another to inspect or seed the contents.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable in-memory byte buffer
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Copy of everything currently buffered
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Buffered bytes as text, replacing invalid UTF-8
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append bytes without going through `Write`
    pub fn push(&self, data: &[u8]) {
        self.lock().extend_from_slice(data);
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reading consumes from the front, like a pipe
impl Read for SharedBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut bytes = self.lock();
        let n = buf.len().min(bytes.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        bytes.drain(..n);
        Ok(n)
    }
}
