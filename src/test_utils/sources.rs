use std::{
    cell::Cell,
    io::{Cursor, Error, ErrorKind, Read, Result},
    rc::Rc,
};

/// Source that hands out at most `max_read` bytes per call, and reports `Interrupted` before
/// every other read, like a slow pipe.
pub struct TrickleSource {
    inner: Cursor<Vec<u8>>,
    max_read: usize,
    interrupt_next: bool,
}

impl TrickleSource {
    pub fn new(bytes: Vec<u8>, max_read: usize) -> Self {
        TrickleSource {
            inner: Cursor::new(bytes),
            max_read,
            interrupt_next: true,
        }
    }
}

impl Read for TrickleSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.interrupt_next = !self.interrupt_next;
        if !self.interrupt_next {
            return Err(Error::from(ErrorKind::Interrupted));
        }
        let len = buf.len().min(self.max_read);
        self.inner.read(&mut buf[..len])
    }
}

/// Source that yields `bytes` and then fails with `kind` instead of reporting end-of-data.
pub struct FailingSource {
    inner: Cursor<Vec<u8>>,
    kind: ErrorKind,
}

impl FailingSource {
    pub fn new(bytes: Vec<u8>, kind: ErrorKind) -> Self {
        FailingSource {
            inner: Cursor::new(bytes),
            kind,
        }
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.inner.read(buf)? {
            0 => Err(Error::new(self.kind, "source failed")),
            n => Ok(n),
        }
    }
}

/// Source that records when it has been dropped, standing in for a file handle.
pub struct TrackedSource {
    inner: Cursor<Vec<u8>>,
    released: Rc<Cell<usize>>,
}

impl TrackedSource {
    /// Returns the source and a counter of how many times it has been released.
    pub fn new(bytes: Vec<u8>) -> (Self, Rc<Cell<usize>>) {
        let released = Rc::new(Cell::new(0));
        (
            TrackedSource {
                inner: Cursor::new(bytes),
                released: released.clone(),
            },
            released,
        )
    }
}

impl Read for TrackedSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}
