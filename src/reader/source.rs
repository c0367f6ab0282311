//! Byte sources that accept pushback.
//!
//! A [`UnitSource`] yields one [`Unit`] at a time and can take recently-read bytes back,
//! so a reader can look ahead by a bounded amount and then change its mind.
//! [`PushbackReader`] provides this over any [`std::io::Read`];
//! decorators like [`CountingSource`] wrap another `UnitSource` and add behavior.

use std::io::{ErrorKind, Read};

use crate::reader::{ReadErr, ReadResult};

/// Pushback capacity used by [`PushbackReader::new`].
/// One unit of lookahead is all the tokenizer needs.
pub const DEFAULT_PUSHBACK: usize = 1;

/// A single element read from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Byte(u8),
    /// The source has no more bytes. Terminal; never pushed back.
    End,
}

impl Unit {
    pub fn is_end(self) -> bool {
        self == Unit::End
    }
}

/// A forward-only source of units, with bounded pushback.
pub trait UnitSource {
    /// Get the next unit: the most recently pushed-back one if any,
    /// otherwise the next byte of the underlying source.
    fn read(&mut self) -> ReadResult<Unit>;

    /// Return a unit to the source, so the next `read` delivers it again.
    ///
    /// Fails with [`ReadErr::PushbackOverflow`] if the pushback buffer is full,
    /// [`ReadErr::PushbackWithoutRead`] if no read is left to undo,
    /// or [`ReadErr::InvalidPushback`] for [`Unit::End`].
    /// A failed call leaves the source unchanged.
    fn unread(&mut self, unit: Unit) -> ReadResult<()>;
}

impl<S> UnitSource for &mut S
where
    S: UnitSource + ?Sized,
{
    fn read(&mut self) -> ReadResult<Unit> {
        (**self).read()
    }

    fn unread(&mut self, unit: Unit) -> ReadResult<()> {
        (**self).unread(unit)
    }
}

/// Adapts a [`Read`] into a [`UnitSource`].
///
/// Reads one byte at a time from the inner reader;
/// wrap unbuffered readers (files, sockets) in a [`std::io::BufReader`] first.
#[derive(Debug)]
pub struct PushbackReader<R> {
    inner: R,
    // Stack: the last element is returned first.
    pushback: Vec<u8>,
    capacity: usize,
    // Units delivered by `read` that may still be pushed back; at most `capacity`.
    returnable: usize,
    exhausted: bool,
}

impl<R: Read> PushbackReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_PUSHBACK)
    }

    /// Create a reader that holds up to `capacity` pushed-back units.
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        assert!(capacity > 0, "pushback capacity must be at least 1");
        PushbackReader {
            inner,
            pushback: Vec::with_capacity(capacity),
            capacity,
            returnable: 0,
            exhausted: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pushed-back units waiting to be read.
    pub fn available(&self) -> usize {
        self.pushback.len()
    }

    /// Push back several bytes at once; the next reads return them in slice order.
    ///
    /// Either all of `bytes` fit, or nothing is pushed back.
    /// Each byte must undo an earlier read.
    pub fn unread_all(&mut self, bytes: &[u8]) -> ReadResult<()> {
        if self.pushback.len() + bytes.len() > self.capacity {
            return Err(ReadErr::PushbackOverflow {
                capacity: self.capacity,
            });
        }
        if bytes.len() > self.returnable {
            return Err(ReadErr::PushbackWithoutRead);
        }
        tracing::trace!(count = bytes.len(), "pushing back bytes");
        self.pushback.extend(bytes.iter().rev());
        self.returnable -= bytes.len();
        Ok(())
    }

    /// Recover the inner reader. Pushed-back units are discarded.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn pull(&mut self) -> ReadResult<Unit> {
        if self.exhausted {
            return Ok(Unit::End);
        }
        let mut byte = 0u8;
        loop {
            match self.inner.read(std::slice::from_mut(&mut byte)) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(Unit::End);
                }
                Ok(_) => return Ok(Unit::Byte(byte)),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadErr::SourceUnavailable(e)),
            }
        }
    }
}

impl<R: Read> UnitSource for PushbackReader<R> {
    fn read(&mut self) -> ReadResult<Unit> {
        let unit = match self.pushback.pop() {
            Some(b) => Unit::Byte(b),
            None => self.pull()?,
        };
        if !unit.is_end() {
            self.returnable = (self.returnable + 1).min(self.capacity);
        }
        Ok(unit)
    }

    fn unread(&mut self, unit: Unit) -> ReadResult<()> {
        let Unit::Byte(b) = unit else {
            return Err(ReadErr::InvalidPushback);
        };
        if self.pushback.len() >= self.capacity {
            return Err(ReadErr::PushbackOverflow {
                capacity: self.capacity,
            });
        }
        if self.returnable == 0 {
            return Err(ReadErr::PushbackWithoutRead);
        }
        tracing::trace!(byte = b, "pushing back byte");
        self.pushback.push(b);
        self.returnable -= 1;
        Ok(())
    }
}

/// Counts the units delivered by another source, net of pushback.
///
/// The count is logged when the source is dropped.
#[derive(Debug)]
pub struct CountingSource<S> {
    inner: S,
    consumed: usize,
}

impl<S: UnitSource> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        CountingSource { inner, consumed: 0 }
    }
}

impl<S> CountingSource<S> {
    /// Bytes read and not pushed back, i.e. the offset of the next byte.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: UnitSource> UnitSource for CountingSource<S> {
    fn read(&mut self) -> ReadResult<Unit> {
        let unit = self.inner.read()?;
        if !unit.is_end() {
            self.consumed += 1;
        }
        Ok(unit)
    }

    fn unread(&mut self, unit: Unit) -> ReadResult<()> {
        self.inner.unread(unit)?;
        self.consumed = self.consumed.saturating_sub(1);
        Ok(())
    }
}

impl<S> Drop for CountingSource<S> {
    fn drop(&mut self) {
        tracing::debug!(consumed = self.consumed, "source closed");
    }
}
