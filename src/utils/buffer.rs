//! Growable byte buffers
//!
//! Both the reply accumulator and the wildcard match collector append only,
//! and double their logical limit when an append would not fit. Growth never
//! touches bytes already stored; a failed allocation is reported as
//! `ClientError::OutOfMemory` and leaves the buffer as it was.

use std::borrow::Cow;

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl GrowableBuffer {
    pub fn with_limit(initial: usize) -> Self {
        let limit = initial.max(1);
        Self {
            data: Vec::with_capacity(limit),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current logical capacity
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Room left before the next growth
    pub fn remaining(&self) -> usize {
        self.limit - self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drops the content, keeps the grown limit.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Doubles the limit.
    pub fn grow(&mut self) -> Result<(), ClientError> {
        let new_limit = self
            .limit
            .checked_mul(2)
            .ok_or(ClientError::OutOfMemory)?;
        self.data
            .try_reserve(new_limit - self.data.len())
            .map_err(|_| ClientError::OutOfMemory)?;
        self.limit = new_limit;
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<(), ClientError> {
        self.extend_from_slice(&[byte])
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        while self.remaining() < bytes.len() {
            self.grow()?;
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Direct access for readers that append in place; callers must stay
    /// within [`remaining`](Self::remaining).
    pub(crate) fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }
}

/// NUL-separated list of names filled from a listing
#[derive(Debug, Clone)]
pub struct MatchBuffer {
    buf: GrowableBuffer,
    count: usize,
}

impl MatchBuffer {
    pub fn with_limit(initial: usize) -> Self {
        Self {
            buf: GrowableBuffer::with_limit(initial),
            count: 0,
        }
    }

    /// Appends one listing line, stripped of its line terminator.
    pub fn push(&mut self, line: &[u8]) -> Result<(), ClientError> {
        let mut end = line.len();
        while end > 0 && matches!(line[end - 1], b'\r' | b'\n') {
            end -= 1;
        }
        let name = &line[..end];
        while self.buf.remaining() < name.len() + 1 {
            self.buf.grow()?;
        }
        self.buf.extend_from_slice(name)?;
        self.buf.push(0)?;
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.buf
            .as_slice()
            .split(|b| *b == 0)
            .take(self.count)
            .map(String::from_utf8_lossy)
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(Cow::into_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_keeps_content_in_order() {
        let mut buf = GrowableBuffer::with_limit(4);
        let mut expected = Vec::new();
        for i in 0..200u8 {
            let chunk = vec![i; (i % 7) as usize + 1];
            buf.extend_from_slice(&chunk).unwrap();
            expected.extend_from_slice(&chunk);
            assert_eq!(buf.as_slice(), expected.as_slice());
        }
        assert!(buf.limit() >= expected.len());
        assert!(buf.limit().is_power_of_two());
    }

    #[test]
    fn test_clear_keeps_limit() {
        let mut buf = GrowableBuffer::with_limit(2);
        buf.extend_from_slice(b"hello").unwrap();
        let limit = buf.limit();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.limit(), limit);
        assert_eq!(buf.remaining(), limit);
    }

    #[test]
    fn test_match_buffer_strips_terminators() {
        let mut names = MatchBuffer::with_limit(4);
        names.push(b"a.txt\r\n").unwrap();
        names.push(b"b.txt\r").unwrap();
        names.push(b"long-file-name.tar.gz").unwrap();

        assert_eq!(names.len(), 3);
        assert_eq!(
            names.names(),
            vec!["a.txt", "b.txt", "long-file-name.tar.gz"]
        );
    }

    #[test]
    fn test_empty_match_buffer() {
        let names = MatchBuffer::with_limit(16);
        assert!(names.is_empty());
        assert_eq!(names.iter().count(), 0);
    }
}
