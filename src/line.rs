//! Line Assembly
//!
//! Collects transport bytes into newline-terminated commands. The buffer is a
//! fixed ring of [`LINE_CAPACITY`] bytes: a peer that never sends a terminator
//! cannot grow it, and once it is full each new byte evicts the oldest one, so
//! the line finally delivered is the most recent 200 bytes.

/// Maximum retained bytes of a pending line
pub const LINE_CAPACITY: usize = 200;

/// Newline-delimited command assembler
#[derive(Debug, Clone)]
pub struct LineAssembler {
    buf: [u8; LINE_CAPACITY],
    /// Index of the oldest byte
    head: usize,
    len: usize,
    dropped: usize,
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        LineAssembler {
            buf: [0; LINE_CAPACITY],
            head: 0,
            len: 0,
            dropped: 0,
        }
    }

    /// Feed one byte.
    ///
    /// Returns the completed line when `byte` is `\n` and the buffer is not
    /// empty. `\r` is ignored.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' => None,
            b'\n' => self.take_line(),
            _ => {
                self.append(byte);
                None
            }
        }
    }

    /// Bytes currently buffered
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no bytes are buffered
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes evicted from the current line because it overflowed
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Discard the pending line
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.dropped = 0;
    }

    fn append(&mut self, byte: u8) {
        if self.len < LINE_CAPACITY {
            self.buf[(self.head + self.len) % LINE_CAPACITY] = byte;
            self.len += 1;
        } else {
            // Full: overwrite the oldest byte and move the start forward
            self.buf[self.head] = byte;
            self.head = (self.head + 1) % LINE_CAPACITY;
            self.dropped += 1;
        }
    }

    fn take_line(&mut self) -> Option<String> {
        if self.len == 0 {
            return None;
        }

        let end = self.head + self.len;
        let bytes: Vec<u8> = if end <= LINE_CAPACITY {
            self.buf[self.head..end].to_vec()
        } else {
            let mut bytes = self.buf[self.head..].to_vec();
            bytes.extend_from_slice(&self.buf[..end - LINE_CAPACITY]);
            bytes
        };

        if self.dropped > 0 {
            tracing::debug!(dropped = self.dropped, "overlong line truncated");
        }
        self.clear();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
