use bytes::BytesMut;
use core::str::Utf8Error;

/// Push based utf8 decoder for response bodies, buffering incomplete multi-byte sequences until the rest of them
/// arrives in a later chunk
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    buffer: BytesMut,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `buffered + bytes` as possible and appends it to `out`. Bytes that could still turn into a
    /// valid character are kept for the next call, anything that never will is an error.
    pub fn push(&mut self, bytes: &[u8], out: &mut String) -> Result<(), Utf8Error> {
        self.buffer.extend_from_slice(bytes);

        match core::str::from_utf8(&self.buffer) {
            Ok(valid) => {
                out.push_str(valid);
                self.buffer.clear();
                Ok(())
            }
            // error_len of None means the input just ended mid-character
            Err(e) if e.error_len().is_none() => {
                let valid = self.buffer.split_to(e.valid_up_to());
                // Safety: valid_up_to bytes were just checked
                out.push_str(unsafe { core::str::from_utf8_unchecked(&valid) });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Call once the body is complete, leftover bytes mean the body ended mid-character
    pub fn finish(&mut self) -> Result<(), Utf8Error> {
        let leftover = self.buffer.split();
        core::str::from_utf8(&leftover).map(|_| ())
    }

    /// Drops anything buffered, used when a new response starts
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
