use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Multi-line data is joined with line
/// feeds, comments and the other standard fields are skipped.
pub struct Sse {
    // Bytes of a UTF-8 sequence split across two chunks.
    pending_bytes: Vec<u8>,
    buf: String,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            pending_bytes: Vec::new(),
            buf: String::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // There may already be a complete event in the buffer.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // Abort if no more data available.
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.pending_bytes.extend_from_slice(bytes);
        let valid_up_to = match str::from_utf8(&self.pending_bytes) {
            Ok(s) => s.len(),
            // An incomplete sequence at the end, wait for more data.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.pending_bytes.split_off(valid_up_to);
        let decoded = std::mem::replace(&mut self.pending_bytes, rest);
        let Ok(decoded) = String::from_utf8(decoded) else {
            return Err(Error::InvalidPayload);
        };

        self.buf.push_str(&decoded);
        // The Gemini endpoint terminates lines with CRLF.
        if self.buf.contains('\r') {
            self.buf = self.buf.replace("\r\n", "\n");
        }
        Ok(())
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        while let Some(eol_idx) = self.buf.find("\n\n") {
            let block: String = self.buf.drain(0..eol_idx + 2).collect();

            let mut data: Option<String> = None;
            for line in block[..eol_idx].lines() {
                if line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match name {
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    "event" | "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}
