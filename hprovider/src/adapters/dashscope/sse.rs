//! Byte-buffered decoder for DashScope server-sent events.
//!
//! DashScope frames look like:
//!
//! ```text
//! id:1
//! event:result
//! :HTTP_STATUS/200
//! data:{"output":{...},"request_id":"..."}
//!
//! ```
//!
//! ```rust
//! use hprovider::adapters::dashscope::SseDecoder;
//!
//! let mut decoder = SseDecoder::new();
//! let first = decoder.push(b"id:1\nevent:result\n:HTTP_STATUS/200\ndata:{\"a\"").expect("utf8");
//! assert!(first.is_empty());
//!
//! let frames = decoder.push(b":1}\n\n").expect("utf8");
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].status, Some(200));
//! assert_eq!(frames[0].data, "{\"a\":1}");
//! ```

use crate::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub id: Option<String>,
    pub event: Option<String>,
    pub status: Option<u16>,
    pub data: String,
}

impl SseFrame {
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.event.is_none() && self.status.is_none() && self.data.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending: SseFrame,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every frame completed by them. Lines are
    /// only decoded once complete, so multi-byte characters may be split
    /// across chunks.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseFrame>, ProviderError> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.drain(..=newline).collect::<Vec<_>>();
            let line = std::str::from_utf8(&line)
                .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in stream: {err}")))?;
            let line = line.trim_end_matches(['\r', '\n']);

            if line.is_empty() {
                if !self.pending.is_empty() {
                    frames.push(std::mem::take(&mut self.pending));
                }
                continue;
            }

            self.apply_line(line);
        }

        Ok(frames)
    }

    /// Flushes a trailing frame that was not terminated by a blank line.
    pub fn finish(&mut self) -> Result<Option<SseFrame>, ProviderError> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = std::str::from_utf8(&rest)
                .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in stream: {err}")))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                self.apply_line(line);
            }
        }

        if self.pending.is_empty() {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.pending)))
        }
    }

    fn apply_line(&mut self, line: &str) {
        if let Some(comment) = line.strip_prefix(':') {
            if let Some(status) = comment.trim().strip_prefix("HTTP_STATUS/") {
                self.pending.status = status.trim().parse().ok();
            }
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "id" => self.pending.id = Some(value.to_string()),
            "event" => self.pending.event = Some(value.to_string()),
            "data" => {
                if !self.pending.data.is_empty() {
                    self.pending.data.push('\n');
                }
                self.pending.data.push_str(value);
            }
            _ => {}
        }
    }
}
