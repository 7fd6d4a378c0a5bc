//! Folds streamed increments into a final `{text, tool_calls}` snapshot.
//!
//! Content follows last-non-null-wins: an increment whose message carries
//! content (even `""`) replaces the text, an absent content leaves it alone.
//! Tool calls follow most-recent-non-empty-wins: the upstream protocol sends
//! the whole accumulated tool-call list on each increment that has one, so a
//! non-empty list replaces the previous one atomically and an empty or
//! absent list never erases it.
//!
//! ```rust
//! use hprovider::{ModelResponse, ResponseMessage, StreamAccumulator};
//!
//! let mut accumulator = StreamAccumulator::new();
//! accumulator.ingest(&ModelResponse::from_message(ResponseMessage::text("Hel")));
//! accumulator.ingest(&ModelResponse::from_message(ResponseMessage::text("Hello")));
//! accumulator.ingest(&ModelResponse::from_message(ResponseMessage::default()));
//!
//! let snapshot = accumulator.finalize();
//! assert_eq!(snapshot.text, "Hello");
//! assert!(snapshot.tool_calls.is_empty());
//! ```

use crate::{ModelResponse, ToolCallRequest};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSnapshot {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl StreamSnapshot {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Accumulator state for exactly one streamed call. Build a fresh one per
/// call; nothing carries over between calls.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    snapshot: StreamSnapshot,
    increments: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, increment: &ModelResponse) {
        self.increments += 1;

        for choice in increment.choices() {
            let Some(message) = &choice.message else {
                continue;
            };

            if let Some(content) = &message.content {
                self.snapshot.text.clone_from(content);
            }

            if let Some(tool_calls) = &message.tool_calls
                && !tool_calls.is_empty()
            {
                self.snapshot.tool_calls.clone_from(tool_calls);
            }
        }
    }

    pub fn increments(&self) -> usize {
        self.increments
    }

    pub fn finalize(self) -> StreamSnapshot {
        self.snapshot
    }
}
