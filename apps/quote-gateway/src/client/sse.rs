//! Incremental server-sent events parser.
//!
//! Feeds arbitrary byte chunks and yields complete frames. Comment lines
//! (leading `:`) are keep-alives and are dropped; `event:` names the next
//! frame; `data:` lines accumulate and dispatch on the blank line.

/// One parsed SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name, when the frame carried an `event:` field.
    pub event: Option<String>,
    /// Concatenated data payload.
    pub data: String,
}

/// Streaming SSE frame parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl SseParser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame completed by it.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the payloads are
    /// JSON and a mangled frame surfaces as a parse failure downstream.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(frame) = self.take_line(line.trim_end_matches(['\n', '\r'])) {
                frames.push(frame);
            }
        }
        frames
    }

    fn take_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            // Dispatch boundary.
            if self.data_lines.is_empty() {
                self.event = None;
                return None;
            }
            let frame = SseFrame {
                event: self.event.take(),
                data: self.data_lines.join("\n"),
            };
            self.data_lines.clear();
            return Some(frame);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line
            .split_once(':')
            .map_or((line, ""), |(f, v)| (f, v.strip_prefix(' ').unwrap_or(v)));

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_data_frame() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: {\"price\":1.0}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, None);
        assert_eq!(frames[0].data, "{\"price\":1.0}");
    }

    #[test]
    fn parses_named_events() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: connected\ndata: {\"status\":\"connected\"}\n\n");
        assert_eq!(frames[0].event.as_deref(), Some("connected"));
    }

    #[test]
    fn comments_are_dropped() {
        let mut parser = SseParser::new();
        assert!(parser.push(b":keepalive\n\n").is_empty());
    }

    #[test]
    fn frames_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: {\"pri").is_empty());
        assert!(parser.push(b"ce\":2.0}\n").is_empty());
        let frames = parser.push(b"\n");
        assert_eq!(frames[0].data, "{\"price\":2.0}");
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: a\n\ndata: b\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "a");
        assert_eq!(frames[1].data, "b");
    }

    #[test]
    fn multi_line_data_joins_with_newline() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: a\ndata: b\n\n");
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn crlf_lines_are_handled() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: x\r\n\r\n");
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn event_name_resets_between_frames() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: error\ndata: e\n\ndata: q\n\n");
        assert_eq!(frames[0].event.as_deref(), Some("error"));
        assert_eq!(frames[1].event, None);
    }
}
