// Incremental server-sent-events framing over a chunked byte stream
use bytes::{Buf, BytesMut};

/// One complete SSE frame: the event name and its joined data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Accumulates transport chunks and yields complete frames.
///
/// Frames are terminated by a blank line; `data:` fields spanning
/// multiple lines are joined with newlines. Comment lines and unknown
/// fields are skipped.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: BytesMut,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk, returning every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(frame_end) = find_frame_end(&self.buffer) {
            let frame = self.buffer.split_to(frame_end.frame_len);
            self.buffer.advance(frame_end.separator_len);
            if let Some(event) = parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }
}

struct FrameEnd {
    frame_len: usize,
    separator_len: usize,
}

/// Locate the first blank-line separator ("\n\n" or "\r\n\r\n").
fn find_frame_end(buffer: &[u8]) -> Option<FrameEnd> {
    let mut candidate: Option<FrameEnd> = None;
    if let Some(pos) = find_subslice(buffer, b"\n\n") {
        candidate = Some(FrameEnd {
            frame_len: pos,
            separator_len: 2,
        });
    }
    if let Some(pos) = find_subslice(buffer, b"\r\n\r\n") {
        let crlf = FrameEnd {
            frame_len: pos,
            separator_len: 4,
        };
        candidate = match candidate {
            Some(lf) if lf.frame_len < crlf.frame_len => Some(lf),
            _ => Some(crlf),
        };
    }
    candidate
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_frame(frame: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(frame);
    let mut event = String::new();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("event:") {
            event = value.trim_start().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if event.is_empty() && data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: put\ndata: {\"path\":\"/\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "put");
        assert_eq!(events[0].data, "{\"path\":\"/\"}");
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: pu").is_empty());
        assert!(parser.push(b"t\ndata: 1").is_empty());
        let events = parser.push(b"23\n\nevent: keep-alive\ndata: null\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "123");
        assert_eq!(events[1].event, "keep-alive");
    }

    #[test]
    fn test_crlf_frames() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: put\r\ndata: 1\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "1");
    }

    #[test]
    fn test_multi_line_data_joined() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: put\ndata: line1\ndata: line2\n\n");
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn test_comments_and_unknown_fields_skipped() {
        let mut parser = SseParser::new();
        let events = parser.push(b": heartbeat\nid: 7\nevent: put\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "put");
        assert_eq!(events[0].data, "x");
    }
}
