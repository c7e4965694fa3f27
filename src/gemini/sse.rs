//! Incremental Server-Sent Events decoding for `alt=sse` responses.

/// Accumulates raw bytes and yields the `data:` payload of each complete event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes from the network and returns every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        // hold back an incomplete UTF-8 tail until the next read
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) => e.valid_up_to(),
        };
        let tail = self.pending.split_off(valid_up_to);
        let mut text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        // a trailing CR may be the first half of a CRLF split across reads
        if self.pending.is_empty() && text.ends_with('\r') {
            text.pop();
            self.pending.push(b'\r');
        }
        self.buffer
            .push_str(&text.replace("\r\n", "\n").replace('\r', "\n"));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            if let Some(data) = Self::event_data(&block) {
                events.push(data);
            }
        }
        events
    }

    /// Flushes a final event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        Self::event_data(&rest)
    }

    fn event_data(block: &str) -> Option<String> {
        let data: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|d| d.strip_prefix(' ').unwrap_or(d))
            .collect();
        if data.is_empty() {
            None
        } else {
            Some(data.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_events_across_reads() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        let events = decoder.push(b"1}\r\n\r\ndata: {\"b\":2}\n\n: keep-alive\n\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn crlf_separator_split_across_reads() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":1}\r\n\r").is_empty());
        let events = decoder.push(b"\ndata: {\"b\":2}\r\n\r\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn every_read_boundary_yields_the_same_events() {
        let stream = b"data: {\"a\":1}\r\n\r\ndata: {\"b\":2}\r\n\r\ndata: {\"c\":3}\r\n\r\n";
        for cut in 1..stream.len() {
            let mut decoder = SseDecoder::new();
            let mut events = decoder.push(&stream[..cut]);
            events.extend(decoder.push(&stream[cut..]));
            assert_eq!(events.len(), 3, "cut at {}", cut);
            assert_eq!(events[2], "{\"c\":3}");
        }
    }

    #[test]
    fn bare_cr_line_endings_are_accepted() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: one\r\rdata: two\r\r");
        assert_eq!(events, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn holds_split_utf8_sequences() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: é\n\n".as_bytes();
        // "é" is two bytes; cut between them
        let cut = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(decoder.push(&bytes[..cut]).is_empty());
        assert_eq!(decoder.push(&bytes[cut..]), vec!["é".to_string()]);
    }

    #[test]
    fn finish_returns_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: last").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("last"));
    }
}
