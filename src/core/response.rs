//! Response chunking and outbound delivery
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Character-based line buffering with hard split for long lines, ordered delivery through `MessageSink`
//! - 1.0.0: Initial chunking helpers

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Outbound side of a transport.
///
/// Implementations must deliver messages in the order `send` is awaited.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Maximum characters per message, or `None` when the transport has no cap.
    fn max_message_len(&self) -> Option<usize>;

    async fn send(&self, text: &str) -> Result<()>;

    /// Show a "processing" indicator. Transports without one do nothing.
    async fn typing(&self) -> Result<()> {
        Ok(())
    }
}

/// Split `text` into segments of at most `max_len` characters.
///
/// Lines are accumulated into a buffer (each followed by a newline) until the
/// next line would overflow it. A line that is itself longer than `max_len`
/// is hard-split into `max_len`-character slices that bypass the buffer.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 || text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if current_len + line_len + 1 > max_len && !current.is_empty() {
            chunks.push(finish_segment(std::mem::take(&mut current), max_len));
            current_len = 0;
        }

        if line_len > max_len {
            chunks.extend(split_long_line(line, max_len));
        } else {
            current.push_str(line);
            current.push('\n');
            current_len += line_len + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(finish_segment(current, max_len));
    }

    chunks
}

/// A line of exactly `max_len` characters sits in the buffer with its newline
/// attached; that newline is the only thing that can push a segment over.
fn finish_segment(mut segment: String, max_len: usize) -> String {
    if segment.chars().count() > max_len && segment.ends_with('\n') {
        segment.pop();
    }
    segment
}

/// Split a single line into consecutive `max_len`-character slices
fn split_long_line(line: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_len)
        .map(|slice| slice.iter().collect())
        .collect()
}

/// Send `text` through `sink`, chunked to the sink's length cap.
///
/// Segments are sent strictly one after another. Empty segments and a lone
/// trailing newline left by buffering are skipped since chat platforms reject
/// empty messages. Returns the number of messages sent.
pub async fn deliver(sink: &dyn MessageSink, text: &str) -> Result<usize> {
    let segments = match sink.max_message_len() {
        Some(max_len) => chunk_text(text, max_len),
        None => vec![text.to_string()],
    };

    let total = segments.len();
    let mut sent = 0;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() || (i + 1 == total && segment == "\n") {
            continue;
        }
        debug!("📤 Sending segment {} of {} ({} chars)", i + 1, total, segment.chars().count());
        sink.send(segment).await?;
        sent += 1;
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        max_len: Option<usize>,
        sent: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl RecordingSink {
        fn new(max_len: Option<usize>) -> Self {
            Self {
                max_len,
                sent: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        fn max_message_len(&self) -> Option<usize> {
            self.max_len
        }

        async fn send(&self, text: &str) -> Result<()> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_on == Some(sent.len()) {
                anyhow::bail!("transport rejected message");
            }
            sent.push(text.to_string());
            Ok(())
        }
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_short_text_no_chunk() {
        let result = chunk_text("hello", 100);
        assert_eq!(result, vec!["hello"]);
    }

    #[test]
    fn test_empty_text() {
        let result = chunk_text("", 100);
        assert_eq!(result, vec![""]);
    }

    #[test]
    fn test_exactly_at_limit() {
        let text = "a".repeat(100);
        let result = chunk_text(&text, 100);
        assert_eq!(result, vec![text]);
    }

    #[test]
    fn test_repeated_short_lines_flush_before_overflow() {
        let text = "a\n".repeat(2000);
        let result = chunk_text(&text, 2000);

        assert!(result.len() >= 2);
        for chunk in &result {
            assert!(char_len(chunk) <= 2000);
        }
        // 1000 lines fill the first buffer exactly; line 1001 forces the flush
        assert_eq!(result[0], "a\n".repeat(1000));
        assert_eq!(result[1], "a\n".repeat(1000));
    }

    #[test]
    fn test_single_long_line_hard_split() {
        let text = "x".repeat(5000);
        let result = chunk_text(&text, 2000);

        let lengths: Vec<usize> = result.iter().map(|c| char_len(c)).collect();
        assert_eq!(lengths, vec![2000, 2000, 1000]);
        assert_eq!(result.concat(), text);
    }

    #[test]
    fn test_long_line_flushes_pending_buffer_first() {
        let text = format!("intro\n{}\noutro", "y".repeat(25));
        let result = chunk_text(&text, 10);

        assert_eq!(result[0], "intro\n");
        assert_eq!(result[1], "y".repeat(10));
        assert_eq!(result[2], "y".repeat(10));
        assert_eq!(result[3], "y".repeat(5));
        assert_eq!(result[4], "outro\n");
    }

    #[test]
    fn test_line_exactly_filling_limit_waits_for_next_line() {
        // "ab" + newline fills a 3-character buffer; the flush only happens
        // when "cd" arrives.
        let text = "ab\ncd\nef";
        let result = chunk_text(text, 3);
        assert_eq!(result, vec!["ab\n", "cd\n", "ef\n"]);
    }

    #[test]
    fn test_line_of_exact_limit_drops_its_newline() {
        // A full-width line flushed on its own loses the newline after it, so
        // the segments join to 20 characters rather than the original 21.
        let line = "z".repeat(10);
        let text = format!("{line}\n{line}");
        let result = chunk_text(&text, 10);

        for chunk in &result {
            assert!(char_len(chunk) <= 10, "chunk too long: {chunk:?}");
        }
        assert_eq!(result, vec![line.clone(), line]);
    }

    #[test]
    fn test_round_trip_preserves_text() {
        let text = (0..300)
            .map(|i| format!("line {i}: {}", "word ".repeat(i % 17)))
            .collect::<Vec<_>>()
            .join("\n");
        let result = chunk_text(&text, 200);

        assert!(result.len() > 1);
        for chunk in &result {
            assert!(char_len(chunk) <= 200);
        }
        let joined = result.concat();
        assert_eq!(joined.strip_suffix('\n').unwrap(), text);
    }

    #[test]
    fn test_multibyte_characters_counted_as_chars() {
        let text = "世界".repeat(1500); // 3000 chars, 9000 bytes
        let result = chunk_text(&text, MESSAGE_LIMIT);

        let lengths: Vec<usize> = result.iter().map(|c| char_len(c)).collect();
        assert_eq!(lengths, vec![2000, 1000]);
        assert_eq!(result.concat(), text);
    }

    #[tokio::test]
    async fn test_deliver_single_message_under_cap() {
        let sink = RecordingSink::new(Some(MESSAGE_LIMIT));
        let sent = deliver(&sink, "short reply").await.unwrap();

        assert_eq!(sent, 1);
        assert_eq!(*sink.sent.lock().unwrap(), vec!["short reply"]);
    }

    #[tokio::test]
    async fn test_deliver_in_order_and_skips_blank_segments() {
        let sink = RecordingSink::new(Some(2000));
        let text = "a\n".repeat(2000);
        let sent = deliver(&sink, &text).await.unwrap();

        let messages = sink.sent.lock().unwrap();
        assert_eq!(sent, messages.len());
        // The trailing empty line would produce a lone newline segment
        assert!(messages.iter().all(|m| m != "\n"));
        assert_eq!(messages.concat(), text);
    }

    #[tokio::test]
    async fn test_deliver_keeps_blank_line_segments_inside_reply() {
        let sink = RecordingSink::new(Some(10));
        let text = "aaaaaaaa\n    \n    \nbbbbbbbb";
        let sent = deliver(&sink, text).await.unwrap();

        let messages = sink.sent.lock().unwrap();
        assert_eq!(sent, 3);
        assert_eq!(*messages, vec!["aaaaaaaa\n", "    \n    \n", "bbbbbbbb\n"]);
    }

    #[tokio::test]
    async fn test_deliver_without_cap_sends_once() {
        let sink = RecordingSink::new(None);
        let text = "b".repeat(10_000);
        deliver(&sink, &text).await.unwrap();

        let messages = sink.sent.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], text);
    }

    #[tokio::test]
    async fn test_deliver_stops_on_send_failure() {
        let mut sink = RecordingSink::new(Some(10));
        sink.fail_on = Some(1);
        let result = deliver(&sink, &"c".repeat(35)).await;

        assert!(result.is_err());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }
}
