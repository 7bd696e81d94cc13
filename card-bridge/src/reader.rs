//! Card reader abstraction
//!
//! The bridge only needs a stream of events: a card was presented, the
//! reader hiccuped, or the reader is gone. Anything that can produce those
//! implements [`CardReader`].

use std::future::Future;
use std::pin::Pin;

use shared::relay::CardUid;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;

/// One event from a reader device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A card was presented
    Card(CardUid),
    /// Recoverable fault (bad read, garbled line)
    Error(String),
    /// The device went away; no further events
    Disconnected,
}

pub trait CardReader: Send {
    /// Wait for the next event. After `Disconnected`, keeps returning `Disconnected`.
    fn next_event(&mut self) -> impl Future<Output = ReaderEvent> + Send;
}

type DeviceStream = Pin<Box<dyn AsyncBufRead + Send>>;

/// Line-oriented reader: one UID per line.
///
/// Covers HID keyboard-wedge readers, serial readers that print UIDs, and
/// stdin for manual testing. UIDs are accepted with or without `:`
/// separators; case folding is left to [`CardUid`].
pub struct LineReader {
    name: String,
    lines: Lines<DeviceStream>,
    done: bool,
}

impl LineReader {
    pub fn new(name: impl Into<String>, source: impl AsyncBufRead + Send + 'static) -> Self {
        let stream: DeviceStream = Box::pin(source);
        Self {
            name: name.into(),
            lines: stream.lines(),
            done: false,
        }
    }

    /// Open a device path, or stdin for `-`
    pub async fn open(device: &str) -> std::io::Result<Self> {
        if device == "-" {
            return Ok(Self::new("stdin", BufReader::new(tokio::io::stdin())));
        }
        let file = tokio::fs::File::open(device).await?;
        Ok(Self::new(device, BufReader::new(file)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// ` 04:a2:b3:c4 ` → `04a2b3c4`
fn normalize_line(line: &str) -> String {
    line.trim().chars().filter(|c| *c != ':').collect()
}

impl CardReader for LineReader {
    async fn next_event(&mut self) -> ReaderEvent {
        if self.done {
            return ReaderEvent::Disconnected;
        }
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    let raw = normalize_line(&line);
                    if raw.is_empty() {
                        continue;
                    }
                    return match CardUid::from_hardware(&raw) {
                        Ok(uid) => ReaderEvent::Card(uid),
                        Err(e) => ReaderEvent::Error(format!("{}: {e}", self.name)),
                    };
                }
                Ok(None) => {
                    self.done = true;
                    return ReaderEvent::Disconnected;
                }
                Err(e) => {
                    // a failed device does not come back without a restart
                    self.done = true;
                    return ReaderEvent::Error(format!("{}: read failed: {e}", self.name));
                }
            }
        }
    }
}

/// Reader fed through a channel, for embedding the bridge
pub struct ChannelReader {
    rx: mpsc::Receiver<ReaderEvent>,
}

impl ChannelReader {
    pub fn new(capacity: usize) -> (mpsc::Sender<ReaderEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl CardReader for ChannelReader {
    async fn next_event(&mut self) -> ReaderEvent {
        self.rx.recv().await.unwrap_or(ReaderEvent::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(input: &'static str) -> LineReader {
        LineReader::new("test", BufReader::new(input.as_bytes()))
    }

    #[tokio::test]
    async fn line_reader_emits_cards_errors_and_disconnect() {
        let mut r = reader("04A2B3C4\n\n  04:a2:b3:c5 \nnot-a-uid\n");

        assert_eq!(
            r.next_event().await,
            ReaderEvent::Card(CardUid::new("04A2B3C4").unwrap())
        );
        assert_eq!(
            r.next_event().await,
            ReaderEvent::Card(CardUid::new("04A2B3C5").unwrap())
        );
        assert!(matches!(r.next_event().await, ReaderEvent::Error(_)));
        assert_eq!(r.next_event().await, ReaderEvent::Disconnected);
        assert_eq!(r.next_event().await, ReaderEvent::Disconnected);
    }

    #[tokio::test]
    async fn channel_reader_disconnects_when_sender_drops() {
        let (tx, mut r) = ChannelReader::new(4);
        tx.send(ReaderEvent::Card(CardUid::new("abcd").unwrap()))
            .await
            .unwrap();
        drop(tx);
        assert!(matches!(r.next_event().await, ReaderEvent::Card(_)));
        assert_eq!(r.next_event().await, ReaderEvent::Disconnected);
    }

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_line(" 04:A2:b3 \r"), "04A2b3");
        assert_eq!(normalize_line("deadbeef"), "deadbeef");
    }
}
