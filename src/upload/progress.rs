//! Byte-level progress accounting for outbound upload bodies.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Width of the rendered progress bar, excluding the brackets.
pub const BAR_WIDTH: usize = 24;

/// Receives the integer percentage after every read.
pub type ProgressSink = Box<dyn FnMut(u8) + Send + 'static>;

/// Bytes consumed against a total known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    total: u64,
    read: u64,
}

impl ProgressState {
    pub fn new(total: u64) -> Self {
        Self { total, read: 0 }
    }

    /// Records `n` more bytes and returns the new percentage.
    pub fn advance(&mut self, n: u64) -> u8 {
        self.read = self.read.saturating_add(n).min(self.total);
        self.percent()
    }

    /// `floor(read * 100 / total)`; an empty body is complete.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.read as u128 * 100) / self.total as u128) as u8
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Renders `[====>     ]` for a percentage, `BAR_WIDTH` characters inside the brackets.
///
/// The `>` head is dropped once the bar is full.
pub fn render_bar(percent: u8) -> String {
    let percent = usize::from(percent.min(100));
    let filled = percent * BAR_WIDTH / 100;
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    bar.push_str(&"=".repeat(filled));
    if filled < BAR_WIDTH {
        bar.push('>');
        bar.push_str(&" ".repeat(BAR_WIDTH - filled - 1));
    }
    bar.push(']');
    bar
}

/// Spinner label for one file of a batch: ` [i/n] <file>\t[<bar>] <pct>%`.
pub fn progress_label(index: usize, count: usize, file_name: &str, percent: u8) -> String {
    format!(
        " [{}/{}] {}\t{} {}%",
        index,
        count,
        file_name,
        render_bar(percent),
        percent
    )
}

/// Wraps a reader and reports progress to a sink on every successful read.
pub struct ProgressReader<R> {
    inner: R,
    state: ProgressState,
    sink: ProgressSink,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, total: u64, sink: ProgressSink) -> Self {
        Self {
            inner,
            state: ProgressState::new(total),
            sink,
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let n = (buf.filled().len() - before) as u64;
            if n > 0 {
                let percent = this.state.advance(n);
                (this.sink)(percent);
            }
        }
        poll
    }
}
