//! # Buffer
//!
//! Holds the growing output of one command invocation together with the
//! annotations produced for it. All state sits behind a single lock; the
//! pager reads through [`Buffer::lock`] and holds the returned view for the
//! whole of a read-plus-dispatch or read-plus-draw sequence.
//!
//! ## Tasks
//!
//! ```text
//! OutputStream ──▶ reader task ──▶ BufferState ◀── annotator task (one per annotator)
//!                       │                               ▲
//!                       └──── line count (watch) ───────┘
//! ```
//!
//! Every generation owns a cancellation signal that is handed to each task
//! when it is spawned. [`Buffer::shutdown`] fires it and waits for every
//! annotator to finish before the generation is dropped.
//!
//! ## Annotation order
//!
//! Annotations of a line are reported ordered by the registration order of
//! the annotator that produced them, then by the order that annotator emitted
//! them. Task scheduling never changes what a line reports.

pub mod annotator;

pub use annotator::{Annotation, Annotator, RegexAnnotator};

use crate::pager::process::OutputStream;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 8;

/// Terminal control sequences (CSI, OSC and two-byte escapes)
fn escape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-_]")
            .expect("escape pattern is valid")
    })
}

/// Turn raw output bytes into a displayable line
fn sanitize_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text: &str = &text;
    let text = text.strip_suffix('\r').unwrap_or(text);
    let stripped = escape_pattern().replace_all(text, "");

    let mut line = String::with_capacity(stripped.len());
    let mut column = 0;
    for ch in stripped.chars() {
        match ch {
            '\t' => {
                let width = TAB_WIDTH - column % TAB_WIDTH;
                line.extend(std::iter::repeat(' ').take(width));
                column += width;
            }
            c if c.is_control() => {}
            c => {
                line.push(c);
                column += c.width().unwrap_or(0);
            }
        }
    }
    line
}

#[derive(Debug)]
struct Entry {
    source: usize,
    seq: u64,
    annotation: Annotation,
}

#[derive(Debug, Default)]
struct BufferState {
    lines: Vec<String>,
    partial: Vec<u8>,
    annotations: BTreeMap<usize, Vec<Entry>>,
    annotation_count: usize,
    finished: bool,
}

impl BufferState {
    fn push_bytes(&mut self, bytes: &[u8]) {
        // whatever is already in `partial` holds no newline
        let mut searched = self.partial.len();
        self.partial.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(found) = self.partial[searched..].iter().position(|b| *b == b'\n') {
            let end = searched + found;
            self.lines.push(sanitize_line(&self.partial[start..end]));
            start = end + 1;
            searched = start;
        }
        self.partial.drain(..start);
    }

    fn finish(&mut self) {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.lines.push(sanitize_line(&rest));
        }
        self.finished = true;
    }

    fn insert(&mut self, source: usize, seq: u64, annotation: Annotation) {
        let entries = self.annotations.entry(annotation.line()).or_default();
        let at = entries.partition_point(|e| (e.source, e.seq) < (source, seq));
        entries.insert(
            at,
            Entry {
                source,
                seq,
                annotation,
            },
        );
        self.annotation_count += 1;
    }
}

fn lock_state(state: &Mutex<BufferState>) -> MutexGuard<'_, BufferState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read access to a buffer while its lock is held
pub struct BufferView<'a> {
    state: MutexGuard<'a, BufferState>,
}

impl BufferView<'_> {
    pub fn num_lines(&self) -> usize {
        self.state.lines.len()
    }

    pub fn num_annotations(&self) -> usize {
        self.state.annotation_count
    }

    /// Annotations of one line in their stable reported order
    pub fn annotations_for_line(&self, line: usize) -> Vec<&Annotation> {
        self.state
            .annotations
            .get(&line)
            .map(|entries| entries.iter().map(|e| &e.annotation).collect())
            .unwrap_or_default()
    }

    /// Up to `count` lines starting at `offset`
    pub fn lines(&self, offset: usize, count: usize) -> &[String] {
        let len = self.state.lines.len();
        let start = offset.min(len);
        let end = offset.saturating_add(count).min(len);
        &self.state.lines[start..end]
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.state.lines.get(index).map(String::as_str)
    }

    /// Whether the output stream has ended
    pub fn is_finished(&self) -> bool {
        self.state.finished
    }
}

/// One generation of command output plus its annotator tasks
pub struct Buffer {
    state: Arc<Mutex<BufferState>>,
    lines: watch::Receiver<usize>,
    cancel: watch::Sender<bool>,
    reader: Option<JoinHandle<()>>,
    annotators: Vec<JoinHandle<()>>,
}

impl Buffer {
    /// Start consuming `stream`; must be called inside a tokio runtime
    pub fn new(stream: OutputStream) -> Self {
        let state = Arc::new(Mutex::new(BufferState::default()));
        let (lines_tx, lines_rx) = watch::channel(0);
        let (cancel, cancel_rx) = watch::channel(false);
        let reader = tokio::spawn(read_lines(stream, Arc::clone(&state), lines_tx, cancel_rx));

        Self {
            state,
            lines: lines_rx,
            cancel,
            reader: Some(reader),
            annotators: Vec::new(),
        }
    }

    /// Launch an annotator task against this generation
    pub fn annotate_with(&mut self, annotator: Box<dyn Annotator>) {
        let source = self.annotators.len();
        let task = tokio::spawn(run_annotator(
            annotator,
            source,
            Arc::clone(&self.state),
            self.lines.clone(),
            self.cancel.subscribe(),
        ));
        self.annotators.push(task);
        tracing::debug!("annotator #{} started", source);
    }

    /// Take the buffer lock
    pub fn lock(&self) -> BufferView<'_> {
        BufferView {
            state: lock_state(&self.state),
        }
    }

    /// Receiver that changes whenever new lines arrive
    pub fn line_updates(&self) -> watch::Receiver<usize> {
        self.lines.clone()
    }

    /// Signal every task of this generation to stop
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Cancel all tasks and wait for the annotators to finish
    pub async fn shutdown(mut self) {
        self.cancel();
        for task in std::mem::take(&mut self.annotators) {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::warn!("annotator task panicked: {}", err);
                }
            }
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        tracing::debug!("buffer generation retired");
    }

    /// Cancel now and finish [`Buffer::shutdown`] in the background
    pub fn retire(self) {
        self.cancel();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.shutdown());
            }
            Err(_) => tracing::debug!("no runtime available, dropping buffer without join"),
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn read_lines(
    mut stream: OutputStream,
    state: Arc<Mutex<BufferState>>,
    lines: watch::Sender<usize>,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            chunk = stream.recv() => match chunk {
                Some(bytes) => {
                    let count = {
                        let mut state = lock_state(&state);
                        state.push_bytes(&bytes);
                        state.lines.len()
                    };
                    lines.send_replace(count);
                }
                None => break,
            },
            _ = cancel.changed() => return,
        }
    }

    let count = {
        let mut state = lock_state(&state);
        state.finish();
        state.lines.len()
    };
    lines.send_replace(count);
}

async fn run_annotator(
    mut annotator: Box<dyn Annotator>,
    source: usize,
    state: Arc<Mutex<BufferState>>,
    mut lines: watch::Receiver<usize>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut next_line = 0;
    let mut seq = 0;
    loop {
        let cancelled = *cancel.borrow();
        if cancelled {
            return;
        }
        annotate_pending(annotator.as_mut(), source, &state, &mut next_line, &mut seq);

        tokio::select! {
            _ = cancel.changed() => return,
            changed = lines.changed() => {
                if changed.is_err() {
                    annotate_pending(annotator.as_mut(), source, &state, &mut next_line, &mut seq);
                    return;
                }
            }
        }
    }
}

/// Annotate every line past `next_line`; the lock is not held while annotating
fn annotate_pending(
    annotator: &mut dyn Annotator,
    source: usize,
    state: &Mutex<BufferState>,
    next_line: &mut usize,
    seq: &mut u64,
) {
    let pending: Vec<String> = lock_state(state)
        .lines
        .get(*next_line..)
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    if pending.is_empty() {
        return;
    }

    let mut produced = Vec::new();
    for (offset, text) in pending.iter().enumerate() {
        produced.extend(annotator.annotate(*next_line + offset, text));
    }
    *next_line += pending.len();

    let mut state = lock_state(state);
    for annotation in produced {
        state.insert(source, *seq, annotation);
        *seq += 1;
    }
}
