// src/pager/sink.rs
// =============================================================================
// Producer -> channel -> writer task -> pipe -> pager process.
//
//   producer ──send──► mpsc (bounded) ──► writer task ──► pager stdin
//
// The channel is bounded, so a slow pager pushes back on the producer once the
// buffer and the pipe are full. The producer only needs to wait for the next
// page to be fetched, never for the pager to catch up.
//
// Quitting the pager early closes its stdin. The writer sees BrokenPipe, stops
// quietly and drops its receiver, after which every OutputSink::write returns
// ReaderGone. That's how producers learn to stop; it isn't an error.
//
// Rust concepts:
// - mpsc channels: the Sender lives in OutputSink, the Receiver in the task
// - tokio::spawn + JoinHandle: the writer runs alongside the producer and
//   hands back its io::Result when it finishes
// - tokio::select!: waits on whichever finishes first, the producer or the
//   pager process
// - Drop: dropping the last OutputSink is what closes the pager's stdin
// =============================================================================

use crate::error::{GitmeError, Result};
use std::future::Future;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const DEFAULT_PAGER: &str = "less -R";

// Blocks buffered between the producer and the writer task
const SINK_CAPACITY: usize = 64;

/// The external program output is piped into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PagerCommand {
    /// $GITME_PAGER, then $PAGER, then `less -R`.
    pub fn from_env() -> Self {
        ["GITME_PAGER", "PAGER"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| Self::parse(&value))
            .unwrap_or_else(Self::default)
    }

    /// Splits a command line on whitespace. Returns None for a blank string.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }
}

impl Default for PagerCommand {
    fn default() -> Self {
        Self::parse(DEFAULT_PAGER).unwrap_or_else(|| Self {
            program: "less".to_string(),
            args: Vec::new(),
        })
    }
}

/// Where command output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Pager(PagerCommand),
    Stdout,
}

/// Returned by OutputSink::write once nobody is reading anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderGone;

/// Cloneable handle for pushing text into the pager.
///
/// The pager only sees end-of-input once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<String>,
}

impl OutputSink {
    pub(crate) fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queues `text`, waiting while the buffer is full.
    pub async fn write(&self, text: impl Into<String>) -> std::result::Result<(), ReaderGone> {
        self.tx.send(text.into()).await.map_err(|_| ReaderGone)
    }
}

/// The reading side: an optional pager process and the task feeding it.
#[derive(Debug)]
pub struct Pager {
    child: Option<Child>,
    writer: JoinHandle<io::Result<()>>,
}

/// Opens the output for a command.
///
/// A pager that fails to start is reported and replaced by stdout, so output
/// is never lost to a missing `less`.
pub fn open(mode: &OutputMode) -> (OutputSink, Pager) {
    match mode {
        OutputMode::Pager(command) => match Pager::spawn(command) {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!(
                    "couldn't start pager {:?} ({}), writing to stdout instead",
                    command.program,
                    e
                );
                Pager::from_writer(tokio::io::stdout())
            }
        },
        OutputMode::Stdout => Pager::from_writer(tokio::io::stdout()),
    }
}

impl Pager {
    /// Starts `command` with its stdin piped from a new OutputSink.
    pub fn spawn(command: &PagerCommand) -> io::Result<(OutputSink, Pager)> {
        // Only stdin is ours; the pager draws straight to the terminal
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        // take() moves the pipe out of the Child so the writer task can own it
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "pager has no stdin"))?;

        log::debug!("Started pager {:?} {:?}", command.program, command.args);

        // Start copying right away; the producer hasn't been given the sink yet
        let (sink, rx) = OutputSink::channel(SINK_CAPACITY);
        let writer = tokio::spawn(pump(rx, stdin));
        Ok((
            sink,
            Pager {
                child: Some(child),
                writer,
            },
        ))
    }

    /// A sink without a process, writing into any async writer.
    pub(crate) fn from_writer<W>(out: W) -> (OutputSink, Pager)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, rx) = OutputSink::channel(SINK_CAPACITY);
        let writer = tokio::spawn(pump(rx, out));
        (sink, Pager { child: None, writer })
    }

    /// Runs `producer` while the pager displays its output, then waits for the
    /// pager to exit.
    ///
    /// `producer` must own the OutputSink returned next to this Pager (and no
    /// other clone may outlive it), otherwise the pager never sees end-of-input.
    ///
    /// If the user quits the pager first, `producer` is dropped mid-flight and
    /// its outcome is ignored.
    pub async fn present<F>(mut self, producer: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        // Pinned so it can be polled by select! and still dropped afterwards
        let mut producer = Box::pin(producer);
        let mut pager_exited = false;

        let outcome = match self.child.as_mut() {
            Some(child) => {
                // biased: polled top to bottom, so a producer that has already
                // finished wins over a pager that exited in the same poll and
                // its error is never dropped.
                tokio::select! {
                    biased;
                    res = &mut producer => Some(res),
                    status = child.wait() => {
                        match status {
                            Ok(status) => log::debug!("Pager exited ({status}) before output was complete"),
                            Err(e) => log::warn!("failed waiting for pager: {e}"),
                        }
                        pager_exited = true;
                        None
                    }
                }
            }
            // Plain stdout can't quit early, just run the producer
            None => Some((&mut producer).await),
        };

        // Dropping the producer drops its sink, which closes the channel.
        drop(producer);

        // Let the writer flush whatever is still queued.
        // A JoinError means the task panicked or was cancelled.
        let written = match self.writer.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        };

        // The user reads at their own pace, so this can take a while
        if let Some(child) = self.child.as_mut() {
            if !pager_exited {
                let status = child.wait().await?;
                log::debug!("Pager exited ({status})");
            }
        }

        // A producer error beats a writer error; None means the pager quit first
        outcome.unwrap_or(Ok(()))?;
        written.map_err(GitmeError::Pager)
    }
}

/// Copies blocks from `rx` into `out` until the channel closes or the reader
/// goes away.
async fn pump<W>(mut rx: mpsc::Receiver<String>, mut out: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    // recv() returns None once every OutputSink has been dropped
    while let Some(block) = rx.recv().await {
        // Flush per block so the pager shows output as soon as it arrives
        let written = match out.write_all(block.as_bytes()).await {
            Ok(()) => out.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("Output reader closed the pipe, discarding the rest");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }

    // Closing stdin is how the pager learns there's nothing more to come
    match out.shutdown().await {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
