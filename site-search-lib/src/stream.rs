//! Streaming record source.
//!
//! A blocking producer thread decodes the host list row by row and hands
//! each record across a single-slot channel. The producer reserves the slot
//! before decoding the next row, so it never runs more than one record ahead
//! of the consumer.

use crate::decode::RecordReader;
use crate::error::SiteSearchError;
use crate::record::{validate_shape, Record};
use futures::Stream;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error};

type Item<T> = Result<T, SiteSearchError>;

/// Lazy, single-pass sequence of decoded records.
///
/// Yields `Ok(record)` in input order. A fatal error (missing header,
/// undecodable row) is yielded once as `Err` and ends the stream; a clean
/// end of input simply ends it.
pub struct RecordStream<T> {
    receiver: mpsc::Receiver<Item<T>>,
}

impl<T: Record> RecordStream<T> {
    /// Start producing records from `reader`, skipping its first row as the header.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(reader: RecordReader<R>) -> Self
    where
        R: Read + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(1);
        let handle = Handle::current();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = produce(reader, &sender, &handle) {
                error!(error = %e, "record source stopped");
                let _ = sender.blocking_send(Err(e));
            }
        });

        Self { receiver }
    }

    /// Open a delimited host list file and start producing records from it.
    pub fn open<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self, SiteSearchError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SiteSearchError::file_error(
                path.to_string_lossy(),
                format!("Failed to open input file: {}", e),
            )
        })?;

        let reader = RecordReader::with_delimiter(BufReader::new(file), delimiter);
        Ok(Self::spawn(reader))
    }
}

impl<T> RecordStream<T> {
    /// Wait for the next record.
    pub async fn next_record(&mut self) -> Option<Item<T>> {
        self.receiver.recv().await
    }
}

impl<T> Stream for RecordStream<T> {
    type Item = Item<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

fn produce<T, R>(
    mut reader: RecordReader<R>,
    sender: &mpsc::Sender<Item<T>>,
    handle: &Handle,
) -> Result<(), SiteSearchError>
where
    T: Record,
    R: Read,
{
    validate_shape::<T>()?;

    match reader.read_row() {
        Ok(true) => debug!(columns = reader.row().len(), "skipped header row"),
        Ok(false) => return Err(SiteSearchError::header("input is empty, expected a header row")),
        Err(e) => return Err(SiteSearchError::header(e.to_string())),
    }

    let mut produced = 0u64;
    loop {
        let slot = match handle.block_on(sender.reserve()) {
            Ok(slot) => slot,
            Err(_) => {
                debug!(produced, "record consumer went away");
                return Ok(());
            }
        };

        match reader.next_record::<T>() {
            Ok(Some(record)) => {
                produced += 1;
                slot.send(Ok(record));
            }
            Ok(None) => {
                debug!(produced, "reached end of input");
                return Ok(());
            }
            Err(e) => return Err(SiteSearchError::decode(reader.line(), e)),
        }
    }
}
