//! Event bus connecting the collection pipeline to its observer
//!
//! Two independent unbounded FIFO channels carry [`ProgressUpdate`]s and
//! [`LogEvent`]s. The producer side ([`EventPublisher`]) never blocks; the
//! consumer side ([`EventSubscriber`]) can be polled, awaited, or turned into
//! streams. There is no ordering guarantee *between* the two channels, so
//! observers correlate log and progress events by tenant id. Receipt of
//! [`ProgressUpdate::Finished`] is the only reliable end-of-run signal; every
//! log event of a run is pushed before it.

use crate::types::{LogEvent, ProgressEvent, ProgressUpdate};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Create a connected publisher/subscriber pair
pub fn channel() -> (EventPublisher, EventSubscriber) {
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (log_tx, log_rx) = mpsc::unbounded_channel();

    (
        EventPublisher {
            progress_tx,
            log_tx,
        },
        EventSubscriber {
            progress_rx,
            log_rx,
        },
    )
}

/// Producer half of the event bus
#[derive(Clone, Debug)]
pub struct EventPublisher {
    progress_tx: UnboundedSender<ProgressUpdate>,
    log_tx: UnboundedSender<LogEvent>,
}

impl EventPublisher {
    /// Push a progress report
    pub fn progress(&self, current: usize, total: usize, message: Option<String>) {
        self.push_progress(ProgressUpdate::Progress(ProgressEvent {
            current,
            total,
            message,
        }));
    }

    /// Push a log event
    pub fn log(&self, event: LogEvent) {
        // send() fails only when the subscriber was dropped; the run continues regardless
        if self.log_tx.send(event).is_err() {
            tracing::trace!("log event dropped: no subscriber");
        }
    }

    /// Push the terminal sentinel
    pub fn finish(&self) {
        self.push_progress(ProgressUpdate::Finished);
    }

    fn push_progress(&self, update: ProgressUpdate) {
        if self.progress_tx.send(update).is_err() {
            tracing::trace!("progress event dropped: no subscriber");
        }
    }
}

/// Consumer half of the event bus
///
/// # Example
///
/// ```no_run
/// use dock_collector::events::channel;
/// use dock_collector::types::ProgressUpdate;
///
/// # async fn example() {
/// let (_publisher, mut subscriber) = channel();
/// while let Some(update) = subscriber.recv_progress().await {
///     for log in subscriber.drain_logs() {
///         println!("{} - {}: {}", log.tenant_id, log.status, log.details);
///     }
///     if update == ProgressUpdate::Finished {
///         break;
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct EventSubscriber {
    progress_rx: UnboundedReceiver<ProgressUpdate>,
    log_rx: UnboundedReceiver<LogEvent>,
}

impl EventSubscriber {
    /// Wait for the next progress update
    ///
    /// Returns `None` once every publisher is dropped and the channel is empty.
    pub async fn recv_progress(&mut self) -> Option<ProgressUpdate> {
        self.progress_rx.recv().await
    }

    /// Wait for the next log event
    ///
    /// Returns `None` once every publisher is dropped and the channel is empty.
    pub async fn recv_log(&mut self) -> Option<LogEvent> {
        self.log_rx.recv().await
    }

    /// Take the next progress update if one is queued
    pub fn try_recv_progress(&mut self) -> Option<ProgressUpdate> {
        match self.progress_rx.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take the next log event if one is queued
    pub fn try_recv_log(&mut self) -> Option<LogEvent> {
        match self.log_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every queued progress update
    pub fn drain_progress(&mut self) -> Vec<ProgressUpdate> {
        std::iter::from_fn(|| self.try_recv_progress()).collect()
    }

    /// Take every queued log event
    pub fn drain_logs(&mut self) -> Vec<LogEvent> {
        std::iter::from_fn(|| self.try_recv_log()).collect()
    }

    /// Split into two independent streams for push-style consumption
    pub fn into_streams(
        self,
    ) -> (
        UnboundedReceiverStream<ProgressUpdate>,
        UnboundedReceiverStream<LogEvent>,
    ) {
        (
            UnboundedReceiverStream::new(self.progress_rx),
            UnboundedReceiverStream::new(self.log_rx),
        )
    }
}
