//! Indication queue and indication-pending signal line.
//!
//! Event producers (radio and stack callbacks, possibly in interrupt
//! context) push indications into a bounded channel through a cheap
//! cloneable [`IndicationSender`]. The bridge task drains the channel into
//! its [`IndicationQueue`], which coalesces state-style indications,
//! delivers one indication at a time to the host and drives the signal
//! line.
//!
//! The line is active-low: it is driven low while at least one indication
//! is pending (queued or delivered but not yet acknowledged) and released
//! high once the host has drained and acknowledged everything. Assertion
//! happens at enqueue time, from whatever context produced the event;
//! release happens only on the consumer side, so pin writes must be short
//! and callable from any context.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, trace};
use nodelink_protocol::{Indication, IndicationKind};

/// The indication-pending line towards the host MCU.
///
/// `set_level` receives the electrical level to drive.
pub trait IndicationPin: Send + Sync {
    /// Drive the line to the given level.
    fn set_level(&self, high: bool);
}

/// Drives the active-low indication line from a pending count.
struct SignalController {
    pin: Arc<dyn IndicationPin>,
}

impl SignalController {
    fn update(&self, pending: usize) {
        // Low while pending, high when idle.
        self.pin.set_level(pending == 0);
    }
}

/// Does a new indication of this kind replace an already queued one?
///
/// State-style indications only ever have one meaningful value, the
/// latest; event-style indications must all be delivered.
fn coalesces(kind: IndicationKind) -> bool {
    match kind {
        IndicationKind::StackState | IndicationKind::AppConfigRx | IndicationKind::TestDataRx => {
            true
        }
        IndicationKind::DataRx | IndicationKind::DataTxSent => false,
    }
}

/// Producer handle for queueing indications.
///
/// Safe to clone into callbacks and interrupt shims; it never blocks.
/// A successful send asserts the line immediately, so the host sees
/// pending work even before the bridge task runs again.
#[derive(Clone)]
pub struct IndicationSender {
    tx: Sender<Indication>,
    pin: Arc<dyn IndicationPin>,
}

impl IndicationSender {
    /// Queue an indication. Returns the indication back if the channel
    /// is full or the queue side is gone.
    pub fn send(&self, ind: Indication) -> Result<(), Indication> {
        match self.tx.try_send(ind) {
            Ok(()) => {
                self.pin.set_level(false);
                Ok(())
            }
            Err(TrySendError::Full(ind)) | Err(TrySendError::Disconnected(ind)) => Err(ind),
        }
    }
}

/// Consumer side: ordered delivery of indications to the host.
pub struct IndicationQueue {
    rx: Receiver<Indication>,
    queue: VecDeque<Indication>,
    in_flight: Option<IndicationKind>,
    capacity: usize,
    signal: SignalController,
}

/// Create a connected sender/queue pair driving the given line.
pub fn indication_channel(
    capacity: usize,
    pin: Arc<dyn IndicationPin>,
) -> (IndicationSender, IndicationQueue) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let signal = SignalController { pin: pin.clone() };
    signal.update(0);
    (
        IndicationSender { tx, pin },
        IndicationQueue {
            rx,
            queue: VecDeque::with_capacity(capacity),
            in_flight: None,
            capacity,
            signal,
        },
    )
}

impl IndicationQueue {
    /// Drain the producer channel into the delivery queue, coalescing
    /// state-style indications, and refresh the signal line.
    pub fn pump(&mut self) {
        while let Ok(ind) = self.rx.try_recv() {
            let kind = ind.kind();
            if coalesces(kind) {
                if let Some(slot) = self.queue.iter_mut().find(|q| q.kind() == kind) {
                    trace!("coalescing queued {kind:?} indication");
                    *slot = ind;
                    continue;
                }
            }
            self.queue.push_back(ind);
        }
        self.signal.update(self.pending());
    }

    /// Number of pending indications, including one delivered but not
    /// yet acknowledged.
    pub fn pending(&self) -> usize {
        self.queue.len() + usize::from(self.in_flight.is_some())
    }

    /// Is there room for more event-style indications?
    pub fn has_room(&self) -> bool {
        self.pending() < self.capacity
    }

    /// Deliver the next indication.
    ///
    /// Returns the indication and the number still queued behind it, or
    /// `None` if the queue is empty or an earlier delivery has not been
    /// acknowledged yet.
    pub fn take(&mut self) -> Option<(Indication, u8)> {
        self.pump();
        if self.in_flight.is_some() {
            return None;
        }
        let ind = self.queue.pop_front()?;
        self.in_flight = Some(ind.kind());
        debug!(
            "delivering {:?} indication, {} queued behind it",
            ind.kind(),
            self.queue.len()
        );
        Some((ind, self.queue.len() as u8))
    }

    /// Acknowledge the delivered indication. Returns false if nothing
    /// was in flight.
    pub fn ack(&mut self) -> bool {
        let acked = self.in_flight.take().is_some();
        self.pump();
        acked
    }
}
