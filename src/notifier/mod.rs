/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{ElevatorUnit, EventRecord};

/***************************************/
/*             Public API              */
/***************************************/
/// Fan-out of state and event changes to observers. Best-effort from the
/// engine's perspective: publishes never fail the tick that produced them.
pub trait Notifier: Send + Sync {
    fn publish_unit_changed(&self, unit: &ElevatorUnit);
    fn publish_event(&self, event: &EventRecord);
}

/**
 * Crossbeam-channel notifier.
 *
 * The engine's side of the push channel: unit snapshots and event records go
 * out on unbounded channels, and whoever holds the receivers forwards them
 * (the binary's observer thread, or a test waiting with `recv_timeout`).
 * Dropped receivers are ignored.
 */
#[derive(Clone)]
pub struct ChannelNotifier {
    unit_tx: cbc::Sender<ElevatorUnit>,
    event_tx: cbc::Sender<EventRecord>,
}

impl ChannelNotifier {
    pub fn new() -> (
        ChannelNotifier,
        cbc::Receiver<ElevatorUnit>,
        cbc::Receiver<EventRecord>,
    ) {
        let (unit_tx, unit_rx) = cbc::unbounded::<ElevatorUnit>();
        let (event_tx, event_rx) = cbc::unbounded::<EventRecord>();
        (ChannelNotifier { unit_tx, event_tx }, unit_rx, event_rx)
    }
}

impl Notifier for ChannelNotifier {
    fn publish_unit_changed(&self, unit: &ElevatorUnit) {
        let _ = self.unit_tx.send(unit.clone());
    }

    fn publish_event(&self, event: &EventRecord) {
        let _ = self.event_tx.send(event.clone());
    }
}

/// Notifier that drops everything, for callers that do not observe.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish_unit_changed(&self, _unit: &ElevatorUnit) {}

    fn publish_event(&self, _event: &EventRecord) {}
}
