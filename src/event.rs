//! Observability events emitted by the clinic.
//!
//! Events are notifications only: nothing in the admission protocol
//! depends on a subscriber consuming them. Every event is applied to the
//! visit registry before it is forwarded, so registry state never lags
//! the stream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::doctor::DoctorId;
use crate::registry::VisitRegistry;

/// Discrete lifecycle events, in the order components emit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A patient reached the building and is about to try the gate.
    ClientArrived { patient: String },

    /// The waiting room was full; the patient left without reserving anything.
    ClientRejected { patient: String },

    /// The patient took a chair (possibly only for an instant).
    ClientSeated { patient: String },

    /// The patient entered a doctor's room.
    ClientAdmitted { patient: String, doctor: DoctorId },

    /// A doctor announced itself free and is accepting a patient.
    DoctorFree { doctor: DoctorId },

    /// A doctor finished treating a patient.
    DoctorDone { doctor: DoctorId, patient: String },
}

/// Clone-able emission handle shared by the gate, the pool, and the tasks.
///
/// A dropped subscriber is not an error; the registry still sees every
/// event.
#[derive(Clone)]
pub(crate) struct EventSender {
    registry: Arc<VisitRegistry>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    pub(crate) fn new(registry: Arc<VisitRegistry>) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { registry, tx }, rx)
    }

    pub(crate) fn emit(&self, event: Event) {
        self.registry.apply(&event);
        if self.tx.send(event).is_err() {
            tracing::trace!("event subscriber gone, dropping event");
        }
    }
}
