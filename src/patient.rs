//! The patient task: one admission attempt, at most one full visit.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;

use crate::clinic::ClinicError;
use crate::doctor::{DoctorId, DoctorPool};
use crate::event::{Event, EventSender};
use crate::gate::{Admission, CapacityGate};

/// Handoff payload: the patient's name and the send half of their
/// rendezvous channel. The assigned doctor signals it exactly once,
/// after treatment completes.
pub(crate) struct PatientTicket {
    pub(crate) patient: String,
    pub(crate) serviced: oneshot::Sender<()>,
}

/// Terminal outcome of one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VisitOutcome {
    /// The waiting room was full; the patient left immediately.
    Rejected,
    /// Treated to completion by the given doctor.
    Served { doctor: DoctorId },
}

impl VisitOutcome {
    pub fn is_served(&self) -> bool {
        matches!(self, Self::Served { .. })
    }
}

/// Wait out the scheduled arrival, try the gate once, and if admitted see
/// the visit through. After admission the patient never touches the
/// counters again; everything further goes through the assigned doctor's
/// handoff and the patient's own rendezvous channel.
pub(crate) async fn run_patient(
    name: String,
    arrival_delay: Duration,
    gate: Arc<CapacityGate>,
    pool: Arc<DoctorPool>,
    events: EventSender,
) -> Result<VisitOutcome, ClinicError> {
    tokio::time::sleep(arrival_delay).await;
    events.emit(Event::ClientArrived {
        patient: name.clone(),
    });

    if gate.try_enter(&name).await == Admission::Rejected {
        tracing::debug!(patient = %name, "waiting room full, leaving");
        events.emit(Event::ClientRejected {
            patient: name.clone(),
        });
        return Ok(VisitOutcome::Rejected);
    }

    let (serviced_tx, serviced) = oneshot::channel();
    let doctor = pool
        .assign(
            PatientTicket {
                patient: name.clone(),
                serviced: serviced_tx,
            },
            &events,
        )
        .await?;

    // Block until the doctor says the treatment is over. Leaving earlier
    // would let the doctor go free against a still-occupied room.
    serviced
        .await
        .map_err(|_| ClinicError::ServiceInterrupted {
            patient: name.clone(),
        })?;

    tracing::debug!(patient = %name, %doctor, "visit complete");
    Ok(VisitOutcome::Served { doctor })
}
