//! The doctor pool: fixed service capacity with per-doctor handoff.
//!
//! The pool owns every doctor's status; an admitted patient picks any
//! free doctor under the pool lock and is handed over on that doctor's
//! one-slot channel. The doctor task itself lives in [`run_doctor`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use crate::event::{Event, EventSender};
use crate::gate::CapacityGate;
use crate::patient::PatientTicket;
use crate::treatment::Treat;

/// Index of a doctor in the fixed pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(pub(crate) usize);

impl DoctorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoctorStatus {
    Free,
    Busy,
}

struct DoctorState {
    status: DoctorStatus,
    /// Patient currently in the room; `Some` iff the doctor is busy.
    patient: Option<String>,
    /// Send half of the one-slot handoff channel.
    handoff: mpsc::Sender<PatientTicket>,
}

/// Assignment failures. Both variants are protocol defects, not load
/// conditions: admission already guaranteed a free doctor exists.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("no free doctor at assignment time")]
    NoFreeDoctor,

    #[error("doctor {0} stopped accepting patients")]
    HandoffClosed(DoctorId),
}

pub struct DoctorPool {
    doctors: Mutex<Vec<DoctorState>>,
    num_doctors: usize,
}

impl DoctorPool {
    /// Build the pool and hand back the receive halves of the handoff
    /// channels, one per doctor, for the doctor tasks.
    pub(crate) fn new(num_doctors: usize) -> (Self, Vec<mpsc::Receiver<PatientTicket>>) {
        let mut doctors = Vec::with_capacity(num_doctors);
        let mut handoffs = Vec::with_capacity(num_doctors);
        for _ in 0..num_doctors {
            let (tx, rx) = mpsc::channel(1);
            doctors.push(DoctorState {
                status: DoctorStatus::Free,
                patient: None,
                handoff: tx,
            });
            handoffs.push(rx);
        }
        (
            Self {
                doctors: Mutex::new(doctors),
                num_doctors,
            },
            handoffs,
        )
    }

    /// Pick any free doctor for an admitted patient and hand the patient
    /// over.
    ///
    /// First-in-index-order is the tie-break; ordering among free doctors
    /// carries no meaning. The handoff send happens outside the pool lock
    /// and is momentary at most: in steady state the doctor is already
    /// blocked on its channel.
    pub(crate) async fn assign(
        &self,
        ticket: PatientTicket,
        events: &EventSender,
    ) -> Result<DoctorId, AssignError> {
        let patient = ticket.patient.clone();
        let (id, handoff) = {
            let mut doctors = self.doctors.lock().await;
            let Some((idx, doctor)) = doctors
                .iter_mut()
                .enumerate()
                .find(|(_, d)| d.status == DoctorStatus::Free)
            else {
                debug_assert!(false, "admission guarantees a free doctor");
                tracing::error!(%patient, "no free doctor at assignment time");
                return Err(AssignError::NoFreeDoctor);
            };
            doctor.status = DoctorStatus::Busy;
            doctor.patient = Some(patient.clone());
            (DoctorId(idx), doctor.handoff.clone())
        };

        if handoff.send(ticket).await.is_err() {
            // The doctor task is gone (clinic shutting down). Leave the
            // doctor marked busy so it is never picked again.
            tracing::error!(%patient, doctor = %id, "handoff channel closed");
            return Err(AssignError::HandoffClosed(id));
        }

        events.emit(Event::ClientAdmitted { patient, doctor: id });
        Ok(id)
    }

    /// Mark a doctor free again after its patient has left the room.
    pub(crate) async fn set_free(&self, id: DoctorId) {
        let mut doctors = self.doctors.lock().await;
        let doctor = &mut doctors[id.0];
        doctor.status = DoctorStatus::Free;
        doctor.patient = None;
    }

    pub async fn status(&self, id: DoctorId) -> Option<DoctorStatus> {
        self.doctors.lock().await.get(id.0).map(|d| d.status)
    }

    /// Patient currently attached to a doctor, if any.
    pub async fn current_patient(&self, id: DoctorId) -> Option<String> {
        self.doctors
            .lock()
            .await
            .get(id.0)
            .and_then(|d| d.patient.clone())
    }

    /// Number of doctors currently treating a patient.
    pub async fn busy_count(&self) -> usize {
        self.doctors
            .lock()
            .await
            .iter()
            .filter(|d| d.status == DoctorStatus::Busy)
            .count()
    }

    pub fn num_doctors(&self) -> usize {
        self.num_doctors
    }
}

/// One doctor's service loop.
///
/// Free: announce availability (event plus a gate permit), then block on
/// the handoff channel. Busy: run the treatment, emit completion, signal
/// the patient's rendezvous exactly once, then mark free and loop. The
/// loop ends when the handoff channel closes.
pub(crate) async fn run_doctor(
    id: DoctorId,
    mut handoff: mpsc::Receiver<PatientTicket>,
    pool: Arc<DoctorPool>,
    gate: Arc<CapacityGate>,
    treatment: Arc<dyn Treat>,
    events: EventSender,
) {
    loop {
        events.emit(Event::DoctorFree { doctor: id });
        gate.release_doctor().await;

        let Some(ticket) = handoff.recv().await else {
            tracing::debug!(doctor = %id, "handoff channel closed, doctor leaving");
            break;
        };

        tracing::debug!(doctor = %id, patient = %ticket.patient, "treatment starting");
        treatment.treat(id, &ticket.patient).await;
        events.emit(Event::DoctorDone {
            doctor: id,
            patient: ticket.patient.clone(),
        });

        // Rendezvous: the patient may only leave once this fires.
        if ticket.serviced.send(()).is_err() {
            tracing::warn!(doctor = %id, patient = %ticket.patient, "patient gone before rendezvous");
        }
        pool.set_free(id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VisitRegistry;
    use tokio::sync::oneshot;

    fn events() -> EventSender {
        let (events, _rx) = EventSender::new(Arc::new(VisitRegistry::new()));
        events
    }

    fn ticket(patient: &str) -> (PatientTicket, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            PatientTicket {
                patient: patient.to_string(),
                serviced: tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn assign_takes_first_free_doctor() {
        let (pool, _handoffs) = DoctorPool::new(2);
        let events = events();

        let (t1, _rx1) = ticket("User1");
        let (t2, _rx2) = ticket("User2");

        assert_eq!(pool.assign(t1, &events).await.unwrap(), DoctorId(0));
        assert_eq!(pool.assign(t2, &events).await.unwrap(), DoctorId(1));

        assert_eq!(pool.status(DoctorId(0)).await, Some(DoctorStatus::Busy));
        assert_eq!(pool.status(DoctorId(1)).await, Some(DoctorStatus::Busy));
        assert_eq!(pool.busy_count().await, 2);
        assert_eq!(
            pool.current_patient(DoctorId(0)).await.as_deref(),
            Some("User1")
        );
    }

    #[tokio::test]
    async fn set_free_detaches_patient_and_allows_reuse() {
        let (pool, _handoffs) = DoctorPool::new(1);
        let events = events();

        let (t1, _rx1) = ticket("User1");
        assert_eq!(pool.assign(t1, &events).await.unwrap(), DoctorId(0));

        pool.set_free(DoctorId(0)).await;
        assert_eq!(pool.status(DoctorId(0)).await, Some(DoctorStatus::Free));
        assert_eq!(pool.current_patient(DoctorId(0)).await, None);
        assert_eq!(pool.busy_count().await, 0);
    }

    #[tokio::test]
    async fn assign_fails_when_doctor_task_is_gone() {
        let (pool, handoffs) = DoctorPool::new(1);
        drop(handoffs);
        let events = events();

        let (t1, _rx1) = ticket("User1");
        let err = pool.assign(t1, &events).await.unwrap_err();
        assert!(matches!(err, AssignError::HandoffClosed(DoctorId(0))));
        // The dead doctor stays out of rotation.
        assert_eq!(pool.status(DoctorId(0)).await, Some(DoctorStatus::Busy));
    }

    #[test]
    fn doctor_id_display_and_serde() {
        assert_eq!(DoctorId(3).to_string(), "3");
        assert_eq!(serde_json::to_value(DoctorId(3)).unwrap(), serde_json::json!(3));
        assert_eq!(
            serde_json::to_value(DoctorStatus::Free).unwrap(),
            serde_json::json!("FREE")
        );
    }
}
