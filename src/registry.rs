//! Per-patient visit states, advanced from events.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::doctor::DoctorId;
use crate::event::Event;

/// Where a patient is in their visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Reached the building; admission not yet decided.
    Arrived,
    /// Turned away: the waiting room was full. Terminal.
    Rejected,
    /// Holding a chair (or passing straight through to a free doctor).
    Waiting,
    /// In a doctor's room.
    InTreatment { doctor: DoctorId },
    /// Treated and gone. Terminal.
    Done { doctor: DoctorId },
}

impl VisitStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Done { .. })
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Arrived => 0,
            Self::Waiting => 1,
            Self::InTreatment { .. } => 2,
            Self::Rejected | Self::Done { .. } => 3,
        }
    }
}

/// Concurrent map of patient name to visit status.
///
/// The doctor's done event and the patient's admitted event come from
/// different tasks; `apply` only ever moves a visit forward, so the race
/// cannot regress a terminal state.
#[derive(Default)]
pub struct VisitRegistry {
    visits: DashMap<String, VisitStatus>,
}

impl VisitRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn apply(&self, event: &Event) {
        let (patient, status) = match event {
            Event::ClientArrived { patient } => (patient, VisitStatus::Arrived),
            Event::ClientRejected { patient } => (patient, VisitStatus::Rejected),
            Event::ClientSeated { patient } => (patient, VisitStatus::Waiting),
            Event::ClientAdmitted { patient, doctor } => {
                (patient, VisitStatus::InTreatment { doctor: *doctor })
            }
            Event::DoctorDone { doctor, patient } => {
                (patient, VisitStatus::Done { doctor: *doctor })
            }
            Event::DoctorFree { .. } => return,
        };

        let mut entry = self.visits.entry(patient.clone()).or_insert(status);
        if status.rank() >= entry.rank() {
            *entry = status;
        }
    }

    pub fn visit(&self, patient: &str) -> Option<VisitStatus> {
        self.visits.get(patient).map(|v| *v)
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn rejected_count(&self) -> usize {
        self.visits
            .iter()
            .filter(|v| matches!(*v.value(), VisitStatus::Rejected))
            .count()
    }

    pub fn served_count(&self) -> usize {
        self.visits
            .iter()
            .filter(|v| matches!(*v.value(), VisitStatus::Done { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrived(patient: &str) -> Event {
        Event::ClientArrived {
            patient: patient.to_string(),
        }
    }

    #[test]
    fn full_visit_sequence() {
        let registry = VisitRegistry::new();
        registry.apply(&arrived("User1"));
        registry.apply(&Event::ClientSeated {
            patient: "User1".to_string(),
        });
        registry.apply(&Event::ClientAdmitted {
            patient: "User1".to_string(),
            doctor: DoctorId(0),
        });
        registry.apply(&Event::DoctorDone {
            doctor: DoctorId(0),
            patient: "User1".to_string(),
        });

        let status = registry.visit("User1").unwrap();
        assert_eq!(status, VisitStatus::Done { doctor: DoctorId(0) });
        assert!(status.is_terminal());
        assert_eq!(registry.served_count(), 1);
    }

    #[test]
    fn rejection_is_terminal() {
        let registry = VisitRegistry::new();
        registry.apply(&arrived("User1"));
        registry.apply(&Event::ClientRejected {
            patient: "User1".to_string(),
        });

        assert_eq!(registry.visit("User1"), Some(VisitStatus::Rejected));
        assert_eq!(registry.rejected_count(), 1);
        assert_eq!(registry.served_count(), 0);
    }

    #[test]
    fn visits_never_move_backward() {
        let registry = VisitRegistry::new();
        registry.apply(&Event::DoctorDone {
            doctor: DoctorId(1),
            patient: "User1".to_string(),
        });
        // Late-arriving admitted event must not regress the terminal state.
        registry.apply(&Event::ClientAdmitted {
            patient: "User1".to_string(),
            doctor: DoctorId(1),
        });

        assert_eq!(
            registry.visit("User1"),
            Some(VisitStatus::Done { doctor: DoctorId(1) })
        );
    }

    #[test]
    fn doctor_free_is_not_a_visit() {
        let registry = VisitRegistry::new();
        registry.apply(&Event::DoctorFree { doctor: DoctorId(0) });
        assert!(registry.is_empty());
    }
}
