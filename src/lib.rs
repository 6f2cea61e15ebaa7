//! waitroom: bounded-capacity admission and worker assignment.
//!
//! A fixed pool of doctors and a fixed number of waiting-room chairs are
//! shared by an unbounded stream of arriving patients. The crate is the
//! synchronization core: chair-capacity gating, doctor selection and
//! handoff, and the patient-doctor rendezvous that keeps a patient in
//! the room until the doctor is done with them. Patients who arrive to a
//! full waiting room leave immediately; admitted patients are eventually
//! served.

mod clinic;
mod config;
mod doctor;
mod event;
mod gate;
mod patient;
mod registry;
mod treatment;

pub use clinic::{Clinic, ClinicError, EventStream, PatientHandle};
pub use config::{ClinicConfig, ConfigError};
pub use doctor::{AssignError, DoctorId, DoctorPool, DoctorStatus};
pub use event::Event;
pub use gate::{Admission, CapacityGate};
pub use patient::VisitOutcome;
pub use registry::{VisitRegistry, VisitStatus};
pub use treatment::{FixedDuration, Treat};
