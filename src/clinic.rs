//! The clinic: owns the gate, the doctor pool, and the doctor tasks.
//!
//! `open` corresponds to opening the building: validate the
//! configuration, seed the capacity gate, start one task per doctor.
//! `spawn_patient` schedules one arrival; the returned handle resolves
//! to the visit's terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ClinicConfig, ConfigError};
use crate::doctor::{AssignError, DoctorId, DoctorPool, run_doctor};
use crate::event::{Event, EventSender};
use crate::gate::CapacityGate;
use crate::patient::{VisitOutcome, run_patient};
use crate::registry::VisitRegistry;
use crate::treatment::{FixedDuration, Treat};

/// Stream of observability events, in per-component emission order.
pub type EventStream = mpsc::UnboundedReceiver<Event>;

/// Failures of an individual visit. Rejection is not an error; it is a
/// normal [`VisitOutcome`]. These only surface on protocol defects or
/// shutdown races.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error("doctor dropped patient {patient} before signaling the rendezvous")]
    ServiceInterrupted { patient: String },

    #[error("patient task failed")]
    Join(#[source] tokio::task::JoinError),
}

/// Handle to one spawned patient.
pub struct PatientHandle {
    name: String,
    task: JoinHandle<Result<VisitOutcome, ClinicError>>,
}

impl PatientHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the visit to end, by rejection or completed treatment.
    pub async fn outcome(self) -> Result<VisitOutcome, ClinicError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(ClinicError::Join(e)),
        }
    }
}

pub struct Clinic {
    config: ClinicConfig,
    gate: Arc<CapacityGate>,
    pool: Arc<DoctorPool>,
    registry: Arc<VisitRegistry>,
    events: EventSender,
    doctor_tasks: Vec<JoinHandle<()>>,
}

impl Clinic {
    /// Open the building with timed treatments of the configured duration.
    pub fn open(config: ClinicConfig) -> Result<(Self, EventStream), ConfigError> {
        let treatment = Arc::new(FixedDuration(config.treatment_duration));
        Self::open_with(config, treatment)
    }

    /// Open the building with a custom treatment implementation.
    pub fn open_with(
        config: ClinicConfig,
        treatment: Arc<dyn Treat>,
    ) -> Result<(Self, EventStream), ConfigError> {
        config.validate()?;

        let registry = Arc::new(VisitRegistry::new());
        let (events, event_rx) = EventSender::new(Arc::clone(&registry));
        let gate = Arc::new(CapacityGate::new(
            config.num_doctors,
            config.num_chairs,
            events.clone(),
        ));
        let (pool, handoffs) = DoctorPool::new(config.num_doctors);
        let pool = Arc::new(pool);

        tracing::info!(
            num_doctors = config.num_doctors,
            num_chairs = config.num_chairs,
            "clinic open"
        );

        let mut doctor_tasks = Vec::with_capacity(config.num_doctors);
        for (idx, handoff) in handoffs.into_iter().enumerate() {
            doctor_tasks.push(tokio::spawn(run_doctor(
                DoctorId(idx),
                handoff,
                Arc::clone(&pool),
                Arc::clone(&gate),
                Arc::clone(&treatment),
                events.clone(),
            )));
        }

        Ok((
            Self {
                config,
                gate,
                pool,
                registry,
                events,
                doctor_tasks,
            },
            event_rx,
        ))
    }

    /// Schedule one patient to arrive `arrival_delay` from now.
    pub fn spawn_patient(
        &self,
        name: impl Into<String>,
        arrival_delay: Duration,
    ) -> PatientHandle {
        let name = name.into();
        let task = tokio::spawn(run_patient(
            name.clone(),
            arrival_delay,
            Arc::clone(&self.gate),
            Arc::clone(&self.pool),
            self.events.clone(),
        ));
        PatientHandle { name, task }
    }

    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    pub fn registry(&self) -> &VisitRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &CapacityGate {
        &self.gate
    }

    pub fn pool(&self) -> &DoctorPool {
        &self.pool
    }

    pub async fn free_chairs(&self) -> usize {
        self.gate.free_chairs().await
    }

    pub async fn free_doctors(&self) -> usize {
        self.gate.free_doctors().await
    }

    pub async fn busy_doctors(&self) -> usize {
        self.pool.busy_count().await
    }

    /// Stop the doctor tasks. In-flight visits are cut short; their
    /// pending rendezvous waits surface as errors, never as `Served`.
    pub fn close(self) {
        for task in &self.doctor_tasks {
            task.abort();
        }
        tracing::info!("clinic closed");
    }
}
