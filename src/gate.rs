//! Admission control: the capacity gate.
//!
//! Two counting resources, waiting-room chairs and free doctor rooms,
//! each pair a mutex-guarded counter with a semaphore. The counter backs
//! the O(1) full/available decision; the semaphore is the blocking wait.
//! Neither counter ever leaves this module.

use tokio::sync::{Mutex, Semaphore};

use crate::event::{Event, EventSender};

/// One-shot admission decision for an arriving patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

/// Arbitrates chair and doctor availability for arriving patients.
///
/// The doctor-room semaphore starts empty; each doctor adds a permit
/// every time it announces itself free, so admissions and free doctors
/// stay in one-to-one correspondence. tokio's `Semaphore` wakes waiters
/// in FIFO order; the protocol does not rely on that ordering.
pub struct CapacityGate {
    num_doctors: usize,
    num_chairs: usize,
    /// Free-chair count. This lock doubles as the waiting-room lock that
    /// serializes the admission decision.
    free_chairs: Mutex<usize>,
    chairs: Semaphore,
    /// Mirror of the number of unclaimed free-doctor announcements.
    free_doctors: Mutex<usize>,
    doctor_rooms: Semaphore,
    events: EventSender,
}

impl CapacityGate {
    pub(crate) fn new(num_doctors: usize, num_chairs: usize, events: EventSender) -> Self {
        Self {
            num_doctors,
            num_chairs,
            free_chairs: Mutex::new(num_chairs),
            chairs: Semaphore::new(num_chairs),
            free_doctors: Mutex::new(0),
            doctor_rooms: Semaphore::new(0),
            events,
        }
    }

    /// Decide admission for one arriving patient.
    ///
    /// Rejection reserves nothing and is final for this arrival.
    /// Admission consumes exactly one doctor-room permit; the chair taken
    /// while deciding or waiting is always handed back before returning.
    ///
    /// The waiting-room lock serializes the decision only, never a wait
    /// for a doctor: a seated patient holding the lock across that wait
    /// would deadlock every later arrival and every chair hand-back. The
    /// fast path claims a doctor room without blocking; if the claim
    /// cannot be satisfied immediately (the permit may already be
    /// earmarked for an earlier waiter), the lock is dropped first and
    /// the patient waits on the semaphore like any other seated patient.
    pub async fn try_enter(&self, patient: &str) -> Admission {
        let mut free_chairs = self.free_chairs.lock().await;
        if *free_chairs == 0 {
            return Admission::Rejected;
        }

        // Guaranteed immediate: the count above was read under the lock,
        // and chair permits only move together with the count.
        match self.chairs.try_acquire() {
            Ok(permit) => permit.forget(),
            Err(_) => {
                debug_assert!(false, "chair count out of sync with chair semaphore");
                tracing::error!(patient, "chair semaphore empty with free chairs > 0");
                return Admission::Rejected;
            }
        }
        *free_chairs -= 1;
        self.events.emit(Event::ClientSeated {
            patient: patient.to_string(),
        });

        let doctor_announced = *self.free_doctors.lock().await > 0;
        if doctor_announced && self.try_claim_doctor_room().await {
            self.hand_back_chair(&mut free_chairs);
        } else {
            drop(free_chairs);
            self.claim_doctor_room().await;
            let mut free_chairs = self.free_chairs.lock().await;
            self.hand_back_chair(&mut free_chairs);
        }

        Admission::Admitted
    }

    /// A doctor announces itself free: one more admission may proceed.
    pub(crate) async fn release_doctor(&self) {
        let mut free_doctors = self.free_doctors.lock().await;
        *free_doctors += 1;
        debug_assert!(
            *free_doctors <= self.num_doctors,
            "more free-doctor announcements than doctors"
        );
        self.doctor_rooms.add_permits(1);
    }

    async fn try_claim_doctor_room(&self) -> bool {
        match self.doctor_rooms.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.note_doctor_claimed().await;
                true
            }
            Err(_) => false,
        }
    }

    async fn claim_doctor_room(&self) {
        match self.doctor_rooms.acquire().await {
            Ok(permit) => permit.forget(),
            // The semaphore is never closed.
            Err(_) => unreachable!("doctor-room semaphore closed"),
        }
        self.note_doctor_claimed().await;
    }

    async fn note_doctor_claimed(&self) {
        let mut free_doctors = self.free_doctors.lock().await;
        debug_assert!(*free_doctors > 0, "claimed a doctor room with no announcement");
        *free_doctors = free_doctors.saturating_sub(1);
    }

    fn hand_back_chair(&self, free_chairs: &mut usize) {
        self.chairs.add_permits(1);
        *free_chairs += 1;
        debug_assert!(*free_chairs <= self.num_chairs, "more free chairs than chairs");
    }

    /// Current free-chair count. Observability only.
    pub async fn free_chairs(&self) -> usize {
        *self.free_chairs.lock().await
    }

    /// Current count of unclaimed free-doctor announcements. Observability only.
    pub async fn free_doctors(&self) -> usize {
        *self.free_doctors.lock().await
    }

    pub fn num_chairs(&self) -> usize {
        self.num_chairs
    }

    pub fn num_doctors(&self) -> usize {
        self.num_doctors
    }
}
