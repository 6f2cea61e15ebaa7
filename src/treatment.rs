//! The treatment seam.
//!
//! The coordination core does not care what a treatment does, only that
//! it occupies the doctor for some time. Real clinics plug in whatever
//! blocking or timed operation they need.

use std::time::Duration;

use async_trait::async_trait;

use crate::doctor::DoctorId;

/// One unit of service work, run by exactly one doctor task at a time.
#[async_trait]
pub trait Treat: Send + Sync + 'static {
    async fn treat(&self, doctor: DoctorId, patient: &str);
}

/// Treatment that takes a fixed amount of time.
pub struct FixedDuration(pub Duration);

#[async_trait]
impl Treat for FixedDuration {
    async fn treat(&self, doctor: DoctorId, patient: &str) {
        tracing::trace!(%doctor, patient, duration = ?self.0, "treating");
        tokio::time::sleep(self.0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn fixed_duration_takes_its_time() {
        let treatment = FixedDuration(Duration::from_secs(2));
        let start = Instant::now();
        treatment.treat(DoctorId(0), "User1").await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
