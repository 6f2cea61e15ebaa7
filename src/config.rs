//! Clinic sizing and timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one clinic.
///
/// Defaults mirror the classic scenario: two doctors, two waiting-room
/// chairs, two-second treatments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// Number of doctors (service capacity). Must be at least one.
    pub num_doctors: usize,
    /// Number of waiting-room chairs. Zero means every walk-in is turned away.
    pub num_chairs: usize,
    /// How long one treatment takes.
    pub treatment_duration: Duration,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            num_doctors: 2,
            num_chairs: 2,
            treatment_duration: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("clinic needs at least one doctor")]
    NoDoctors,

    #[error("treatment duration must be non-zero")]
    ZeroTreatment,
}

impl ClinicConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_doctors == 0 {
            return Err(ConfigError::NoDoctors);
        }
        if self.treatment_duration.is_zero() {
            return Err(ConfigError::ZeroTreatment);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ClinicConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_doctors, 2);
        assert_eq!(config.num_chairs, 2);
    }

    #[test]
    fn zero_doctors_rejected() {
        let config = ClinicConfig {
            num_doctors: 0,
            ..ClinicConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoDoctors)));
    }

    #[test]
    fn zero_treatment_rejected() {
        let config = ClinicConfig {
            treatment_duration: Duration::ZERO,
            ..ClinicConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTreatment)));
    }

    #[test]
    fn zero_chairs_allowed() {
        // A clinic with no waiting room is legal; it just rejects everyone.
        let config = ClinicConfig {
            num_chairs: 0,
            ..ClinicConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
