use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Verified,
    Building,
    Restricted,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::Verified => "verified",
            TrustLevel::Building => "building",
            TrustLevel::Restricted => "restricted",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrustScoreError {
    #[error("score must be within 0..=100, got {0}")]
    ScoreOutOfRange(f64),
    #[error("cancellation_rate must be within 0..=1, got {0}")]
    CancellationRateOutOfRange(f64),
    #[error("avg_response_time must be a non-negative number of minutes, got {0}")]
    InvalidResponseTime(f64),
}

/// Behavioral trust counters for a user or a listing.
///
/// `level` and `score` are both supplied by whoever computed the record and are
/// not reconciled here; a `restricted` record may well carry a high score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustScore {
    pub score: f64,
    pub level: TrustLevel,
    #[serde(default)]
    pub verified_id: bool,
    #[serde(default)]
    pub verified_business: bool,
    #[serde(default)]
    pub completed_bookings: u32,
    /// Minutes.
    #[serde(default)]
    pub avg_response_time: f64,
    #[serde(default)]
    pub cancellation_rate: f64,
    #[serde(default)]
    pub dispute_count: u32,
    #[serde(default)]
    pub last_updated_ts: i64,
}

impl TrustScore {
    pub fn validate(&self) -> Result<(), TrustScoreError> {
        if !(0.0..=100.0).contains(&self.score) {
            return Err(TrustScoreError::ScoreOutOfRange(self.score));
        }
        if !(0.0..=1.0).contains(&self.cancellation_rate) {
            return Err(TrustScoreError::CancellationRateOutOfRange(
                self.cancellation_rate,
            ));
        }
        if !self.avg_response_time.is_finite() || self.avg_response_time < 0.0 {
            return Err(TrustScoreError::InvalidResponseTime(self.avg_response_time));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TrustScore {
        TrustScore {
            score: 72.0,
            level: TrustLevel::Building,
            verified_id: true,
            verified_business: false,
            completed_bookings: 3,
            avg_response_time: 12.0,
            cancellation_rate: 0.05,
            dispute_count: 0,
            last_updated_ts: 0,
        }
    }

    #[test]
    fn level_uses_lowercase_names() {
        let json = serde_json::to_string(&TrustLevel::Restricted).unwrap();
        assert_eq!(json, "\"restricted\"");
        assert_eq!(TrustLevel::Verified.as_str(), "verified");
    }

    #[test]
    fn unknown_level_is_rejected() {
        let parsed = serde_json::from_str::<TrustLevel>("\"gold\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let score: TrustScore =
            serde_json::from_str(r#"{"score": 10, "level": "building"}"#).unwrap();
        assert_eq!(score.completed_bookings, 0);
        assert!(!score.verified_id);
        assert_eq!(score.cancellation_rate, 0.0);
    }

    #[test]
    fn validate_accepts_well_formed_record() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_out_of_range_fields() {
        let mut s = sample();
        s.score = 120.0;
        assert_eq!(s.validate(), Err(TrustScoreError::ScoreOutOfRange(120.0)));

        let mut s = sample();
        s.cancellation_rate = 1.5;
        assert_eq!(
            s.validate(),
            Err(TrustScoreError::CancellationRateOutOfRange(1.5))
        );

        let mut s = sample();
        s.avg_response_time = -1.0;
        assert_eq!(s.validate(), Err(TrustScoreError::InvalidResponseTime(-1.0)));
    }
}
