//! Presentation, feature gates and improvement tips derived from a
//! [`TrustScore`]. Everything here is a pure function of its input.

use serde::Serialize;

use crate::model::{TrustLevel, TrustScore};

pub const MIN_BOOST_SCORE: f64 = 50.0;
pub const MIN_COMPLETED_BOOKINGS: u32 = 5;
/// Minutes.
pub const MAX_AVG_RESPONSE_TIME: f64 = 30.0;
pub const MAX_CANCELLATION_RATE: f64 = 0.15;

pub const TIP_VERIFY_ID: &str = "Complete ID verification to boost your trust score";
pub const TIP_VERIFY_BUSINESS: &str = "Verify your business documents";
pub const TIP_MORE_BOOKINGS: &str = "Complete more bookings to build reputation";
pub const TIP_RESPONSE_TIME: &str = "Improve response time to inquiries";
pub const TIP_CANCELLATIONS: &str = "Reduce cancellation rate";
pub const TIP_DISPUTES: &str = "Resolve outstanding disputes";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Green,
    Amber,
    Red,
}

impl BadgeColor {
    pub fn hex(&self) -> &'static str {
        match self {
            BadgeColor::Green => "#10B981",
            BadgeColor::Amber => "#F59E0B",
            BadgeColor::Red => "#EF4444",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TrustBadge {
    pub color: BadgeColor,
    pub color_hex: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

pub fn classify(level: TrustLevel) -> TrustBadge {
    let (color, label, icon) = match level {
        TrustLevel::Verified => (BadgeColor::Green, "Verified", "🟢"),
        TrustLevel::Building => (BadgeColor::Amber, "Building Reputation", "🟡"),
        TrustLevel::Restricted => (BadgeColor::Red, "Restricted", "🔴"),
    };
    TrustBadge {
        color,
        color_hex: color.hex(),
        label,
        icon,
    }
}

/// Verified accounts, or anyone whose score clears [`MIN_BOOST_SCORE`].
pub fn can_boost_property(trust_score: Option<&TrustScore>) -> bool {
    match trust_score {
        Some(ts) => ts.level == TrustLevel::Verified || ts.score >= MIN_BOOST_SCORE,
        None => false,
    }
}

/// Verified accounts only; the numeric score does not count.
pub fn can_access_premium_features(trust_score: Option<&TrustScore>) -> bool {
    trust_score.is_some_and(|ts| ts.level == TrustLevel::Verified)
}

/// Tips in a fixed order. Business verification is only suggested once the
/// identity is verified.
pub fn get_recommendations(trust_score: &TrustScore) -> Vec<&'static str> {
    let mut tips = Vec::new();

    if !trust_score.verified_id {
        tips.push(TIP_VERIFY_ID);
    } else if !trust_score.verified_business {
        tips.push(TIP_VERIFY_BUSINESS);
    }

    if trust_score.completed_bookings < MIN_COMPLETED_BOOKINGS {
        tips.push(TIP_MORE_BOOKINGS);
    }

    if trust_score.avg_response_time > MAX_AVG_RESPONSE_TIME {
        tips.push(TIP_RESPONSE_TIME);
    }

    if trust_score.cancellation_rate > MAX_CANCELLATION_RATE {
        tips.push(TIP_CANCELLATIONS);
    }

    if trust_score.dispute_count > 0 {
        tips.push(TIP_DISPUTES);
    }

    tips
}

/// Everything the UI needs to render a trust panel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrustEvaluation {
    pub score: f64,
    pub level: TrustLevel,
    pub badge: TrustBadge,
    pub can_boost_property: bool,
    pub can_access_premium_features: bool,
    pub recommendations: Vec<&'static str>,
}

impl TrustEvaluation {
    pub fn evaluate(trust_score: &TrustScore) -> Self {
        Self {
            score: trust_score.score,
            level: trust_score.level,
            badge: classify(trust_score.level),
            can_boost_property: can_boost_property(Some(trust_score)),
            can_access_premium_features: can_access_premium_features(Some(trust_score)),
            recommendations: get_recommendations(trust_score),
        }
    }
}
