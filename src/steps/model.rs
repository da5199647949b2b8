//! Step tags and payload envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator identifying which stage of the intake flow a payload
/// belongs to.
///
/// Progresses linearly: ProfileType → ProfileDetails → ServiceCategory →
/// ServiceDetails → AdditionalInfo → Review. The initial email capture and
/// the final submission sit outside this tagged sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepTag {
    ProfileType,
    ProfileDetails,
    ServiceCategory,
    ServiceDetails,
    AdditionalInfo,
    Review,
}

impl StepTag {
    /// The first tagged step, expected right after email capture.
    pub fn first() -> StepTag {
        StepTag::ProfileType
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<StepTag> {
        use StepTag::*;
        match self {
            ProfileType => Some(ProfileDetails),
            ProfileDetails => Some(ServiceCategory),
            ServiceCategory => Some(ServiceDetails),
            ServiceDetails => Some(AdditionalInfo),
            AdditionalInfo => Some(Review),
            Review => None,
        }
    }

    /// Whether this is the last tagged step before the final submission.
    pub fn is_last(&self) -> bool {
        matches!(self, Self::Review)
    }
}

impl std::fmt::Display for StepTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ProfileType => "PROFILE_TYPE",
            Self::ProfileDetails => "PROFILE_DETAILS",
            Self::ServiceCategory => "SERVICE_CATEGORY",
            Self::ServiceDetails => "SERVICE_DETAILS",
            Self::AdditionalInfo => "ADDITIONAL_INFO",
            Self::Review => "REVIEW",
        };
        write!(f, "{s}")
    }
}

/// Which profile shape the flow is collecting.
///
/// Selected at the `PROFILE_TYPE` step and reused to pick the
/// `PROFILE_DETAILS` schema branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileKind {
    Residential,
    Commercial,
}

impl ProfileKind {
    /// Parse the wire value (`RESIDENTIAL` / `COMMERCIAL`).
    pub fn parse(s: &str) -> Option<ProfileKind> {
        match s {
            "RESIDENTIAL" => Some(Self::Residential),
            "COMMERCIAL" => Some(Self::Commercial),
            _ => None,
        }
    }
}

/// Common envelope for every tagged step payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPayload {
    pub step: StepTag,
    /// Step-specific fields, validated against the step's schema.
    pub data: Value,
    /// Honeypot. Invisible to human users; any value means a bot filled it.
    #[serde(default)]
    pub website: String,
    /// Client clock at submission time, epoch milliseconds.
    pub client_timestamp: i64,
}

/// The initial email-capture payload. Creates the session; carries no step
/// tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailCapture {
    pub email: String,
    /// Honeypot, same contract as the step envelope.
    #[serde(default)]
    pub website: String,
    /// Client clock at submission time, epoch milliseconds.
    pub timestamp: i64,
}

/// The final submission/consent payload. Completes the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub privacy_policy_accepted: bool,
    #[serde(default)]
    pub terms_accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_consent: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_all_steps_in_order() {
        use StepTag::*;
        let expected = [
            ProfileDetails,
            ServiceCategory,
            ServiceDetails,
            AdditionalInfo,
            Review,
        ];
        let mut current = StepTag::first();
        for expected_next in expected {
            let next = current.next().unwrap();
            assert_eq!(next, expected_next);
            current = next;
        }
        assert!(current.is_last());
        assert!(current.next().is_none());
    }

    #[test]
    fn display_matches_serde() {
        use StepTag::*;
        for tag in [
            ProfileType,
            ProfileDetails,
            ServiceCategory,
            ServiceDetails,
            AdditionalInfo,
            Review,
        ] {
            let display = format!("{tag}");
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }

    #[test]
    fn envelope_deserializes_from_wire_shape() {
        let payload: StepPayload = serde_json::from_str(
            r#"{
                "step": "PROFILE_TYPE",
                "data": {"profileType": "RESIDENTIAL"},
                "website": "",
                "clientTimestamp": 1700000000000
            }"#,
        )
        .unwrap();
        assert_eq!(payload.step, StepTag::ProfileType);
        assert_eq!(payload.client_timestamp, 1_700_000_000_000);
        assert!(payload.website.is_empty());
    }

    #[test]
    fn honeypot_defaults_to_empty_when_absent() {
        let payload: StepPayload = serde_json::from_str(
            r#"{"step": "REVIEW", "data": {}, "clientTimestamp": 1}"#,
        )
        .unwrap();
        assert!(payload.website.is_empty());
    }

    #[test]
    fn submission_flags_default_to_false() {
        let submission: Submission = serde_json::from_str("{}").unwrap();
        assert!(!submission.privacy_policy_accepted);
        assert!(!submission.terms_accepted);
        assert!(submission.marketing_consent.is_none());
    }

    #[test]
    fn profile_kind_parses_wire_values_only() {
        assert_eq!(ProfileKind::parse("COMMERCIAL"), Some(ProfileKind::Commercial));
        assert_eq!(ProfileKind::parse("RESIDENTIAL"), Some(ProfileKind::Residential));
        assert_eq!(ProfileKind::parse("commercial"), None);
    }
}
