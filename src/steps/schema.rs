//! Per-step validation schemas.
//!
//! One validator per step tag, dispatched by a single exhaustive match, plus
//! the step-independent email-capture and submission validators. Validators
//! collect every violated constraint, not just the first, and return a
//! normalized copy of the accepted data (postal codes uppercased, emails
//! lowercased).

use regex::Regex;
use serde_json::Value;

use crate::config::IntakeConfig;
use crate::error::{FieldViolation, ValidationError, ViolationCode};
use crate::steps::model::{EmailCapture, ProfileKind, StepTag, Submission};

/// Email domains rejected as disposable, matched case-insensitively against
/// the part after `@`.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "10minutemail.com",
    "yopmail.com",
    "tempmail.com",
    "temp-mail.org",
    "trashmail.com",
    "sharklasers.com",
    "getnada.com",
    "dispostable.com",
    "maildrop.cc",
    "throwawaymail.com",
];

/// Allowed `urgency` values on the service-details step.
const URGENCY_LEVELS: &[&str] = &["LOW", "MEDIUM", "HIGH", "EMERGENCY"];

/// Allowed `preferredContactMethod` values.
const CONTACT_METHODS: &[&str] = &["EMAIL", "PHONE"];

/// Holds the validation schema for every step plus the step-independent
/// email-capture and submission validators.
pub struct StepSchemaRegistry {
    email_re: Regex,
    phone_re: Regex,
    postal_re: Regex,
    max_email_length: usize,
    max_text_length: usize,
}

impl StepSchemaRegistry {
    pub fn new(config: &IntakeConfig) -> Self {
        Self {
            // Pragmatic format check; deliverability is not validated here.
            email_re: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap(),
            // North-American, tolerant of separators and an optional +1/1.
            phone_re: Regex::new(r"^\+?1?[\s\-.]?\(?\d{3}\)?[\s\-.]?\d{3}[\s\-.]?\d{4}$").unwrap(),
            // Canadian postal code, space or dash between halves optional.
            postal_re: Regex::new(r"^[A-Za-z]\d[A-Za-z][\s\-]?\d[A-Za-z]\d$").unwrap(),
            max_email_length: config.max_email_length,
            max_text_length: config.max_text_length,
        }
    }

    /// Validate the initial email-capture payload. Returns the normalized
    /// (lowercased) email.
    pub fn validate_email_capture(&self, capture: &EmailCapture) -> Result<String, ValidationError> {
        let mut violations = Vec::new();
        let email = self.check_email(&capture.email, &mut violations);
        match email {
            Some(email) if violations.is_empty() => Ok(email),
            _ => Err(ValidationError::Fields(violations)),
        }
    }

    /// Validate a tagged step's data against its schema.
    ///
    /// `profile` is the shape recorded at the `PROFILE_TYPE` step; it selects
    /// the `PROFILE_DETAILS` branch. When absent, the branch is inferred from
    /// the payload itself. Returns a normalized copy of the accepted data.
    pub fn validate_step(
        &self,
        tag: StepTag,
        data: &Value,
        profile: Option<ProfileKind>,
    ) -> Result<Value, ValidationError> {
        let Some(_) = data.as_object() else {
            return Err(ValidationError::Fields(vec![FieldViolation::new(
                "data",
                ViolationCode::InvalidFormat,
                "step data must be an object",
            )]));
        };

        let mut normalized = data.clone();
        let mut violations = Vec::new();
        match tag {
            StepTag::ProfileType => self.check_profile_type(data, &mut violations),
            StepTag::ProfileDetails => {
                self.check_profile_details(data, profile, &mut normalized, &mut violations)
            }
            StepTag::ServiceCategory => self.check_service_category(data, &mut violations),
            StepTag::ServiceDetails => self.check_service_details(data, &mut violations),
            StepTag::AdditionalInfo => self.check_additional_info(data, &mut violations),
            StepTag::Review => self.check_review(data, &mut violations),
        }

        if violations.is_empty() {
            Ok(normalized)
        } else {
            Err(ValidationError::Fields(violations))
        }
    }

    /// Validate the final submission. Both consents must be explicitly true.
    pub fn validate_submission(&self, submission: &Submission) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        if !submission.privacy_policy_accepted {
            violations.push(FieldViolation::new(
                "privacyPolicyAccepted",
                ViolationCode::NotAccepted,
                "privacy policy must be accepted",
            ));
        }
        if !submission.terms_accepted {
            violations.push(FieldViolation::new(
                "termsAccepted",
                ViolationCode::NotAccepted,
                "terms must be accepted",
            ));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(violations))
        }
    }

    // ── Per-step checks ─────────────────────────────────────────────

    fn check_profile_type(&self, data: &Value, violations: &mut Vec<FieldViolation>) {
        match required_str(data, "profileType", violations) {
            Some(s) if ProfileKind::parse(s).is_some() => {}
            Some(_) => violations.push(FieldViolation::new(
                "profileType",
                ViolationCode::OutOfRange,
                "must be RESIDENTIAL or COMMERCIAL",
            )),
            None => {}
        }
    }

    fn check_profile_details(
        &self,
        data: &Value,
        profile: Option<ProfileKind>,
        normalized: &mut Value,
        violations: &mut Vec<FieldViolation>,
    ) {
        let kind = profile.unwrap_or_else(|| {
            // No recorded profile type; a usable business name implies the
            // commercial shape.
            match data.get("businessName").and_then(Value::as_str) {
                Some(name) if !name.trim().is_empty() => ProfileKind::Commercial,
                _ => ProfileKind::Residential,
            }
        });

        match kind {
            ProfileKind::Residential => {
                if let Some(s) = required_str(data, "firstName", violations) {
                    self.check_len(s, "firstName", 100, violations);
                }
                if let Some(s) = required_str(data, "lastName", violations) {
                    self.check_len(s, "lastName", 100, violations);
                }
                if let Some(s) = optional_str(data, "address", violations) {
                    self.check_len(s, "address", 200, violations);
                }
                if let Some(s) = optional_str(data, "city", violations) {
                    self.check_len(s, "city", 100, violations);
                }
            }
            ProfileKind::Commercial => {
                if let Some(s) = required_str(data, "businessName", violations) {
                    self.check_len(s, "businessName", 150, violations);
                }
                for field in ["contactFirstName", "contactLastName"] {
                    if let Some(s) = optional_str(data, field, violations) {
                        self.check_len(s, field, 100, violations);
                    }
                }
            }
        }

        match required_str(data, "phone", violations) {
            Some(s) if !self.phone_re.is_match(s.trim()) => violations.push(FieldViolation::new(
                "phone",
                ViolationCode::InvalidFormat,
                "must be a North-American phone number",
            )),
            _ => {}
        }

        if let Some(s) = optional_str(data, "postalCode", violations) {
            if self.postal_re.is_match(s.trim()) {
                normalized["postalCode"] = Value::String(s.trim().to_uppercase());
            } else {
                violations.push(FieldViolation::new(
                    "postalCode",
                    ViolationCode::InvalidFormat,
                    "must be a Canadian postal code",
                ));
            }
        }
    }

    fn check_service_category(&self, data: &Value, violations: &mut Vec<FieldViolation>) {
        if let Some(s) = required_str(data, "serviceType", violations) {
            self.check_len(s, "serviceType", 100, violations);
        }
    }

    fn check_service_details(&self, data: &Value, violations: &mut Vec<FieldViolation>) {
        if let Some(s) = required_str(data, "description", violations) {
            self.check_len(s, "description", self.max_text_length, violations);
        }
        match required_str(data, "urgency", violations) {
            Some(s) if !URGENCY_LEVELS.contains(&s) => violations.push(FieldViolation::new(
                "urgency",
                ViolationCode::OutOfRange,
                "must be one of LOW, MEDIUM, HIGH, EMERGENCY",
            )),
            _ => {}
        }
        match data.get("estimatedBudget") {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f >= 0.0) => {}
            Some(_) => violations.push(FieldViolation::new(
                "estimatedBudget",
                ViolationCode::OutOfRange,
                "must be a non-negative number",
            )),
        }
    }

    fn check_additional_info(&self, data: &Value, violations: &mut Vec<FieldViolation>) {
        if let Some(s) = optional_str(data, "notes", violations) {
            self.check_len(s, "notes", self.max_text_length, violations);
        }
        if let Some(s) = optional_str(data, "preferredContactMethod", violations) {
            if !CONTACT_METHODS.contains(&s) {
                violations.push(FieldViolation::new(
                    "preferredContactMethod",
                    ViolationCode::OutOfRange,
                    "must be EMAIL or PHONE",
                ));
            }
        }
    }

    fn check_review(&self, data: &Value, violations: &mut Vec<FieldViolation>) {
        if data.get("confirmed").and_then(Value::as_bool) != Some(true) {
            violations.push(FieldViolation::new(
                "confirmed",
                ViolationCode::NotAccepted,
                "review must be confirmed",
            ));
        }
    }

    // ── Shared field checks ─────────────────────────────────────────

    /// Full email check: format, length bounds, disposable-domain list.
    /// Returns the lowercased email when clean.
    fn check_email(&self, email: &str, violations: &mut Vec<FieldViolation>) -> Option<String> {
        let email = email.trim();
        if email.is_empty() {
            violations.push(FieldViolation::new(
                "email",
                ViolationCode::Required,
                "email is required",
            ));
            return None;
        }
        if email.len() < 6 || email.len() > self.max_email_length {
            violations.push(FieldViolation::new(
                "email",
                ViolationCode::TooLong,
                format!("email must be 6-{} characters", self.max_email_length),
            ));
        }
        if !self.email_re.is_match(email) {
            violations.push(FieldViolation::new(
                "email",
                ViolationCode::InvalidFormat,
                "email is not well-formed",
            ));
            return None;
        }
        let normalized = email.to_lowercase();
        if let Some(domain) = normalized.rsplit('@').next() {
            if DISPOSABLE_DOMAINS.contains(&domain) {
                violations.push(FieldViolation::new(
                    "email",
                    ViolationCode::DisposableEmail,
                    "disposable email addresses are not accepted",
                ));
                return None;
            }
        }
        if violations.is_empty() {
            Some(normalized)
        } else {
            None
        }
    }

    fn check_len(&self, s: &str, field: &str, max: usize, violations: &mut Vec<FieldViolation>) {
        if s.len() > max {
            violations.push(FieldViolation::new(
                field,
                ViolationCode::TooLong,
                format!("{field} must be at most {max} characters"),
            ));
        }
    }
}

impl Default for StepSchemaRegistry {
    fn default() -> Self {
        Self::new(&IntakeConfig::default())
    }
}

/// A required, nonempty string field. Absence or emptiness records a
/// violation and yields `None`.
fn required_str<'a>(
    data: &'a Value,
    field: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<&'a str> {
    match data.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            violations.push(FieldViolation::new(
                field,
                ViolationCode::Required,
                format!("{field} is required"),
            ));
            None
        }
        Some(_) => {
            violations.push(FieldViolation::new(
                field,
                ViolationCode::InvalidFormat,
                format!("{field} must be a string"),
            ));
            None
        }
    }
}

/// An optional string field. Present non-strings record a violation.
fn optional_str<'a>(
    data: &'a Value,
    field: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<&'a str> {
    match data.get(field) {
        Some(Value::String(s)) => Some(s.as_str()),
        None | Some(Value::Null) => None,
        Some(_) => {
            violations.push(FieldViolation::new(
                field,
                ViolationCode::InvalidFormat,
                format!("{field} must be a string"),
            ));
            None
        }
    }
}
