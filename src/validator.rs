// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Booking submission validator.
//!
//! Server-side re-validation of lead submissions, independent of whatever
//! the browser form already checked:
//! - Name shape and length
//! - Realistic patient age
//! - Indian mobile number format
//! - Served-city membership
//!
//! Every field is checked in a single pass and all failures are accumulated,
//! so one response can report every problem at once. Input is an untrusted
//! JSON value; wrong types fail the corresponding field check, never crash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Service applied when the form leaves the field blank.
pub const DEFAULT_SERVICE: &str = "General Consultation";

/// Cities with doctor home-visit coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum City {
    Vizag,
    Tirupati,
    Kakinada,
}

impl City {
    /// Case-insensitive, whitespace-tolerant lookup.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "vizag" => Some(City::Vizag),
            "tirupati" => Some(City::Tirupati),
            "kakinada" => Some(City::Kakinada),
            _ => None,
        }
    }

    /// Normalized lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Vizag => "vizag",
            City::Tirupati => "tirupati",
            City::Kakinada => "kakinada",
        }
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failures. The rendered messages are exactly what
/// the API returns to the form.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name must be at least 2 characters")]
    NameTooShort,

    #[error("Name must be less than 50 characters")]
    NameTooLong,

    #[error("Name can only contain letters, spaces, and periods")]
    NameBadCharacters,

    #[error("Age must be between 1 and 120")]
    AgeOutOfRange,

    #[error("Phone must be a valid 10-digit Indian mobile number")]
    InvalidPhone,

    #[error("City must be one of: Vizag, Tirupati, Kakinada")]
    UnknownCity,
}

/// Sanitized booking fields, produced only by a fully successful
/// [`validate`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFields {
    pub name: String,
    pub age: u8,
    pub phone: String,
    pub city: City,
    pub service: String,
}

impl LeadFields {
    /// Promote to a full [`Lead`] with the server-side submission time and
    /// channel tag attached. Client-supplied timestamps are never trusted.
    pub fn into_lead(self, timestamp: DateTime<Utc>, source: &str) -> Lead {
        Lead {
            name: self.name,
            age: self.age,
            phone: self.phone,
            city: self.city,
            service: self.service,
            timestamp,
            source: source.to_string(),
        }
    }
}

/// A validated booking request. Immutable once created; lives for one
/// request and is discarded after alert delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Lead {
    pub name: String,
    pub age: u8,
    pub phone: String,
    pub city: City,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Outcome of validating one raw submission.
#[derive(Debug)]
pub enum ValidationResult {
    /// Every field passed; sanitized values attached.
    Valid(LeadFields),
    /// One or more fields failed; all failures reported together.
    Invalid(Vec<ValidationError>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }
}

/// Validate a raw submission into sanitized lead fields.
///
/// Pure and deterministic: no clock reads, no side effects.
pub fn validate(raw: &Value) -> ValidationResult {
    let mut errors = Vec::new();

    let name = str_field(raw, "name").map(str::trim).unwrap_or("");
    let name_len = name.chars().count();
    if name_len < 2 {
        errors.push(ValidationError::NameTooShort);
    }
    if name_len > 50 {
        errors.push(ValidationError::NameTooLong);
    }
    if name.is_empty() || !name.chars().all(is_name_char) {
        errors.push(ValidationError::NameBadCharacters);
    }

    let age = age_field(raw).filter(|a| (1..=120).contains(a));
    if age.is_none() {
        errors.push(ValidationError::AgeOutOfRange);
    }

    let phone = phone_digits(raw);
    if !is_indian_mobile(&phone) {
        errors.push(ValidationError::InvalidPhone);
    }

    let city = str_field(raw, "city").and_then(City::parse);
    if city.is_none() {
        errors.push(ValidationError::UnknownCity);
    }

    let service = match str_field(raw, "service").map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_SERVICE.to_string(),
    };

    match (age, city) {
        (Some(age), Some(city)) if errors.is_empty() => ValidationResult::Valid(LeadFields {
            name: name.to_string(),
            age: age as u8,
            phone,
            city,
            service,
        }),
        _ => ValidationResult::Invalid(errors),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ' ' || c == '.'
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

/// Age arrives as a string from the browser form, but a JSON number from an
/// API client is accepted too.
fn age_field(raw: &Value) -> Option<i64> {
    match raw.get("age") {
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

/// Strip everything but digits so formatted numbers ("+91-98765-43210",
/// "98765 43210") are judged on their digit content.
fn phone_digits(raw: &Value) -> String {
    str_field(raw, "phone")
        .unwrap_or("")
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

fn is_indian_mobile(digits: &str) -> bool {
    digits.len() == 10 && matches!(digits.as_bytes()[0], b'6'..=b'9')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_submission() -> Value {
        json!({
            "name": "Ravi Kumar",
            "age": "34",
            "phone": "9876543210",
            "city": "Vizag",
        })
    }

    #[test]
    fn accepts_valid_submission_and_normalizes() {
        match validate(&valid_submission()) {
            ValidationResult::Valid(fields) => {
                assert_eq!(fields.name, "Ravi Kumar");
                assert_eq!(fields.age, 34);
                assert_eq!(fields.phone, "9876543210");
                assert_eq!(fields.city, City::Vizag);
                assert_eq!(fields.city.as_str(), "vizag");
                assert_eq!(fields.service, DEFAULT_SERVICE);
            }
            ValidationResult::Invalid(errors) => panic!("should be valid, got {errors:?}"),
        }
    }

    #[test]
    fn accumulates_all_field_errors_in_one_pass() {
        let result = validate(&json!({
            "name": "X",
            "age": "200",
            "phone": "12345",
            "city": "Mumbai",
        }));
        let errors = result.errors();
        assert!(errors.contains(&ValidationError::NameTooShort));
        assert!(errors.contains(&ValidationError::AgeOutOfRange));
        assert!(errors.contains(&ValidationError::InvalidPhone));
        assert!(errors.contains(&ValidationError::UnknownCity));
    }

    #[test]
    fn missing_fields_each_produce_an_error() {
        let result = validate(&json!({}));
        let errors = result.errors();
        assert!(errors.contains(&ValidationError::NameTooShort));
        assert!(errors.contains(&ValidationError::AgeOutOfRange));
        assert!(errors.contains(&ValidationError::InvalidPhone));
        assert!(errors.contains(&ValidationError::UnknownCity));
    }

    #[test]
    fn non_string_types_are_invalid_not_a_crash() {
        let result = validate(&json!({
            "name": 42,
            "age": [1, 2],
            "phone": {"digits": "9876543210"},
            "city": null,
        }));
        assert!(!result.is_valid());
        // name short + name chars + age + phone + city
        assert_eq!(result.errors().len(), 5);
    }

    #[test]
    fn name_rules() {
        let with_name = |name: &str| {
            let mut raw = valid_submission();
            raw["name"] = json!(name);
            raw
        };

        assert!(validate(&with_name("Dr. A. P. J. Abdul Kalam")).is_valid());
        assert!(!validate(&with_name("Ravi2")).is_valid());
        assert!(!validate(&with_name("Ravi_Kumar")).is_valid());
        assert!(!validate(&with_name("R")).is_valid());
        assert!(!validate(&with_name(&"a".repeat(51))).is_valid());
        assert!(validate(&with_name(&"a".repeat(50))).is_valid());
        // Trimmed before the length check
        assert!(validate(&with_name("  Ravi Kumar  ")).is_valid());
    }

    #[test]
    fn age_boundaries() {
        let with_age = |age: Value| {
            let mut raw = valid_submission();
            raw["age"] = age;
            raw
        };

        assert!(validate(&with_age(json!("1"))).is_valid());
        assert!(validate(&with_age(json!("120"))).is_valid());
        assert!(!validate(&with_age(json!("0"))).is_valid());
        assert!(!validate(&with_age(json!("121"))).is_valid());
        assert!(!validate(&with_age(json!("abc"))).is_valid());
        // JSON numbers are accepted alongside form strings
        assert!(validate(&with_age(json!(34))).is_valid());
        assert!(!validate(&with_age(json!(200))).is_valid());
    }

    #[test]
    fn phone_rules() {
        let with_phone = |phone: &str| {
            let mut raw = valid_submission();
            raw["phone"] = json!(phone);
            raw
        };

        // Separators are stripped before the shape check
        match validate(&with_phone("98765 43210")) {
            ValidationResult::Valid(fields) => assert_eq!(fields.phone, "9876543210"),
            ValidationResult::Invalid(errors) => panic!("should be valid, got {errors:?}"),
        }

        assert!(!validate(&with_phone("12345")).is_valid());
        assert!(!validate(&with_phone("5123456789")).is_valid());
        // Country prefix leaves 11 digits, which is rejected
        assert!(!validate(&with_phone("+91-98765-43210")).is_valid());
        assert!(validate(&with_phone("6000000000")).is_valid());
    }

    #[test]
    fn city_membership_is_case_insensitive() {
        let with_city = |city: &str| {
            let mut raw = valid_submission();
            raw["city"] = json!(city);
            raw
        };

        for city in ["vizag", "VIZAG", " Tirupati ", "kakinada"] {
            assert!(validate(&with_city(city)).is_valid(), "{city} should pass");
        }
        let result = validate(&with_city("Hyderabad"));
        assert_eq!(result.errors(), &[ValidationError::UnknownCity]);
    }

    #[test]
    fn service_passes_through_or_defaults() {
        let mut raw = valid_submission();
        raw["service"] = json!("Senior Care");
        match validate(&raw) {
            ValidationResult::Valid(fields) => assert_eq!(fields.service, "Senior Care"),
            ValidationResult::Invalid(errors) => panic!("should be valid, got {errors:?}"),
        }

        raw["service"] = json!("   ");
        match validate(&raw) {
            ValidationResult::Valid(fields) => assert_eq!(fields.service, DEFAULT_SERVICE),
            ValidationResult::Invalid(errors) => panic!("should be valid, got {errors:?}"),
        }
    }

    #[test]
    fn into_lead_attaches_server_metadata() {
        let fields = match validate(&valid_submission()) {
            ValidationResult::Valid(fields) => fields,
            ValidationResult::Invalid(errors) => panic!("should be valid, got {errors:?}"),
        };
        let now = Utc::now();
        let lead = fields.into_lead(now, "website");
        assert_eq!(lead.timestamp, now);
        assert_eq!(lead.source, "website");
    }
}
