// crates/numerino-e2e-core/src/generate.rs
// ============================================================================
// Module: Test Data Generators
// Description: Unique identities and request payloads for registration.
// Purpose: Produce collision-free emails/usernames and backend payloads.
// Dependencies: rand, serde_json
// ============================================================================

//! ## Overview
//! Identities combine the unix-millis timestamp, a random suffix, and a
//! process-local sequence, so repeated calls within one phase never collide
//! and separate runs stay distinct.
//!
//! Payload builders return [`serde_json::Value`] documents matching the
//! backend's camelCase request DTOs. [`set_field`] and [`remove_field`]
//! derive invalid variants for negative checks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use rand::Rng;
use serde_json::Value;
use serde_json::json;

use crate::shared_data::now_millis;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Password used for generated students.
pub const STUDENT_PASSWORD: &str = "TestPass123!";
/// Password used for generated teachers.
pub const TEACHER_PASSWORD: &str = "TeacherPass123!";
/// Password used for generated guardians.
pub const GUARDIAN_PASSWORD: &str = "GuardianPass123!";
/// Birth date used for generated students.
const STUDENT_BIRTH_DATE: &str = "2010-05-15T00:00:00Z";
/// STEM area assigned to generated teachers.
const DEFAULT_STEM_AREA_ID: i64 = 1;
/// Phone number used for generated guardians.
const GUARDIAN_PHONE: &str = "+51955736644";

/// Process-local sequence mixed into identities.
static SEQUENCE: AtomicU32 = AtomicU32::new(0);

// ============================================================================
// SECTION: Identities
// ============================================================================

/// A unique set of personal fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIdentity {
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Phone number.
    pub phone: String,
}

/// Generates a fresh identity.
#[must_use]
pub fn unique_identity() -> UniqueIdentity {
    let timestamp = now_millis();
    let random: u32 = rand::thread_rng().gen_range(0 .. 1000);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let last4 = timestamp % 10_000;
    UniqueIdentity {
        email: format!("test_{timestamp}_{random}_{sequence}@example.com"),
        username: format!("user_{timestamp}_{random}_{sequence}"),
        first_name: format!("TestUser_{random}"),
        last_name: format!("LastName_{timestamp}"),
        phone: format!("+51300{random:03}{last4:04}"),
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Complete institution registration payload.
#[must_use]
pub fn institution_full(timestamp: u64) -> Value {
    json!({
        "name": format!("Instituto de Prueba {timestamp}"),
        "address": "Calle 123 # 45-67",
        "city": "Bogotá",
        "state": "Cundinamarca",
        "country": "Colombia",
        "postalCode": "110111",
        "phone": "+51-1-5551234",
        "email": format!("contacto{timestamp}@instituto.edu.co"),
        "website": format!("https://instituto{timestamp}.edu.co"),
        "logoUrl": format!("https://instituto{timestamp}.edu.co/logo.png"),
    })
}

/// Institution payload with only the required fields.
#[must_use]
pub fn institution_minimal(timestamp: u64) -> Value {
    json!({
        "name": format!("Instituto Mínimo {timestamp}"),
        "address": "Dirección requerida",
        "city": "Ciudad",
        "country": "País",
        "phone": "+57-1-1234567",
        "email": format!("minimal{timestamp}@test.com"),
    })
}

/// Student registration payload.
#[must_use]
pub fn student_registration(identity: &UniqueIdentity, institution_id: i64) -> Value {
    json!({
        "firstName": "María",
        "lastName": "González",
        "email": identity.email,
        "password": STUDENT_PASSWORD,
        "username": identity.username,
        "birth_date": STUDENT_BIRTH_DATE,
        "institutionId": institution_id,
        "guardianProfileId": Value::Null,
    })
}

/// Teacher registration payload.
#[must_use]
pub fn teacher_registration(identity: &UniqueIdentity, institution_id: i64) -> Value {
    json!({
        "firstName": "Carlos",
        "lastName": "Ramírez",
        "email": identity.email,
        "password": TEACHER_PASSWORD,
        "institutionId": institution_id,
        "stemAreaId": DEFAULT_STEM_AREA_ID,
    })
}

/// Guardian registration payload.
#[must_use]
pub fn guardian_registration(identity: &UniqueIdentity) -> Value {
    json!({
        "firstName": "Ana",
        "lastName": "Martínez",
        "email": identity.email,
        "password": GUARDIAN_PASSWORD,
        "phone": GUARDIAN_PHONE,
    })
}

/// Returns `payload` with `key` set to `value` (objects only).
#[must_use]
pub fn set_field(mut payload: Value, key: &str, value: Value) -> Value {
    if let Some(object) = payload.as_object_mut() {
        object.insert(key.to_string(), value);
    }
    payload
}

/// Returns `payload` without `key` (objects only).
#[must_use]
pub fn remove_field(mut payload: Value, key: &str) -> Value {
    if let Some(object) = payload.as_object_mut() {
        object.remove(key);
    }
    payload
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::collections::HashSet;

    use serde_json::json;

    use super::guardian_registration;
    use super::institution_full;
    use super::remove_field;
    use super::set_field;
    use super::student_registration;
    use super::unique_identity;

    #[test]
    fn identities_do_not_collide() {
        let mut emails = HashSet::new();
        let mut usernames = HashSet::new();
        for _ in 0 .. 200 {
            let identity = unique_identity();
            assert!(emails.insert(identity.email.clone()));
            assert!(usernames.insert(identity.username.clone()));
            assert!(identity.email.ends_with("@example.com"));
            assert!(identity.phone.starts_with("+51300"));
            assert_eq!(identity.phone.len(), "+51300".len() + 7);
        }
    }

    #[test]
    fn identity_fields_share_timestamp_and_suffixes() {
        let identity = unique_identity();
        let email = identity.email.strip_suffix("@example.com").unwrap();
        let email_parts: Vec<&str> = email.strip_prefix("test_").unwrap().split('_').collect();
        let user_parts: Vec<&str> =
            identity.username.strip_prefix("user_").unwrap().split('_').collect();
        assert_eq!(email_parts.len(), 3);
        assert_eq!(email_parts, user_parts);
        assert_eq!(identity.last_name, format!("LastName_{}", email_parts[0]));
        assert_eq!(identity.first_name, format!("TestUser_{}", email_parts[1]));
        let random: u32 = email_parts[1].parse().unwrap();
        assert!(random < 1000);
        assert_eq!(&identity.phone["+51300".len() .. "+51300".len() + 3], format!("{random:03}"));
    }

    #[test]
    fn student_payload_matches_backend_fields() {
        let identity = unique_identity();
        let payload = student_registration(&identity, 12);
        assert_eq!(payload["institutionId"], json!(12));
        assert_eq!(payload["birth_date"], json!("2010-05-15T00:00:00Z"));
        assert_eq!(payload["username"], json!(identity.username));
        assert!(payload["guardianProfileId"].is_null());
    }

    #[test]
    fn field_helpers_derive_invalid_variants() {
        let payload = guardian_registration(&unique_identity());
        let without_phone = remove_field(payload.clone(), "phone");
        assert!(without_phone.get("phone").is_none());
        let short_phone = set_field(payload, "phone", json!("123"));
        assert_eq!(short_phone["phone"], json!("123"));
    }

    #[test]
    fn institution_payload_embeds_timestamp() {
        let payload = institution_full(1_700_000_000_000);
        assert_eq!(payload["name"], json!("Instituto de Prueba 1700000000000"));
        assert_eq!(payload["website"], json!("https://instituto1700000000000.edu.co"));
    }
}
