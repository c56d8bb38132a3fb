// crates/numerino-e2e-core/src/shared_data.rs
// ============================================================================
// Module: Shared Test Data
// Description: JSON-backed record of identities created across phases.
// Purpose: Let later phases reuse institutions and accounts created earlier.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Phases run as separate processes, so identities they create are persisted
//! to a JSON file. The store is opened at phase start and every mutation is
//! written back immediately. Phases run strictly sequentially, so the last
//! writer wins and no locking is needed.
//!
//! ## Invariants
//! - Opening never fails: missing or corrupt files fall back to defaults.
//! - File keys are merged shallowly over defaults, so absent keys keep
//!   their default values.
//! - `createdEmails` and `createdUsernames` never contain duplicates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Shared data persistence errors.
#[derive(Debug, Error)]
pub enum SharedDataError {
    /// Filesystem failure.
    #[error("shared data io error at {path}: {message}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        message: String,
    },
    /// Serialization failure.
    #[error("shared data json error: {0}")]
    Json(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Persisted identities and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTestData {
    /// Institution used by registration checks.
    pub institution_id: i64,
    /// Teacher user id.
    pub teacher_id: Option<i64>,
    /// Teacher profile id.
    pub teacher_profile_id: Option<i64>,
    /// Teacher login email.
    pub teacher_email: Option<String>,
    /// Teacher password.
    pub teacher_password: Option<String>,
    /// Guardian user id.
    pub guardian_id: Option<i64>,
    /// Guardian profile id.
    pub guardian_profile_id: Option<i64>,
    /// Guardian login email.
    pub guardian_email: Option<String>,
    /// Guardian password.
    pub guardian_password: Option<String>,
    /// Student user id.
    pub student_id: Option<i64>,
    /// Student profile id.
    pub student_profile_id: Option<i64>,
    /// Student email.
    pub student_email: Option<String>,
    /// Student username.
    pub student_username: Option<String>,
    /// Student password.
    pub student_password: Option<String>,
    /// Every email registered by the harness.
    pub created_emails: Vec<String>,
    /// Every username registered by the harness.
    pub created_usernames: Vec<String>,
    /// Unix-millis id of the run that last initialized the file.
    pub test_run_id: Option<u64>,
}

impl SharedTestData {
    /// Returns the defaults for a given fallback institution.
    #[must_use]
    pub const fn with_fallback(institution_id: i64) -> Self {
        Self {
            institution_id,
            teacher_id: None,
            teacher_profile_id: None,
            teacher_email: None,
            teacher_password: None,
            guardian_id: None,
            guardian_profile_id: None,
            guardian_email: None,
            guardian_password: None,
            student_id: None,
            student_profile_id: None,
            student_email: None,
            student_username: None,
            student_password: None,
            created_emails: Vec::new(),
            created_usernames: Vec::new(),
            test_run_id: None,
        }
    }
}

/// Ids and credentials for one created account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountRecord {
    /// User id.
    pub user_id: Option<i64>,
    /// Role profile id.
    pub profile_id: Option<i64>,
    /// Login email.
    pub email: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Username (students only).
    pub username: Option<String>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// File-backed [`SharedTestData`].
#[derive(Debug, Clone)]
pub struct SharedDataStore {
    /// Backing file.
    path: PathBuf,
    /// Institution id used for defaults.
    fallback_institution_id: i64,
    /// In-memory copy.
    data: SharedTestData,
}

impl SharedDataStore {
    /// Opens the store, falling back to defaults when the file is missing or
    /// unreadable.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, fallback_institution_id: i64) -> Self {
        let path = path.into();
        let data = load_or_default(&path, fallback_institution_id);
        Self {
            path,
            fallback_institution_id,
            data,
        }
    }

    /// Re-reads the backing file.
    pub fn reload(&mut self) {
        self.data = load_or_default(&self.path, self.fallback_institution_id);
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the in-memory data.
    #[must_use]
    pub const fn data(&self) -> &SharedTestData {
        &self.data
    }

    /// Writes the data atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when serialization or the filesystem fails.
    pub fn save(&self) -> Result<(), SharedDataError> {
        let io_error = |path: &Path, err: std::io::Error| SharedDataError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        };
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
        }
        let mut bytes = serde_json::to_vec_pretty(&self.data)
            .map_err(|err| SharedDataError::Json(err.to_string()))?;
        bytes.push(b'\n');
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(|err| io_error(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| io_error(&self.path, err))?;
        debug!(path = %self.path.display(), "shared test data saved");
        Ok(())
    }

    /// Starts a new run: stamps `testRunId` and saves.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when saving fails.
    pub fn initialize_run(&mut self) -> Result<u64, SharedDataError> {
        let run_id = now_millis();
        self.data.test_run_id = Some(run_id);
        self.save()?;
        Ok(run_id)
    }

    /// Stores the institution id.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when saving fails.
    pub fn set_institution_id(&mut self, institution_id: i64) -> Result<(), SharedDataError> {
        self.data.institution_id = institution_id;
        self.save()
    }

    /// Stores the teacher account.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when saving fails.
    pub fn set_teacher(&mut self, record: AccountRecord) -> Result<(), SharedDataError> {
        self.remember_email(record.email.as_deref());
        self.data.teacher_id = record.user_id;
        self.data.teacher_profile_id = record.profile_id;
        self.data.teacher_email = record.email;
        self.data.teacher_password = record.password;
        self.save()
    }

    /// Stores the guardian account.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when saving fails.
    pub fn set_guardian(&mut self, record: AccountRecord) -> Result<(), SharedDataError> {
        self.remember_email(record.email.as_deref());
        self.data.guardian_id = record.user_id;
        self.data.guardian_profile_id = record.profile_id;
        self.data.guardian_email = record.email;
        self.data.guardian_password = record.password;
        self.save()
    }

    /// Stores the student account.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when saving fails.
    pub fn set_student(&mut self, record: AccountRecord) -> Result<(), SharedDataError> {
        self.remember_email(record.email.as_deref());
        if let Some(username) = record.username.as_deref()
            && !self.is_username_used(username)
        {
            self.data.created_usernames.push(username.to_string());
        }
        self.data.student_id = record.user_id;
        self.data.student_profile_id = record.profile_id;
        self.data.student_email = record.email;
        self.data.student_username = record.username;
        self.data.student_password = record.password;
        self.save()
    }

    /// Returns the stored teacher account.
    #[must_use]
    pub fn teacher(&self) -> AccountRecord {
        AccountRecord {
            user_id: self.data.teacher_id,
            profile_id: self.data.teacher_profile_id,
            email: self.data.teacher_email.clone(),
            password: self.data.teacher_password.clone(),
            username: None,
        }
    }

    /// Returns the stored guardian account.
    #[must_use]
    pub fn guardian(&self) -> AccountRecord {
        AccountRecord {
            user_id: self.data.guardian_id,
            profile_id: self.data.guardian_profile_id,
            email: self.data.guardian_email.clone(),
            password: self.data.guardian_password.clone(),
            username: None,
        }
    }

    /// Returns the stored student account.
    #[must_use]
    pub fn student(&self) -> AccountRecord {
        AccountRecord {
            user_id: self.data.student_id,
            profile_id: self.data.student_profile_id,
            email: self.data.student_email.clone(),
            password: self.data.student_password.clone(),
            username: self.data.student_username.clone(),
        }
    }

    /// Returns true when the harness registered `email` before.
    #[must_use]
    pub fn is_email_used(&self, email: &str) -> bool {
        self.data.created_emails.iter().any(|known| known == email)
    }

    /// Returns true when the harness registered `username` before.
    #[must_use]
    pub fn is_username_used(&self, username: &str) -> bool {
        self.data.created_usernames.iter().any(|known| known == username)
    }

    /// Resets to defaults and saves.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError`] when saving fails.
    pub fn cleanup(&mut self) -> Result<(), SharedDataError> {
        self.data = SharedTestData::with_fallback(self.fallback_institution_id);
        self.save()
    }

    /// Renders the data as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SharedDataError::Json`] when serialization fails.
    pub fn render(&self) -> Result<String, SharedDataError> {
        serde_json::to_string_pretty(&self.data)
            .map_err(|err| SharedDataError::Json(err.to_string()))
    }

    /// Appends `email` to the created list when new.
    fn remember_email(&mut self, email: Option<&str>) {
        if let Some(email) = email
            && !self.is_email_used(email)
        {
            self.data.created_emails.push(email.to_string());
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current unix time in milliseconds.
#[must_use]
pub fn now_millis() -> u64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Loads the file, merging its keys over defaults.
fn load_or_default(path: &Path, fallback_institution_id: i64) -> SharedTestData {
    let defaults = SharedTestData::with_fallback(fallback_institution_id);
    if !path.exists() {
        return defaults;
    }
    match read_merged(path, &defaults) {
        Ok(data) => data,
        Err(message) => {
            warn!(
                path = %path.display(),
                error = %message,
                "shared test data unreadable, using defaults"
            );
            defaults
        }
    }
}

/// Reads `path` and overlays its top-level keys on `defaults`, one key at a
/// time. A key whose value does not fit its field (such as `null` for
/// `institutionId`) keeps the default and leaves the other keys intact.
fn read_merged(path: &Path, defaults: &SharedTestData) -> Result<SharedTestData, String> {
    let text = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let file: Value = serde_json::from_str(&text).map_err(|err| err.to_string())?;
    let Value::Object(overrides) = file else {
        return Err("shared test data must be a JSON object".to_string());
    };
    let Value::Object(mut merged) = serde_json::to_value(defaults).map_err(|err| err.to_string())?
    else {
        return Err("shared test data defaults must serialize to an object".to_string());
    };
    for (key, value) in overrides {
        let previous = merged.insert(key.clone(), value);
        if serde_json::from_value::<SharedTestData>(Value::Object(merged.clone())).is_err() {
            warn!(path = %path.display(), key = %key, "ignoring unusable shared data value");
            match previous {
                Some(previous) => merged.insert(key, previous),
                None => merged.remove(&key),
            };
        }
    }
    serde_json::from_value(Value::Object(merged)).map_err(|err| err.to_string())
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

    use std::fs;

    use tempfile::TempDir;

    use super::AccountRecord;
    use super::SharedDataStore;
    use super::SharedTestData;

    fn store_in(dir: &TempDir) -> SharedDataStore {
        SharedDataStore::open(dir.path().join("nested/test-data.json"), 3)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.data(), &SharedTestData::with_fallback(3));
    }

    #[test]
    fn file_keys_merge_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test-data.json");
        fs::write(&path, r#"{"teacherId": 77, "teacherEmail": "t@example.com"}"#).unwrap();
        let store = SharedDataStore::open(&path, 5);
        assert_eq!(store.data().institution_id, 5);
        assert_eq!(store.data().teacher_id, Some(77));
        assert_eq!(store.teacher().email.as_deref(), Some("t@example.com"));
        assert!(store.data().created_emails.is_empty());
    }

    #[test]
    fn unusable_values_keep_defaults_without_dropping_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test-data.json");
        let text = r#"{"institutionId": null, "teacherId": 55, "createdEmails": "oops",
            "studentUsername": "ana"}"#;
        fs::write(&path, text).unwrap();
        let store = SharedDataStore::open(&path, 3);
        assert_eq!(store.data().institution_id, 3);
        assert_eq!(store.data().teacher_id, Some(55));
        assert!(store.data().created_emails.is_empty());
        assert_eq!(store.data().student_username.as_deref(), Some("ana"));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test-data.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SharedDataStore::open(&path, 3);
        assert_eq!(store.data(), &SharedTestData::with_fallback(3));
    }

    #[test]
    fn setters_persist_and_deduplicate() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let student = AccountRecord {
            user_id: Some(10),
            profile_id: Some(11),
            email: Some("s@example.com".to_string()),
            password: Some("pw".to_string()),
            username: Some("student_1".to_string()),
        };
        store.set_student(student.clone()).unwrap();
        store.set_student(student).unwrap();
        store.set_institution_id(42).unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.data().institution_id, 42);
        assert_eq!(reopened.student().profile_id, Some(11));
        assert_eq!(reopened.data().created_emails, vec!["s@example.com".to_string()]);
        assert_eq!(reopened.data().created_usernames, vec!["student_1".to_string()]);
        assert!(reopened.is_email_used("s@example.com"));
        assert!(reopened.is_username_used("student_1"));
    }

    #[test]
    fn cleanup_resets_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.initialize_run().unwrap();
        store
            .set_teacher(AccountRecord {
                user_id: Some(1),
                email: Some("t@example.com".to_string()),
                ..AccountRecord::default()
            })
            .unwrap();
        store.cleanup().unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.data(), &SharedTestData::with_fallback(3));
    }

    #[test]
    fn reload_observes_other_writers() {
        let dir = TempDir::new().unwrap();
        let mut reader = store_in(&dir);
        let mut writer = store_in(&dir);
        writer.set_institution_id(9).unwrap();
        assert_eq!(reader.data().institution_id, 3);
        reader.reload();
        assert_eq!(reader.data().institution_id, 9);
    }

    #[test]
    fn render_uses_camel_case_keys() {
        let dir = TempDir::new().unwrap();
        let rendered = store_in(&dir).render().unwrap();
        assert!(rendered.contains("\"institutionId\": 3"));
        assert!(rendered.contains("\"createdUsernames\": []"));
    }
}
