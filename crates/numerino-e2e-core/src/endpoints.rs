// crates/numerino-e2e-core/src/endpoints.rs
// ============================================================================
// Module: Backend Endpoint Table
// Description: Route templates exposed by the backend under test.
// Purpose: Keep every exercised path in one typed table.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Paths are relative to the configured API base (`base_url + api_prefix`).
//! Templates containing `{id}` are expanded with [`Endpoint::with_id`].

// ============================================================================
// SECTION: Types
// ============================================================================

/// Route namespaces exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Authentication and diagnostics.
    Auth,
    /// Institution registry.
    Institutions,
    /// Self-service registration.
    Registration,
    /// User profiles and administration.
    Users,
    /// Audit trail queries.
    Audit,
    /// Session management.
    Sessions,
}

impl Namespace {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Institutions => "institutions",
            Self::Registration => "registration",
            Self::Users => "users",
            Self::Audit => "audit",
            Self::Sessions => "sessions",
        }
    }
}

/// Placeholder substituted by [`Endpoint::with_id`].
const ID_PLACEHOLDER: &str = "{id}";

/// Declares the endpoint enum alongside its namespace and path template.
macro_rules! endpoints {
    ($( $(#[$doc:meta])* $variant:ident => ($namespace:ident, $path:literal), )+) => {
        /// Backend routes exercised by the harness.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Endpoint {
            $( $(#[$doc])* $variant, )+
        }

        impl Endpoint {
            /// Every known endpoint, in table order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Returns the path template relative to the API base.
            #[must_use]
            pub const fn path(self) -> &'static str {
                match self {
                    $( Self::$variant => $path, )+
                }
            }

            /// Returns the namespace the endpoint belongs to.
            #[must_use]
            pub const fn namespace(self) -> Namespace {
                match self {
                    $( Self::$variant => Namespace::$namespace, )+
                }
            }

            /// Returns the stable variant name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }
        }
    };
}

endpoints! {
    /// Service health probe.
    AuthHealth => (Auth, "/auth/health"),
    /// Database connectivity probe.
    AuthDbTest => (Auth, "/auth/db-test"),
    /// Stored procedure probe.
    AuthSpTest => (Auth, "/auth/sp-test"),
    /// Email/password login.
    AuthLogin => (Auth, "/auth/login"),
    /// Username/password student login.
    AuthStudentLogin => (Auth, "/auth/student-login"),
    /// Session logout.
    AuthLogout => (Auth, "/auth/logout"),
    /// Access token refresh.
    AuthRefreshToken => (Auth, "/auth/refresh-token"),
    /// Email verification.
    AuthVerifyEmail => (Auth, "/auth/verify-email"),
    /// Verification email resend.
    AuthResendVerification => (Auth, "/auth/resend-verification"),
    /// Password reset request.
    AuthForgotPassword => (Auth, "/auth/forgot-password"),
    /// Password reset confirmation.
    AuthResetPassword => (Auth, "/auth/reset-password"),
    /// Institution listing and registration.
    Institutions => (Institutions, "/institutions"),
    /// Institution by id.
    InstitutionById => (Institutions, "/institutions/{id}"),
    /// Institution search.
    InstitutionSearch => (Institutions, "/institutions/search"),
    /// Student registration.
    RegisterStudent => (Registration, "/register/students"),
    /// Teacher registration.
    RegisterTeacher => (Registration, "/register/teachers"),
    /// Guardian registration.
    RegisterGuardian => (Registration, "/register/guardians"),
    /// Email availability check.
    RegisterCheckEmail => (Registration, "/register/check-email"),
    /// Username availability check.
    RegisterCheckUsername => (Registration, "/register/check-username"),
    /// Student/guardian association.
    RegisterAssociateStudentToGuardian => (Registration, "/register/associate-student-to-guardian"),
    /// Debug view of a user record.
    RegisterDebugUser => (Registration, "/register/debug/user/{id}"),
    /// Student profile repair.
    RegisterFixStudentProfile => (Registration, "/register/fix-student-profile"),
    /// Student profile table migration.
    RegisterAlterStudentProfileTable => (Registration, "/register/alter-student-profile-table"),
    /// Current user profile.
    UserProfile => (Users, "/users/profile"),
    /// User search.
    UserSearch => (Users, "/users/search"),
    /// Student profile by id.
    UserStudent => (Users, "/users/students/{id}"),
    /// Teacher profile by id.
    UserTeacher => (Users, "/users/teachers/{id}"),
    /// Guardian profile by id.
    UserGuardian => (Users, "/users/guardians/{id}"),
    /// Students associated with a guardian.
    UserGuardianStudents => (Users, "/users/guardians/{id}/students"),
    /// Guardian/student association.
    UserAssociateStudent => (Users, "/users/guardians/associate-student"),
    /// Password change.
    UserPassword => (Users, "/users/{id}/password"),
    /// Profile picture update.
    UserProfilePicture => (Users, "/users/{id}/profile-picture"),
    /// User deactivation.
    UserDeactivate => (Users, "/users/{id}"),
    /// Audit search.
    AuditSearch => (Audit, "/audit/search"),
    /// Login history.
    AuditLoginHistory => (Audit, "/audit/login-history"),
    /// Activity log.
    AuditActivity => (Audit, "/audit/activity"),
    /// Suspicious activity report.
    AuditSuspiciousActivity => (Audit, "/audit/suspicious-activity"),
    /// Session listing.
    Sessions => (Sessions, "/sessions"),
    /// Session rename.
    SessionRename => (Sessions, "/sessions/{id}/rename"),
    /// Session by id.
    SessionById => (Sessions, "/sessions/{id}"),
    /// Every session of the caller.
    SessionsAll => (Sessions, "/sessions/all"),
    /// Every session except the current one.
    SessionsAllExceptCurrent => (Sessions, "/sessions/all-except-current"),
    /// Sessions of a given user.
    SessionsByUser => (Sessions, "/sessions/user/{id}"),
}

impl Endpoint {
    /// Returns true when the template requires an id.
    #[must_use]
    pub fn needs_id(self) -> bool {
        self.path().contains(ID_PLACEHOLDER)
    }

    /// Expands the `{id}` placeholder.
    #[must_use]
    pub fn with_id(self, id: impl std::fmt::Display) -> String {
        self.path().replace(ID_PLACEHOLDER, &id.to_string())
    }
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
        clippy::use_debug,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::collections::HashSet;

    use super::Endpoint;
    use super::Namespace;

    #[test]
    fn paths_are_unique_and_rooted() {
        let mut seen = HashSet::new();
        for endpoint in Endpoint::ALL {
            assert!(endpoint.path().starts_with('/'), "{}", endpoint.name());
            assert!(seen.insert(endpoint.path()), "duplicate {}", endpoint.path());
        }
    }

    #[test]
    fn namespaces_match_path_roots() {
        for endpoint in Endpoint::ALL {
            let root = match endpoint.namespace() {
                Namespace::Auth => "/auth",
                Namespace::Institutions => "/institutions",
                Namespace::Registration => "/register",
                Namespace::Users => "/users",
                Namespace::Audit => "/audit",
                Namespace::Sessions => "/sessions",
            };
            assert!(endpoint.path().starts_with(root), "{}", endpoint.name());
        }
    }

    #[test]
    fn with_id_expands_placeholder() {
        assert_eq!(Endpoint::UserGuardianStudents.with_id(123), "/users/guardians/123/students");
        assert_eq!(Endpoint::InstitutionById.with_id("a113"), "/institutions/a113");
        assert!(Endpoint::SessionRename.needs_id());
        assert!(!Endpoint::AuthLogin.needs_id());
    }
}
