//! Login and the per-request identity every manager operation is called with.

use crate::error::{Error, Result};
use crate::models::{Role, Teacher};

/// The authenticated staff member on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub teacher_id: String,
    pub name: String,
    pub role: Role,
    pub department: String,
}

impl Session {
    /// Fails with [`Error::Forbidden`] unless the session belongs to an admin or department admin.
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden {
                action,
                role: self.role,
            })
        }
    }
}

impl From<&Teacher> for Session {
    fn from(teacher: &Teacher) -> Self {
        Self {
            teacher_id: teacher.teacher_id.clone(),
            name: teacher.name.clone(),
            role: teacher.role,
            department: teacher.department.clone(),
        }
    }
}

/// Finds the staff account matching `email` (case-insensitive) and `password`.
///
/// Passwords are compared in plaintext. Both an unknown email and a wrong password produce the
/// same [`Error::InvalidCredentials`]. An account with an empty email or password cell can never
/// log in.
pub fn authenticate(teachers: &[Teacher], email: &str, password: &str) -> Result<Session> {
    let email = email.trim().to_lowercase();

    teachers
        .iter()
        .find(|teacher| {
            let stored_email = teacher.email.trim();
            let stored_password = teacher.password.trim();
            !stored_email.is_empty()
                && !stored_password.is_empty()
                && stored_email.to_lowercase() == email
                && stored_password == password
        })
        .map(Session::from)
        .ok_or(Error::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teachers() -> Vec<Teacher> {
        vec![
            Teacher {
                teacher_id: "T1".into(),
                name: "Asha".into(),
                role: Role::Teacher,
                department: "PHY".into(),
                email: "Asha@College.edu ".into(),
                password: "1234 ".into(),
            },
            Teacher {
                teacher_id: "A1".into(),
                name: "Office".into(),
                role: Role::Admin,
                department: String::new(),
                email: "office@college.edu".into(),
                password: "secret".into(),
            },
        ]
    }

    #[test]
    fn matches_email_case_insensitively() {
        let session = authenticate(&teachers(), " asha@college.EDU", "1234").unwrap();
        assert_eq!(session.teacher_id, "T1");
        assert_eq!(session.role, Role::Teacher);
        assert_eq!(session.department, "PHY");
    }

    #[test]
    fn failures_are_indistinguishable() {
        let wrong_password = authenticate(&teachers(), "asha@college.edu", "nope").unwrap_err();
        let unknown_email = authenticate(&teachers(), "who@college.edu", "1234").unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, Error::InvalidCredentials));
    }

    #[test]
    fn empty_stored_credentials_never_match() {
        let mut teachers = teachers();
        teachers[0].password = String::new();
        teachers[1].email = "  ".into();

        assert!(matches!(
            authenticate(&teachers, "asha@college.edu", ""),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&teachers, "", "secret"),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn only_admins_pass_the_admin_gate() {
        let teacher = authenticate(&teachers(), "asha@college.edu", "1234").unwrap();
        let admin = authenticate(&teachers(), "office@college.edu", "secret").unwrap();

        assert!(matches!(
            teacher.require_admin("delete attendance"),
            Err(Error::Forbidden { .. })
        ));
        assert!(admin.require_admin("delete attendance").is_ok());
    }
}
