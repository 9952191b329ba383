//! Roles and principals
//!
//! A [`Principal`] is the authenticated actor on whose behalf an engine call
//! runs. It is always passed explicitly; nothing in the domain reads a
//! "current user" from ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AccessError;

/// Staff and patient roles recognised by the clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(rename = "superadmin")]
    SuperAdmin,
    Admin,
    Doctor,
    #[serde(rename = "frontdesk_staff")]
    FrontDeskStaff,
    Patient,
}

impl Role {
    /// All roles, most privileged first
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Doctor,
        Role::FrontDeskStaff,
        Role::Patient,
    ];

    /// Returns the wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::FrontDeskStaff => "frontdesk_staff",
            Role::Patient => "patient",
        }
    }

    /// Superadmin and admin see every record
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// Roles that work the clinic (everyone but patients)
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "superadmin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "frontdesk_staff" => Ok(Role::FrontDeskStaff),
            "patient" => Ok(Role::Patient),
            other => Err(AccessError::UnknownRole(other.to_string())),
        }
    }
}

/// Identifier scoping a doctor's ownership of records
///
/// Doctor ids are opaque strings. A blank id is treated as absent and never
/// matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(String);

impl DoctorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the doctor id from the local part of an e-mail address
    ///
    /// `doctor@dakshinrehab.com` becomes `doctor`. The local part is kept as
    /// written, since record owners are compared verbatim.
    pub fn from_email(email: &str) -> Result<Self, AccessError> {
        match email.trim().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(local.to_string()))
            }
            _ => Err(AccessError::InvalidEmail(email.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Equality that fails closed on blank ids
    pub fn matches(&self, other: &DoctorId) -> bool {
        !self.is_blank() && !other.is_blank() && self.0 == other.0
    }
}

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DoctorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The authenticated actor performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier from the principal source
    pub id: String,
    /// Role held for this session
    pub role: Role,
    /// Doctor scope; required for doctors, ignored for other roles
    pub doctor_id: Option<DoctorId>,
    /// Display name
    pub name: Option<String>,
}

impl Principal {
    /// Creates a principal without a doctor scope
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            doctor_id: None,
            name: None,
        }
    }

    /// Creates a doctor principal
    pub fn doctor(id: impl Into<String>, doctor_id: impl Into<DoctorId>) -> Self {
        Self {
            id: id.into(),
            role: Role::Doctor,
            doctor_id: Some(doctor_id.into()),
            name: None,
        }
    }

    /// Builds a principal the way the login flow does: the doctor scope is
    /// the local part of the e-mail address.
    pub fn from_email(id: impl Into<String>, email: &str, role: Role) -> Result<Self, AccessError> {
        let doctor_id = DoctorId::from_email(email)?;
        Ok(Self {
            id: id.into(),
            role,
            doctor_id: Some(doctor_id),
            name: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the doctor scope if it is usable (present and non-blank)
    pub fn scoped_doctor(&self) -> Option<&DoctorId> {
        self.doctor_id.as_ref().filter(|id| !id.is_blank())
    }

    /// Checks that the principal is internally consistent
    pub fn validate(&self) -> Result<(), AccessError> {
        if self.role == Role::Doctor && self.scoped_doctor().is_none() {
            return Err(AccessError::MissingDoctorId(self.id.clone()));
        }
        Ok(())
    }
}

impl From<String> for DoctorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_wire_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(
            "receptionist".parse::<Role>(),
            Err(AccessError::UnknownRole("receptionist".to_string()))
        );
    }

    #[test]
    fn test_role_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::FrontDeskStaff).unwrap();
        assert_eq!(json, "\"frontdesk_staff\"");
        let role: Role = serde_json::from_str("\"superadmin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
    }

    #[test]
    fn test_doctor_id_from_email() {
        let id = DoctorId::from_email("doctor@dakshinrehab.com").unwrap();
        assert_eq!(id.as_str(), "doctor");
        assert!(DoctorId::from_email("not-an-email").is_err());
        assert!(DoctorId::from_email("@dakshinrehab.com").is_err());
    }

    #[test]
    fn test_doctor_id_keeps_local_part_case() {
        let id = DoctorId::from_email("Dr.Anand@dakshinrehab.com").unwrap();
        assert_eq!(id.as_str(), "Dr.Anand");
        assert!(id.matches(&DoctorId::new("Dr.Anand")));
        assert!(!id.matches(&DoctorId::new("dr.anand")));
    }

    #[test]
    fn test_blank_doctor_ids_never_match() {
        let blank = DoctorId::new("  ");
        assert!(!blank.matches(&blank));
        assert!(DoctorId::new("dr-a").matches(&DoctorId::new("dr-a")));
    }

    #[test]
    fn test_doctor_principal_requires_doctor_id() {
        let mut principal = Principal::doctor("u1", "dr-a");
        assert!(principal.validate().is_ok());

        principal.doctor_id = None;
        assert_eq!(
            principal.validate(),
            Err(AccessError::MissingDoctorId("u1".to_string()))
        );
        assert!(Principal::new("u2", Role::Admin).validate().is_ok());
    }
}
