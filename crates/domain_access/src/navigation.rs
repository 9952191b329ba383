//! Dashboard sections and the roles allowed into them

use serde::{Deserialize, Serialize};

use crate::principal::Role;

/// A top-level area of the clinic dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Dashboard,
    UserManagement,
    SystemSettings,
    Doctors,
    Patients,
    Appointments,
    Prescriptions,
    MedicalCertificates,
    Billing,
    Quotations,
    Inpatient,
    Inventory,
    Departments,
    Staff,
    Reports,
    Feedback,
    Support,
}

const ALL_ROLES: &[Role] = &[
    Role::SuperAdmin,
    Role::Admin,
    Role::Doctor,
    Role::FrontDeskStaff,
    Role::Patient,
];
const STAFF: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Doctor, Role::FrontDeskStaff];
const CLINICAL: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Doctor];
const FRONT_OFFICE: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::FrontDeskStaff];
const MANAGEMENT: &[Role] = &[Role::SuperAdmin, Role::Admin];
const SUPERADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

impl Section {
    /// Sidebar order
    pub const ALL: [Section; 17] = [
        Section::Dashboard,
        Section::UserManagement,
        Section::SystemSettings,
        Section::Doctors,
        Section::Patients,
        Section::Appointments,
        Section::Prescriptions,
        Section::MedicalCertificates,
        Section::Billing,
        Section::Quotations,
        Section::Inpatient,
        Section::Inventory,
        Section::Departments,
        Section::Staff,
        Section::Reports,
        Section::Feedback,
        Section::Support,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::UserManagement => "User Management",
            Section::SystemSettings => "System Settings",
            Section::Doctors => "Doctors",
            Section::Patients => "Patients",
            Section::Appointments => "Appointments",
            Section::Prescriptions => "Prescriptions",
            Section::MedicalCertificates => "Medical Certificates",
            Section::Billing => "Billing",
            Section::Quotations => "Quotations",
            Section::Inpatient => "Inpatient Management",
            Section::Inventory => "Inventory",
            Section::Departments => "Departments",
            Section::Staff => "Staff",
            Section::Reports => "Reports",
            Section::Feedback => "Reviews & Feedback",
            Section::Support => "Support",
        }
    }

    /// Route prefix the section lives under
    pub fn path(&self) -> &'static str {
        match self {
            Section::Dashboard => "/dashboard",
            Section::UserManagement => "/settings/user-roles",
            Section::SystemSettings => "/settings",
            Section::Doctors => "/doctors",
            Section::Patients => "/patients",
            Section::Appointments => "/appointments",
            Section::Prescriptions => "/prescriptions",
            Section::MedicalCertificates => "/medical-certificates",
            Section::Billing => "/billing",
            Section::Quotations => "/billing/quotations",
            Section::Inpatient => "/rooms",
            Section::Inventory => "/inventory",
            Section::Departments => "/departments",
            Section::Staff => "/staff",
            Section::Reports => "/reports",
            Section::Feedback => "/feedback",
            Section::Support => "/support",
        }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Section::Dashboard => ALL_ROLES,
            Section::UserManagement => SUPERADMIN_ONLY,
            Section::SystemSettings
            | Section::Doctors
            | Section::Departments
            | Section::Staff
            | Section::Reports => MANAGEMENT,
            Section::Patients
            | Section::Appointments
            | Section::Quotations
            | Section::Feedback
            | Section::Support => STAFF,
            Section::Prescriptions | Section::MedicalCertificates => CLINICAL,
            Section::Billing | Section::Inpatient | Section::Inventory => FRONT_OFFICE,
        }
    }

    /// Resolves a route to the section owning it
    ///
    /// The longest matching prefix wins, so `/settings/user-roles/42` resolves
    /// to [`Section::UserManagement`] rather than [`Section::SystemSettings`].
    /// A prefix only matches on a segment boundary.
    pub fn from_path(path: &str) -> Option<Section> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        Section::ALL
            .iter()
            .copied()
            .filter(|section| {
                let prefix = section.path();
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|section| section.path().len())
    }
}

/// Sections visible to `role`, in sidebar order
pub fn sections_for(role: Role) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|section| section.allowed_roles().contains(&role))
        .collect()
}
