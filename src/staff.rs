use serde::{Deserialize, Serialize};
use tracing::warn;

/// A validated staff member eligible for incident assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub staff_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    /// Comma-separated free-text competency tags, e.g.
    /// "networking, hardware, windows".
    pub skillset: String,
    pub availability: bool,
}

impl StaffRecord {
    /// Skillset split on commas, trimmed and lower-cased.
    pub fn skills(&self) -> Vec<String> {
        self.skillset
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Raw record as delivered by the external workflow system.
///
/// The upstream payload uses Dataverse-style column names with the owning
/// user nested under an association; plain field names are accepted too so
/// test fixtures and simpler sources stay readable. Every field is optional
/// at this layer; validation happens in [`StaffDirectory::from_raw`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawStaffRecord {
    #[serde(default, alias = "cr6dd_staff1id", alias = "cr6dd_staffid")]
    pub staff_id: Option<String>,
    #[serde(default, alias = "cr6dd_name")]
    pub name: Option<String>,
    #[serde(default, alias = "cr6dd_email")]
    pub email: Option<String>,
    #[serde(default, alias = "cr6dd_departmentname")]
    pub department: Option<String>,
    #[serde(default, alias = "cr6dd_skillset")]
    pub skillset: Option<String>,
    #[serde(default, alias = "cr6dd_availability")]
    pub availability: Option<bool>,
    #[serde(default, alias = "cr6dd_UserID")]
    pub user: Option<RawStaffUser>,
}

/// Nested user association carrying the display name and email.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStaffUser {
    #[serde(default, alias = "cr6dd_name")]
    pub name: Option<String>,
    #[serde(default, alias = "cr6dd_email")]
    pub email: Option<String>,
}

/// Immutable snapshot of the staff directory.
///
/// Replaced wholesale on refresh and read once per request, so a request
/// never observes a half-updated directory. Record order is preserved from
/// the source feed; selection ties resolve by that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffDirectory {
    records: Vec<StaffRecord>,
}

impl StaffDirectory {
    pub fn new(records: Vec<StaffRecord>) -> Self {
        Self { records }
    }

    /// Validate raw records into a snapshot, discarding any record missing
    /// a required field rather than rejecting the whole feed.
    pub fn from_raw(raw: Vec<RawStaffRecord>) -> Self {
        let mut records = Vec::with_capacity(raw.len());
        for (i, r) in raw.into_iter().enumerate() {
            match validate_record(r) {
                Some(rec) => records.push(rec),
                None => warn!(index = i, "discarding staff record with missing fields"),
            }
        }
        Self { records }
    }

    pub fn records(&self) -> &[StaffRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Built-in directory used until the first successful refresh, so a
    /// freshly started daemon can classify immediately.
    pub fn sample() -> Self {
        let mk = |id: &str, name: &str, email: &str, dept: &str, skills: &str, avail: bool| {
            StaffRecord {
                staff_id: id.into(),
                name: name.into(),
                email: email.into(),
                department: dept.into(),
                skillset: skills.into(),
                availability: avail,
            }
        };
        Self::new(vec![
            mk(
                "st-001",
                "Ava Chen",
                "ava.chen@example.com",
                "IT",
                "networking, hardware, windows",
                true,
            ),
            mk(
                "st-002",
                "Marcus Webb",
                "marcus.webb@example.com",
                "IT",
                "software, linux, databases",
                true,
            ),
            mk(
                "st-003",
                "Priya Nair",
                "priya.nair@example.com",
                "HR",
                "onboarding, payroll, policy",
                true,
            ),
            mk(
                "st-004",
                "Daniel Okoye",
                "daniel.okoye@example.com",
                "Finance",
                "invoicing, budgeting",
                false,
            ),
            mk(
                "st-005",
                "Sofia Reyes",
                "sofia.reyes@example.com",
                "Admin",
                "general support, coordination",
                true,
            ),
        ])
    }
}

fn validate_record(r: RawStaffRecord) -> Option<StaffRecord> {
    let name = r
        .name
        .or_else(|| r.user.as_ref().and_then(|u| u.name.clone()))?;
    let email = r
        .email
        .or_else(|| r.user.as_ref().and_then(|u| u.email.clone()))?;
    Some(StaffRecord {
        staff_id: r.staff_id?,
        name,
        email,
        department: r.department?,
        skillset: r.skillset?,
        availability: r.availability.unwrap_or(false),
    })
}
