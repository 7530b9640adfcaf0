use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::TriagedError;
use crate::selector::StaffSelector;
use crate::staff::{StaffDirectory, StaffRecord};

/// Sentinel category for incidents rejected before classification.
pub const UNCLASSIFIED: &str = "Unclassified";
/// Sentinel category when classification produced nothing routable.
pub const MANUAL_ASSIGNMENT_REQUIRED: &str = "Manual Assignment Required";

/// Incident severity. Unknown or missing values degrade to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Lenient parse for LLM-provided severity strings.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("low") => Severity::Low,
            Some(v) if v.eq_ignore_ascii_case("high") => Severity::High,
            _ => Severity::Medium,
        }
    }
}

/// Fields parsed out of the LLM completion. Every field is optional; the
/// response builder substitutes defaults so no response is ever partial.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassificationData {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
}

/// The classification half of the response. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub severity: Severity,
    pub department: String,
    pub required_skills: Vec<String>,
    pub title: String,
    pub summary: String,
    pub email: String,
}

/// How a staff member was (or was not) chosen. The tag carries the status
/// so callers branch on `assignment_status` instead of probing null fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "assignment_status", rename_all = "snake_case")]
pub enum Assignment {
    Assigned {
        assigned_staff_email: String,
        assigned_staff_name: String,
        assigned_staff_id: String,
        assigned_department: String,
        staff_skillset: String,
        assignment_reason: String,
    },
    AssignedFallback {
        assigned_staff_email: String,
        assigned_staff_name: String,
        assigned_staff_id: String,
        assigned_department: String,
        staff_skillset: String,
        assignment_reason: String,
    },
    NoStaffAvailable {
        assigned_department: String,
        assignment_reason: String,
    },
}

impl Assignment {
    pub fn status(&self) -> &'static str {
        match self {
            Assignment::Assigned { .. } => "assigned",
            Assignment::AssignedFallback { .. } => "assigned_fallback",
            Assignment::NoStaffAvailable { .. } => "no_staff_available",
        }
    }

    pub fn staff_email(&self) -> Option<&str> {
        match self {
            Assignment::Assigned {
                assigned_staff_email,
                ..
            }
            | Assignment::AssignedFallback {
                assigned_staff_email,
                ..
            } => Some(assigned_staff_email),
            Assignment::NoStaffAvailable { .. } => None,
        }
    }
}

/// Per-request observability metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingDetails {
    pub request_id: Uuid,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// The unit returned to the caller; never partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub classification: Classification,
    pub staff_assignment: Assignment,
    pub processing: ProcessingDetails,
}

/// Assembles final responses, including every fallback variant.
pub struct ResponseBuilder {
    selector: StaffSelector,
    fallback_department: String,
    fallback_skills: Vec<String>,
}

impl ResponseBuilder {
    pub fn new(fallback_department: impl Into<String>, fallback_skills: Vec<String>) -> Self {
        let fallback_department = fallback_department.into();
        Self {
            selector: StaffSelector::new(fallback_department.clone()),
            fallback_department,
            fallback_skills,
        }
    }

    pub fn fallback_department(&self) -> &str {
        &self.fallback_department
    }

    pub fn fallback_skills(&self) -> &[String] {
        &self.fallback_skills
    }

    pub fn selector(&self) -> &StaffSelector {
        &self.selector
    }

    /// Build the fallback response for a rejected, unparseable or
    /// unassignable incident. Staff always resolves through the fallback
    /// department's relaxed rule.
    ///
    /// With no available fallback staff this is still a legitimate terminal
    /// state for `unclassified` incidents (`no_staff_available`); for
    /// anything else there is no safe default to fabricate, so it surfaces
    /// as a configuration error.
    pub fn fallback(
        &self,
        directory: &StaffDirectory,
        reason: &str,
        unclassified: bool,
    ) -> Result<(Classification, Assignment), TriagedError> {
        let staff = self.selector.select_best_staff(
            directory,
            &self.fallback_skills,
            &self.fallback_department,
        );
        let category = if unclassified {
            UNCLASSIFIED
        } else {
            MANUAL_ASSIGNMENT_REQUIRED
        };

        let Some(staff) = staff else {
            if unclassified {
                let classification = Classification {
                    category: category.to_string(),
                    severity: Severity::Low,
                    department: self.fallback_department.clone(),
                    required_skills: self.fallback_skills.clone(),
                    title: "Undefined".to_string(),
                    summary: format!("Incident flagged for review: {reason}"),
                    email: "This incident requires manual review due to no available staff. \
                            Please assign to an appropriate team."
                        .to_string(),
                };
                let assignment = Assignment::NoStaffAvailable {
                    assigned_department: self.fallback_department.clone(),
                    assignment_reason: format!(
                        "No available staff in {} department.",
                        self.fallback_department
                    ),
                };
                return Ok((classification, assignment));
            }
            error!(reason, "no available fallback staff for {category} response");
            return Err(TriagedError::NoFallbackStaff {
                department: self.fallback_department.clone(),
            });
        };

        let classification = Classification {
            category: category.to_string(),
            severity: Severity::Low,
            department: self.fallback_department.clone(),
            required_skills: self.fallback_skills.clone(),
            title: "Undefined".to_string(),
            summary: format!("Incident flagged for review: {reason}"),
            email: format!(
                "Dear {}, this incident requires manual review due to: {reason}. \
                 Please assign to the appropriate team or handle accordingly.",
                self.fallback_department
            ),
        };
        let assignment = Assignment::AssignedFallback {
            assigned_staff_email: staff.email.clone(),
            assigned_staff_name: staff.name.clone(),
            assigned_staff_id: staff.staff_id.clone(),
            assigned_department: self.fallback_department.clone(),
            staff_skillset: staff.skillset.clone(),
            assignment_reason: format!(
                "Assigned to {} due to: {reason}",
                self.fallback_department
            ),
        };
        Ok((classification, assignment))
    }

    /// Build the response for a successfully classified incident. Missing
    /// LLM fields get defaults so every required field is always set.
    pub fn success(
        &self,
        data: &ClassificationData,
        staff: &StaffRecord,
        target_department: &str,
        required_skills: &[String],
        original_department: Option<&str>,
    ) -> (Classification, Assignment) {
        let direct_match = original_department == Some(target_department);

        let classification = Classification {
            category: data
                .category
                .clone()
                .unwrap_or_else(|| MANUAL_ASSIGNMENT_REQUIRED.to_string()),
            severity: Severity::parse_or_default(data.severity.as_deref()),
            department: target_department.to_string(),
            required_skills: required_skills.to_vec(),
            title: data
                .title
                .clone()
                .unwrap_or_else(|| "Incident classification title".to_string()),
            summary: data
                .summary
                .clone()
                .unwrap_or_else(|| "Incident classification summary".to_string()),
            email: data
                .email
                .clone()
                .unwrap_or_else(|| format!("Incident assigned to {target_department} for review")),
        };

        let reason = if direct_match {
            format!(
                "Matched to {target_department} based on required skills: {}",
                required_skills.join(", ")
            )
        } else {
            format!(
                "Assigned to {target_department}: no match in suggested department {}",
                original_department.unwrap_or("(none)")
            )
        };

        let assignment = if direct_match {
            Assignment::Assigned {
                assigned_staff_email: staff.email.clone(),
                assigned_staff_name: staff.name.clone(),
                assigned_staff_id: staff.staff_id.clone(),
                assigned_department: target_department.to_string(),
                staff_skillset: staff.skillset.clone(),
                assignment_reason: reason,
            }
        } else {
            Assignment::AssignedFallback {
                assigned_staff_email: staff.email.clone(),
                assigned_staff_name: staff.name.clone(),
                assigned_staff_id: staff.staff_id.clone(),
                assigned_department: target_department.to_string(),
                staff_skillset: staff.skillset.clone(),
                assignment_reason: reason,
            }
        };

        (classification, assignment)
    }
}
