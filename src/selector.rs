use std::collections::HashSet;

use tracing::{info, warn};

use crate::staff::{StaffDirectory, StaffRecord};

/// Picks the best available staff member for a department by skill overlap.
pub struct StaffSelector {
    fallback_department: String,
}

impl StaffSelector {
    pub fn new(fallback_department: impl Into<String>) -> Self {
        Self {
            fallback_department: fallback_department.into(),
        }
    }

    /// Score available staff in `department` by the size of the
    /// intersection between their normalized skills and `required_skills`;
    /// the first-encountered highest scorer wins. Candidates must score
    /// above zero, except in the fallback department where any available
    /// staff member is acceptable when nothing matched. Returns `None` only
    /// when the department has no available staff at all.
    pub fn select_best_staff<'a>(
        &self,
        directory: &'a StaffDirectory,
        required_skills: &[String],
        department: &str,
    ) -> Option<&'a StaffRecord> {
        let required: HashSet<String> =
            required_skills.iter().map(|s| s.to_lowercase()).collect();

        let mut best_staff: Option<&StaffRecord> = None;
        let mut best_score = 0usize;

        for staff in directory.records() {
            if staff.department != department || !staff.availability {
                continue;
            }
            let skills: HashSet<String> = staff.skills().into_iter().collect();
            let match_score = skills.intersection(&required).count();
            if match_score > best_score {
                best_score = match_score;
                best_staff = Some(staff);
            }
        }

        // Relaxed rule: the fallback department must absorb anything, so
        // take the first available member when no skill matched.
        if best_staff.is_none() && department == self.fallback_department {
            best_staff = directory
                .records()
                .iter()
                .find(|s| s.department == department && s.availability);
            if let Some(staff) = best_staff {
                info!(staff = %staff.name, "no skill match, selecting available fallback staff");
            }
        }

        match best_staff {
            Some(staff) => {
                info!(staff = %staff.name, department, score = best_score, "selected staff");
            }
            None => {
                warn!(department, ?required_skills, "no available staff found");
            }
        }

        best_staff
    }
}
