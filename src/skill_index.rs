use std::collections::{BTreeMap, BTreeSet};

use crate::staff::{StaffDirectory, StaffRecord};

/// Index from normalized skill token to the available staff who hold it.
///
/// Built once per directory snapshot and never mutated in place; the same
/// snapshot always yields the same index. Only available staff are indexed,
/// so every lookup result is assignment-eligible.
#[derive(Debug, Clone, Default)]
pub struct SkillIndex {
    by_skill: BTreeMap<String, Vec<StaffRecord>>,
    departments: BTreeSet<String>,
}

impl SkillIndex {
    pub fn build(directory: &StaffDirectory) -> Self {
        let mut by_skill: BTreeMap<String, Vec<StaffRecord>> = BTreeMap::new();
        let mut departments = BTreeSet::new();

        for staff in directory.records() {
            if !staff.availability {
                continue;
            }
            departments.insert(staff.department.clone());
            for skill in staff.skills() {
                by_skill.entry(skill).or_default().push(staff.clone());
            }
        }

        Self {
            by_skill,
            departments,
        }
    }

    /// Available staff holding the given skill token (lower-cased, trimmed).
    pub fn staff_for(&self, token: &str) -> &[StaffRecord] {
        self.by_skill
            .get(token.trim().to_lowercase().as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Departments with at least one available staff member, sorted so the
    /// rendered prompt is deterministic for a given snapshot.
    pub fn available_departments(&self) -> &BTreeSet<String> {
        &self.departments
    }

    /// All indexed skill tokens, grouped by department, for prompt rendering.
    pub fn skills_by_department(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut out: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (skill, staff) in &self.by_skill {
            for s in staff {
                out.entry(s.department.as_str())
                    .or_default()
                    .insert(skill.as_str());
            }
        }
        out
    }
}
