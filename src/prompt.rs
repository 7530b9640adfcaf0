use std::fmt::Write;

use crate::skill_index::SkillIndex;

/// System instruction shared by every classification call.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert IT incident analyst and staff \
assignment specialist. Respond only with valid JSON.";

/// Render the classification instruction prompt from the incident text and
/// the departments/skills currently staffed.
///
/// Departments and skills come from the skill index, so the model can only
/// be steered toward departments that actually have someone available; the
/// engine still re-validates whatever comes back.
pub fn classification_prompt(description: &str, index: &SkillIndex) -> String {
    let mut staffing = String::new();
    for (department, skills) in index.skills_by_department() {
        let skills: Vec<&str> = skills.into_iter().collect();
        let _ = writeln!(staffing, "- {department}: {}", skills.join(", "));
    }
    if staffing.is_empty() {
        staffing.push_str("- (no departments currently staffed)\n");
    }

    format!(
        r#"Analyze the following incident and provide a structured classification and department mapping.
You must analyze the incident in ANY language but respond ONLY in English using the specified JSON format.

Incident Description: "{description}"

Available departments and their skills:
{staffing}
Instructions:
1. Classify the incident considering business impact and urgency, technical complexity, security implications and resource requirements.
2. Map the incident to the most appropriate department from the list above.
3. List the skills required to resolve the incident, using skill terms from the list where possible.

Respond with ONLY a valid JSON object containing:
{{
    "category": "brief category description (e.g., 'Network Issue', 'Security Problem', 'HR Query')",
    "severity": "one of: Low, Medium, High",
    "title": "short incident title",
    "summary": "concise 1-2 sentence summary",
    "email": "professional email body for the assigned staff member",
    "department": "exact department name from the list above",
    "required_skills": ["skill", "skill"]
}}

Respond ONLY with the JSON object, no additional text or formatting."#
    )
}

/// Render the tone/grammar regeneration prompt for an existing summary and
/// email draft.
pub fn regenerate_prompt(summary: &str, email: &str) -> String {
    format!(
        r#"Improve the following text by:
1. Making the summary more clear and structured.
2. Enhancing the tone to be professional, polite, and suitable for an email.
3. Correcting grammar, punctuation, and flow where needed.
Keep it concise but informative.

Respond with ONLY a valid JSON object containing "summary" and "email".

Summary:
{summary}

Email:
{email}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staff::StaffDirectory;

    #[test]
    fn classification_prompt_embeds_description_and_departments() {
        let index = SkillIndex::build(&StaffDirectory::sample());
        let prompt = classification_prompt("VPN drops every few minutes", &index);
        assert!(prompt.contains("VPN drops every few minutes"));
        assert!(prompt.contains("- IT:"));
        assert!(prompt.contains("- Admin:"));
        assert!(prompt.contains("networking"));
        assert!(prompt.contains("\"required_skills\""));
    }

    #[test]
    fn classification_prompt_with_empty_directory() {
        let index = SkillIndex::build(&StaffDirectory::default());
        let prompt = classification_prompt("anything at all here", &index);
        assert!(prompt.contains("no departments currently staffed"));
    }

    #[test]
    fn unavailable_departments_are_not_offered() {
        let index = SkillIndex::build(&StaffDirectory::sample());
        // Finance's only sample member is unavailable
        let prompt = classification_prompt("expense report question", &index);
        assert!(!prompt.contains("- Finance:"));
    }

    #[test]
    fn regenerate_prompt_embeds_both_fields() {
        let prompt = regenerate_prompt("server down", "pls fix asap");
        assert!(prompt.contains("server down"));
        assert!(prompt.contains("pls fix asap"));
        assert!(prompt.contains("\"summary\""));
    }
}
