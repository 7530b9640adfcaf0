use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TriagedConfig;
use crate::error::TriagedError;
use crate::llm::{ChatMessage, ChatRequest, ChatSender};
use crate::parser::extract_json;
use crate::prompt::{classification_prompt, regenerate_prompt, SYSTEM_INSTRUCTION};
use crate::response::{
    Assignment, Classification, ClassificationData, ClassificationResponse, ProcessingDetails,
    ResponseBuilder, MANUAL_ASSIGNMENT_REQUIRED,
};
use crate::skill_index::SkillIndex;
use crate::staff::StaffDirectory;
use crate::validator::ContentValidator;

/// The phases a request moves through inside the engine.
///
/// Every request terminates in `Responding` with a structured response; the
/// only exits that bypass it are LLM transport failures and the
/// no-fallback-staff configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    RejectedFallback,
    Prompting,
    Parsing,
    ResolvingDepartment,
    ResolvingStaff,
    Responding,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Validating => write!(f, "VALIDATING"),
            Phase::RejectedFallback => write!(f, "REJECTED_FALLBACK"),
            Phase::Prompting => write!(f, "PROMPTING"),
            Phase::Parsing => write!(f, "PARSING"),
            Phase::ResolvingDepartment => write!(f, "RESOLVING_DEPARTMENT"),
            Phase::ResolvingStaff => write!(f, "RESOLVING_STAFF"),
            Phase::Responding => write!(f, "RESPONDING"),
        }
    }
}

/// Ordered record of the phases a request traversed.
#[derive(Debug, Clone, Default)]
pub struct PhaseTrace {
    phases: Vec<Phase>,
}

impl PhaseTrace {
    fn enter(&mut self, phase: Phase) {
        debug!(phase = %phase, "engine phase");
        self.phases.push(phase);
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
}

/// Rewritten summary/email pair from the regeneration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegeneratedText {
    pub summary: String,
    pub email: String,
}

/// End-to-end classification and assignment decision pipeline.
///
/// Stateless across requests: the staff directory snapshot and the LLM
/// client are passed in per call, so identical inputs plus a deterministic
/// completion yield an identical response.
pub struct ClassificationEngine {
    validator: ContentValidator,
    builder: ResponseBuilder,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ClassificationEngine {
    pub fn from_config(config: &TriagedConfig) -> Self {
        Self {
            validator: ContentValidator::new(),
            builder: ResponseBuilder::new(
                config.fallback_department.clone(),
                config.fallback_skills.clone(),
            ),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Classify an incident description and assign staff from the given
    /// directory snapshot.
    pub async fn classify(
        &self,
        client: &impl ChatSender,
        directory: &StaffDirectory,
        description: &str,
    ) -> Result<ClassificationResponse, TriagedError> {
        self.classify_traced(client, directory, description)
            .await
            .map(|(response, _)| response)
    }

    /// Like [`classify`](Self::classify), also returning the phase trail
    /// the request took.
    pub async fn classify_traced(
        &self,
        client: &impl ChatSender,
        directory: &StaffDirectory,
        description: &str,
    ) -> Result<(ClassificationResponse, PhaseTrace), TriagedError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let mut trace = PhaseTrace::default();

        trace.enter(Phase::Validating);
        if self.validator.is_inappropriate(description) {
            trace.enter(Phase::RejectedFallback);
            return self.finish_fallback(
                directory,
                "Inappropriate content detected",
                true,
                started,
                request_id,
                trace,
            );
        }
        if self.validator.is_ambiguous(description) {
            trace.enter(Phase::RejectedFallback);
            return self.finish_fallback(
                directory,
                "Ambiguous or vague description",
                true,
                started,
                request_id,
                trace,
            );
        }

        trace.enter(Phase::Prompting);
        let index = SkillIndex::build(directory);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(classification_prompt(description, &index)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: 1.0,
        };
        // The one suspension point. Transport failure propagates as an
        // error rather than being masked as a classification.
        let completion = client.send_chat(&request).await?;

        trace.enter(Phase::Parsing);
        let data = match extract_json(&completion.first_text()) {
            Ok(value) => serde_json::from_value::<ClassificationData>(value).unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "AI response parsing failed");
                trace.enter(Phase::RejectedFallback);
                return self.finish_fallback(
                    directory,
                    "AI response parsing failed",
                    false,
                    started,
                    request_id,
                    trace,
                );
            }
        };

        trace.enter(Phase::ResolvingDepartment);
        let suggested = data.department.clone();
        let mut data = data;
        let target = match suggested.as_deref() {
            Some(dept) if index.available_departments().contains(dept) => dept.to_string(),
            other => {
                warn!(
                    suggested = other.unwrap_or("(none)"),
                    "suggested department unavailable, defaulting to {}",
                    self.builder.fallback_department()
                );
                data.category = Some(MANUAL_ASSIGNMENT_REQUIRED.to_string());
                self.builder.fallback_department().to_string()
            }
        };

        trace.enter(Phase::ResolvingStaff);
        let mut required_skills = data
            .required_skills
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.builder.fallback_skills().to_vec());
        let mut final_department = target.clone();
        let mut staff =
            self.builder
                .selector()
                .select_best_staff(directory, &required_skills, &target);

        // One retry against the fallback department before giving up.
        if staff.is_none() && target != self.builder.fallback_department() {
            required_skills = self.builder.fallback_skills().to_vec();
            final_department = self.builder.fallback_department().to_string();
            staff = self.builder.selector().select_best_staff(
                directory,
                &required_skills,
                &final_department,
            );
        }

        let Some(staff) = staff else {
            trace.enter(Phase::RejectedFallback);
            return self.finish_fallback(
                directory,
                "No available staff found",
                true,
                started,
                request_id,
                trace,
            );
        };

        let (classification, assignment) = self.builder.success(
            &data,
            staff,
            &final_department,
            &required_skills,
            suggested.as_deref(),
        );
        let fallback_used = suggested.as_deref() != Some(final_department.as_str());

        trace.enter(Phase::Responding);
        let response = Self::respond(
            classification,
            assignment,
            fallback_used,
            None,
            started,
            request_id,
        );
        Ok((response, trace))
    }

    fn finish_fallback(
        &self,
        directory: &StaffDirectory,
        reason: &str,
        unclassified: bool,
        started: Instant,
        request_id: Uuid,
        mut trace: PhaseTrace,
    ) -> Result<(ClassificationResponse, PhaseTrace), TriagedError> {
        let (classification, assignment) = self.builder.fallback(directory, reason, unclassified)?;
        trace.enter(Phase::Responding);
        let response = Self::respond(
            classification,
            assignment,
            true,
            Some(reason.to_string()),
            started,
            request_id,
        );
        Ok((response, trace))
    }

    fn respond(
        classification: Classification,
        staff_assignment: Assignment,
        fallback_used: bool,
        fallback_reason: Option<String>,
        started: Instant,
        request_id: Uuid,
    ) -> ClassificationResponse {
        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            %request_id,
            status = staff_assignment.status(),
            processing_time_ms,
            "classification completed"
        );
        ClassificationResponse {
            classification,
            staff_assignment,
            processing: ProcessingDetails {
                request_id,
                processing_time_ms,
                timestamp: Utc::now(),
                fallback_used,
                fallback_reason,
            },
        }
    }

    /// Rewrite an existing summary and email draft for tone and grammar via
    /// a second, simpler LLM call.
    pub async fn regenerate(
        &self,
        client: &impl ChatSender,
        summary: &str,
        email: &str,
    ) -> Result<RegeneratedText, TriagedError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(regenerate_prompt(summary, email)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: 1.0,
        };
        let completion = client.send_chat(&request).await?;
        let value = extract_json(&completion.first_text())?;

        let summary = value
            .get("summary")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TriagedError::MalformedCompletion("regeneration reply missing summary".into())
            })?;
        // Some models return the email as an object with a body field.
        let email = value
            .get("email")
            .and_then(|v| v.as_str().or_else(|| v.get("body").and_then(|b| b.as_str())))
            .ok_or_else(|| {
                TriagedError::MalformedCompletion("regeneration reply missing email".into())
            })?;

        Ok(RegeneratedText {
            summary: summary.to_string(),
            email: email.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::llm::types::{AssistantMessage, ChatResponse, Choice};
    use crate::llm::LlmError;
    use crate::staff::StaffRecord;

    struct MockClient {
        response: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn err(status: u16) -> Self {
            Self {
                response: Err(status),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChatSender for MockClient {
        async fn send_chat(&self, _req: &ChatRequest) -> Result<ChatResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(ChatResponse {
                    choices: vec![Choice {
                        message: AssistantMessage {
                            role: "assistant".into(),
                            content: text.clone(),
                        },
                        finish_reason: Some("stop".into()),
                    }],
                    usage: None,
                }),
                Err(status) => Err(LlmError::ApiError {
                    status: *status,
                    message: "mock error".into(),
                }),
            }
        }
    }

    fn engine() -> ClassificationEngine {
        ClassificationEngine::from_config(&TriagedConfig::default())
    }

    fn it_completion() -> &'static str {
        r#"{
            "category": "Hardware Failure",
            "severity": "High",
            "title": "Laptop will not power on",
            "summary": "User laptop fails to boot ahead of a client demo.",
            "email": "Hi, a laptop failure needs urgent attention before a client demo.",
            "department": "IT",
            "required_skills": ["hardware", "windows"]
        }"#
    }

    #[tokio::test]
    async fn happy_path_assigns_matching_it_staff() {
        let client = MockClient::ok(it_completion());
        let directory = StaffDirectory::sample();
        let response = engine()
            .classify(
                &client,
                &directory,
                "My laptop won't turn on and I have a client demo in 1 hour",
            )
            .await
            .unwrap();

        assert_eq!(response.staff_assignment.status(), "assigned");
        assert_eq!(response.classification.department, "IT");
        assert_eq!(response.classification.severity, crate::response::Severity::High);
        // Ava Chen is the hardware/windows match in the sample directory
        assert_eq!(
            response.staff_assignment.staff_email(),
            Some("ava.chen@example.com")
        );
        assert!(!response.processing.fallback_used);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn ambiguous_description_skips_llm() {
        let client = MockClient::ok(it_completion());
        let directory = StaffDirectory::sample();
        let response = engine()
            .classify(&client, &directory, "asdfasdf")
            .await
            .unwrap();

        assert_eq!(client.call_count(), 0);
        assert_eq!(response.staff_assignment.status(), "assigned_fallback");
        assert_eq!(response.classification.category, "Unclassified");
        assert_eq!(
            response.processing.fallback_reason.as_deref(),
            Some("Ambiguous or vague description")
        );
    }

    #[tokio::test]
    async fn inappropriate_description_skips_llm() {
        let client = MockClient::ok(it_completion());
        let directory = StaffDirectory::sample();
        let response = engine()
            .classify(&client, &directory, "this damn thing is broken and I hate it")
            .await
            .unwrap();

        assert_eq!(client.call_count(), 0);
        assert_eq!(response.staff_assignment.status(), "assigned_fallback");
    }

    #[tokio::test]
    async fn unparseable_completion_falls_back_to_manual_assignment() {
        let client = MockClient::ok("I could not classify this one, sorry!");
        let directory = StaffDirectory::sample();
        let response = engine()
            .classify(&client, &directory, "The shared printer on floor 3 is jammed")
            .await
            .unwrap();

        assert_eq!(response.staff_assignment.status(), "assigned_fallback");
        assert_eq!(
            response.classification.category,
            "Manual Assignment Required"
        );
        assert_eq!(
            response.processing.fallback_reason.as_deref(),
            Some("AI response parsing failed")
        );
    }

    #[tokio::test]
    async fn unknown_department_forces_manual_assignment() {
        let client = MockClient::ok(
            r#"{"category": "Facilities", "severity": "Low", "department": "Facilities",
                "required_skills": ["plumbing"]}"#,
        );
        let directory = StaffDirectory::sample();
        let response = engine()
            .classify(&client, &directory, "Water leak under the kitchen sink")
            .await
            .unwrap();

        assert_eq!(
            response.classification.category,
            "Manual Assignment Required"
        );
        assert_eq!(response.classification.department, "Admin");
        assert_eq!(response.staff_assignment.status(), "assigned_fallback");
        assert!(response.processing.fallback_used);
    }

    #[tokio::test]
    async fn empty_directory_returns_no_staff_available() {
        let client = MockClient::ok(it_completion());
        let directory = StaffDirectory::default();
        let response = engine()
            .classify(&client, &directory, "My laptop won't turn on this morning")
            .await
            .unwrap();

        assert_eq!(response.staff_assignment.status(), "no_staff_available");
    }

    #[tokio::test]
    async fn staff_gap_retries_fallback_department() {
        // IT is staffed, but nobody there holds the required skills; the
        // engine retries once against Admin with the fallback skills.
        let directory = StaffDirectory::new(vec![
            StaffRecord {
                staff_id: "it-1".into(),
                name: "Printers Only".into(),
                email: "printers@x.com".into(),
                department: "IT".into(),
                skillset: "printing".into(),
                availability: true,
            },
            StaffRecord {
                staff_id: "adm-1".into(),
                name: "Backstop".into(),
                email: "backstop@x.com".into(),
                department: "Admin".into(),
                skillset: "general support".into(),
                availability: true,
            },
        ]);
        let client = MockClient::ok(it_completion());
        let response = engine()
            .classify(&client, &directory, "My laptop won't turn on this morning")
            .await
            .unwrap();

        assert_eq!(response.staff_assignment.status(), "assigned_fallback");
        assert_eq!(
            response.staff_assignment.staff_email(),
            Some("backstop@x.com")
        );
        assert!(response.processing.fallback_used);
    }

    #[tokio::test]
    async fn llm_transport_failure_surfaces_as_error() {
        let client = MockClient::err(500);
        let directory = StaffDirectory::sample();
        let result = engine()
            .classify(&client, &directory, "Mail server rejects all outbound messages")
            .await;

        assert!(matches!(result, Err(TriagedError::Llm(_))));
    }

    #[tokio::test]
    async fn trace_ends_in_responding() {
        let client = MockClient::ok(it_completion());
        let directory = StaffDirectory::sample();
        let (_, trace) = engine()
            .classify_traced(&client, &directory, "My laptop won't turn on this morning")
            .await
            .unwrap();

        assert_eq!(trace.phases().first(), Some(&Phase::Validating));
        assert_eq!(trace.phases().last(), Some(&Phase::Responding));
        assert!(trace.phases().contains(&Phase::ResolvingStaff));
    }

    #[tokio::test]
    async fn rejected_trace_skips_prompting() {
        let client = MockClient::ok(it_completion());
        let directory = StaffDirectory::sample();
        let (_, trace) = engine()
            .classify_traced(&client, &directory, "12345")
            .await
            .unwrap();

        assert!(!trace.phases().contains(&Phase::Prompting));
        assert_eq!(trace.phases().last(), Some(&Phase::Responding));
    }

    #[tokio::test]
    async fn regenerate_happy_path() {
        let client =
            MockClient::ok(r#"{"summary": "Server outage.", "email": "Dear team, ..."}"#);
        let result = engine()
            .regenerate(&client, "server down", "pls fix")
            .await
            .unwrap();
        assert_eq!(result.summary, "Server outage.");
        assert_eq!(result.email, "Dear team, ...");
    }

    #[tokio::test]
    async fn regenerate_accepts_email_object_with_body() {
        let client = MockClient::ok(
            r#"```json
{"summary": "Server outage.", "email": {"subject": "Outage", "body": "Dear team"}}
```"#,
        );
        let result = engine()
            .regenerate(&client, "server down", "pls fix")
            .await
            .unwrap();
        assert_eq!(result.email, "Dear team");
    }

    #[tokio::test]
    async fn regenerate_missing_field_is_error() {
        let client = MockClient::ok(r#"{"summary": "only a summary"}"#);
        let result = engine().regenerate(&client, "s", "e").await;
        assert!(matches!(result, Err(TriagedError::MalformedCompletion(_))));
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Validating.to_string(), "VALIDATING");
        assert_eq!(Phase::RejectedFallback.to_string(), "REJECTED_FALLBACK");
        assert_eq!(
            Phase::ResolvingDepartment.to_string(),
            "RESOLVING_DEPARTMENT"
        );
        assert_eq!(Phase::Responding.to_string(), "RESPONDING");
    }
}
