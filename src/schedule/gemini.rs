//! Gemini-backed schedule generator.
//!
//! Talks to the Generative Language REST API directly with reqwest; no
//! SDK. Prompts ask for JSON and the response is parsed out of the
//! first candidate's text part.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::config::config;

use super::{
    CandidateShift, GeneratedSchedule, GeneratorError, ScheduleGenerator, ScheduleRequest,
};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    schedule_model: String,
    proposal_model: String,
}

impl GeminiGenerator {
    pub fn from_config() -> Self {
        let ai = &config().ai;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ai.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: ai.api_key.clone(),
            schedule_model: ai.schedule_model.clone(),
            proposal_model: ai.proposal_model.clone(),
        }
    }

    async fn generate_json(&self, model: &str, prompt: String) -> Result<String, GeneratorError> {
        let url = format!("{GEMINI_BASE_URL}/{model}:generateContent?key={}", self.api_key);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Upstream(format!(
                "upstream returned {status}: {detail}"
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(GeneratorError::Malformed)
    }
}

#[async_trait]
impl ScheduleGenerator for GeminiGenerator {
    async fn generate_schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<GeneratedSchedule, GeneratorError> {
        let prompt = schedule_prompt(request);
        let text = self.generate_json(&self.schedule_model, prompt).await?;

        let schedule: GeneratedSchedule =
            serde_json::from_str(&text).map_err(|_| GeneratorError::Malformed)?;
        if schedule.shifts.is_empty() {
            return Err(GeneratorError::Upstream(
                "model returned an empty schedule".to_string(),
            ));
        }
        Ok(schedule)
    }

    async fn parse_shift_proposal(
        &self,
        natural_language: &str,
        user_id: Uuid,
    ) -> Result<Vec<CandidateShift>, GeneratorError> {
        let prompt = proposal_prompt(natural_language);
        let text = self.generate_json(&self.proposal_model, prompt).await?;

        let mut shifts: Vec<CandidateShift> =
            serde_json::from_str(&text).map_err(|_| GeneratorError::Malformed)?;
        if shifts.is_empty() {
            return Err(GeneratorError::Upstream(
                "model did not return any valid shifts".to_string(),
            ));
        }

        // The model is told to use the caller's id but we never trust it
        for shift in &mut shifts {
            shift.assigned_to = user_id.to_string();
            shift.role = "staff".to_string();
        }
        Ok(shifts)
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn capitalize(day: &str) -> String {
    let mut chars = day.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn schedule_prompt(request: &ScheduleRequest) -> String {
    let manager_time_instructions = request
        .manager
        .preferences
        .days()
        .iter()
        .map(|(day, slots)| {
            if slots.is_empty() {
                format!("{}: Not available", capitalize(day))
            } else {
                format!("{}: {}", capitalize(day), slots.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let manager_json =
        serde_json::to_string_pretty(&request.manager).unwrap_or_else(|_| "{}".to_string());
    let staff_json =
        serde_json::to_string_pretty(&request.staff).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are an expert scheduling assistant. Generate an optimal work schedule for the following requirements:

SCHEDULE PERIOD: {start} to {end}
ALL TIMES ARE IN UTC+2 (Central European Time).

MANAGER REQUIREMENTS:
{manager_json}

MANAGER AVAILABLE TIME SLOTS (STRICT):
{manager_time_instructions}

STAFF PREFERENCES:
{staff_json}

INSTRUCTIONS:
1. Create shifts that satisfy the manager's staff requirements for each day
2. Assign staff members based on their availability preferences
3. Ensure fair distribution of work hours among staff
4. Respect staff's preferred time slots when possible
5. Generate shifts that cover the required hours for each day
6. Use realistic shift durations (typically 4-8 hours)
7. Ensure proper coverage for all required time slots
8. DO NOT generate any shift that starts before or ends after the manager's available time slot for that day. All shifts must be fully contained within the manager's available time for that day (see above). For example, if the manager's available time is 09:00-17:00, no shift should start before 09:00 or end after 17:00.

CONSTRAINTS:
- Each shift must have a unique title
- Start and end times must be in ISO format
- Assigned staff must be available during the shift time
- Respect the required number of staff per day
- Avoid scheduling conflicts for individual staff members

Return a JSON object with a "shifts" array (each shift has title, startTime, endTime, assignedTo, role and an optional description, times as ISO 8601 strings, assignedTo as the staff member's userId) and a "summary" object with totalShifts, a per-day coverage count and optional notes.

Generate a schedule that optimizes coverage while respecting staff preferences and strictly adheres to the manager's available time slots for each day."#,
        start = request.start_date,
        end = request.end_date,
    )
}

fn proposal_prompt(natural_language: &str) -> String {
    let today = Utc::now().date_naive();
    format!(
        r#"You are an expert scheduling assistant. A staff member wants to propose one or more shifts using natural language.

Input: "{natural_language}"

Today is {today} (ISO format, YYYY-MM-DD).
ALL TIMES ARE IN UTC+2 (Central European Time).

Parse the input and return a JSON array of shift objects. Each shift object should have:
- title: string (e.g. "Proposed Shift")
- startTime: ISO 8601 datetime string (YYYY-MM-DDTHH:mm:ss.sssZ) for the next occurrence of the requested day/time
- endTime: ISO 8601 datetime string (YYYY-MM-DDTHH:mm:ss.sssZ)
- assignedTo: the provided userId
- role: always "staff"
- description: a short description

If the input contains multiple days or times, return one shift object for each. If ambiguous, make a reasonable guess. Always return a valid JSON array."#
    )
}
