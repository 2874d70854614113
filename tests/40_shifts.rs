// Shift listing scope and approval input handling against a running
// server and database.

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// RFC 3339 start/end pair for tomorrow, safely past the booking cutoff.
fn tomorrow_window(start_hour: u32, end_hour: u32) -> (String, String) {
    let day = (Utc::now() + Duration::days(1)).date_naive();
    let at = |hour| {
        day.and_hms_opt(hour, 0, 0)
            .expect("valid wall-clock time")
            .and_utc()
            .to_rfc3339()
    };
    (at(start_hour), at(end_hour))
}

async fn create_shift(
    base: &str,
    token: &str,
    assigned_to: &str,
) -> Result<(StatusCode, Value)> {
    let (start, end) = tomorrow_window(9, 17);
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/shifts", base))
        .bearer_auth(token)
        .json(&json!({
            "title": "Floor cover",
            "startTime": start,
            "endTime": end,
            "assignedTo": assigned_to,
            "role": "staff",
        }))
        .send()
        .await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    Ok((status, body))
}

/// The list payload populates assignees where the user still exists and
/// falls back to a bare id otherwise; accept both shapes.
fn assignee_id(shift: &Value) -> Option<&str> {
    shift["assignedTo"]
        .as_str()
        .or_else(|| shift["assignedTo"]["id"].as_str())
}

#[tokio::test]
async fn manager_shift_list_is_scoped_to_their_roster() -> Result<()> {
    let server = common::ensure_server().await?;
    let base = &server.base_url;

    let manager_a = common::register_user(base, "manager", None).await?;
    let manager_b = common::register_user(base, "manager", None).await?;
    let staff_a = common::register_user(base, "staff", Some(&manager_a.id)).await?;
    let staff_b = common::register_user(base, "staff", Some(&manager_b.id)).await?;

    let (status, ours) = create_shift(base, &manager_a.token, &staff_a.id).await?;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", ours);
    // Manager assigning someone else lands directly in scheduled
    assert_eq!(ours["status"], "scheduled");

    let (status, theirs) = create_shift(base, &manager_b.token, &staff_b.id).await?;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", theirs);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/api/shifts", base))
        .bearer_auth(&manager_a.token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Value = resp.json().await?;
    let listed = listed.as_array().expect("shift list should be an array");

    let ids: Vec<&str> = listed.iter().filter_map(|s| s["id"].as_str()).collect();
    assert!(ids.contains(&ours["id"].as_str().unwrap()));
    assert!(!ids.contains(&theirs["id"].as_str().unwrap()));

    // Manager A's roster is exactly one person, so every listed shift
    // must belong to that person
    for shift in listed {
        assert_eq!(assignee_id(shift), Some(staff_a.id.as_str()));
    }

    Ok(())
}

#[tokio::test]
async fn unknown_approve_action_is_a_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let base = &server.base_url;

    let manager = common::register_user(base, "manager", None).await?;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/shifts/{}/approve", base, uuid::Uuid::new_v4()))
        .bearer_auth(&manager.token)
        .json(&json!({ "action": "banana" }))
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Invalid action");

    Ok(())
}
