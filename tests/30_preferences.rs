// Work preference access control and persistence, exercised end to end
// against a running server and database.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn week_slots() -> Value {
    json!({
        "monday": ["09:00-17:00"],
        "tuesday": ["09:00-13:00", "14:00-18:00"],
        "wednesday": [],
        "thursday": ["10:00-16:00"],
        "friday": ["09:00-17:00"],
        "saturday": [],
        "sunday": [],
    })
}

fn week_counts() -> Value {
    json!({
        "monday": 2,
        "tuesday": 2,
        "wednesday": 0,
        "thursday": 1,
        "friday": 3,
        "saturday": 0,
        "sunday": 0,
    })
}

async fn get_prefs(base: &str, token: &str, target: &str) -> Result<(StatusCode, Value)> {
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/api/preferences/{}", base, target))
        .bearer_auth(token)
        .send()
        .await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    Ok((status, body))
}

async fn put_prefs(
    base: &str,
    token: &str,
    target: &str,
    body: &Value,
) -> Result<(StatusCode, Value)> {
    let client = reqwest::Client::new();
    let resp = client
        .put(format!("{}/api/preferences/{}", base, target))
        .bearer_auth(token)
        .json(body)
        .send()
        .await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    Ok((status, body))
}

#[tokio::test]
async fn staff_cannot_touch_another_users_preferences() -> Result<()> {
    let server = common::ensure_server().await?;
    let base = &server.base_url;

    let manager_a = common::register_user(base, "manager", None).await?;
    let manager_b = common::register_user(base, "manager", None).await?;
    let staff_a = common::register_user(base, "staff", Some(&manager_a.id)).await?;
    let staff_b = common::register_user(base, "staff", Some(&manager_b.id)).await?;

    // Own record is always readable
    let (status, _) = get_prefs(base, &staff_a.token, &staff_a.id).await?;
    assert_eq!(status, StatusCode::OK);

    // Another staff member's record is not, for reads or writes
    let (status, body) = get_prefs(base, &staff_a.token, &staff_b.id).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    let update = json!({ "preferences": week_slots() });
    let (status, body) = put_prefs(base, &staff_a.token, &staff_b.id, &update).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    // Nor is the manager's own record
    let (status, _) = get_prefs(base, &staff_a.token, &manager_a.id).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A manager reaches their own roster but not another manager's
    let (status, _) = get_prefs(base, &manager_a.token, &staff_a.id).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_prefs(base, &manager_a.token, &staff_b.id).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    let (status, _) = put_prefs(base, &manager_b.token, &staff_a.id, &update).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn saved_preferences_read_back_identical() -> Result<()> {
    let server = common::ensure_server().await?;
    let base = &server.base_url;

    let manager = common::register_user(base, "manager", None).await?;

    let update = json!({
        "preferences": week_slots(),
        "staffRequirements": week_counts(),
    });
    let (status, saved) = put_prefs(base, &manager.token, &manager.id, &update).await?;
    assert_eq!(status, StatusCode::OK, "save failed: {}", saved);

    let (status, body) = get_prefs(base, &manager.token, &manager.id).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"], week_slots());
    assert_eq!(body["staffRequirements"], week_counts());

    Ok(())
}
