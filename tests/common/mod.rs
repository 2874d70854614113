use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/rota-api");
        cmd.env("ROTA_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL and
        // GEMINI_API_KEY from .env (loaded by the server)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Consider server ready on any non-404 response
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: String,
    pub token: String,
}

/// Register a fresh user through the API and hand back its id and token.
/// Usernames carry a random suffix so repeated runs never collide.
#[allow(dead_code)]
pub async fn register_user(
    base_url: &str,
    role: &str,
    manager_id: Option<&str>,
) -> Result<TestUser> {
    let client = reqwest::Client::new();
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let mut body = serde_json::json!({
        "username": format!("{}-{}", role, tag),
        "password": "test-password-1",
        "name": format!("Test {}", role),
        "email": format!("{}-{}@example.com", role, tag),
        "role": role,
    });
    if let Some(manager_id) = manager_id {
        body["managerId"] = serde_json::json!(manager_id);
    }

    let resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&body)
        .send()
        .await?;
    let status = resp.status();
    let json: serde_json::Value = resp.json().await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "register returned {}: {}",
        status,
        json
    );

    Ok(TestUser {
        id: json["id"]
            .as_str()
            .context("register response missing id")?
            .to_string(),
        token: json["token"]
            .as_str()
            .context("register response missing token")?
            .to_string(),
    })
}
