#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

/// One server process per test. Killed when dropped.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Cargo builds the server binary before integration tests run
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_portfolio-api"));
        cmd.env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("HOST", "127.0.0.1")
            .env("PORTFOLIO_API_PORT", port.to_string())
            .env("JWT_SECRET", "integration-test-secret")
            .env("RUST_LOG", "portfolio_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

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
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Username that no other test in the run will collide with
pub fn unique_username(prefix: &str) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    format!("{}_{}_{}", prefix, std::process::id(), NEXT.fetch_add(1, Ordering::Relaxed))
}

/// Register `username` and return a bearer token for it
pub async fn signup_and_login(
    server: &TestServer,
    client: &reqwest::Client,
    username: &str,
    password: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/signup", server.base_url))
        .query(&[("username", username), ("password", password)])
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "signup failed: {}", res.status());

    let res = client
        .post(format!("{}/login", server.base_url))
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .context("login response missing access_token")
}
