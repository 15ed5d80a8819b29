//! Docker container management for MySQL testing

use crate::ConnectionOpts;
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const ROOT_PASSWORD: &str = "testpass";
const DATABASE: &str = "testdb";

/// A throwaway MySQL 8 container bound to a local port
pub struct MySQLContainer {
    pub container_name: String,
    pub host_port: u16,
    pub image_name: String,
}

impl MySQLContainer {
    pub fn new(container_name: &str, host_port: u16) -> Self {
        Self {
            container_name: container_name.to_string(),
            host_port,
            image_name: "mysql:8.0".to_string(),
        }
    }

    /// Options for connecting to the container's test database
    pub fn connection_opts(&self) -> ConnectionOpts {
        ConnectionOpts {
            host: "127.0.0.1".to_string(),
            port: self.host_port,
            username: "root".to_string(),
            password: ROOT_PASSWORD.to_string(),
            database: DATABASE.to_string(),
        }
    }

    /// Starts the container, replacing any leftover one with the same name
    pub fn start(&self) -> Result<()> {
        info!("Starting MySQL container: {}", self.container_name);
        self.remove_quietly();

        let output = Command::new("docker")
            .args([
                "run",
                "--name",
                &self.container_name,
                "-e",
                &format!("MYSQL_ROOT_PASSWORD={ROOT_PASSWORD}"),
                "-e",
                &format!("MYSQL_DATABASE={DATABASE}"),
                "-p",
                &format!("{}:3306", self.host_port),
                "-d",
                &self.image_name,
            ])
            .output()
            .context("Failed to start Docker container")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to start container: {stderr}");
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Started container: {}", container_id);
        Ok(())
    }

    /// Waits for MySQL to accept connections
    pub async fn wait_until_ready(&self, timeout_secs: u64) -> Result<()> {
        info!("Waiting for MySQL to be ready...");

        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        while start.elapsed() < timeout {
            match self.connect().await {
                Ok(conn) => {
                    let _ = conn.disconnect().await;
                    info!("MySQL is ready!");
                    return Ok(());
                }
                Err(e) => {
                    debug!("Connection attempt failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(1000)).await;
                }
            }
        }

        anyhow::bail!("MySQL did not become ready within {timeout_secs} seconds")
    }

    /// Runs setup statements (DDL and fixture rows) with autocommit on
    pub async fn execute_all(&self, statements: &[&str]) -> Result<()> {
        let mut conn = self.connect().await?;
        for statement in statements {
            conn.query_drop(*statement)
                .await
                .with_context(|| format!("Failed to run setup statement: {statement}"))?;
        }
        conn.disconnect().await.context("Failed to disconnect")?;
        Ok(())
    }

    async fn connect(&self) -> Result<Conn> {
        let opts = self.connection_opts();
        let builder = OptsBuilder::default()
            .ip_or_hostname(opts.host)
            .tcp_port(opts.port)
            .user(Some(opts.username))
            .pass(Some(opts.password))
            .db_name(Some(opts.database));
        let mut conn = Conn::new(builder).await.context("Failed to connect")?;
        let _: Option<i32> = conn
            .query_first("SELECT 1")
            .await
            .context("Failed to execute test query")?;
        Ok(conn)
    }

    /// Stops and removes the container
    pub fn stop(&self) -> Result<()> {
        info!("Stopping container: {}", self.container_name);

        for action in ["stop", "rm"] {
            let output = Command::new("docker")
                .args([action, &self.container_name])
                .output()
                .with_context(|| format!("Failed to {action} container"))?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("docker {} failed (container may not exist): {}", action, stderr);
            }
        }

        info!("Container stopped and removed");
        Ok(())
    }

    fn remove_quietly(&self) {
        for action in ["stop", "rm"] {
            let _ = Command::new("docker")
                .args([action, &self.container_name])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

impl Drop for MySQLContainer {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.stop();
    }
}
