//! Container management for the Redis test dependency.
//!
//! Pure functions build command arguments and pick the feature matrix; the
//! I/O functions run the container runtime.

use std::time::Duration;

use tokio::process::Command;

use super::error::{IntegrationError, Result};

/// Storage backend feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Inmemory,
    Sqlite,
}

/// Cache backend feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cache {
    Memory,
    Redis,
}

/// Container runtime (Docker or Podman).
#[derive(Debug, Clone, Copy)]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

/// Specification for a container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: &'static str,
    pub image: &'static str,
    pub port: u16,
    pub command: Option<&'static str>,
}

/// Redis container specification. Ephemeral: no volume is mounted.
pub const REDIS_SPEC: ContainerSpec = ContainerSpec {
    name: "cachebound-redis",
    image: "redis:7-alpine",
    port: 6379,
    command: Some("redis-server --appendonly no"),
};

pub const REDIS_URL: &str = "redis://localhost:6379";

/// Builds arguments for `docker run` / `podman run`.
pub fn container_run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        spec.name.to_string(),
        "-d".to_string(),
        "-p".to_string(),
        format!("{}:{}", spec.port, spec.port),
        spec.image.to_string(),
    ];

    if let Some(cmd) = spec.command {
        args.extend(cmd.split_whitespace().map(String::from));
    }

    args
}

/// Storage backends to run, given the `--inmemory` / `--sqlite` flags.
pub fn storages(inmemory: bool, sqlite: bool) -> Vec<Storage> {
    match (inmemory, sqlite) {
        (true, false) => vec![Storage::Inmemory],
        (false, true) => vec![Storage::Sqlite],
        _ => vec![Storage::Inmemory, Storage::Sqlite],
    }
}

/// The cargo feature string for one cell of the matrix.
pub fn cargo_features(storage: Storage, cache: Cache) -> String {
    let storage_str = match storage {
        Storage::Inmemory => "inmemory",
        Storage::Sqlite => "sqlite",
    };

    let cache_str = match cache {
        Cache::Memory => "memory",
        Cache::Redis => "redis",
    };

    format!("{},{}", storage_str, cache_str)
}

/// Returns the command name for the container runtime.
pub fn runtime_command(runtime: ContainerRuntime) -> &'static str {
    match runtime {
        ContainerRuntime::Docker => "docker",
        ContainerRuntime::Podman => "podman",
    }
}

/// Detects which container runtime is available, Docker first.
pub async fn detect_runtime() -> Result<ContainerRuntime> {
    for (runtime, cmd) in [
        (ContainerRuntime::Docker, "docker"),
        (ContainerRuntime::Podman, "podman"),
    ] {
        if let Ok(output) = Command::new(cmd).arg("--version").output().await {
            if output.status.success() {
                return Ok(runtime);
            }
        }
    }

    Err(IntegrationError::RuntimeNotFound(
        "Neither docker nor podman found in PATH".to_string(),
    ))
}

/// Returns true if a container with this name is running.
pub async fn is_running(runtime: ContainerRuntime, name: &str) -> Result<bool> {
    let output = Command::new(runtime_command(runtime))
        .args(["ps", "-q", "-f", &format!("name={}", name)])
        .output()
        .await?;

    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Stops a container. Errors are ignored since it might not exist.
pub async fn stop_container(runtime: ContainerRuntime, name: &str) -> Result<()> {
    let _ = Command::new(runtime_command(runtime))
        .args(["stop", name])
        .output()
        .await;

    Ok(())
}

/// Starts a container with the given specification.
pub async fn start_container(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<()> {
    let args = container_run_args(spec);
    let output = Command::new(runtime_command(runtime))
        .args(&args)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IntegrationError::ContainerFailed(format!(
            "Failed to start container '{}': {}",
            spec.name, stderr
        )));
    }

    Ok(())
}

/// Polls `redis-cli ping` inside the container until it answers.
pub async fn wait_for_redis(
    runtime: ContainerRuntime,
    spec: &ContainerSpec,
    timeout: Duration,
) -> Result<()> {
    let start = std::time::Instant::now();

    while start.elapsed() < timeout {
        let output = Command::new(runtime_command(runtime))
            .args(["exec", spec.name, "redis-cli", "ping"])
            .output()
            .await;

        if let Ok(output) = output {
            if output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "PONG"
            {
                return Ok(());
            }
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Err(IntegrationError::ContainerNotHealthy {
        name: spec.name.to_string(),
        timeout_secs: timeout.as_secs(),
    })
}
