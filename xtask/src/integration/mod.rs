//! Integration test infrastructure.
//!
//! Runs the `cachebound` test suite once per backend feature combination,
//! managing a Redis container when the Redis cache is selected.
//!
//! # Usage
//!
//! ```bash
//! # In-memory and SQLite storage with the in-process cache
//! cargo xtask integration
//!
//! # Only SQLite
//! cargo xtask integration --sqlite
//!
//! # Redis cache (starts a container)
//! cargo xtask integration --redis
//!
//! # Skip container management (assumes Redis is already running)
//! cargo xtask integration --redis --no-docker
//! ```

pub mod containers;
pub mod error;

pub use error::{IntegrationError, Result};

use std::time::Duration;

use containers::{
    cargo_features, detect_runtime, is_running, start_container, stop_container, storages,
    wait_for_redis, Cache, ContainerRuntime, REDIS_SPEC, REDIS_URL,
};

use crate::prelude::*;

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run the test suite against every backend combination.

By default both storage backends (in-memory and SQLite) are tested with
the in-process cache. With --redis, the Redis cache is used instead and a
Redis container is started and stopped around the run.

Environment variables:
  REDIS_URL           - Override Redis URL (default: redis://localhost:6379)")]
pub struct IntegrationCommand {
    /// Run only the in-memory storage tests.
    #[arg(long)]
    pub inmemory: bool,

    /// Run only the SQLite storage tests.
    #[arg(long)]
    pub sqlite: bool,

    /// Use the Redis cache (requires Docker or Podman unless --no-docker).
    #[arg(long)]
    pub redis: bool,

    /// Skip container management (assume services are already running).
    #[arg(long)]
    pub no_docker: bool,

    /// Keep containers running after tests complete.
    #[arg(long)]
    pub keep_containers: bool,

    /// Timeout in seconds for container health checks.
    #[arg(long, default_value = "30")]
    pub health_timeout: u64,
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    let cache = if command.redis {
        Cache::Redis
    } else {
        Cache::Memory
    };
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| REDIS_URL.to_string());

    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
    }

    let runtime = if command.redis && !command.no_docker {
        Some(detect_runtime().await?)
    } else {
        None
    };

    let mut redis_started = false;
    if let Some(rt) = runtime {
        redis_started = start_redis(rt, command.health_timeout, &global).await?;
    } else if command.redis && !global.is_silent() {
        aprintln!(
            "{} Skipping Redis container management (--no-docker)",
            p_y("⚠️")
        );
    }

    let mut all_passed = true;
    for storage in storages(command.inmemory, command.sqlite) {
        let features = cargo_features(storage, cache);
        if !run_tests_with_features(&features, &redis_url, &global).await? {
            all_passed = false;
        }
    }

    if let Some(rt) = runtime {
        if redis_started && !command.keep_containers {
            stop_container(rt, REDIS_SPEC.name).await?;
        } else if redis_started && !global.is_silent() {
            aprintln!("{} Containers left running (--keep-containers)", p_y("⚠️"));
        }
    }

    aprintln!();
    if all_passed {
        aprintln!("{} {}", p_g("✅"), p_g("All integration tests passed!"));
        Ok(())
    } else {
        aprintln!("{} {}", p_r("❌"), p_r("Some integration tests failed"));
        Err(IntegrationError::TestFailed(
            "One or more feature combinations failed".to_string(),
        ))
    }
}

/// Runs `cargo test -p cachebound` with one storage and one cache feature.
async fn run_tests_with_features(
    features: &str,
    redis_url: &str,
    global: &crate::Global,
) -> Result<bool> {
    if !global.is_silent() {
        aprintln!("{} Running with features: {}", p_b("  →"), p_y(features));
    }

    let status = tokio::process::Command::new("cargo")
        .args([
            "test",
            "-p",
            "cachebound",
            "--no-default-features",
            "--features",
            features,
        ])
        .env("REDIS_URL", redis_url)
        .status()
        .await?;

    if status.success() {
        if !global.is_silent() {
            aprintln!("{} {} tests passed", p_g("✅"), features);
        }
        Ok(true)
    } else {
        aprintln!("{} {} tests failed", p_r("❌"), features);
        Ok(false)
    }
}

/// Starts Redis unless it is already running. Returns true if we started it.
async fn start_redis(
    runtime: ContainerRuntime,
    timeout_secs: u64,
    global: &crate::Global,
) -> Result<bool> {
    if is_running(runtime, REDIS_SPEC.name).await? {
        if !global.is_silent() {
            aprintln!("{} Redis container already running", p_y("⚠️"));
        }
        return Ok(false);
    }

    if !global.is_silent() {
        aprintln!("{} Starting Redis container...", p_b("🐳"));
    }
    start_container(runtime, &REDIS_SPEC).await?;
    wait_for_redis(runtime, &REDIS_SPEC, Duration::from_secs(timeout_secs)).await?;

    if !global.is_silent() {
        aprintln!("{} Redis is ready", p_g("✅"));
    }
    Ok(true)
}
