//! Common test utilities for CineChunks integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

/// Test environment with an isolated home directory so the real
/// ~/.cinechunks and the caller's environment are never touched
pub struct TestEnv {
    pub temp_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            temp_dir: tempdir()?,
        })
    }

    /// Command with HOME pointed at the temp dir and model/tool-server
    /// variables cleared
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cinechunks"));
        cmd.env("HOME", self.temp_dir.path())
            .env_remove("OPENAI_API_KEY")
            .env_remove("OPENAI_MODEL")
            .env_remove("OPENAI_API_BASE")
            // Nothing listens here; tool-server access must degrade, not hang
            .env("MCP_URL", "http://127.0.0.1:1/mcp");
        cmd
    }
}
