//! CineChunks command implementations

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use cinechunks_agent::{prompts, McpToolInvoker, Orchestrator, ToolCatalog};
use cinechunks_config::Config;
use cinechunks_mcp::McpClient;
use cinechunks_provider::OpenAiProvider;

/// Write a default config file
pub async fn init_command() -> Result<()> {
    let config = cinechunks_config::init().await?;
    println!("Config ready at {:?}", cinechunks_config::config_path());
    println!("  model:       {}", config.model());
    println!("  tool server: {}", config.mcp_url());
    Ok(())
}

/// List the tools the subtitle server advertises
pub async fn tools_command() -> Result<()> {
    let config = Config::load().await?;
    let client = mcp_client(&config)?;
    client
        .connect()
        .await
        .context("failed to reach the tool server")?;

    let tools = client.list_tools().await?;
    if tools.is_empty() {
        println!("No tools advertised");
        return Ok(());
    }

    for tool in tools {
        println!("{} - {}", tool.name, tool.description.unwrap_or_default());
    }
    Ok(())
}

/// Run one orchestration for a movie and print the JSON payload
pub async fn split_command(
    movie: String,
    episodes: Option<u32>,
    episode_length: Option<u32>,
) -> Result<()> {
    let config = Config::load().await?;

    let provider = OpenAiProvider::new(
        config.api_key().unwrap_or_default(),
        config.openai.api_base.clone(),
        Some(config.model()),
    );

    // An unreachable tool server degrades to a run with zero tools
    // instead of failing the request.
    let client = Arc::new(mcp_client(&config)?);
    let catalog = match client.connect().await {
        Ok(()) => Arc::new(ToolCatalog::load_or_empty(&client).await),
        Err(e) => {
            warn!("tool server unavailable: {}", e);
            Arc::new(ToolCatalog::empty())
        }
    };

    let invoker = Box::new(McpToolInvoker::new(client));
    let mut orchestrator = Orchestrator::new(provider, invoker, catalog, config.model());
    orchestrator.set_sampling(config.openai.max_tokens, config.openai.temperature);

    let query = prompts::build_user_prompt(&movie, episodes, episode_length);
    let payload = orchestrator
        .run(&query)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn mcp_client(config: &Config) -> Result<McpClient> {
    Ok(McpClient::new(
        config.mcp_url(),
        Duration::from_secs(config.mcp.timeout_secs),
    )?)
}
