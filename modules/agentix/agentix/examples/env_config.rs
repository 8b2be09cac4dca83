//! Configuration sources
//!
//! Shows explicit configuration, environment overlay and the transport
//! knobs (timeout, default headers).
//!
//! To run this example:
//! ```bash
//! export AGENT_API_KEY="sk-..."
//! cargo run --example env_config
//! ```

use std::time::Duration;

use agentix::{ClientConfig, HttpTransport, LlmAdapter, Message, OpenAiAdapter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Explicit values first, then whatever AGENT_API_KEY / AGENT_BASE_URL provide
    let config = ClientConfig::new("")
        .with_timeout(Duration::from_secs(30))
        .with_default_header("X-Client", "agentix-demo")?
        .with_env();

    println!("Base URL: {}", config.base_url);
    println!("Timeout:  {:?}", config.timeout);
    println!("API key:  {}", if config.has_api_key() { "set" } else { "missing" });

    let transport = HttpTransport::from_config(&config)?;
    let mut llm = OpenAiAdapter::with_transport(config, "gpt-4o-mini", transport)?;

    // Slow down for long answers
    llm.transport_mut().set_timeout(Duration::from_secs(120));

    let response = llm.chat(&[Message::user("Say hello in five languages.")])?;
    println!("\n{}", response.text());

    Ok(())
}
