//! Plain (non-streaming) chat and completion calls
//!
//! To run this example:
//! ```bash
//! export AGENT_API_KEY="sk-..."
//! export AGENT_BASE_URL="https://api.deepseek.com"  # Optional
//! cargo run --example basic_chat
//! ```

use agentix::{ChatOptions, ClientConfig, LlmAdapter, Message, OpenAiAdapter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env()?;
    let mut llm = OpenAiAdapter::new(config, "gpt-4o-mini")?;

    println!("=== Example 1: Chat ===\n");

    let messages = [
        Message::system("You are a concise assistant."),
        Message::user("What is the capital of France?"),
    ];
    let response = llm.chat(&messages)?;
    println!("{}\n", response.text());

    if let Some(usage) = response.get::<serde_json::Value>("usage") {
        println!("Usage: {usage}\n");
    }

    println!("=== Example 2: Chat with options ===\n");

    let options = ChatOptions {
        temperature: 0.2,
        max_tokens: Some(64),
    };
    let response = llm.chat_with_options(&[Message::user("Name three sorting algorithms.")], &options)?;
    println!("{}\n", response.text());

    println!("=== Example 3: Text completion ===\n");

    llm.set_model("gpt-3.5-turbo-instruct");
    let response = llm.complete("Write a haiku about the sea:")?;
    println!("{}", response.text());

    Ok(())
}
