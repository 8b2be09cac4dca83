//! Streaming chat, materialized and real-time
//!
//! To run this example:
//! ```bash
//! export AGENT_API_KEY="sk-..."
//! cargo run --example streaming_chat
//! ```

use std::io::Write;

use agentix::{ClientConfig, LlmAdapter, Message, OpenAiAdapter, PushSink};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut llm = OpenAiAdapter::with_default_model(ClientConfig::from_env()?)?;

    println!("=== Example 1: Materialized stream ===\n");

    let stream = llm.chat_stream(&[Message::user("Count from one to five.")])?;
    for chunk in &stream {
        if !chunk.is_terminal() {
            print!("[{}]", chunk.text());
        }
    }
    println!("\n\nChunks: {}, complete: {}", stream.len(), stream.is_complete());
    println!("Full text: {}\n", stream.full_text());

    println!("=== Example 2: Real-time stream ===\n");

    let mut stdout = std::io::stdout();
    let mut sink = PushSink::new()
        .on_chunk(|chunk| {
            print!("{}", chunk.text());
            stdout.flush().ok();
        })
        .on_complete(|| println!("\n\n=== Stream Complete ==="))
        .on_error(|message| eprintln!("\n[stream error] {message}"));

    llm.chat_stream_realtime(
        &[Message::user("Tell me a short story about a robot learning to code.")],
        &mut sink,
    )?;
    println!("Chunks delivered: {}", sink.delivered());

    Ok(())
}
