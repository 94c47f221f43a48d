//! Minimal walkthrough: one blocking chat, one streamed chat, one async call.
//!
//! Requires `HIAGENT_BASE_URL` and `HIAGENT_APIKEY` in the environment.
//!
//! ```sh
//! HIAGENT_BASE_URL=https://agent.example.com \
//! HIAGENT_APIKEY=sk-... \
//! cargo run --example chat_demo
//! ```

use std::io::Write;

use hiagent::{ChatModel, ChatOptions, HiAgentChatModel, LoggingConfig};

fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let model = HiAgentChatModel::from_env()?;

    let response = model.chat(
        "Introduce yourself in one sentence.",
        None,
        &ChatOptions::default(),
    )?;
    println!("blocking answer: {}", response.content);

    print!("streamed answer: ");
    let fragments = model.chat_stream(
        "Count from one to five.",
        None,
        &ChatOptions::default().with_chunk_size(1024),
    )?;
    for fragment in fragments {
        print!("{}", fragment?);
        std::io::stdout().flush()?;
    }
    println!();

    // The async entry points hand the blocking call to the worker pool; the
    // client must be built outside the runtime, as above.
    let runtime = tokio::runtime::Runtime::new()?;
    let response = runtime.block_on(async {
        model
            .achat("Say goodbye in one word.", None, &ChatOptions::default())
            .await
    })?;
    println!("async answer: {}", response.content);

    Ok(())
}
