//! Live tests against a real HiAgent deployment. They run only when
//! `HIAGENT_BASE_URL` and `HIAGENT_APIKEY` are set; otherwise they skip.

use anyhow::Result;
use hiagent::{ChatModel, ChatOptions, ClientConfig, HiAgentChatModel, HiAgentClient};

fn live_config() -> Option<ClientConfig> {
    let base_url = std::env::var("HIAGENT_BASE_URL").ok()?;
    let api_key = std::env::var("HIAGENT_APIKEY").ok()?;
    Some(ClientConfig::new(base_url, api_key))
}

#[test]
fn live_blocking_chat_roundtrip() -> Result<()> {
    let Some(config) = live_config() else {
        eprintln!("HIAGENT_BASE_URL / HIAGENT_APIKEY not set; skipping live test");
        return Ok(());
    };

    let model = HiAgentChatModel::new(HiAgentClient::new(config)?);
    let response = model.chat(
        "Please introduce yourself in one sentence",
        None,
        &ChatOptions::default(),
    )?;

    assert!(!response.content.is_empty(), "answer should not be empty");
    println!("HiAgent response: {}", response.content);
    Ok(())
}

#[test]
fn live_streaming_chat_yields_fragments() -> Result<()> {
    let Some(config) = live_config() else {
        eprintln!("HIAGENT_BASE_URL / HIAGENT_APIKEY not set; skipping live test");
        return Ok(());
    };

    let model = HiAgentChatModel::new(HiAgentClient::new(config)?);
    let fragments: Vec<String> = model
        .chat_stream(
            "Count from one to three",
            None,
            &ChatOptions::default().with_chunk_size(1024),
        )?
        .collect::<hiagent::Result<_>>()?;

    assert!(!fragments.is_empty(), "stream should yield fragments");
    println!("streamed answer: {}", fragments.concat());
    Ok(())
}

#[test]
fn live_conversation_messages_are_listed() -> Result<()> {
    let Some(config) = live_config() else {
        eprintln!("HIAGENT_BASE_URL / HIAGENT_APIKEY not set; skipping live test");
        return Ok(());
    };

    let client = HiAgentClient::new(config)?;
    client.create_conversation("hiagent_live_test", None)?;
    client.chat_query_blocking("hello", None)?;
    let messages = client.get_conversation_messages(10)?;
    assert!(messages.is_object());
    Ok(())
}
