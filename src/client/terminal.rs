use std::future::Future;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;

use super::relay_client::{PollPolicy, RelayClient};
use super::session::ChatSession;

/// Reads lines from stdin and prints the agent's replies until EOF or Ctrl-C.
pub async fn run_terminal_chat(base_url: &str, policy: PollPolicy) -> anyhow::Result<()> {
    let client = RelayClient::new(base_url).with_policy(policy);

    log::info!("Chatting with relay at {base_url}");
    println!("Connected to {base_url}. Type a message, Ctrl-C or Ctrl-D to quit.");

    let input = BufReader::new(tokio::io::stdin());
    let session = chat_loop(&client, input, signal::ctrl_c()).await?;

    log::info!("Chat ended after {} messages", session.messages().len());
    Ok(())
}

/// `interrupt` ends the session whether it fires at the prompt or while a
/// reply is in flight; an in-flight exchange is aborted.
async fn chat_loop<R, I>(client: &RelayClient, input: R, interrupt: I) -> io::Result<ChatSession>
where
    R: AsyncBufRead + Unpin,
    I: Future,
{
    let mut session = ChatSession::new();
    let mut lines = input.lines();
    tokio::pin!(interrupt);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupt => {
                session.push_system("Interrupted");
                break;
            }
        };
        let Some(line) = line else { break };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        session.push_user(text);
        println!("...");

        let pending = client.send(text);
        let abort = pending.abort_handle();
        tokio::select! {
            reply = pending.reply_text() => {
                let message = session.push_agent(reply);
                println!("agent> {}", message.text);
            }
            _ = &mut interrupt => {
                abort.abort();
                session.push_system("Cancelled");
                break;
            }
        }
    }

    Ok(session)
}
