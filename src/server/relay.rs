use tokio::task::JoinHandle;

use super::RelayContext;

/// Produces the reply for an acknowledged message in the background: the
/// primary adapter is retried `deferred_attempts` times, then the fallback
/// adapter answers. The entry always leaves `Pending`.
pub(super) fn spawn_deferred_reply(
    ctx: RelayContext,
    message_id: String,
    text: String,
) -> JoinHandle<()> {
    tokio::spawn(async move { resolve_deferred(&ctx, &message_id, &text).await })
}

async fn resolve_deferred(ctx: &RelayContext, message_id: &str, text: &str) {
    let delay = ctx.settings.retry_delay();

    for attempt in 1..=ctx.settings.deferred_attempts {
        tokio::time::sleep(delay).await;
        match ctx.adapter.send_message(text).await {
            Ok(reply) => {
                log::info!("Message {message_id} answered on retry {attempt}");
                if !ctx.pending.complete(message_id, reply.reply_text).await {
                    log::warn!("Reply for message {message_id} arrived after it was dropped");
                }
                return;
            }
            Err(err) => log::debug!("Retry {attempt} for message {message_id} failed: {err}"),
        }
    }

    match ctx.fallback.send_message(text).await {
        Ok(reply) => {
            log::info!(
                "Message {message_id} answered by `{}` fallback",
                ctx.fallback.name()
            );
            if !ctx.pending.complete(message_id, reply.reply_text).await {
                log::warn!("Reply for message {message_id} arrived after it was dropped");
            }
        }
        Err(err) => {
            log::error!("No reply could be produced for message {message_id}: {err}");
            if !ctx.pending.fail(message_id).await {
                log::warn!("Message {message_id} was dropped before it could be marked failed");
            }
        }
    }
}
