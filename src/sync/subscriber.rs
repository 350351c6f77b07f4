use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use url::Url;

/// Pause before reconnecting a dropped subscription
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Block number of a `newHeads` notification, `None` for any other message
#[must_use]
pub fn parse_block_number(text: &str) -> Option<u64> {
    let json: Value = serde_json::from_str(text).ok()?;
    if json.get("method")?.as_str()? != "eth_subscription" {
        return None;
    }
    let number = json.get("params")?.get("result")?.get("number")?.as_str()?;
    u64::from_str_radix(number.trim_start_matches("0x"), 16).ok()
}

/// Streams one subscription until the socket closes
///
/// # Returns
/// `false` once the receiving side is gone and streaming should stop
///
/// # Errors
/// * If the connection or the subscription request fails
async fn stream_new_heads(ws_url: &Url, blocks: &mpsc::Sender<u64>) -> eyre::Result<bool> {
    let (mut ws_stream, _) = connect_async(ws_url.as_str()).await?;
    let subscribe_request = json!({
        "jsonrpc": "2.0",
        "method": "eth_subscribe",
        "params": ["newHeads"],
        "id": 1
    });
    ws_stream
        .send(Message::Text(subscribe_request.to_string()))
        .await?;
    info!("sync::subscriber: subscribed to newHeads");

    while let Some(msg) = ws_stream.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("sync::subscriber: error receiving message: {e:?}");
                break;
            }
            _ => continue,
        };

        let Some(block) = parse_block_number(&text) else {
            debug!("sync::subscriber: ignoring message {text}");
            continue;
        };
        debug!("sync::subscriber: block {block}");
        if blocks.send(block).await.is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Subscribes to new block headers and forwards their numbers to `blocks`
///
/// Reconnects after a short pause whenever the socket drops. Returns once the
/// receiver is dropped.
pub async fn subscribe_to_blocks(ws_url: Url, blocks: mpsc::Sender<u64>) {
    loop {
        match stream_new_heads(&ws_url, &blocks).await {
            Ok(false) => {
                info!("sync::subscriber: block receiver closed, stopping");
                return;
            }
            Ok(true) => warn!("sync::subscriber: subscription ended, reconnecting"),
            Err(e) => error!("sync::subscriber: subscription failed: {e}"),
        }
        if blocks.is_closed() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
