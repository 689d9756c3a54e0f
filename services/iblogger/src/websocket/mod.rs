use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use han_protocols::Topics;
use serde_json::json;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use crate::state::AppState;

/// 主题推送 WebSocket
///
/// 客户端按主题订阅（ordtrack/riskmgt/report），服务端把事件总线上
/// 匹配主题的消息原样转发。
pub async fn topic_websocket(
    ws: WebSocketUpgrade,
    Path(topic): Path<String>,
    State(state): State<AppState>,
) -> Response {
    if !Topics::is_valid(&topic) {
        return StatusCode::NOT_FOUND.into_response();
    }

    ws.on_upgrade(move |socket| handle_topic_socket(socket, state, topic))
}

async fn handle_topic_socket(socket: WebSocket, state: AppState, topic: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.event_tx.subscribe();

    state.metrics.ws_connections.inc();
    info!("WebSocket client subscribed to topic {}", topic);

    // 发送欢迎消息
    let welcome_msg = json!({
        "type": "welcome",
        "topic": topic,
        "timestamp": chrono::Utc::now()
    });

    if sender
        .send(Message::Text(welcome_msg.to_string()))
        .await
        .is_err()
    {
        state.metrics.ws_connections.dec();
        return;
    }

    let mut ping_interval = interval(Duration::from_secs(
        state.config.websocket.ping_interval_secs,
    ));

    loop {
        tokio::select! {
            // 转发总线消息
            event = event_rx.recv() => {
                match event {
                    Ok(event) if event.topic == topic => {
                        let payload = match serde_json::to_string(&event.message) {
                            Ok(payload) => payload,
                            Err(e) => {
                                tracing::error!("Failed to serialize bus event: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("WebSocket client lagged, {} events skipped", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            // 处理客户端消息
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.trim() == "ping" {
                            let pong = json!({
                                "type": "pong",
                                "timestamp": chrono::Utc::now()
                            });
                            if sender.send(Message::Text(pong.to_string())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket connection closed by client");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            // 定期探活
            _ = ping_interval.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.metrics.ws_connections.dec();
    debug!("WebSocket client for topic {} disconnected", topic);
}
