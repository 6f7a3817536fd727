use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use watch_core::{
    ChatMessage, MapInfo, MapMarker, MemberId, ServerInfo, ServerTime, TeamInfo, Transport, TransportError,
    TransportResult,
};

use crate::config::ClientConfig;
use crate::protocol::{missing, AppMessage, AppRequest, AppResponse, RequestBody};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Companion API session over a single WebSocket.
///
/// Calls are serialized through the socket lock, so at most one request is in
/// flight. A connection-level failure drops the socket; the next call opens a
/// fresh one before sending, so a lost connection costs one failed cycle.
pub struct CompanionClient {
    config: ClientConfig,
    stream: Mutex<Option<WsStream>>,
    next_seq: AtomicU32,
}

impl CompanionClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
            next_seq: AtomicU32::new(1),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a new WebSocket to the configured server, bounded by the
    /// request timeout.
    async fn open_socket(&self) -> TransportResult<WsStream> {
        let url = self.config.url();
        let (stream, _) = match timeout(self.config.request_timeout, connect_async(url.as_str())).await {
            Ok(result) => result.map_err(|e| TransportError::Connection(e.to_string()))?,
            Err(_) => return Err(TransportError::Timeout(self.config.request_timeout)),
        };
        info!("Companion socket open at {}", url);
        Ok(stream)
    }

    async fn request(&self, body: RequestBody) -> TransportResult<AppResponse> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let operation = body.name();
        let request = AppRequest::new(seq, &self.config, body);
        let json = serde_json::to_string(&request).map_err(|e| TransportError::Protocol(e.to_string()))?;

        let mut guard = self.stream.lock().await;
        if guard.is_none() {
            info!("Reconnecting companion socket");
            *guard = Some(self.open_socket().await?);
        }
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;

        trace!("→ {} (seq {})", operation, seq);
        let outcome = match timeout(self.config.request_timeout, exchange(stream, seq, json)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!("{} (seq {}) timed out", operation, seq);
                return Err(TransportError::Timeout(self.config.request_timeout));
            }
        };

        match outcome {
            Ok(response) => response.into_result(),
            Err(e) => {
                if matches!(e, TransportError::Connection(_)) {
                    warn!("Companion socket lost during {}: {}", operation, e);
                    *guard = None;
                }
                Err(e)
            }
        }
    }
}

/// Sends one request and waits for the response carrying the same `seq`.
async fn exchange(stream: &mut WsStream, seq: u32, json: String) -> TransportResult<AppResponse> {
    stream
        .send(Message::text(json))
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    loop {
        let frame = match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(TransportError::Connection(e.to_string())),
            None => return Err(TransportError::Connection("socket closed".to_string())),
        };

        match frame {
            Message::Text(text) => {
                let message: AppMessage =
                    serde_json::from_str(text.as_str()).map_err(|e| TransportError::Protocol(e.to_string()))?;
                match message.response {
                    Some(response) if response.seq == seq => return Ok(response),
                    Some(response) => trace!("Skipping stale response seq {}", response.seq),
                    None => trace!("Skipping broadcast"),
                }
            }
            Message::Close(frame) => {
                return Err(TransportError::Connection(format!("closed by server: {:?}", frame)));
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Transport for CompanionClient {
    async fn connect(&self) -> TransportResult<()> {
        let stream = self.open_socket().await?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn get_map_info(&self) -> TransportResult<MapInfo> {
        let response = self.request(RequestBody::GetMap {}).await?;
        response.map.map(MapInfo::from).ok_or_else(|| missing("map"))
    }

    async fn get_server_info(&self) -> TransportResult<ServerInfo> {
        let response = self.request(RequestBody::GetInfo {}).await?;
        response.info.map(ServerInfo::from).ok_or_else(|| missing("info"))
    }

    async fn get_team_chat(&self) -> TransportResult<Vec<ChatMessage>> {
        let response = self.request(RequestBody::GetTeamChat {}).await?;
        let chat = response.team_chat.ok_or_else(|| missing("teamChat"))?;
        Ok(chat.messages.into_iter().map(ChatMessage::from).collect())
    }

    async fn get_team_info(&self) -> TransportResult<TeamInfo> {
        let response = self.request(RequestBody::GetTeamInfo {}).await?;
        response.team_info.map(TeamInfo::from).ok_or_else(|| missing("teamInfo"))
    }

    async fn get_markers(&self) -> TransportResult<Vec<MapMarker>> {
        let response = self.request(RequestBody::GetMapMarkers {}).await?;
        let markers = response.map_markers.ok_or_else(|| missing("mapMarkers"))?;
        Ok(markers.markers.into_iter().map(MapMarker::from).collect())
    }

    async fn get_server_time(&self) -> TransportResult<ServerTime> {
        let response = self.request(RequestBody::GetTime {}).await?;
        response.time.map(ServerTime::from).ok_or_else(|| missing("time"))
    }

    async fn send_team_message(&self, text: &str) -> TransportResult<()> {
        self.request(RequestBody::SendTeamMessage { message: text.to_string() })
            .await
            .map(|_| ())
    }

    async fn promote_to_leader(&self, member: MemberId) -> TransportResult<()> {
        self.request(RequestBody::PromoteToLeader { steam_id: member })
            .await
            .map(|_| ())
    }
}
