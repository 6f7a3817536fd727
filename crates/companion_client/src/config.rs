use std::time::Duration;

/// Connection details for one player session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_ip: String,
    pub server_port: u16,
    /// Platform account id of the observing player.
    pub player_id: u64,
    pub player_token: i64,
    /// Upper bound for a single request/response exchange.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_ip: impl Into<String>, server_port: u16, player_id: u64, player_token: i64) -> Self {
        Self {
            server_ip: server_ip.into(),
            server_port,
            player_id,
            player_token,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.server_ip, self.server_port)
    }
}
