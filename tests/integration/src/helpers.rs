//! Test helpers for integration tests
//!
//! Spawns in-process gateways on ephemeral ports and drives them with real
//! WebSocket clients.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use huddle_cache::{LocalBus, MemorySetStore};
use huddle_common::{GatewayConfig, JwtService};
use huddle_core::IdentityId;
use huddle_gateway::{create_app, GatewayState};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::fixtures::World;

/// Signing secret shared by every test server
pub const TEST_SECRET: &str = "integration-test-secret";

/// How long a client waits for an expected frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

/// Gateway settings for tests
pub fn test_config() -> GatewayConfig {
    GatewayConfig::default()
}

/// Mint an access token for `identity`
pub fn token_for(identity: i64) -> String {
    JwtService::new(TEST_SECRET)
        .issue_access_token(IdentityId::new(identity), chrono::Duration::minutes(10))
        .expect("token encodes")
}

/// Gateways sharing one ephemeral store and one bus, like processes
/// sharing a Redis
#[derive(Clone)]
pub struct Cluster {
    pub world: Arc<World>,
    pub store: Arc<MemorySetStore>,
    pub bus: Arc<LocalBus>,
}

impl Cluster {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            store: Arc::new(MemorySetStore::new()),
            bus: Arc::new(LocalBus::default()),
        }
    }

    /// Start one more gateway process
    pub async fn spawn(&self, config: GatewayConfig) -> Result<TestServer> {
        let state = GatewayState::new(
            config,
            JwtService::new(TEST_SECRET),
            self.world.collaborators(),
            self.store.clone(),
            self.bus.clone(),
        );
        state.start();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = create_app(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(TestServer {
            addr,
            state,
            client,
            handle,
        })
    }
}

/// A running gateway
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: GatewayState,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a standalone gateway over `world`
    pub async fn start(world: &Arc<World>) -> Result<Self> {
        Self::start_with_config(world, test_config()).await
    }

    pub async fn start_with_config(world: &Arc<World>, config: GatewayConfig) -> Result<Self> {
        Cluster::new(world.clone()).spawn(config).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn gateway_url(&self) -> String {
        format!("ws://{}/gateway", self.addr)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Connect as `identity` with a header credential and wait for `ready`
    pub async fn connect(&self, identity: i64) -> Result<WsClient> {
        match self.try_connect(Some(&token_for(identity))).await? {
            Ok(client) => Ok(client),
            Err(status) => bail!("upgrade rejected with {status}"),
        }
    }

    /// Connect with the credential in the `token` query parameter
    pub async fn connect_with_query(&self, identity: i64) -> Result<WsClient> {
        let url = format!("{}?token={}", self.gateway_url(), token_for(identity));
        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        WsClient::ready(stream).await
    }

    /// Attempt an upgrade; `Err(status)` when the gateway refused it
    pub async fn try_connect(
        &self,
        token: Option<&str>,
    ) -> Result<std::result::Result<WsClient, u16>> {
        let mut request = self.gateway_url().into_client_request()?;
        if let Some(token) = token {
            request.headers_mut().insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))?,
            );
        }

        match tokio_tungstenite::connect_async(request).await {
            Ok((stream, _)) => Ok(Ok(WsClient::ready(stream).await?)),
            Err(tungstenite::Error::Http(response)) => Ok(Err(response.status().as_u16())),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.state.stop();
        self.handle.abort();
    }
}

/// A WebSocket client speaking the gateway's JSON frames
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub session_id: String,
    pub ready: Value,
}

impl WsClient {
    async fn ready(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Result<Self> {
        let mut client = Self {
            stream,
            session_id: String::new(),
            ready: Value::Null,
        };
        let ready = client.next_event("ready").await?;
        client.session_id = ready["session_id"]
            .as_str()
            .context("ready without session_id")?
            .to_string();
        client.ready = ready;
        Ok(client)
    }

    pub async fn send_event(&mut self, event: &str, data: Value) -> Result<()> {
        let frame = json!({ "event": event, "data": data });
        self.stream.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    pub async fn send_raw(&mut self, message: Message) -> Result<()> {
        self.stream.send(message).await?;
        Ok(())
    }

    /// Join `room` and return the `joined_room` payload
    pub async fn join(&mut self, room: &str) -> Result<Value> {
        self.send_event("join_room", json!({ "room_id": room })).await?;
        self.next_event("joined_room").await
    }

    /// Next application frame as `(event, data)`
    pub async fn next_frame(&mut self) -> Result<(String, Value)> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?
                .context("connection ended")??;

            match message {
                Message::Text(text) => {
                    let mut frame: Value = serde_json::from_str(&text)?;
                    let event = frame["event"].as_str().context("frame without event")?.to_string();
                    return Ok((event, frame["data"].take()));
                }
                Message::Close(frame) => bail!("connection closed: {frame:?}"),
                _ => {}
            }
        }
    }

    /// Data of the next frame named `event`, skipping others
    pub async fn next_event(&mut self, event: &str) -> Result<Value> {
        loop {
            let (name, data) = self.next_frame().await?;
            if name == event {
                return Ok(data);
            }
        }
    }

    /// Every frame received during `window`
    pub async fn collect_for(&mut self, window: Duration) -> Vec<(String, Value)> {
        let mut frames = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Some(Ok(message))) =
            tokio::time::timeout_at(deadline, self.stream.next()).await
        {
            if let Message::Text(text) = message {
                if let Ok(mut frame) = serde_json::from_str::<Value>(&text) {
                    let event = frame["event"].as_str().unwrap_or_default().to_string();
                    frames.push((event, frame["data"].take()));
                }
            }
        }
        frames
    }

    /// Read until the server closes; returns the close code it sent
    pub async fn next_close(&mut self) -> Result<Option<u16>> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for close")?;
            match message {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Poll `check` until it holds, failing after a few seconds
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..60 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
