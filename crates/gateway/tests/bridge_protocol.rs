//! Integration tests: a real bridge on an ephemeral port, driven by
//! tokio-tungstenite clients, with stub agent backends behind it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::routing::post;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tp_domain::config::{BackendConfig, BridgeConfig, Persona};
use tp_domain::{Error, Result};
use tp_gateway::backend::{AgentBackend, HttpAgentBackend};
use tp_gateway::bridge::persona::{IdentityAssigner, PersonaRoster};
use tp_gateway::bridge::{Bridge, BridgeHandle, INVALID_FORMAT, NO_AGENT, QUEUE_FULL};
use tp_protocol::{AgentReply, ClientMessage, ReplyFragment, ServerEvent};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const GREETING: &str = "Connected to TrendPup";

// ── Stub backends ───────────────────────────────────────────────────────

fn fragments(texts: &[&str]) -> AgentReply {
    AgentReply::Fragments(
        texts
            .iter()
            .map(|t| ReplyFragment {
                text: t.to_string(),
                extra: Default::default(),
            })
            .collect(),
    )
}

/// Answers every message with two fragments; `"fail"` produces an error
/// and `"slow"` takes a while.
struct EchoBackend;

#[async_trait::async_trait]
impl AgentBackend for EchoBackend {
    async fn send_message(&self, text: &str, persona: &Persona) -> Result<AgentReply> {
        match text {
            "fail" => Err(Error::Backend {
                status: 500,
                body: "boom".into(),
            }),
            "slow" => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(fragments(&["slow done"]))
            }
            _ => Ok(fragments(&[format!("{}: {text}", persona.name).as_str(), "anything else?"])),
        }
    }
}

/// Holds every call until released.
struct GatedBackend {
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl AgentBackend for GatedBackend {
    async fn send_message(&self, text: &str, _persona: &Persona) -> Result<AgentReply> {
        self.gate.notified().await;
        Ok(fragments(&[text]))
    }
}

struct NobodyAssigned;

impl IdentityAssigner for NobodyAssigned {
    fn assign(&self, _connection_id: &str, _roster: &PersonaRoster) -> Option<Persona> {
        None
    }
}

// ── Harness ─────────────────────────────────────────────────────────────

fn bridge_config() -> BridgeConfig {
    BridgeConfig {
        greeting: GREETING.into(),
        ping_interval_secs: 30,
        ..BridgeConfig::default()
    }
}

fn roster() -> Arc<PersonaRoster> {
    Arc::new(PersonaRoster::new(vec![Persona::named("TrendPup")]))
}

async fn start(bridge: Bridge) -> BridgeHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    bridge.serve(listener).unwrap()
}

async fn start_with(backend: impl AgentBackend + 'static, config: BridgeConfig) -> BridgeHandle {
    start(Bridge::new(config, Arc::new(backend), roster())).await
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
        .await
        .expect("connect to bridge");
    ws
}

/// Next event from the bridge, skipping control frames.
async fn next_event(ws: &mut Client) -> ServerEvent {
    try_next_event(ws, Duration::from_secs(5))
        .await
        .expect("timed out waiting for an event")
}

async fn try_next_event(ws: &mut Client, wait: Duration) -> Option<ServerEvent> {
    tokio::time::timeout(wait, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<ServerEvent>(&text).expect("event JSON");
                }
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .ok()
}

async fn send_chat(ws: &mut Client, content: &str) {
    ws.send(Message::Text(ClientMessage::chat_frame(content)))
        .await
        .unwrap();
}

/// Connect and consume the greeting.
async fn session(addr: SocketAddr) -> Client {
    let mut ws = connect(addr).await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::connected(GREETING));
    ws
}

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ── Protocol ────────────────────────────────────────────────────────────

#[tokio::test]
async fn greeting_is_the_first_event() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = connect(bridge.local_addr()).await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::connected(GREETING));
    bridge.close().await;
}

#[tokio::test]
async fn ws_path_is_also_accepted() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", bridge.local_addr()))
        .await
        .unwrap();
    assert_eq!(next_event(&mut ws).await, ServerEvent::connected(GREETING));
    bridge.close().await;
}

#[tokio::test]
async fn each_fragment_becomes_a_message_event_in_order() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "gm").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: gm"));
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("anything else?"));
    bridge.close().await;
}

#[tokio::test]
async fn backend_failure_is_a_single_error_event() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "fail").await;
    send_chat(&mut ws, "again").await;

    let ServerEvent::Error { message } = next_event(&mut ws).await else {
        panic!("expected an error event");
    };
    assert!(message.starts_with("Error processing your message:"), "{message}");
    assert!(message.contains("500"), "{message}");
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: again"));
    bridge.close().await;
}

#[tokio::test]
async fn malformed_frames_get_an_error_and_keep_the_session() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;

    for bad in ["not json", "[1,2]", r#"{"content":"hi"}"#, r#"{"type":"message"}"#] {
        ws.send(Message::Text(bad.into())).await.unwrap();
        assert_eq!(next_event(&mut ws).await, ServerEvent::error(INVALID_FORMAT), "{bad}");
    }

    send_chat(&mut ws, "still here").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: still here"));
    assert_eq!(bridge.connection_count(), 1);
    bridge.close().await;
}

#[tokio::test]
async fn other_frame_kinds_are_ignored() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;

    ws.send(Message::Text(r#"{"type":"typing"}"#.into())).await.unwrap();
    send_chat(&mut ws, "hi").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: hi"));
    bridge.close().await;
}

#[tokio::test]
async fn binary_utf8_frames_are_treated_as_text() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;

    ws.send(Message::Binary(ClientMessage::chat_frame("bin").into_bytes()))
        .await
        .unwrap();
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: bin"));
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("anything else?"));

    ws.send(Message::Binary(vec![0xff, 0xfe])).await.unwrap();
    assert_eq!(next_event(&mut ws).await, ServerEvent::error(INVALID_FORMAT));
    bridge.close().await;
}

#[tokio::test]
async fn replies_follow_submission_order() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "slow").await;
    send_chat(&mut ws, "quick").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("slow done"));
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: quick"));
    bridge.close().await;
}

#[tokio::test]
async fn sessions_are_isolated() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut alice = session(bridge.local_addr()).await;
    let mut bob = session(bridge.local_addr()).await;

    send_chat(&mut alice, "secret").await;
    assert_eq!(next_event(&mut alice).await, ServerEvent::message("TrendPup: secret"));
    assert_eq!(next_event(&mut alice).await, ServerEvent::message("anything else?"));
    assert_eq!(try_next_event(&mut bob, Duration::from_millis(300)).await, None);

    send_chat(&mut bob, "mine").await;
    assert_eq!(next_event(&mut bob).await, ServerEvent::message("TrendPup: mine"));
    bridge.close().await;
}

#[tokio::test]
async fn overflowing_the_queue_is_rejected() {
    let gate = Arc::new(Notify::new());
    let config = BridgeConfig {
        max_pending_requests: 1,
        ..bridge_config()
    };
    let bridge = start_with(GatedBackend { gate: gate.clone() }, config).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "one").await;
    send_chat(&mut ws, "two").await;
    send_chat(&mut ws, "three").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::error(QUEUE_FULL));

    gate.notify_one();
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("one"));
    gate.notify_one();
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("two"));
    bridge.close().await;
}

#[tokio::test]
async fn connection_without_persona_gets_an_error_per_message() {
    let bridge = start(
        Bridge::new(bridge_config(), Arc::new(EchoBackend), roster()).with_assigner(Arc::new(NobodyAssigned)),
    )
    .await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "hello?").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::error(NO_AGENT));
    assert_eq!(bridge.connections()[0].agent_id, None);
    bridge.close().await;
}

// ── Lifecycle ───────────────────────────────────────────────────────────

#[tokio::test]
async fn client_close_removes_the_connection() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let mut ws = session(bridge.local_addr()).await;
    wait_until("registration", || bridge.connection_count() == 1).await;

    let id = bridge.connections()[0].connection_id.clone();
    assert_eq!(bridge.connections()[0].agent_id.as_deref(), Some("TrendPup"));

    ws.close(None).await.unwrap();
    wait_until("removal", || bridge.connection_count() == 0).await;
    assert!(!bridge.registry().contains(&id));
    bridge.close().await;
}

#[tokio::test]
async fn responsive_client_survives_probes() {
    let config = BridgeConfig {
        ping_interval_secs: 1,
        ..bridge_config()
    };
    let bridge = start_with(EchoBackend, config).await;
    let ws = session(bridge.local_addr()).await;

    // Reading lets tungstenite answer each ping.
    let (_sink, mut stream) = ws.split();
    let reader = tokio::spawn(async move { while let Some(Ok(_)) = stream.next().await {} });

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let infos = bridge.connections();
    assert_eq!(infos.len(), 1);
    assert!(infos[0].probes_sent >= 3, "probes sent: {}", infos[0].probes_sent);

    reader.abort();
    bridge.close().await;
}

#[tokio::test]
async fn silent_client_is_terminated() {
    let config = BridgeConfig {
        ping_interval_secs: 1,
        ..bridge_config()
    };
    let bridge = start_with(EchoBackend, config).await;
    // Not read until the bridge gives up, so no pong is ever sent.
    let mut ws = session(bridge.local_addr()).await;
    wait_until("registration", || bridge.connection_count() == 1).await;

    let id = bridge.connections()[0].connection_id.clone();
    let registry = bridge.registry();
    wait_until("heartbeat termination", || registry.get(&id).is_none()).await;

    // The socket is dropped without a closing handshake.
    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(frame))) => panic!("unexpected close frame: {frame:?}"),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "client stream stayed open");
    bridge.close().await;
}

#[tokio::test]
async fn zero_ping_interval_is_rejected() {
    let config = BridgeConfig {
        ping_interval_secs: 0,
        ..bridge_config()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result = Bridge::new(config, Arc::new(EchoBackend), roster()).serve(listener);
    assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("ping_interval_secs")));
}

#[tokio::test]
async fn zero_payload_cap_is_rejected() {
    let config = BridgeConfig {
        max_payload_bytes: 0,
        ..bridge_config()
    };
    let result = Bridge::new(config, Arc::new(EchoBackend), roster())
        .start("127.0.0.1:0")
        .await;
    assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("max_payload_bytes")));
}

#[tokio::test]
async fn close_stops_accepting_but_open_sessions_continue() {
    let bridge = start_with(EchoBackend, bridge_config()).await;
    let addr = bridge.local_addr();
    let mut ws = session(addr).await;

    tokio::time::timeout(Duration::from_secs(5), bridge.close())
        .await
        .expect("close returns promptly");
    assert!(tokio_tungstenite::connect_async(format!("ws://{addr}/")).await.is_err());

    send_chat(&mut ws, "after close").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("TrendPup: after close"));
}

#[tokio::test]
async fn bridges_keep_separate_registries() {
    let first = start_with(EchoBackend, bridge_config()).await;
    let second = start_with(EchoBackend, bridge_config()).await;
    let _ws = session(first.local_addr()).await;

    wait_until("registration", || first.connection_count() == 1).await;
    assert_eq!(second.connection_count(), 0);
    first.close().await;
    second.close().await;
}

// ── HTTP backend, end to end ────────────────────────────────────────────

#[derive(Default)]
struct Captured {
    agent_ids: Vec<String>,
    bodies: Vec<serde_json::Value>,
}

/// A stand-in agent server: answers `/{agent_id}/message` according to the
/// text it receives.
async fn start_agent_server() -> (SocketAddr, Arc<Mutex<Captured>>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let seen = captured.clone();
    let app = Router::new().route(
        "/:agent_id/message",
        post(move |Path(agent_id): Path<String>, Json(body): Json<serde_json::Value>| {
            let seen = seen.clone();
            async move {
                let text = body["text"].as_str().unwrap_or_default().to_string();
                {
                    let mut seen = seen.lock();
                    seen.agent_ids.push(agent_id);
                    seen.bodies.push(body);
                }
                match text.as_str() {
                    "object" => (axum::http::StatusCode::OK, Json(serde_json::json!({ "text": "hi" }))),
                    "mixed" => (
                        axum::http::StatusCode::OK,
                        Json(serde_json::json!([
                            { "text": "hello" },
                            { "text": null, "action": "CONTINUE" },
                            "plain",
                        ])),
                    ),
                    "down" => (
                        axum::http::StatusCode::SERVICE_UNAVAILABLE,
                        Json(serde_json::json!({ "error": "down" })),
                    ),
                    _ => (
                        axum::http::StatusCode::OK,
                        Json(serde_json::json!([
                            { "text": format!("you said {text}"), "action": "NONE" },
                            { "text": "wagmi" },
                        ])),
                    ),
                }
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

async fn start_http_bridge(agent: SocketAddr) -> BridgeHandle {
    let backend = HttpAgentBackend::new(&BackendConfig {
        base_url: format!("http://{agent}/"),
        user_id: "user".into(),
        user_name: "User".into(),
        timeout_secs: 5,
    })
    .unwrap();
    let roster = Arc::new(PersonaRoster::new(vec![Persona {
        name: "TrendPup".into(),
        id: Some("b850bc30-45f8-0041-a00a-83df46d8555d".into()),
    }]));
    start(Bridge::new(bridge_config(), Arc::new(backend), roster)).await
}

#[tokio::test]
async fn http_backend_relays_fragments() {
    let (agent, captured) = start_agent_server().await;
    let bridge = start_http_bridge(agent).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "gm").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("you said gm"));
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("wagmi"));

    let captured = captured.lock();
    assert_eq!(captured.agent_ids, vec!["b850bc30-45f8-0041-a00a-83df46d8555d"]);
    assert_eq!(
        captured.bodies[0],
        serde_json::json!({ "text": "gm", "userId": "user", "userName": "User" })
    );
    drop(captured);
    bridge.close().await;
}

#[tokio::test]
async fn http_backend_unexpected_shape_and_status() {
    let (agent, _captured) = start_agent_server().await;
    let bridge = start_http_bridge(agent).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "object").await;
    assert_eq!(
        next_event(&mut ws).await,
        ServerEvent::message(AgentReply::UNEXPECTED_FORMAT)
    );

    send_chat(&mut ws, "down").await;
    let ServerEvent::Error { message } = next_event(&mut ws).await else {
        panic!("expected an error event");
    };
    assert!(message.contains("503"), "{message}");
    bridge.close().await;
}

#[tokio::test]
async fn http_backend_mixed_fragments_each_become_a_message() {
    let (agent, _captured) = start_agent_server().await;
    let bridge = start_http_bridge(agent).await;
    let mut ws = session(bridge.local_addr()).await;

    send_chat(&mut ws, "mixed").await;
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("hello"));
    assert_eq!(next_event(&mut ws).await, ServerEvent::message(""));
    assert_eq!(next_event(&mut ws).await, ServerEvent::message("plain"));
    bridge.close().await;
}

#[tokio::test]
async fn unreachable_backend_is_reported() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let bridge = start_http_bridge(dead).await;
    let mut ws = session(bridge.local_addr()).await;
    send_chat(&mut ws, "anyone?").await;
    let ServerEvent::Error { message } = next_event(&mut ws).await else {
        panic!("expected an error event");
    };
    assert!(message.starts_with("Error processing your message:"), "{message}");
    bridge.close().await;
}
