//! `trendpup chat` — terminal client for the realtime bridge.
//!
//! Lines typed at the prompt go out as chat frames; events are printed as
//! they arrive. A dropped connection is retried on the back-off schedule.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tp_domain::config::BridgeConfig;
use tp_protocol::{ClientMessage, ServerEvent};

use crate::reconnect::ReconnectBackoff;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionEnd {
    Quit,
    Disconnected,
}

/// `ws://` URL of the configured bridge. Wildcard hosts map to loopback.
pub fn default_url(bridge: &BridgeConfig) -> String {
    let host = match bridge.host.as_str() {
        "0.0.0.0" | "::" | "" => "127.0.0.1",
        other => other,
    };
    format!("ws://{host}:{}/", bridge.port)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(url: String, backoff: ReconnectBackoff) -> anyhow::Result<()> {
    let (line_tx, mut lines) = mpsc::channel::<String>(16);
    std::thread::spawn(move || read_lines(line_tx));

    eprintln!("TrendPup chat on {url}  |  /exit or Ctrl+D to quit");

    let mut attempt = 0u32;
    loop {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                attempt = 0;
                match session(socket, &mut lines).await {
                    SessionEnd::Quit => break,
                    SessionEnd::Disconnected => eprintln!("\x1B[33mconnection lost\x1B[0m"),
                }
            }
            Err(e) => eprintln!("\x1B[31mconnect failed: {e}\x1B[0m"),
        }

        if backoff.should_give_up(attempt) {
            anyhow::bail!("giving up after {attempt} reconnect attempts");
        }
        let delay = backoff.delay_for_attempt(attempt);
        attempt += 1;
        eprintln!("reconnecting in {:.1}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }

    eprintln!("Goodbye!");
    Ok(())
}

/// Blocking prompt loop. Ends when the user quits or the receiver is gone.
fn read_lines(tx: mpsc::Sender<String>) {
    let mut rl = match rustyline::DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("\x1B[31mreadline unavailable: {e}\x1B[0m");
            return;
        }
    };

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed).ok();
                if matches!(trimmed, "/exit" | "/quit") || tx.blocking_send(trimmed.to_string()).is_err() {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connected session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn session(socket: Socket, lines: &mut mpsc::Receiver<String>) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    let frame = ClientMessage::chat_frame(&line);
                    if sink.send(Message::Text(frame)).await.is_err() {
                        return SessionEnd::Disconnected;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    return SessionEnd::Quit;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => print_event(&text),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    return SessionEnd::Disconnected;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

/// How an inbound frame is shown in the terminal.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Out(String),
    Info(String),
    Error(String),
}

fn render(frame: &str) -> Line {
    match serde_json::from_str::<ServerEvent>(frame) {
        Ok(ServerEvent::Message { text }) => Line::Out(format!("pup> {text}")),
        Ok(ServerEvent::Connected { message }) => Line::Info(message),
        Ok(ServerEvent::Error { message }) => Line::Error(message),
        Err(_) => Line::Out(frame.to_string()),
    }
}

fn print_event(frame: &str) {
    match render(frame) {
        Line::Out(text) => println!("{text}"),
        Line::Info(text) => eprintln!("\x1B[2m{text}\x1B[0m"),
        Line::Error(text) => eprintln!("\x1B[31merror: {text}\x1B[0m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_host_maps_to_loopback() {
        let bridge = BridgeConfig {
            host: "0.0.0.0".into(),
            port: 9001,
            ..BridgeConfig::default()
        };
        assert_eq!(default_url(&bridge), "ws://127.0.0.1:9001/");
        assert_eq!(default_url(&BridgeConfig::default()), "ws://127.0.0.1:8080/");
    }

    #[test]
    fn renders_each_event_kind() {
        assert_eq!(
            render(r#"{"type":"message","text":"gm"}"#),
            Line::Out("pup> gm".into())
        );
        assert_eq!(
            render(r#"{"type":"connected","message":"hi"}"#),
            Line::Info("hi".into())
        );
        assert_eq!(
            render(r#"{"type":"error","message":"nope"}"#),
            Line::Error("nope".into())
        );
        assert_eq!(render("plain"), Line::Out("plain".into()));
    }
}
