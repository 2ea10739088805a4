//! In-process stand-in for the TV's art channel and transfer socket.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Script {
    /// Pair the client and serve art requests.
    Accept,
    /// Answer the handshake with `ms.channel.unauthorized`.
    Unauthorized,
    /// Close the channel without confirming the client.
    CloseImmediately,
    /// Pair, then answer `send_image` with an error event.
    RejectImages,
}

#[derive(Debug, Default)]
pub(crate) struct FakeTvState {
    pub received_header: Value,
    pub received_image: Vec<u8>,
    pub selected: Vec<(String, bool)>,
    pub deleted: Vec<String>,
}

pub(crate) struct FakeTv {
    pub port: u16,
    handle: JoinHandle<FakeTvState>,
}

type ServerWs = WebSocketStream<TcpStream>;

impl FakeTv {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            serve(&mut ws, script).await
        });
        Self { port, handle }
    }

    /// Wait for the client to hang up and return what the TV saw.
    pub async fn finish(self) -> FakeTvState {
        self.handle.await.unwrap()
    }
}

async fn send(ws: &mut ServerWs, value: Value) {
    let _ = ws.send(Message::Text(value.to_string())).await;
}

async fn reply(ws: &mut ServerWs, inner: Value) {
    send(ws, json!({ "event": "d2d_service_message", "data": inner.to_string() })).await;
}

async fn serve(ws: &mut ServerWs, script: Script) -> FakeTvState {
    let mut state = FakeTvState::default();
    match script {
        Script::Unauthorized => {
            send(ws, json!({ "event": "ms.channel.unauthorized" })).await;
            let _ = ws.close(None).await;
            return state;
        }
        Script::CloseImmediately => {
            let _ = ws.close(None).await;
            return state;
        }
        Script::Accept | Script::RejectImages => {}
    }

    send(ws, json!({ "event": "ms.channel.connect", "data": { "id": "c1", "token": "11112222", "clients": [] } })).await;
    send(ws, json!({ "event": "ms.channel.ready", "data": {} })).await;

    while let Some(Ok(message)) = ws.next().await {
        let raw = match message {
            Message::Text(raw) => raw,
            Message::Close(_) => break,
            _ => continue,
        };
        let envelope: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["method"], "ms.channel.emit");
        let data: Value = serde_json::from_str(envelope["params"]["data"].as_str().unwrap()).unwrap();
        let id = data["id"].as_str().unwrap_or_default().to_string();

        match data["request"].as_str().unwrap_or_default() {
            "send_image" if script == Script::RejectImages => {
                reply(ws, json!({ "event": "error", "request_id": id, "request_event": "send_image", "error_code": "-7" })).await;
            }
            "send_image" => {
                let transfer = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let conn = json!({
                    "ip": "127.0.0.1",
                    "port": transfer.local_addr().unwrap().port().to_string(),
                    "key": "fake-key",
                    "secured": false,
                });
                reply(ws, json!({ "event": "ready_to_use", "request_id": id, "conn_info": conn.to_string() })).await;

                let (mut socket, _) = transfer.accept().await.unwrap();
                let mut len = [0u8; 4];
                socket.read_exact(&mut len).await.unwrap();
                let mut header = vec![0u8; u32::from_be_bytes(len) as usize];
                socket.read_exact(&mut header).await.unwrap();
                state.received_header = serde_json::from_slice(&header).unwrap();
                assert_eq!(state.received_header["secKey"], "fake-key");
                let mut image = vec![0u8; state.received_header["fileLength"].as_u64().unwrap() as usize];
                socket.read_exact(&mut image).await.unwrap();
                state.received_image = image;

                reply(ws, json!({ "event": "image_added", "request_id": id, "content_id": "MY_F0042" })).await;
            }
            "get_artmode_status" => {
                reply(ws, json!({ "event": "artmode_status", "id": id, "value": "on" })).await;
            }
            "select_image" => {
                let content_id = data["content_id"].as_str().unwrap().to_string();
                state.selected.push((content_id.clone(), data["show"].as_bool().unwrap_or(false)));
                reply(ws, json!({ "event": "image_selected", "id": id, "content_id": content_id })).await;
            }
            "get_current_artwork" => {
                let current = state.selected.last().map(|(c, _)| c.clone()).unwrap_or_default();
                reply(ws, json!({ "event": "current_artwork", "id": id, "content_id": current })).await;
            }
            "get_content_list" => {
                let list = json!([
                    { "content_id": "MY_F0001", "category_id": "MY-C0002" },
                    { "content_id": "SAM-S0100", "category_id": "MY-C0004" },
                    { "content_id": "MY_F0042", "category_id": "MY-C0002" },
                ]);
                reply(ws, json!({ "event": "content_list", "id": id, "content_list": list.to_string() })).await;
            }
            "delete_image_list" => {
                for item in data["content_id_list"].as_array().unwrap() {
                    state.deleted.push(item["content_id"].as_str().unwrap().to_string());
                }
                reply(ws, json!({ "event": "image_deleted", "id": id })).await;
            }
            other => panic!("fake TV got unexpected request {other}"),
        }
    }
    state
}
