//! Authenticated art-app channel.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use theframe_core::{ArtDisplay, FrameError, FrameResult, ImageFileType};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::endpoint::TvEndpoint;
use crate::protocol::{
    art_request, parse_channel_event, send_image_params, ChannelEvent, D2dMessage,
    USER_CONTENT_CATEGORY,
};
use crate::transfer::{send_image_bytes, tls_connector};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for `ms.channel.ready` once the TV has accepted the client.
const READY_GRACE: std::time::Duration = std::time::Duration::from_secs(2);

pub struct ArtSession {
    endpoint: TvEndpoint,
    ws: WsStream,
    issued_token: Option<String>,
}

impl ArtSession {
    /// Open the art channel and wait for the TV to accept this client.
    ///
    /// Network failures come back as `TvUnreachable`, a rejected or missing
    /// pairing as `TvAuth`.
    pub async fn connect(endpoint: &TvEndpoint) -> FrameResult<Self> {
        let host = endpoint.host.clone();
        info!(url = %endpoint.redacted_url(), "Connecting to TV");

        let request = endpoint
            .url()
            .into_client_request()
            .map_err(|e| FrameError::Config(format!("invalid TV address {host}: {e}")))?;
        let connector = if endpoint.secure {
            let tls = tls_connector().map_err(|e| FrameError::TvUnreachable {
                host: host.clone(),
                reason: format!("cannot create TLS connector: {e}"),
            })?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        let (ws, _response) = tokio::time::timeout(
            endpoint.timeout,
            connect_async_tls_with_config(request, None, false, connector),
        )
        .await
        .map_err(|_| FrameError::TvUnreachable {
            host: host.clone(),
            reason: format!("no answer within {}s", endpoint.timeout.as_secs()),
        })?
        .map_err(|e| connect_error(&host, e))?;

        let mut session = Self {
            endpoint: endpoint.clone(),
            ws,
            issued_token: None,
        };
        tokio::time::timeout(endpoint.timeout, session.await_connect())
            .await
            .map_err(|_| FrameError::TvAuth { host: host.clone() })??;

        if let Some(token) = session.issued_token.as_deref() {
            if session.endpoint.token.as_deref() != Some(token) {
                info!("TV issued a new pairing token; store it as THEFRAME_TV_TOKEN");
            }
        }
        info!(host = %host, "Connected to TV art channel");
        Ok(session)
    }

    async fn await_connect(&mut self) -> FrameResult<()> {
        let host = self.endpoint.host.clone();
        loop {
            let text = match next_text(&mut self.ws).await {
                Ok(Some(text)) => text,
                // Closing the channel before confirming it is how the TV
                // turns away a client it does not trust.
                Ok(None) => return Err(FrameError::TvAuth { host }),
                Err(e) => return Err(transport_error(&host, "handshake", e)),
            };
            match parse_channel_event(&text) {
                Some(ChannelEvent::Connected { token }) => {
                    self.issued_token = token;
                    break;
                }
                Some(ChannelEvent::Unauthorized) => return Err(FrameError::TvAuth { host }),
                other => debug!(event = ?other, "Ignoring pre-connect event"),
            }
        }

        // Some firmware follows up with `ms.channel.ready`; consume it if it comes.
        if let Ok(Ok(Some(text))) = tokio::time::timeout(READY_GRACE, next_text(&mut self.ws)).await {
            debug!(event = ?parse_channel_event(&text), "Post-connect event");
        }
        Ok(())
    }

    /// Token the TV handed out during the handshake, if any.
    pub fn issued_token(&self) -> Option<&str> {
        self.issued_token.as_deref()
    }

    /// Send `request` and wait for a reply named in `expected`.
    async fn request(
        &mut self,
        request: &str,
        params: Map<String, Value>,
        expected: &[&str],
    ) -> FrameResult<D2dMessage> {
        let id = Uuid::new_v4().to_string();
        self.send(request, &id, params).await?;
        self.await_reply(request, &id, expected).await
    }

    async fn send(&mut self, request: &str, id: &str, params: Map<String, Value>) -> FrameResult<()> {
        debug!(request, id, "Sending art request");
        self.ws
            .send(Message::Text(art_request(request, id, params)))
            .await
            .map_err(|e| transport_error(&self.endpoint.host, request, e))
    }

    async fn await_reply(&mut self, request: &str, id: &str, expected: &[&str]) -> FrameResult<D2dMessage> {
        let timeout = self.endpoint.timeout;
        let host = self.endpoint.host.clone();

        let wait = async {
            loop {
                let text = match next_text(&mut self.ws).await {
                    Ok(Some(text)) => text,
                    Ok(None) => {
                        return Err(FrameError::ConnectionReset(format!(
                            "TV closed the channel while waiting for {request}"
                        )))
                    }
                    Err(e) => return Err(transport_error(&host, request, e)),
                };
                let Some(ChannelEvent::D2d(message)) = parse_channel_event(&text) else {
                    continue;
                };
                if message.request_id().is_some_and(|rid| rid != id) {
                    debug!(event = %message.event, "Reply to another request, skipping");
                    continue;
                }
                if message.event == "error" {
                    return Err(FrameError::TvRequest {
                        request: request.to_string(),
                        message: message.error_message(),
                    });
                }
                if expected.contains(&message.event.as_str()) {
                    return Ok(message);
                }
                debug!(event = %message.event, "Unexpected art event, skipping");
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| FrameError::TvRequest {
                request: request.to_string(),
                message: format!("no answer within {}s", timeout.as_secs()),
            })?
    }

    /// Upload an image and return the content id the TV assigned to it.
    pub async fn upload(&mut self, image: &[u8], file_type: ImageFileType) -> FrameResult<String> {
        let id = Uuid::new_v4().to_string();
        let connection_id: u32 = rand::random();
        let params = send_image_params(&id, file_type, image.len(), connection_id, chrono::Local::now());
        self.send("send_image", &id, params).await?;

        let ready = self.await_reply("send_image", &id, &["ready_to_use"]).await?;
        let conn = ready
            .conn_info()
            .ok_or_else(|| FrameError::Upload("ready_to_use without usable conn_info".into()))?;
        send_image_bytes(&conn, image, file_type, self.endpoint.timeout).await?;

        let added = self.await_reply("send_image", &id, &["image_added"]).await?;
        let content_id = added
            .content_id()
            .ok_or_else(|| FrameError::Upload("image_added without content_id".into()))?
            .to_string();
        info!(content_id = %content_id, bytes = image.len(), "Image stored on TV");
        Ok(content_id)
    }

    pub async fn set_active(&mut self, content_id: &str, show: bool) -> FrameResult<()> {
        let params = object(json!({ "category_id": null, "content_id": content_id, "show": show }));
        self.request("select_image", params, &["image_selected"]).await?;
        info!(content_id, show, "Selected artwork");
        Ok(())
    }

    pub async fn artmode_enabled(&mut self) -> FrameResult<bool> {
        let reply = self
            .request("get_artmode_status", Map::new(), &["artmode_status"])
            .await?;
        Ok(reply.str_field("value") == Some("on"))
    }

    pub async fn current_content(&mut self) -> FrameResult<Option<String>> {
        let reply = self
            .request("get_current_artwork", Map::new(), &["current_artwork"])
            .await?;
        Ok(reply.content_id().map(str::to_string))
    }

    /// User-uploaded content ids stored on the TV.
    pub async fn list_content(&mut self) -> FrameResult<Vec<String>> {
        let params = object(json!({ "category": null }));
        let reply = self
            .request("get_content_list", params, &["content_list"])
            .await?;
        Ok(reply.content_ids(USER_CONTENT_CATEGORY))
    }

    pub async fn delete_content(&mut self, content_ids: &[String]) -> FrameResult<()> {
        if content_ids.is_empty() {
            return Ok(());
        }
        let list: Vec<Value> = content_ids.iter().map(|id| json!({ "content_id": id })).collect();
        let params = object(json!({ "content_id_list": list }));
        self.request("delete_image_list", params, &["image_deleted"]).await?;
        info!(count = content_ids.len(), "Deleted artworks from TV");
        Ok(())
    }

    pub async fn close(mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "Error closing TV channel");
        }
    }
}

#[async_trait]
impl ArtDisplay for ArtSession {
    async fn upload(&mut self, image: &[u8], file_type: ImageFileType) -> FrameResult<String> {
        ArtSession::upload(self, image, file_type).await
    }

    async fn set_active(&mut self, content_id: &str, show: bool) -> FrameResult<()> {
        ArtSession::set_active(self, content_id, show).await
    }

    async fn artmode_enabled(&mut self) -> FrameResult<bool> {
        ArtSession::artmode_enabled(self).await
    }

    async fn current_content(&mut self) -> FrameResult<Option<String>> {
        ArtSession::current_content(self).await
    }

    async fn list_content(&mut self) -> FrameResult<Vec<String>> {
        ArtSession::list_content(self).await
    }

    async fn delete_content(&mut self, content_ids: &[String]) -> FrameResult<()> {
        ArtSession::delete_content(self, content_ids).await
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Next text frame; `None` once the channel is closed.
async fn next_text(ws: &mut WsStream) -> Result<Option<String>, WsError> {
    while let Some(message) = ws.next().await {
        match message? {
            Message::Text(text) => return Ok(Some(text)),
            Message::Close(frame) => {
                debug!(?frame, "TV closed the channel");
                return Ok(None);
            }
            _ => continue,
        }
    }
    Ok(None)
}

fn connect_error(host: &str, e: WsError) -> FrameError {
    match e {
        WsError::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            FrameError::TvAuth { host: host.to_string() }
        }
        WsError::Http(response) => FrameError::TvUnreachable {
            host: host.to_string(),
            reason: format!("unexpected HTTP {}", response.status()),
        },
        e if is_reset(&e) => FrameError::ConnectionReset(format!("{host}: {e}")),
        e => FrameError::TvUnreachable {
            host: host.to_string(),
            reason: e.to_string(),
        },
    }
}

fn transport_error(host: &str, request: &str, e: WsError) -> FrameError {
    if is_reset(&e) {
        warn!(host, request, error = %e, "TV connection reset");
        FrameError::ConnectionReset(format!("{request}: {e}"))
    } else {
        FrameError::TvRequest {
            request: request.to_string(),
            message: e.to_string(),
        }
    }
}

fn is_reset(e: &WsError) -> bool {
    match e {
        WsError::Io(io) => matches!(
            io.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
        ),
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        WsError::ConnectionClosed | WsError::AlreadyClosed => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_tv::{FakeTv, Script};
    use std::time::Duration;

    fn endpoint_for(port: u16) -> TvEndpoint {
        TvEndpoint::new("127.0.0.1", port)
            .with_token("11112222")
            .with_timeout(Duration::from_secs(5))
            .insecure()
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = ArtSession::connect(&endpoint_for(port)).await.err().unwrap();
        assert!(matches!(err, FrameError::TvUnreachable { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn rejected_token_is_an_auth_error() {
        let tv = FakeTv::start(Script::Unauthorized).await;
        let err = ArtSession::connect(&endpoint_for(tv.port)).await.err().unwrap();
        assert!(matches!(err, FrameError::TvAuth { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn channel_closed_before_connect_is_an_auth_error() {
        let tv = FakeTv::start(Script::CloseImmediately).await;
        let err = ArtSession::connect(&endpoint_for(tv.port)).await.err().unwrap();
        assert!(matches!(err, FrameError::TvAuth { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn full_upload_flow_against_fake_tv() {
        let tv = FakeTv::start(Script::Accept).await;
        let mut session = ArtSession::connect(&endpoint_for(tv.port)).await.unwrap();
        assert_eq!(session.issued_token(), Some("11112222"));

        let image = b"\xFF\xD8\xFFfake jpeg body".to_vec();
        let content_id = session.upload(&image, ImageFileType::Jpeg).await.unwrap();
        assert_eq!(content_id, "MY_F0042");

        assert!(session.artmode_enabled().await.unwrap());
        session.set_active(&content_id, true).await.unwrap();
        assert_eq!(session.current_content().await.unwrap().as_deref(), Some("MY_F0042"));
        assert_eq!(session.list_content().await.unwrap(), vec!["MY_F0001", "MY_F0042"]);
        session.delete_content(&["MY_F0001".to_string()]).await.unwrap();
        session.close().await;

        let state = tv.finish().await;
        assert_eq!(state.received_image, image);
        assert_eq!(state.received_header["fileType"], "jpg");
        assert_eq!(state.selected, vec![("MY_F0042".to_string(), true)]);
        assert_eq!(state.deleted, vec!["MY_F0001".to_string()]);
    }

    #[tokio::test]
    async fn tv_error_event_becomes_request_error() {
        let tv = FakeTv::start(Script::RejectImages).await;
        let mut session = ArtSession::connect(&endpoint_for(tv.port)).await.unwrap();
        let err = session.upload(b"\x89PNG\r\n\x1a\n", ImageFileType::Png).await.unwrap_err();
        match err {
            FrameError::TvRequest { request, message } => {
                assert_eq!(request, "send_image");
                assert!(message.contains("-7"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
