//! Art-app message formats.
//!
//! Requests go out as `ms.channel.emit` envelopes whose `data` is itself a
//! JSON *string*; replies come back as `d2d_service_message` events with the
//! same double encoding.

use chrono::{DateTime, Local};
use serde_json::{json, Map, Value};
use theframe_core::ImageFileType;

pub const EVENT_CONNECT: &str = "ms.channel.connect";
pub const EVENT_READY: &str = "ms.channel.ready";
pub const EVENT_UNAUTHORIZED: &str = "ms.channel.unauthorized";
pub const EVENT_TIMEOUT: &str = "ms.channel.timeOut";
pub const EVENT_D2D: &str = "d2d_service_message";

/// Category of images uploaded by the user ("My Photos").
pub const USER_CONTENT_CATEGORY: &str = "MY-C0002";

/// Channel-level events the session cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected { token: Option<String> },
    Ready,
    Unauthorized,
    D2d(D2dMessage),
    Other(String),
}

/// Parse one text frame from the channel; `None` if it is not JSON.
pub fn parse_channel_event(text: &str) -> Option<ChannelEvent> {
    let value: Value = serde_json::from_str(text).ok()?;
    let event = value.get("event").and_then(Value::as_str).unwrap_or_default();

    Some(match event {
        EVENT_CONNECT => ChannelEvent::Connected {
            token: value
                .pointer("/data/token")
                .and_then(|t| t.as_str().map(str::to_string).or_else(|| t.as_u64().map(|n| n.to_string()))),
        },
        EVENT_READY => ChannelEvent::Ready,
        EVENT_UNAUTHORIZED | EVENT_TIMEOUT => ChannelEvent::Unauthorized,
        EVENT_D2D => match value.get("data").and_then(D2dMessage::from_data) {
            Some(message) => ChannelEvent::D2d(message),
            None => ChannelEvent::Other(event.to_string()),
        },
        other => ChannelEvent::Other(other.to_string()),
    })
}

/// Decoded payload of a `d2d_service_message`.
#[derive(Debug, Clone, PartialEq)]
pub struct D2dMessage {
    pub event: String,
    pub body: Map<String, Value>,
}

impl D2dMessage {
    /// `data` may arrive as a JSON string (usual) or an inline object.
    fn from_data(data: &Value) -> Option<Self> {
        let body = match data {
            Value::String(raw) => match serde_json::from_str::<Value>(raw).ok()? {
                Value::Object(map) => map,
                _ => return None,
            },
            Value::Object(map) => map.clone(),
            _ => return None,
        };
        let event = body.get("event")?.as_str()?.to_string();
        Some(Self { event, body })
    }

    /// Request id the reply refers to, if the TV echoed one.
    pub fn request_id(&self) -> Option<&str> {
        self.str_field("request_id").or_else(|| self.str_field("id"))
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    pub fn content_id(&self) -> Option<&str> {
        self.str_field("content_id")
    }

    /// Human readable reason carried by an `error` event.
    pub fn error_message(&self) -> String {
        let code = self
            .body
            .get("error_code")
            .map(|c| c.as_str().map(str::to_string).unwrap_or_else(|| c.to_string()));
        match (self.str_field("request_event"), code) {
            (Some(request), Some(code)) => format!("{request} failed with error code {code}"),
            (None, Some(code)) => format!("error code {code}"),
            _ => Value::Object(self.body.clone()).to_string(),
        }
    }

    /// Field holding nested JSON encoded as a string, decoded.
    pub fn nested(&self, key: &str) -> Option<Value> {
        match self.body.get(key)? {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => Some(other.clone()),
        }
    }

    /// `conn_info` of a `ready_to_use` reply.
    pub fn conn_info(&self) -> Option<ConnInfo> {
        ConnInfo::from_value(&self.nested("conn_info")?)
    }

    /// Content ids in a `content_list` reply restricted to `category`.
    pub fn content_ids(&self, category: &str) -> Vec<String> {
        let Some(Value::Array(items)) = self.nested("content_list") else {
            return Vec::new();
        };
        items
            .iter()
            .filter(|item| {
                item.get("category_id")
                    .and_then(Value::as_str)
                    .map_or(true, |c| c == category)
            })
            .filter_map(|item| item.get("content_id").and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

/// Where to send the image bytes, as announced by the TV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnInfo {
    pub ip: String,
    pub port: u16,
    pub key: String,
    pub secured: bool,
}

impl ConnInfo {
    fn from_value(value: &Value) -> Option<Self> {
        let port = match value.get("port")? {
            Value::Number(n) => u16::try_from(n.as_u64()?).ok()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };
        Some(Self {
            ip: value.get("ip")?.as_str()?.to_string(),
            port,
            key: value.get("key")?.as_str()?.to_string(),
            secured: value.get("secured").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

/// Wrap an art-app request in the channel envelope.
pub fn art_request(request: &str, id: &str, mut params: Map<String, Value>) -> String {
    params.insert("request".into(), Value::String(request.to_string()));
    params.insert("id".into(), Value::String(id.to_string()));
    json!({
        "method": "ms.channel.emit",
        "params": {
            "event": "art_app_request",
            "to": "host",
            "data": Value::Object(params).to_string(),
        }
    })
    .to_string()
}

/// Parameters for `send_image`.
pub fn send_image_params(
    id: &str,
    file_type: ImageFileType,
    file_size: usize,
    connection_id: u32,
    now: DateTime<Local>,
) -> Map<String, Value> {
    let params = json!({
        "request_id": id,
        "file_type": file_type.wire_name(),
        "conn_info": {
            "d2d_mode": "socket",
            "connection_id": connection_id,
            "id": id,
        },
        "image_date": now.format("%Y:%m:%d %H:%M:%S").to_string(),
        "matte_id": "none",
        "portrait_matte_id": "shadowbox_polar",
        "file_size": file_size,
    });
    match params {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Header sent on the transfer socket: a 4-byte big-endian length, then JSON.
pub fn transfer_header(file_length: usize, file_type: ImageFileType, sec_key: &str) -> Vec<u8> {
    let header = json!({
        "num": 0,
        "total": 1,
        "fileLength": file_length,
        "fileName": "theframe",
        "fileType": file_type.wire_name(),
        "secKey": sec_key,
        "version": "0.0.1",
    })
    .to_string();
    let mut frame = Vec::with_capacity(4 + header.len());
    frame.extend_from_slice(&(header.len() as u32).to_be_bytes());
    frame.extend_from_slice(header.as_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d2d(inner: Value) -> String {
        json!({"event": EVENT_D2D, "data": inner.to_string()}).to_string()
    }

    #[test]
    fn request_envelope_double_encodes_data() {
        let mut params = Map::new();
        params.insert("content_id".into(), json!("MY_F0003"));
        let raw = art_request("select_image", "req-1", params);

        let envelope: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["method"], "ms.channel.emit");
        assert_eq!(envelope["params"]["event"], "art_app_request");
        let data: Value = serde_json::from_str(envelope["params"]["data"].as_str().unwrap()).unwrap();
        assert_eq!(data["request"], "select_image");
        assert_eq!(data["id"], "req-1");
        assert_eq!(data["content_id"], "MY_F0003");
    }

    #[test]
    fn parses_handshake_events() {
        assert_eq!(
            parse_channel_event(r#"{"event":"ms.channel.connect","data":{"token":"1234"}}"#),
            Some(ChannelEvent::Connected { token: Some("1234".into()) })
        );
        assert_eq!(
            parse_channel_event(r#"{"event":"ms.channel.connect","data":{"clients":[]}}"#),
            Some(ChannelEvent::Connected { token: None })
        );
        assert_eq!(
            parse_channel_event(r#"{"event":"ms.channel.unauthorized"}"#),
            Some(ChannelEvent::Unauthorized)
        );
        assert_eq!(parse_channel_event("not json"), None);
    }

    #[test]
    fn parses_ready_to_use_conn_info() {
        let conn = json!({"ip": "192.168.1.20", "port": "37171", "key": "abc", "secured": true});
        let raw = d2d(json!({"event": "ready_to_use", "request_id": "r1", "conn_info": conn.to_string()}));

        let Some(ChannelEvent::D2d(message)) = parse_channel_event(&raw) else {
            panic!("expected d2d message");
        };
        assert_eq!(message.event, "ready_to_use");
        assert_eq!(message.request_id(), Some("r1"));
        assert_eq!(
            message.conn_info(),
            Some(ConnInfo { ip: "192.168.1.20".into(), port: 37171, key: "abc".into(), secured: true })
        );
    }

    #[test]
    fn content_list_is_filtered_by_category() {
        let list = json!([
            {"content_id": "MY_F0001", "category_id": "MY-C0002"},
            {"content_id": "SAM-S0700", "category_id": "MY-C0004"},
            {"content_id": "MY_F0002", "category_id": "MY-C0002"},
        ]);
        let raw = d2d(json!({"event": "content_list", "content_list": list.to_string()}));
        let Some(ChannelEvent::D2d(message)) = parse_channel_event(&raw) else {
            panic!("expected d2d message");
        };
        assert_eq!(message.content_ids(USER_CONTENT_CATEGORY), vec!["MY_F0001", "MY_F0002"]);
    }

    #[test]
    fn error_events_describe_themselves() {
        let raw = d2d(json!({"event": "error", "request_event": "send_image", "error_code": "-1"}));
        let Some(ChannelEvent::D2d(message)) = parse_channel_event(&raw) else {
            panic!("expected d2d message");
        };
        assert_eq!(message.error_message(), "send_image failed with error code -1");
    }

    #[test]
    fn send_image_params_use_tv_formats() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let params = send_image_params("r1", ImageFileType::Jpeg, 2048, 99, now);
        assert_eq!(params["file_type"], "jpg");
        assert_eq!(params["image_date"], "2024:03:09 07:05:01");
        assert_eq!(params["matte_id"], "none");
        assert_eq!(params["portrait_matte_id"], "shadowbox_polar");
        assert_eq!(params["conn_info"]["d2d_mode"], "socket");
        assert_eq!(params["file_size"], 2048);
    }

    #[test]
    fn transfer_header_is_length_prefixed() {
        let frame = transfer_header(5, ImageFileType::Png, "k3y");
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
        let header: Value = serde_json::from_slice(&frame[4..]).unwrap();
        assert_eq!(header["fileLength"], 5);
        assert_eq!(header["fileType"], "png");
        assert_eq!(header["secKey"], "k3y");
    }
}
