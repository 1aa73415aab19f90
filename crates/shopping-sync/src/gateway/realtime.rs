//! Realtime Channel Frames
//!
//! Phoenix channel messages spoken by the hosted realtime service. The
//! websocket transport lives with the UI; this module only builds and reads
//! frames.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::feed::{ChangeKind, ChangeNotice, ChannelSpec};
use super::postgrest::filter_param;
use crate::error::StoreResult;

/// Topic that carries heartbeats
pub const PHOENIX_TOPIC: &str = "phoenix";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl Frame {
    pub fn to_text(&self) -> StoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Monotonic message references
#[derive(Debug, Default)]
pub struct RefCounter(u64);

impl RefCounter {
    pub fn next(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }
}

pub fn topic(channel: &ChannelSpec) -> String {
    format!("realtime:{}", channel.name)
}

/// Join request with one `postgres_changes` binding per change kind
pub fn join_frame(channel: &ChannelSpec, access_token: &str, reference: String) -> Frame {
    let (column, condition) = filter_param(&channel.filter);
    let filter = format!("{}={}", column, condition);
    let bindings: Vec<Value> = channel
        .events
        .iter()
        .map(|kind| {
            json!({
                "event": kind.as_str(),
                "schema": "public",
                "table": channel.table,
                "filter": filter,
            })
        })
        .collect();

    Frame {
        topic: topic(channel),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": bindings,
            },
            "access_token": access_token,
        }),
        reference: Some(reference),
    }
}

pub fn leave_frame(channel: &ChannelSpec, reference: String) -> Frame {
    Frame {
        topic: topic(channel),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference),
    }
}

pub fn heartbeat_frame(reference: String) -> Frame {
    Frame {
        topic: PHOENIX_TOPIC.to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference),
    }
}

/// Upper bound on the wait before reopening a dropped socket
pub const MAX_RECONNECT_DELAY_MS: u32 = 30_000;

/// Wait before the next connection after `failures` consecutive drops:
/// none at first, then doubling from one second
pub fn reconnect_delay_ms(failures: u32) -> u32 {
    match failures {
        0 => 0,
        n => 1000u32
            .saturating_mul(1 << (n - 1).min(15))
            .min(MAX_RECONNECT_DELAY_MS),
    }
}

/// What an incoming frame means for the subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Change(ChangeNotice),
    JoinReply { ok: bool, detail: Value },
    Closed,
    Error(String),
    Ignored,
}

/// Interpret an incoming frame for the channel with the given topic
pub fn decode_inbound(text: &str, channel_topic: &str) -> StoreResult<Inbound> {
    let frame: Frame = serde_json::from_str(text)?;
    if frame.topic != channel_topic {
        return Ok(Inbound::Ignored);
    }

    let inbound = match frame.event.as_str() {
        "postgres_changes" => {
            let data = &frame.payload["data"];
            Inbound::Change(ChangeNotice {
                table: data["table"].as_str().unwrap_or_default().to_string(),
                kind: data["type"].as_str().and_then(ChangeKind::parse),
            })
        }
        "phx_reply" => Inbound::JoinReply {
            ok: frame.payload["status"] == "ok",
            detail: frame.payload["response"].clone(),
        },
        "phx_close" => Inbound::Closed,
        "phx_error" => Inbound::Error(frame.payload.to_string()),
        "system" if frame.payload["status"] == "error" => Inbound::Error(
            frame.payload["message"]
                .as_str()
                .unwrap_or("realtime system error")
                .to_string(),
        ),
        _ => Inbound::Ignored,
    };
    Ok(inbound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Filter;

    fn channel() -> ChannelSpec {
        ChannelSpec {
            name: "shopping_changes".to_string(),
            table: "shopping_items".to_string(),
            filter: Filter::eq("family_id", "f1"),
            events: ChangeKind::ALL.to_vec(),
        }
    }

    #[test]
    fn test_reconnect_delay_backs_off() {
        assert_eq!(reconnect_delay_ms(0), 0);
        assert_eq!(reconnect_delay_ms(1), 1000);
        assert_eq!(reconnect_delay_ms(3), 4000);
        assert_eq!(reconnect_delay_ms(6), MAX_RECONNECT_DELAY_MS);
        assert_eq!(reconnect_delay_ms(u32::MAX), MAX_RECONNECT_DELAY_MS);
    }

    #[test]
    fn test_join_frame() {
        let frame = join_frame(&channel(), "anon-key", "1".to_string());
        assert_eq!(frame.topic, "realtime:shopping_changes");
        assert_eq!(frame.event, "phx_join");
        assert_eq!(frame.reference.as_deref(), Some("1"));

        let bindings = frame.payload["config"]["postgres_changes"].as_array().unwrap();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0]["event"], "INSERT");
        assert_eq!(bindings[2]["event"], "DELETE");
        assert_eq!(bindings[1]["filter"], "family_id=eq.f1");
        assert_eq!(frame.payload["access_token"], "anon-key");
    }

    #[test]
    fn test_frame_text_uses_ref_key() {
        let text = heartbeat_frame("7".to_string()).to_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["topic"], "phoenix");
        assert_eq!(value["ref"], "7");
    }

    #[test]
    fn test_decode_postgres_change() {
        let text = r#"{
            "topic": "realtime:shopping_changes",
            "event": "postgres_changes",
            "payload": {"ids": [1], "data": {"type": "UPDATE", "table": "shopping_items", "schema": "public"}},
            "ref": null
        }"#;
        let inbound = decode_inbound(text, "realtime:shopping_changes").unwrap();
        assert_eq!(
            inbound,
            Inbound::Change(ChangeNotice {
                table: "shopping_items".to_string(),
                kind: Some(ChangeKind::Update),
            })
        );
    }

    #[test]
    fn test_decode_other_frames() {
        let reply = r#"{"topic":"realtime:shopping_changes","event":"phx_reply","payload":{"status":"ok","response":{}},"ref":"1"}"#;
        assert!(matches!(
            decode_inbound(reply, "realtime:shopping_changes").unwrap(),
            Inbound::JoinReply { ok: true, .. }
        ));

        let heartbeat = r#"{"topic":"phoenix","event":"phx_reply","payload":{"status":"ok","response":{}},"ref":"2"}"#;
        assert_eq!(
            decode_inbound(heartbeat, "realtime:shopping_changes").unwrap(),
            Inbound::Ignored
        );

        let closed = r#"{"topic":"realtime:shopping_changes","event":"phx_close","payload":{},"ref":"1"}"#;
        assert_eq!(
            decode_inbound(closed, "realtime:shopping_changes").unwrap(),
            Inbound::Closed
        );

        assert!(decode_inbound("not json", "realtime:shopping_changes").is_err());
    }

    #[test]
    fn test_ref_counter() {
        let mut refs = RefCounter::default();
        assert_eq!(refs.next(), "1");
        assert_eq!(refs.next(), "2");
    }
}
