//! Extraction of the vehicle payload from a poll body.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::ChannelName;

use super::error::PollingError;
use super::packet::{Packet, SocketKind, packets};

/// Raw upstream vehicle records, keyed by vehicle id.
pub type RawVehicles = Map<String, Value>;

/// Decode the event frame published on `channel`.
///
/// The event payload is a JSON array whose second element is an object with
/// a `data` object. If the body holds several events for the channel, the
/// last one is the freshest and wins.
///
/// Text the tokenizer cannot read only matters once it touches the channel:
/// inside or after the channel's event it is `MalformedFrame`, before that
/// the body simply carries no event for us.
pub fn decode_event(body: &str, channel: &ChannelName) -> Result<RawVehicles, PollingError> {
    let namespace = channel.namespace();
    let mut packets = packets(body);

    let mut latest = None;
    let mut rejection = None;
    while let Some(packet) = packets.next() {
        let packet = match packet {
            Ok(packet) => packet,
            Err(e)
                if latest.is_some()
                    || packets.failed_namespace() == Some(namespace.as_str()) =>
            {
                return Err(e.into());
            }
            Err(e) => {
                debug!(channel = %channel, error = %e, "Ignoring unreadable frames");
                break;
            }
        };
        let Packet::Message(message) = packet else {
            continue;
        };
        if message.namespace != namespace {
            continue;
        }
        match message.kind {
            SocketKind::Event => latest = Some(message.payload),
            SocketKind::ConnectError => rejection = Some(message.payload),
            _ => {}
        }
    }

    match (latest, rejection) {
        (Some(payload), _) => extract_data(payload),
        (None, Some(message)) => Err(PollingError::NamespaceRejected {
            channel: channel.to_string(),
            message: message.to_string(),
        }),
        (None, None) => Err(PollingError::NoDataFrame {
            channel: channel.to_string(),
        }),
    }
}

fn extract_data(payload: &str) -> Result<RawVehicles, PollingError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| PollingError::MalformedFrame(format!("event payload is not JSON: {e}")))?;

    let Value::Array(mut items) = value else {
        return Err(malformed("event payload is not an array"));
    };
    if items.len() < 2 {
        return Err(malformed("event payload has no body element"));
    }
    let Value::Object(mut body) = items.swap_remove(1) else {
        return Err(malformed("event body is not an object"));
    };

    match body.remove("data") {
        Some(Value::Object(data)) => Ok(data),
        Some(_) => Err(malformed("event `data` is not an object")),
        None => Err(malformed("event body has no `data` field")),
    }
}

fn malformed(message: &str) -> PollingError {
    PollingError::MalformedFrame(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> ChannelName {
        ChannelName::parse(name).unwrap()
    }

    #[test]
    fn decodes_vehicle_map() {
        let body = r#"0{"pingInterval":25000}42/cityA,[0,{"data":{"v1":{"lat":51.9,"lon":15.5,"route_id":"5","delay":10}}}]"#;

        let data = decode_event(body, &channel("cityA")).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["v1"]["route_id"], "5");
        assert_eq!(data["v1"]["delay"], 10);
    }

    #[test]
    fn missing_event_is_no_data() {
        let body = r#"0{"sid":"abc","pingInterval":25000}"#;
        let err = decode_event(body, &channel("cityA")).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn empty_body_is_no_data() {
        assert!(decode_event("", &channel("cityA")).unwrap_err().is_no_data());
    }

    #[test]
    fn event_on_other_channel_is_no_data() {
        let body = r#"42/cityB,[0,{"data":{"v1":{}}}]"#;
        let err = decode_event(body, &channel("cityA")).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn channel_prefix_does_not_match() {
        // "/city" must not match the "/cityA" namespace.
        let body = r#"42/cityA,[0,{"data":{"v1":{}}}]"#;
        let err = decode_event(body, &channel("city")).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn last_event_wins() {
        let body = "42/a,[0,{\"data\":{\"old\":{}}}]\u{1e}42/a,[0,{\"data\":{\"new\":{}}}]";
        let data = decode_event(body, &channel("a")).unwrap();
        assert!(data.contains_key("new"));
        assert!(!data.contains_key("old"));
    }

    #[test]
    fn missing_data_field_is_malformed() {
        let body = r#"42/a,["vehicles",{"other":1}]"#;
        let err = decode_event(body, &channel("a")).unwrap_err();
        assert!(matches!(err, PollingError::MalformedFrame(_)));
    }

    #[test]
    fn short_array_is_malformed() {
        let err = decode_event(r#"42/a,["vehicles"]"#, &channel("a")).unwrap_err();
        assert!(matches!(err, PollingError::MalformedFrame(_)));
    }

    #[test]
    fn non_object_data_is_malformed() {
        let err = decode_event(r#"42/a,[0,{"data":[1,2]}]"#, &channel("a")).unwrap_err();
        assert!(matches!(err, PollingError::MalformedFrame(_)));
    }

    #[test]
    fn unreadable_body_is_malformed() {
        let err = decode_event(r#"42/a,[0,{"data":"#, &channel("a")).unwrap_err();
        assert!(matches!(err, PollingError::MalformedFrame(_)));
    }

    #[test]
    fn non_protocol_bodies_are_no_data() {
        for body in [
            "ok",
            "<!DOCTYPE html><html><body>502 Bad Gateway</body></html>",
            r#"0{"pingInterval":25000}junk"#,
        ] {
            let err = decode_event(body, &channel("cityA")).unwrap_err();
            assert!(err.is_no_data(), "{body:?} gave {err}");
        }
    }

    #[test]
    fn broken_frame_on_other_channel_is_no_data() {
        let err = decode_event(r#"42/cityB,[0,{"data":"#, &channel("cityA")).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn noise_after_channel_event_is_malformed() {
        let body = r#"42/cityA,[0,{"data":{"v1":{}}}]junk"#;
        let err = decode_event(body, &channel("cityA")).unwrap_err();
        assert!(matches!(err, PollingError::MalformedFrame(_)));
    }

    #[test]
    fn connect_error_is_rejection() {
        let body = r#"44/a,{"message":"Invalid namespace"}"#;
        let err = decode_event(body, &channel("a")).unwrap_err();
        assert!(matches!(err, PollingError::NamespaceRejected { .. }));
        assert!(err.to_string().contains("Invalid namespace"));
    }
}
