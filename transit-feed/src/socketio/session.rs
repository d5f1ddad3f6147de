//! Session negotiation on the long-polling transport.
//!
//! Reading a channel takes four steps: a handshake GET that yields a session
//! id, a POST that joins the channel, a short settle delay while the upstream
//! buffers its first push, and a GET that collects the buffered frames.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use crate::domain::ChannelName;
use crate::http::HttpTransport;

use super::error::PollingError;
use super::packet::{Packet, packets};

/// Contents of the engine open packet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    pub ping_interval: Option<u64>,
}

/// Parse a handshake response body.
///
/// The body is normally an open packet (`0{"sid":...}`), possibly followed
/// by more packets. A bare JSON object is accepted as well. The first open
/// packet with a session id wins; whatever follows it is not read.
pub fn parse_handshake(body: &str) -> Result<Handshake, PollingError> {
    let trimmed = body.trim_start();

    let handshake = if trimmed.starts_with('{') {
        serde_json::Deserializer::from_str(trimmed)
            .into_iter::<Handshake>()
            .next()
            .ok_or_else(|| PollingError::Handshake("empty handshake body".to_string()))?
            .map_err(|e| PollingError::Handshake(e.to_string()))?
    } else {
        first_open_packet(body)?
    };

    if handshake.sid.is_empty() {
        return Err(PollingError::Handshake("empty session id".to_string()));
    }
    Ok(handshake)
}

fn first_open_packet(body: &str) -> Result<Handshake, PollingError> {
    let mut rejected = None;

    for packet in packets(body) {
        match packet {
            Ok(Packet::Open(json)) => match serde_json::from_str::<Handshake>(json) {
                Ok(handshake) => return Ok(handshake),
                Err(e) => rejected = Some(e.to_string()),
            },
            Ok(_) => {}
            Err(e) => {
                let message = match rejected {
                    Some(rejected) => rejected,
                    None => format!("unreadable handshake body: {e}"),
                };
                return Err(PollingError::Handshake(message));
            }
        }
    }

    Err(PollingError::Handshake(
        rejected.unwrap_or_else(|| "no open packet in response".to_string()),
    ))
}

/// An open polling session.
#[derive(Debug, Clone)]
pub struct Session {
    sid: String,
    url: Url,
}

impl Session {
    /// Perform the handshake against `endpoint`.
    pub async fn open<T: HttpTransport>(
        transport: &T,
        endpoint: &Url,
        headers: &HeaderMap,
    ) -> Result<Self, PollingError> {
        let body = transport.get(endpoint, headers).await?;
        let handshake = parse_handshake(&body)?;

        debug!(
            sid = %handshake.sid,
            ping_interval = ?handshake.ping_interval,
            "Opened polling session"
        );

        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("sid", &handshake.sid);

        Ok(Self {
            sid: handshake.sid,
            url,
        })
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Session URL: the endpoint with `&sid=<sid>` appended.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Join `channel` by posting the control frame `40/<channel>,{}`.
    pub async fn join<T: HttpTransport>(
        &self,
        transport: &T,
        channel: &ChannelName,
        headers: &HeaderMap,
    ) -> Result<(), PollingError> {
        let frame = format!("40/{channel},{{}}");
        transport.post(&self.url, headers, frame).await?;
        Ok(())
    }

    /// Collect whatever the upstream has buffered for this session.
    pub async fn poll<T: HttpTransport>(
        &self,
        transport: &T,
        headers: &HeaderMap,
    ) -> Result<String, PollingError> {
        let body = transport.get(&self.url, headers).await?;
        debug!(sid = %self.sid, bytes = body.len(), "Polled session");
        Ok(body)
    }
}

/// Run the full handshake, join, settle, poll sequence and return the raw
/// poll body.
pub async fn read_channel<T: HttpTransport>(
    transport: &T,
    endpoint: &Url,
    channel: &ChannelName,
    headers: &HeaderMap,
    settle_delay: Duration,
) -> Result<String, PollingError> {
    let session = Session::open(transport, endpoint, headers).await?;
    session.join(transport, channel, headers).await?;

    if !settle_delay.is_zero() {
        tokio::time::sleep(settle_delay).await;
    }

    session.poll(transport, headers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::{MockResponse, MockTransport};

    const ENDPOINT: &str = "https://example.test/socket.io/?EIO=4&transport=polling";
    const SESSION: &str = "https://example.test/socket.io/?EIO=4&transport=polling&sid=abc123";

    fn endpoint() -> Url {
        Url::parse(ENDPOINT).unwrap()
    }

    #[test]
    fn handshake_with_open_prefix() {
        let hs = parse_handshake(
            r#"0{"sid":"abc123","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();

        assert_eq!(hs.sid, "abc123");
        assert_eq!(hs.ping_interval, Some(25000));
    }

    #[test]
    fn handshake_ignores_unreadable_tail() {
        let hs = parse_handshake(r#"0{"sid":"abc123","pingInterval":25000}xyz"#).unwrap();
        assert_eq!(hs.sid, "abc123");

        let hs = parse_handshake("0{\"sid\":\"abc123\"}\u{1e}<html>").unwrap();
        assert_eq!(hs.sid, "abc123");
    }

    #[test]
    fn handshake_skips_open_packet_without_sid() {
        let hs = parse_handshake(r#"0{"pingInterval":25000}0{"sid":"abc123"}"#).unwrap();
        assert_eq!(hs.sid, "abc123");
    }

    #[test]
    fn unreadable_body_before_open_packet_fails() {
        let err = parse_handshake(r#"xyz0{"sid":"abc123"}"#).unwrap_err();
        assert!(err.to_string().contains("unreadable handshake body"));
    }

    #[test]
    fn handshake_with_length_prefix() {
        let hs = parse_handshake(r#"17:0{"sid":"abc123"}"#).unwrap();
        assert_eq!(hs.sid, "abc123");
    }

    #[test]
    fn handshake_bare_json() {
        let hs = parse_handshake(r#"{"sid":"abc123","pingInterval":25000}"#).unwrap();
        assert_eq!(hs.sid, "abc123");
    }

    #[test]
    fn handshake_without_sid_fails() {
        let err = parse_handshake(r#"0{"pingInterval":25000}"#).unwrap_err();
        assert!(matches!(err, PollingError::Handshake(_)));

        let err = parse_handshake("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, PollingError::Handshake(_)));

        let err = parse_handshake("").unwrap_err();
        assert!(matches!(err, PollingError::Handshake(_)));
    }

    #[test]
    fn handshake_with_empty_sid_fails() {
        let err = parse_handshake(r#"0{"sid":""}"#).unwrap_err();
        assert!(matches!(err, PollingError::Handshake(_)));
    }

    #[tokio::test]
    async fn full_sequence() {
        let transport = MockTransport::new();
        transport.on_get(ENDPOINT, MockResponse::Body(r#"0{"sid":"abc123"}"#.into()));
        transport.on_post(SESSION, MockResponse::Body("ok".into()));
        transport.on_get(SESSION, MockResponse::Body(r#"42/cityA,[0,{"data":{}}]"#.into()));

        let channel = ChannelName::parse("cityA").unwrap();
        let body = read_channel(
            &transport,
            &endpoint(),
            &channel,
            &HeaderMap::new(),
            Duration::ZERO,
        )
        .await
        .unwrap();

        assert_eq!(body, r#"42/cityA,[0,{"data":{}}]"#);

        let requests = transport.requests();
        let methods: Vec<_> = requests.iter().map(|r| (r.method, r.url.as_str())).collect();
        assert_eq!(
            methods,
            vec![("GET", ENDPOINT), ("POST", SESSION), ("GET", SESSION)]
        );
        assert_eq!(requests[1].body.as_deref(), Some("40/cityA,{}"));
    }

    #[tokio::test]
    async fn handshake_failure_stops_sequence() {
        let transport = MockTransport::new();
        transport.on_get(ENDPOINT, MockResponse::Body("0{}".into()));

        let channel = ChannelName::parse("cityA").unwrap();
        let err = read_channel(
            &transport,
            &endpoint(),
            &channel,
            &HeaderMap::new(),
            Duration::ZERO,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollingError::Handshake(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn join_failure_is_transport_error() {
        let transport = MockTransport::new();
        transport.on_get(ENDPOINT, MockResponse::Body(r#"0{"sid":"abc123"}"#.into()));
        transport.on_post(SESSION, MockResponse::Status(400));

        let channel = ChannelName::parse("cityA").unwrap();
        let err = read_channel(
            &transport,
            &endpoint(),
            &channel,
            &HeaderMap::new(),
            Duration::ZERO,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollingError::Transport(_)));
    }

    #[tokio::test]
    async fn session_url_escapes_sid() {
        let transport = MockTransport::new();
        transport.on_get(ENDPOINT, MockResponse::Body(r#"0{"sid":"a b&c"}"#.into()));

        let session = Session::open(&transport, &endpoint(), &HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(session.sid(), "a b&c");
        assert!(session.url().as_str().ends_with("&sid=a+b%26c"));
    }
}
