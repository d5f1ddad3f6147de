//! Network identifiers and static network descriptors.

use std::borrow::Borrow;
use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Error returned when a network descriptor fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidNetworkConfig {
    #[error("invalid network id {value:?}: {reason}")]
    Id { value: String, reason: &'static str },

    #[error("invalid channel name {value:?}: {reason}")]
    Channel { value: String, reason: &'static str },

    #[error("invalid {field} URL {value:?}: {message}")]
    Url {
        field: &'static str,
        value: String,
        message: String,
    },
}

/// Identifier of a configured transit network (e.g. `zielonagora`).
///
/// Always non-empty and free of whitespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(String);

impl NetworkId {
    pub fn parse(s: &str) -> Result<Self, InvalidNetworkConfig> {
        let reason = if s.is_empty() {
            Some("must not be empty")
        } else if s.chars().any(char::is_whitespace) {
            Some("must not contain whitespace")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidNetworkConfig::Id {
                value: s.to_string(),
                reason,
            }),
            None => Ok(Self(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NetworkId {
    type Error = InvalidNetworkConfig;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.0
    }
}

/// Lets maps keyed by `NetworkId` be queried with a plain `&str`.
impl Borrow<str> for NetworkId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", self.0)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the logical channel (socket namespace) a network publishes on.
///
/// The name is spliced into control frames such as `40/<channel>,{}`, so it
/// may not contain the frame delimiters `/` and `,`, nor the record separator.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn parse(s: &str) -> Result<Self, InvalidNetworkConfig> {
        let reason = if s.is_empty() {
            Some("must not be empty")
        } else if s.contains(['/', ',']) {
            Some("must not contain '/' or ','")
        } else if s.chars().any(|c| c.is_control() || c.is_whitespace()) {
            Some("must not contain whitespace or control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidNetworkConfig::Channel {
                value: s.to_string(),
                reason,
            }),
            None => Ok(Self(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace path as it appears in socket packets (`/<channel>`).
    pub fn namespace(&self) -> String {
        format!("/{}", self.0)
    }
}

impl fmt::Debug for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelName({})", self.0)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network descriptor as written in the networks file.
#[derive(Debug, Clone, Deserialize)]
struct RawNetworkConfig {
    id: String,
    stops_url: String,
    channel: Option<String>,
    referer: String,
    #[serde(default)]
    polling_url: Option<String>,
    #[serde(default)]
    cookie: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    origin: Option<String>,
}

/// Static, validated descriptor of one transit network.
///
/// Supplied at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawNetworkConfig")]
pub struct NetworkConfig {
    pub id: NetworkId,
    /// REST endpoint returning the stop list.
    pub stops_url: Url,
    /// Channel joined on the long-polling transport.
    pub channel: ChannelName,
    /// Referer sent with every upstream request for this network.
    pub referer: String,
    /// Overrides the client-wide polling endpoint.
    pub polling_url: Option<Url>,
    /// Overrides the client-wide session cookie.
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub origin: Option<String>,
}

impl NetworkConfig {
    /// Build a descriptor whose channel name equals its id.
    pub fn new(
        id: &str,
        stops_url: &str,
        referer: impl Into<String>,
    ) -> Result<Self, InvalidNetworkConfig> {
        Ok(Self {
            id: NetworkId::parse(id)?,
            stops_url: parse_url("stops", stops_url)?,
            channel: ChannelName::parse(id)?,
            referer: referer.into(),
            polling_url: None,
            cookie: None,
            user_agent: None,
            origin: None,
        })
    }

    pub fn with_channel(mut self, channel: ChannelName) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_polling_url(mut self, url: Url) -> Self {
        self.polling_url = Some(url);
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

impl TryFrom<RawNetworkConfig> for NetworkConfig {
    type Error = InvalidNetworkConfig;

    fn try_from(raw: RawNetworkConfig) -> Result<Self, Self::Error> {
        let id = NetworkId::parse(&raw.id)?;
        let channel = ChannelName::parse(raw.channel.as_deref().unwrap_or(&raw.id))?;
        let stops_url = parse_url("stops", &raw.stops_url)?;
        let polling_url = raw
            .polling_url
            .as_deref()
            .map(|u| parse_url("polling", u))
            .transpose()?;

        Ok(Self {
            id,
            stops_url,
            channel,
            referer: raw.referer,
            polling_url,
            cookie: raw.cookie.filter(|c| !c.is_empty()),
            user_agent: raw.user_agent,
            origin: raw.origin,
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, InvalidNetworkConfig> {
    Url::parse(value).map_err(|e| InvalidNetworkConfig::Url {
        field,
        value: value.to_string(),
        message: e.to_string(),
    })
}
