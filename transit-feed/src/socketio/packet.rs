//! Tokenizer for long-polling response bodies.
//!
//! A polling body carries one or more engine packets. Packets are either
//! separated by the record separator `\x1e`, prefixed with their length as
//! `<len>:` (older protocol revision), or simply concatenated. In the last
//! case the JSON value a packet carries is what delimits it, so the scanner
//! measures JSON extents instead of searching for markers.
//!
//! Engine packet types: `0` open, `1` close, `2` ping, `3` pong, `4`
//! message, `5` upgrade, `6` noop. A message packet wraps a socket packet:
//! a type digit, an optional `/<namespace>,`, an optional ack id and an
//! optional JSON payload, e.g. `42/wroclaw,["vehicles",{...}]`.

use serde::de::IgnoredAny;

/// Separator between packets in a protocol v4 polling payload.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Errors raised while tokenizing a polling body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("unknown packet type {found:?} at byte {offset}")]
    UnknownPacketType { found: char, offset: usize },

    #[error("packet at byte {offset} is truncated")]
    Truncated { offset: usize },

    #[error("invalid JSON at byte {offset}: {message}")]
    Json { offset: usize, message: String },

    #[error("invalid number at byte {offset}")]
    InvalidNumber { offset: usize },

    #[error("unexpected data at byte {offset}")]
    TrailingData { offset: usize },
}

/// Socket packet type carried inside an engine message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl SocketKind {
    fn from_digit(c: char) -> Option<Self> {
        Some(match c {
            '0' => SocketKind::Connect,
            '1' => SocketKind::Disconnect,
            '2' => SocketKind::Event,
            '3' => SocketKind::Ack,
            '4' => SocketKind::ConnectError,
            '5' => SocketKind::BinaryEvent,
            '6' => SocketKind::BinaryAck,
            _ => return None,
        })
    }

    fn is_binary(self) -> bool {
        matches!(self, SocketKind::BinaryEvent | SocketKind::BinaryAck)
    }
}

/// A socket packet: `<type>[/<namespace>,][<ack id>][<json>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPacket<'a> {
    pub kind: SocketKind,
    /// Namespace including its leading slash; `/` when absent.
    pub namespace: &'a str,
    pub ack_id: Option<u64>,
    /// Raw JSON payload, empty when the packet carries none.
    pub payload: &'a str,
}

/// An engine packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet<'a> {
    /// Session handshake; carries a JSON object with the session id.
    Open(&'a str),
    Close,
    Ping(&'a str),
    Pong(&'a str),
    Message(SocketPacket<'a>),
    Upgrade,
    Noop,
}

/// Split a polling body into packets.
///
/// Fails on the first segment that is not a well-formed packet; nothing in
/// the body is matched by substring search.
pub fn parse_payload(body: &str) -> Result<Vec<Packet<'_>>, FrameError> {
    packets(body).collect()
}

/// Read a polling body one packet at a time.
///
/// Unlike [`parse_payload`], callers see every packet that precedes a
/// tokenizing error and decide for themselves what the error means.
pub fn packets(body: &str) -> Packets<'_> {
    Packets {
        scanner: Scanner::new(body, 0),
        failed: false,
    }
}

/// Iterator over the packets of a polling body. Stops after the first error.
pub struct Packets<'a> {
    scanner: Scanner<'a>,
    failed: bool,
}

impl<'a> Packets<'a> {
    /// Namespace of the socket packet that was being read when tokenizing
    /// failed, if the scanner got as far as its namespace.
    pub fn failed_namespace(&self) -> Option<&'a str> {
        if self.failed {
            self.scanner.namespace
        } else {
            None
        }
    }
}

impl<'a> Iterator for Packets<'a> {
    type Item = Result<Packet<'a>, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.scanner.next_packet() {
            Ok(packet) => packet.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    /// Offset of `input` within the whole body, for error reporting.
    base: usize,
    /// Namespace of the socket packet currently being read.
    namespace: Option<&'a str>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, base: usize) -> Self {
        Self {
            input,
            pos: 0,
            base,
            namespace: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_separators(&mut self) {
        let rest = self.rest();
        let trimmed =
            rest.trim_start_matches(|c: char| c == RECORD_SEPARATOR || c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    fn take_digits(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        self.pos += len;
        &rest[..len]
    }

    /// Consume exactly one JSON value and return its text.
    fn take_json(&mut self) -> Result<&'a str, FrameError> {
        let offset = self.offset();
        let rest = self.rest();
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<IgnoredAny>();

        match stream.next() {
            Some(Ok(_)) => {
                let len = stream.byte_offset();
                self.pos += len;
                Ok(&rest[..len])
            }
            Some(Err(e)) => Err(FrameError::Json {
                offset,
                message: e.to_string(),
            }),
            None => Err(FrameError::Truncated { offset }),
        }
    }

    /// Consume the free-text data of a ping/pong packet.
    ///
    /// The text runs to the next separator. A digit directly after the type
    /// is the start of the next concatenated packet, not text.
    fn take_text(&mut self) -> &'a str {
        let rest = self.rest();
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return "";
        }
        let end = rest.find(RECORD_SEPARATOR).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Consume a `<len>:` prefix if present.
    fn length_prefix(&mut self) -> Result<Option<usize>, FrameError> {
        let offset = self.offset();
        let rest = self.rest();
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();

        if digits == 0 || rest.as_bytes().get(digits) != Some(&b':') {
            return Ok(None);
        }

        let len = rest[..digits]
            .parse::<usize>()
            .map_err(|_| FrameError::InvalidNumber { offset })?;
        self.pos += digits + 1;
        Ok(Some(len))
    }

    fn next_packet(&mut self) -> Result<Option<Packet<'a>>, FrameError> {
        self.namespace = None;
        self.skip_separators();
        if self.rest().is_empty() {
            return Ok(None);
        }

        let start = self.offset();
        let Some(len) = self.length_prefix()? else {
            return self.packet().map(Some);
        };

        // The prefix counts characters, not bytes.
        let rest = self.rest();
        let byte_len = match rest.char_indices().nth(len) {
            Some((idx, _)) => idx,
            None if rest.chars().count() == len => rest.len(),
            None => return Err(FrameError::Truncated { offset: start }),
        };

        let mut framed = Scanner::new(&rest[..byte_len], self.offset());
        self.pos += byte_len;

        let packet = framed.packet();
        self.namespace = framed.namespace;
        let packet = packet?;
        if !framed.rest().is_empty() {
            return Err(FrameError::TrailingData {
                offset: framed.offset(),
            });
        }
        Ok(Some(packet))
    }

    fn packet(&mut self) -> Result<Packet<'a>, FrameError> {
        let offset = self.offset();
        let kind = self.bump().ok_or(FrameError::Truncated { offset })?;

        match kind {
            '0' => Ok(Packet::Open(self.take_json()?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping(self.take_text())),
            '3' => Ok(Packet::Pong(self.take_text())),
            '4' => self.socket_packet().map(Packet::Message),
            '5' => Ok(Packet::Upgrade),
            '6' => Ok(Packet::Noop),
            found => Err(FrameError::UnknownPacketType { found, offset }),
        }
    }

    fn socket_packet(&mut self) -> Result<SocketPacket<'a>, FrameError> {
        let offset = self.offset();
        let kind = match self.bump() {
            Some(c) => SocketKind::from_digit(c)
                .ok_or(FrameError::UnknownPacketType { found: c, offset })?,
            None => return Err(FrameError::Truncated { offset }),
        };

        if kind.is_binary() {
            let attachments_at = self.offset();
            if self.take_digits().is_empty() || self.bump() != Some('-') {
                return Err(FrameError::InvalidNumber {
                    offset: attachments_at,
                });
            }
        }

        let namespace = if self.peek() == Some('/') {
            let rest = self.rest();
            let end = rest.find([',', RECORD_SEPARATOR]).unwrap_or(rest.len());
            self.pos += end;
            if self.peek() == Some(',') {
                self.pos += 1;
            }
            &rest[..end]
        } else {
            "/"
        };
        self.namespace = Some(namespace);

        let ack_at = self.offset();
        let digits = self.take_digits();
        let ack_id = if digits.is_empty() {
            None
        } else {
            Some(
                digits
                    .parse::<u64>()
                    .map_err(|_| FrameError::InvalidNumber { offset: ack_at })?,
            )
        };

        let payload = match self.peek() {
            Some('{' | '[' | '"') => self.take_json()?,
            _ => "",
        };

        Ok(SocketPacket {
            kind,
            namespace,
            ack_id,
            payload,
        })
    }
}
