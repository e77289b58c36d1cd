//! Decoding of messages coming from a live sequencer input.
//!
//! The native binding hands over one framed message (status byte included) or
//! one system exclusive payload per received event. Nothing here polls or
//! blocks; every call decodes what it is given and returns.

use log::trace;

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::message::{system_message_len, ChannelEvent, Event, EventKind, EventType, SysexEvent};
use crate::running_status::RunningStatus;

/// Outcome of decoding one live buffer.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Decoded {
    Message(Event),
    /// System common or realtime message. Not an error, callers skip these.
    NotChannelMessage { status: u8 },
}

impl Decoded {
    pub fn into_event(self) -> Option<Event> {
        match self {
            Decoded::Message(event) => Some(event),
            Decoded::NotChannelMessage { .. } => None,
        }
    }
}

/// One event as retrieved from the native sequencer.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum NativeEvent<'a> {
    /// Bytes written by the native MIDI decoder; empty when it reported the
    /// event is not a MIDI message.
    Midi(&'a [u8]),
    /// External data of a system exclusive event.
    Sysex(&'a [u8]),
    ClientExit,
}

/// What a subscriber of the live input gets notified of.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Received {
    Event(Event),
    Exclusive(Event),
    Closed,
    Skipped,
}

/// `data_offset` is where `data` starts in the caller's buffer.
fn decode_channel(status: u8, data: &[u8], data_offset: usize) -> Result<Event, DecodeError> {
    let event_type = EventType::from_status_code(status)
        .map(|(event_type, _)| event_type)
        .filter(EventType::is_channel_voice)
        .ok_or(DecodeError::UnknownEventType { status, offset: 0 })?;
    let expected = event_type.data_len().unwrap_or(0);
    if data.len() != expected {
        return Err(DecodeError::TruncatedMessage { status, expected: expected + 1, actual: data.len() + 1 });
    }
    if let Some(i) = data.iter().position(|&b| b & 0x80 != 0) {
        return Err(DecodeError::UnknownEventType { status: data[i], offset: data_offset + i });
    }
    Ok(Event::new(
        0,
        0,
        EventKind::Channel(ChannelEvent {
            status: event_type,
            channel: status & 0x0f,
            data1: data[0],
            data2: data.get(1).copied().unwrap_or(0),
        }),
    ))
}

/// Decodes one framed live message.
///
/// The resulting event has a zero delta time and tick, the caller stamps it.
pub fn decode_message(buffer: &[u8], config: &DecoderConfig) -> Result<Decoded, DecodeError> {
    let (&status, data) = buffer
        .split_first()
        .ok_or(DecodeError::TruncatedMessage { status: 0, expected: 1, actual: 0 })?;
    if status == 0xF0 || status == 0xF7 {
        return Ok(Decoded::Message(decode_sysex(buffer)));
    }
    if buffer.len() > config.live_message_limit {
        return Err(DecodeError::TruncatedMessage {
            status,
            expected: config.live_message_limit,
            actual: buffer.len(),
        });
    }

    match status {
        0x00..=0x7F => Err(DecodeError::UnknownEventType { status, offset: 0 }),
        0x80..=0xEF => decode_channel(status, data, 1).map(Decoded::Message),
        _ => {
            trace!("skipping system message {status:#04x}");
            Ok(Decoded::NotChannelMessage { status })
        }
    }
}

/// Builds a system exclusive event from a raw payload.
///
/// A leading 0xF0 or 0xF7 picks the variant and is dropped, as is one
/// trailing 0xF7. A payload without a status byte is taken as 0xF0.
pub fn decode_sysex(buffer: &[u8]) -> Event {
    let (status, body) = match buffer.split_first() {
        Some((0xF7, rest)) => (EventType::SystemExclusiveF7, rest),
        Some((0xF0, rest)) => (EventType::SystemExclusiveF0, rest),
        _ => (EventType::SystemExclusiveF0, buffer),
    };
    let payload = match body.split_last() {
        Some((0xF7, rest)) => rest,
        _ => body,
    };
    Event::new(0, 0, EventKind::SystemExclusive(SysexEvent { status, payload: payload.to_vec() }))
}

/// Maps one native sequencer event to a notification.
pub fn receive(native: NativeEvent<'_>, config: &DecoderConfig) -> Result<Received, DecodeError> {
    match native {
        NativeEvent::ClientExit => Ok(Received::Closed),
        NativeEvent::Sysex(data) => Ok(Received::Exclusive(decode_sysex(data))),
        NativeEvent::Midi([]) => Ok(Received::Skipped),
        NativeEvent::Midi(data) => Ok(match decode_message(data, config)? {
            Decoded::Message(event) if event.as_sysex().is_some() => Received::Exclusive(event),
            Decoded::Message(event) => Received::Event(event),
            Decoded::NotChannelMessage { .. } => Received::Skipped,
        }),
    }
}

/// Decoder for a raw live byte stream that may use running status.
///
/// Owns its running status; use one per input stream, from one thread at a time.
#[derive(Clone, Debug, Default)]
pub struct MessageStream {
    running_status: RunningStatus,
    config: DecoderConfig,
}

impl MessageStream {
    pub fn new(config: DecoderConfig) -> MessageStream {
        MessageStream { running_status: RunningStatus::new(), config }
    }

    pub fn running_status(&self) -> &RunningStatus {
        &self.running_status
    }

    pub fn reset(&mut self) {
        self.running_status.reset();
    }

    /// Decodes one message, whose status byte may be omitted under running status.
    pub fn decode(&mut self, buffer: &[u8]) -> Result<Decoded, DecodeError> {
        self.decode_at(buffer, 0)
    }

    fn decode_at(&mut self, buffer: &[u8], offset: usize) -> Result<Decoded, DecodeError> {
        let first = *buffer
            .first()
            .ok_or(DecodeError::TruncatedMessage { status: 0, expected: 1, actual: 0 })?;
        match first {
            // realtime bytes leave running status alone
            0xF8..=0xFF => Ok(Decoded::NotChannelMessage { status: first }),
            0xF7 if buffer.len() == 1 => {
                self.running_status.cancel();
                Ok(Decoded::NotChannelMessage { status: first })
            }
            0xF0..=0xF7 => {
                self.running_status.cancel();
                decode_message(buffer, &self.config)
            }
            0x80..=0xEF => {
                let mut next = self.running_status;
                next.resolve(first, offset)?;
                let decoded = decode_message(buffer, &self.config)?;
                self.running_status = next;
                Ok(decoded)
            }
            _ => {
                let effective = self.running_status.resolve(first, offset)?;
                decode_channel(effective.status, buffer, offset).map(Decoded::Message)
            }
        }
    }

    /// Length of the message starting at `offset`, status byte included.
    fn message_len(&self, bytes: &[u8], offset: usize) -> Result<usize, DecodeError> {
        let status = bytes[offset];
        match status {
            0xF0 => bytes[offset + 1..]
                .iter()
                .position(|&b| b == 0xF7)
                .map(|end| end + 2)
                .ok_or(DecodeError::MalformedSysex { offset }),
            0xF1..=0xFF => Ok(system_message_len(status).unwrap_or(1)),
            0x80..=0xEF => EventType::from_status_code(status)
                .and_then(|(event_type, _)| event_type.data_len())
                .map(|len| len + 1)
                .ok_or(DecodeError::UnknownEventType { status, offset }),
            _ => {
                let mut lookahead = self.running_status;
                let effective = lookahead.resolve(status, offset)?;
                effective
                    .event_type
                    .data_len()
                    .ok_or(DecodeError::UnknownEventType { status, offset })
            }
        }
    }

    /// Splits a contiguous byte run into messages and decodes them.
    ///
    /// Only channel voice and system exclusive events are returned.
    pub fn decode_all(&mut self, bytes: &[u8]) -> Result<Vec<Event>, DecodeError> {
        let mut events = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            let len = self.message_len(bytes, offset)?;
            let message = bytes.get(offset..offset + len).ok_or(DecodeError::TruncatedMessage {
                status: bytes[offset],
                expected: len,
                actual: bytes.len() - offset,
            })?;
            match self.decode_at(message, offset)? {
                Decoded::Message(event) => events.push(event),
                Decoded::NotChannelMessage { status } => trace!("skipping system message {status:#04x} at {offset}"),
            }
            offset += len;
        }

        Ok(events)
    }
}
