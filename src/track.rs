use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{DecoderConfig, SysexFraming};
use crate::error::{DecodeError, TrackError};
use crate::io::ByteReader;
use crate::message::{ChannelEvent, Event, EventKind, EventType, MetaEvent, SysexEvent};
use crate::running_status::RunningStatus;

/// Events of one track chunk, in file order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    number: usize,
    events: Vec<Event>,
}

/// Lazily decodes the events of a track region.
///
/// Each item is one event; the first error ends the iteration.
#[derive(Clone, Debug)]
pub struct EventReader<'a> {
    reader: ByteReader<'a>,
    running_status: RunningStatus,
    tick: u64,
    sysex_framing: SysexFraming,
    failed: bool,
}

impl<'a> EventReader<'a> {
    pub fn new(data: &'a [u8], config: &DecoderConfig) -> EventReader<'a> {
        EventReader {
            reader: ByteReader::new(data),
            running_status: RunningStatus::new(),
            tick: 0,
            sysex_framing: config.sysex_framing,
            failed: false,
        }
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Checks that the events consumed the region exactly.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.reader.position() == self.reader.end() {
            Ok(())
        } else {
            Err(DecodeError::TrackLengthMismatch { declared: self.reader.end(), consumed: self.reader.position() })
        }
    }

    fn read_event(&mut self) -> Result<Event, DecodeError> {
        let delta_time = self.reader.read_variable_length()?;
        self.tick += u64::from(delta_time);

        let offset = self.reader.position();
        let status = self.running_status.resolve(self.reader.peek_u8()?, offset)?;
        if status.explicit {
            self.reader.read_u8()?;
        }

        let kind = match status.event_type {
            EventType::SystemExclusiveF0 | EventType::SystemExclusiveF7 => {
                EventKind::SystemExclusive(self.read_sysex(status.event_type, offset)?)
            }
            EventType::MetaEvent => EventKind::Meta(self.read_meta()?),
            event_type => {
                let len = event_type
                    .data_len()
                    .ok_or(DecodeError::UnknownEventType { status: status.status, offset })?;
                let data_offset = self.reader.position();
                let data = self.reader.read_bytes(len)?;
                if let Some(i) = data.iter().position(|&b| b & 0x80 != 0) {
                    return Err(DecodeError::UnknownEventType { status: data[i], offset: data_offset + i });
                }
                EventKind::Channel(ChannelEvent {
                    status: event_type,
                    channel: status.channel,
                    data1: data[0],
                    data2: data.get(1).copied().unwrap_or(0),
                })
            }
        };

        Ok(Event::new(delta_time, self.tick, kind))
    }

    fn read_sysex(&mut self, status: EventType, offset: usize) -> Result<SysexEvent, DecodeError> {
        let payload = match self.sysex_framing {
            SysexFraming::Terminated => self.reader.read_until_terminator(offset)?,
            SysexFraming::LengthPrefixed => {
                let len = self.reader.read_variable_length()? as usize;
                let payload = self.reader.read_bytes(len)?;
                match payload.split_last() {
                    Some((0xF7, rest)) if status == EventType::SystemExclusiveF0 => rest,
                    _ => payload,
                }
            }
        };
        Ok(SysexEvent { status, payload: payload.to_vec() })
    }

    fn read_meta(&mut self) -> Result<MetaEvent, DecodeError> {
        let meta_type = self.reader.read_u8()?;
        let len = self.reader.read_variable_length()? as usize;
        let data = self.reader.read_bytes(len)?;
        Ok(MetaEvent { meta_type, data: data.to_vec() })
    }
}

impl Iterator for EventReader<'_> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_at_end() {
            return None;
        }
        let event = self.read_event();
        self.failed = event.is_err();
        Some(event)
    }
}

impl Track {
    /// Decodes a track whose declared length is `data.len()`.
    pub fn parse(number: usize, data: &[u8]) -> Result<Track, TrackError> {
        Self::parse_with(number, data, &DecoderConfig::default())
    }

    pub fn parse_with(number: usize, data: &[u8], config: &DecoderConfig) -> Result<Track, TrackError> {
        let mut reader = EventReader::new(data, config);
        let result = reader
            .by_ref()
            .collect::<Result<Vec<_>, _>>()
            .and_then(|events| reader.finish().map(|()| events));

        match result {
            Ok(events) => {
                let track = Track { number, events };
                debug!("track {number}: {} events over {} bytes, ends at tick {}", track.len(), data.len(), track.end_tick());
                Ok(track)
            }
            Err(source) => {
                debug!("track {number} rejected: {source}");
                Err(TrackError { number, source })
            }
        }
    }

    /// Decodes a track from its length field onwards.
    ///
    /// `chunk` starts with the big-endian 32-bit data length. Anything past
    /// the declared data is left alone.
    pub fn from_chunk(number: usize, chunk: &[u8], config: &DecoderConfig) -> Result<Track, TrackError> {
        let fail = |source| TrackError { number, source };
        let (length, data) = chunk
            .split_first_chunk::<4>()
            .ok_or(fail(DecodeError::MalformedLength { offset: 0 }))?;
        let declared = u32::from_be_bytes(*length) as usize;
        let data = data
            .get(..declared)
            .ok_or(fail(DecodeError::TrackLengthMismatch { declared, consumed: data.len() }))?;
        Self::parse_with(number, data, config)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn end_tick(&self) -> u64 {
        self.events.last().map_or(0, |event| event.tick)
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
