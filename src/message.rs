use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::tempo2qpm;

#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum EventType {
    // Channel Voice Messages
    NoteOff = 0x80,
    NoteOn = 0x90,
    PolyphonicKeyPressure = 0xA0,
    ControlChange = 0xB0,
    ProgramChange = 0xC0,
    ChannelPressure = 0xD0,
    Pitchbend = 0xE0,

    // System Exclusive Messages
    SystemExclusiveF0 = 0xF0,
    SystemExclusiveF7 = 0xF7,

    // Meta Messages
    MetaEvent = 0xFF,

    Unknown = 0x00,
}

/// How many bytes follow a status byte.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum PayloadLength {
    Fixed(usize),
    /// Delimited by a terminator or a length prefix.
    Variable,
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum MessageCategory {
    ChannelVoice,
    SystemExclusive,
    Meta,
    SystemCommon,
    Realtime,
}

impl EventType {
    /// Classifies a status byte as found in a track chunk.
    ///
    /// Returns `None` for data bytes and for system common/realtime bytes,
    /// which cannot start an event in a file.
    pub fn from_status_code(status: u8) -> Option<(EventType, PayloadLength)> {
        match status {
            0x80..=0x8F => Some((EventType::NoteOff, PayloadLength::Fixed(2))),
            0x90..=0x9F => Some((EventType::NoteOn, PayloadLength::Fixed(2))),
            0xA0..=0xAF => Some((EventType::PolyphonicKeyPressure, PayloadLength::Fixed(2))),
            0xB0..=0xBF => Some((EventType::ControlChange, PayloadLength::Fixed(2))),
            0xC0..=0xCF => Some((EventType::ProgramChange, PayloadLength::Fixed(1))),
            0xD0..=0xDF => Some((EventType::ChannelPressure, PayloadLength::Fixed(1))),
            0xE0..=0xEF => Some((EventType::Pitchbend, PayloadLength::Fixed(2))),
            0xF0 => Some((EventType::SystemExclusiveF0, PayloadLength::Variable)),
            0xF7 => Some((EventType::SystemExclusiveF7, PayloadLength::Variable)),
            0xFF => Some((EventType::MetaEvent, PayloadLength::Variable)),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_channel_voice(&self) -> bool {
        matches!(
            self,
            EventType::NoteOff
                | EventType::NoteOn
                | EventType::PolyphonicKeyPressure
                | EventType::ControlChange
                | EventType::ProgramChange
                | EventType::ChannelPressure
                | EventType::Pitchbend
        )
    }

    /// Number of data bytes of a channel voice message, `None` for anything else.
    pub fn data_len(&self) -> Option<usize> {
        match self {
            EventType::ProgramChange | EventType::ChannelPressure => Some(1),
            t if t.is_channel_voice() => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Category of a status byte. 0xFF counts as a meta event here, the live
/// decoder treats it as a realtime reset instead.
pub fn category_of(status: u8) -> Option<MessageCategory> {
    match status {
        0x00..=0x7F => None,
        0x80..=0xEF => Some(MessageCategory::ChannelVoice),
        0xF0 | 0xF7 => Some(MessageCategory::SystemExclusive),
        0xF1..=0xF6 => Some(MessageCategory::SystemCommon),
        0xFF => Some(MessageCategory::Meta),
        0xF8..=0xFE => Some(MessageCategory::Realtime),
    }
}

/// Total length, status included, of a system common or realtime message on
/// the wire. Undefined codes are taken as status-only.
pub fn system_message_len(status: u8) -> Option<usize> {
    match status {
        0xF1 | 0xF3 => Some(2),
        0xF2 => Some(3),
        0xF4 | 0xF5 | 0xF6 => Some(1),
        0xF8..=0xFF => Some(1),
        _ => None,
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum MetaStatus {
    SequenceNumber = 0x00,
    Text = 0x01,
    CopyrightNote = 0x02,
    TrackName = 0x03,
    InstrumentName = 0x04,
    Lyric = 0x05,
    Marker = 0x06,
    CuePoint = 0x07,
    MIDIChannelPrefix = 0x20,
    EndOfTrack = 0x2F,
    SetTempo = 0x51,
    SMPTEOffset = 0x54,
    TimeSignature = 0x58,
    KeySignature = 0x59,
    SequencerSpecificMeta = 0x7F,
    Unknown,
}

impl MetaStatus {
    pub fn from_status_code(status: u8) -> MetaStatus {
        match status {
            0x00 => MetaStatus::SequenceNumber,
            0x01 => MetaStatus::Text,
            0x02 => MetaStatus::CopyrightNote,
            0x03 => MetaStatus::TrackName,
            0x04 => MetaStatus::InstrumentName,
            0x05 => MetaStatus::Lyric,
            0x06 => MetaStatus::Marker,
            0x07 => MetaStatus::CuePoint,
            0x20 => MetaStatus::MIDIChannelPrefix,
            0x2F => MetaStatus::EndOfTrack,
            0x51 => MetaStatus::SetTempo,
            0x54 => MetaStatus::SMPTEOffset,
            0x58 => MetaStatus::TimeSignature,
            0x59 => MetaStatus::KeySignature,
            0x7F => MetaStatus::SequencerSpecificMeta,
            _ => MetaStatus::Unknown,
        }
    }

    #[inline(always)]
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            MetaStatus::Text
                | MetaStatus::CopyrightNote
                | MetaStatus::TrackName
                | MetaStatus::InstrumentName
                | MetaStatus::Lyric
                | MetaStatus::Marker
                | MetaStatus::CuePoint
        )
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub status: EventType,
    pub channel: u8,
    pub data1: u8,
    /// Zero for program change and channel pressure.
    pub data2: u8,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct SysexEvent {
    /// `SystemExclusiveF0` or `SystemExclusiveF7`.
    pub status: EventType,
    /// Raw bytes without the status byte, length prefix or 0xF7 terminator.
    pub payload: Vec<u8>,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct MetaEvent {
    pub meta_type: u8,
    pub data: Vec<u8>,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub enum EventKind {
    Channel(ChannelEvent),
    SystemExclusive(SysexEvent),
    Meta(MetaEvent),
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Ticks since the previous event of the track.
    pub delta_time: u32,
    /// Absolute tick within the track. Live events carry whatever the caller assigns.
    pub tick: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(delta_time: u32, tick: u64, kind: EventKind) -> Event {
        Event { delta_time, tick, kind }
    }

    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::Channel(event) => event.status,
            EventKind::SystemExclusive(event) => event.status,
            EventKind::Meta(_) => EventType::MetaEvent,
        }
    }

    #[inline(always)]
    pub fn channel(&self) -> Option<u8> {
        self.as_channel().map(|event| event.channel)
    }

    pub fn as_channel(&self) -> Option<&ChannelEvent> {
        match &self.kind {
            EventKind::Channel(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_sysex(&self) -> Option<&SysexEvent> {
        match &self.kind {
            EventKind::SystemExclusive(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_meta(&self) -> Option<&MetaEvent> {
        match &self.kind {
            EventKind::Meta(event) => Some(event),
            _ => None,
        }
    }

    /// The same event stamped with a different absolute tick.
    #[must_use]
    pub fn at_tick(self, tick: u64) -> Event {
        Event { tick, ..self }
    }
}

impl ChannelEvent {
    #[inline(always)]
    pub fn key(&self) -> Option<u8> {
        match self.status {
            EventType::NoteOff | EventType::NoteOn | EventType::PolyphonicKeyPressure => Some(self.data1),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn velocity(&self) -> Option<u8> {
        match self.status {
            EventType::NoteOff | EventType::NoteOn => Some(self.data2),
            _ => None,
        }
    }

    /// Key pressure for polyphonic aftertouch, channel pressure otherwise.
    #[inline(always)]
    pub fn pressure(&self) -> Option<u8> {
        match self.status {
            EventType::PolyphonicKeyPressure => Some(self.data2),
            EventType::ChannelPressure => Some(self.data1),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn controller(&self) -> Option<u8> {
        match self.status {
            EventType::ControlChange => Some(self.data1),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn controller_value(&self) -> Option<u8> {
        match self.status {
            EventType::ControlChange => Some(self.data2),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn program(&self) -> Option<u8> {
        match self.status {
            EventType::ProgramChange => Some(self.data1),
            _ => None,
        }
    }

    /// 14-bit bend value, 0x2000 is centered.
    #[inline(always)]
    pub fn pitch_bend(&self) -> Option<u16> {
        match self.status {
            EventType::Pitchbend => Some(u16::from(self.data1 & 0x7f) | (u16::from(self.data2 & 0x7f) << 7)),
            _ => None,
        }
    }
}

// data2 is not shown.
impl fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} channel: {} data1: {}", self.status, self.channel, self.data1)
    }
}

const SHARP_KEYS: [&str; 8] = ["C", "G", "D", "A", "E", "B", "#F", "#C"];
const FLAT_KEYS: [&str; 8] = ["C", "F", "bB", "bE", "bA", "bD", "bG", "bC"];
const SHARP_MINOR_KEYS: [&str; 8] = ["a", "e", "b", "#f", "#c", "#g", "#d", "#a"];
const FLAT_MINOR_KEYS: [&str; 8] = ["a", "d", "g", "c", "f", "bb", "be", "ba"];

impl MetaEvent {
    #[inline(always)]
    pub fn status(&self) -> MetaStatus {
        MetaStatus::from_status_code(self.meta_type)
    }

    /// Microseconds per quarter note.
    pub fn tempo(&self) -> Option<u32> {
        match (self.status(), self.data.get(..3)) {
            (MetaStatus::SetTempo, Some(bytes)) => {
                let mut tempo = [0; 4];
                tempo[1..].copy_from_slice(bytes);
                Some(u32::from_be_bytes(tempo))
            }
            _ => None,
        }
    }

    pub fn qpm(&self) -> Option<f32> {
        self.tempo().filter(|&tempo| tempo > 0).map(tempo2qpm)
    }

    /// (numerator, denominator, clocks per click, 32nds per quarter)
    pub fn time_signature(&self) -> Option<(u8, u16, u8, u8)> {
        match (self.status(), self.data.as_slice()) {
            (MetaStatus::TimeSignature, &[nn, dd, cc, bb, ..]) if dd < 16 => Some((nn, 1 << dd, cc, bb)),
            _ => None,
        }
    }

    /// Key name, upper case for major and lower case for minor keys.
    pub fn key_signature(&self) -> Option<&'static str> {
        let (sf, mi) = match (self.status(), self.data.as_slice()) {
            (MetaStatus::KeySignature, &[sf, mi, ..]) => (sf as i8, mi),
            _ => return None,
        };
        let index = usize::from(sf.unsigned_abs());
        let table = match (sf < 0, mi) {
            (false, 0) => &SHARP_KEYS,
            (true, 0) => &FLAT_KEYS,
            (false, 1) => &SHARP_MINOR_KEYS,
            (true, 1) => &FLAT_MINOR_KEYS,
            _ => return None,
        };
        table.get(index).copied()
    }

    pub fn text(&self) -> Option<String> {
        if self.status().is_text() {
            Some(String::from_utf8_lossy(&self.data).into_owned())
        } else {
            None
        }
    }

    pub fn is_end_of_track(&self) -> bool {
        self.status() == MetaStatus::EndOfTrack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(meta_type: u8, data: &[u8]) -> MetaEvent {
        MetaEvent { meta_type, data: data.to_vec() }
    }

    #[test]
    fn test_get_event_type() {
        assert_eq!(Some((EventType::NoteOff, PayloadLength::Fixed(2))), EventType::from_status_code(0b10000000));
        assert_eq!(Some((EventType::NoteOn, PayloadLength::Fixed(2))), EventType::from_status_code(0b10010001));
        assert_eq!(Some((EventType::ProgramChange, PayloadLength::Fixed(1))), EventType::from_status_code(0xC5));
        assert_eq!(Some((EventType::ChannelPressure, PayloadLength::Fixed(1))), EventType::from_status_code(0xDF));
        assert_eq!(Some((EventType::Pitchbend, PayloadLength::Fixed(2))), EventType::from_status_code(0xE3));
        assert_eq!(Some((EventType::SystemExclusiveF0, PayloadLength::Variable)), EventType::from_status_code(0xF0));
        assert_eq!(Some((EventType::SystemExclusiveF7, PayloadLength::Variable)), EventType::from_status_code(0xF7));
        assert_eq!(Some((EventType::MetaEvent, PayloadLength::Variable)), EventType::from_status_code(0xFF));
    }

    #[test]
    fn test_undecodable_status_codes() {
        for status in (0x00..=0x7F).chain(0xF1..=0xF6).chain(0xF8..=0xFE) {
            assert_eq!(EventType::from_status_code(status), None, "{status:#04x}");
        }
    }

    #[test]
    fn test_category_of() {
        assert_eq!(category_of(0x40), None);
        assert_eq!(category_of(0xB2), Some(MessageCategory::ChannelVoice));
        assert_eq!(category_of(0xF7), Some(MessageCategory::SystemExclusive));
        assert_eq!(category_of(0xF4), Some(MessageCategory::SystemCommon));
        assert_eq!(category_of(0xF8), Some(MessageCategory::Realtime));
        assert_eq!(category_of(0xFF), Some(MessageCategory::Meta));
    }

    #[test]
    fn test_system_message_len() {
        assert_eq!(system_message_len(0xF2), Some(3));
        assert_eq!(system_message_len(0xF3), Some(2));
        assert_eq!(system_message_len(0xF6), Some(1));
        assert_eq!(system_message_len(0xFE), Some(1));
        assert_eq!(system_message_len(0xF0), None);
        assert_eq!(system_message_len(0x90), None);
    }

    #[test]
    fn test_channel_accessors() {
        let note = ChannelEvent { status: EventType::NoteOn, channel: 1, data1: 0x45, data2: 0x7f };
        assert_eq!(note.key(), Some(0x45));
        assert_eq!(note.velocity(), Some(0x7f));
        assert_eq!(note.program(), None);

        let bend = ChannelEvent { status: EventType::Pitchbend, channel: 0, data1: 0x00, data2: 0x40 };
        assert_eq!(bend.pitch_bend(), Some(0x2000));
        assert_eq!(bend.key(), None);

        let pressure = ChannelEvent { status: EventType::ChannelPressure, channel: 0, data1: 0x33, data2: 0 };
        assert_eq!(pressure.pressure(), Some(0x33));
    }

    #[test]
    fn test_channel_display() {
        let event = ChannelEvent { status: EventType::NoteOn, channel: 1, data1: 3, data2: 5 };
        let text = event.to_string();
        assert!(text.contains("NoteOn"));
        assert!(text.contains('1'));
        assert!(text.contains('3'));
        assert!(!text.contains('5'));
    }

    #[test]
    fn test_meta_tempo() {
        let tempo = meta(0x51, &[0x07, 0xA1, 0x20]);
        assert_eq!(tempo.tempo(), Some(500_000));
        assert_eq!(tempo.qpm(), Some(120.0));
        assert_eq!(meta(0x51, &[0x07]).tempo(), None);
        assert_eq!(meta(0x01, &[0x07, 0xA1, 0x20]).tempo(), None);
    }

    #[test]
    fn test_meta_signatures() {
        assert_eq!(meta(0x58, &[6, 3, 24, 8]).time_signature(), Some((6, 8, 24, 8)));
        assert_eq!(meta(0x59, &[0xFD, 0]).key_signature(), Some("bE"));
        assert_eq!(meta(0x59, &[3, 1]).key_signature(), Some("#f"));
        assert_eq!(meta(0x59, &[0, 0]).key_signature(), Some("C"));
        assert_eq!(meta(0x59, &[9, 0]).key_signature(), None);
        assert_eq!(meta(0x59, &[0, 2]).key_signature(), None);
    }

    #[test]
    fn test_meta_text() {
        let name = meta(0x03, b"Piano");
        assert_eq!(name.status(), MetaStatus::TrackName);
        assert_eq!(name.text().as_deref(), Some("Piano"));
        assert_eq!(meta(0x2F, &[]).text(), None);
        assert!(meta(0x2F, &[]).is_end_of_track());
        assert_eq!(meta(0x60, &[]).status(), MetaStatus::Unknown);
    }
}
