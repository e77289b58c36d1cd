use log::trace;

use crate::error::DecodeError;
use crate::message::EventType;

/// The status a message is decoded with.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct EffectiveStatus {
    pub status: u8,
    pub event_type: EventType,
    /// Low nibble of the status, meaningful for channel voice types only.
    pub channel: u8,
    /// Whether the status byte was present and consumed.
    pub explicit: bool,
}

/// Last status byte and channel of one stream.
///
/// A fresh tracker belongs to every track or live stream and is never shared.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunningStatus {
    last_status: Option<u8>,
    last_channel: Option<u8>,
}

impl RunningStatus {
    pub fn new() -> RunningStatus {
        RunningStatus::default()
    }

    pub fn last_status(&self) -> Option<u8> {
        self.last_status
    }

    pub fn last_channel(&self) -> Option<u8> {
        self.last_channel
    }

    pub fn reset(&mut self) {
        *self = RunningStatus::default();
    }

    /// Resolves the status for the message whose first byte is `byte`.
    ///
    /// A byte with bit 7 set becomes the new status. A data byte reuses the
    /// last status, which must be a channel voice status. `offset` is only
    /// used for error reporting.
    pub fn resolve(&mut self, byte: u8, offset: usize) -> Result<EffectiveStatus, DecodeError> {
        if byte & 0x80 == 0x80 {
            let (event_type, _) =
                EventType::from_status_code(byte).ok_or(DecodeError::UnknownEventType { status: byte, offset })?;
            self.last_status = Some(byte);
            if event_type.is_channel_voice() {
                self.last_channel = Some(byte & 0x0f);
            }
            return Ok(EffectiveStatus { status: byte, event_type, channel: byte & 0x0f, explicit: true });
        }

        match self.last_status.and_then(|status| EventType::from_status_code(status).map(|(t, _)| (status, t))) {
            Some((status, event_type)) if event_type.is_channel_voice() => {
                trace!("running status {status:#04x} applied at offset {offset}");
                Ok(EffectiveStatus {
                    status,
                    event_type,
                    channel: self.last_channel.unwrap_or(status & 0x0f),
                    explicit: false,
                })
            }
            _ => Err(DecodeError::UnknownEventType { status: byte, offset }),
        }
    }

    /// Drops the active status, as system common messages do on a live stream.
    pub fn cancel(&mut self) {
        self.last_status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_status_is_consumed() {
        let mut running = RunningStatus::new();
        let status = running.resolve(0x93, 0).unwrap();
        assert_eq!(status.event_type, EventType::NoteOn);
        assert_eq!(status.channel, 3);
        assert!(status.explicit);
        assert_eq!(running.last_status(), Some(0x93));
        assert_eq!(running.last_channel(), Some(3));
    }

    #[test]
    fn test_data_byte_reuses_last_status() {
        let mut running = RunningStatus::new();
        running.resolve(0xB2, 0).unwrap();
        let status = running.resolve(0x07, 3).unwrap();
        assert_eq!(status.event_type, EventType::ControlChange);
        assert_eq!(status.channel, 2);
        assert!(!status.explicit);
    }

    #[test]
    fn test_data_byte_without_status() {
        let mut running = RunningStatus::new();
        assert_eq!(running.resolve(0x40, 5), Err(DecodeError::UnknownEventType { status: 0x40, offset: 5 }));
    }

    #[test]
    fn test_running_status_does_not_cover_meta_or_sysex() {
        let mut running = RunningStatus::new();
        running.resolve(0x90, 0).unwrap();
        running.resolve(0xFF, 3).unwrap();
        assert_eq!(running.last_channel(), Some(0));
        assert!(running.resolve(0x2F, 4).is_err());

        running.resolve(0xF0, 6).unwrap();
        assert!(running.resolve(0x43, 7).is_err());
    }

    #[test]
    fn test_undecodable_status_is_rejected() {
        let mut running = RunningStatus::new();
        running.resolve(0x80, 0).unwrap();
        assert_eq!(running.resolve(0xF4, 2), Err(DecodeError::UnknownEventType { status: 0xF4, offset: 2 }));
        assert_eq!(running.last_status(), Some(0x80));
    }

    #[test]
    fn test_reset_and_cancel() {
        let mut running = RunningStatus::new();
        running.resolve(0xE1, 0).unwrap();
        running.cancel();
        assert_eq!(running.last_status(), None);
        assert_eq!(running.last_channel(), Some(1));
        running.reset();
        assert_eq!(running, RunningStatus::new());
    }
}
