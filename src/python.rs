use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::DecoderConfig;
use crate::live::{self, Decoded};
use crate::message::{Event as MidiEvent, EventKind};
use crate::track::Track as MidiTrack;

#[pyclass]
#[derive(Clone, Debug)]
pub struct Event {
    #[pyo3(get)]
    pub delta_time: u32,
    #[pyo3(get)]
    pub tick: u64,
    #[pyo3(get)]
    pub event_type: String,
    #[pyo3(get)]
    pub channel: Option<u8>,
    #[pyo3(get)]
    pub data1: Option<u8>,
    #[pyo3(get)]
    pub data2: Option<u8>,
    #[pyo3(get)]
    pub meta_type: Option<u8>,
    #[pyo3(get)]
    pub payload: Vec<u8>,
}

impl From<&MidiEvent> for Event {
    fn from(event: &MidiEvent) -> Self {
        let mut py_event = Event {
            delta_time: event.delta_time,
            tick: event.tick,
            event_type: event.event_type().to_string(),
            channel: None,
            data1: None,
            data2: None,
            meta_type: None,
            payload: Vec::new(),
        };
        match &event.kind {
            EventKind::Channel(channel) => {
                py_event.channel = Some(channel.channel);
                py_event.data1 = Some(channel.data1);
                py_event.data2 = Some(channel.data2);
            }
            EventKind::SystemExclusive(sysex) => py_event.payload = sysex.payload.clone(),
            EventKind::Meta(meta) => {
                py_event.meta_type = Some(meta.meta_type);
                py_event.payload = meta.data.clone();
            }
        }
        py_event
    }
}

#[pymethods]
impl Event {
    fn __repr__(&self) -> String {
        format!("{:?}", self)
    }
}

#[pyclass]
#[derive(Clone, Debug)]
pub struct Track {
    #[pyo3(get)]
    pub number: usize,
    #[pyo3(get)]
    pub events: Vec<Event>,
}

impl From<&MidiTrack> for Track {
    fn from(track: &MidiTrack) -> Self {
        Track { number: track.number(), events: track.events().iter().map(Event::from).collect() }
    }
}

#[pymethods]
impl Track {
    fn __len__(&self) -> usize {
        self.events.len()
    }
}

/// Decodes the data region of a track chunk.
#[pyfunction]
pub fn parse_track(number: usize, data: &[u8]) -> PyResult<Track> {
    MidiTrack::parse(number, data)
        .map(|track| Track::from(&track))
        .map_err(|e| PyValueError::new_err(format!("{e}: {}", e.source)))
}

/// Decodes a track chunk starting at its 4-byte length field.
#[pyfunction]
pub fn parse_chunk(number: usize, chunk: &[u8]) -> PyResult<Track> {
    MidiTrack::from_chunk(number, chunk, &DecoderConfig::default())
        .map(|track| Track::from(&track))
        .map_err(|e| PyValueError::new_err(format!("{e}: {}", e.source)))
}

/// Decodes one live message; `None` for system messages.
#[pyfunction]
pub fn decode_message(data: &[u8]) -> PyResult<Option<Event>> {
    match live::decode_message(data, &DecoderConfig::default()) {
        Ok(Decoded::Message(event)) => Ok(Some(Event::from(&event))),
        Ok(Decoded::NotChannelMessage { .. }) => Ok(None),
        Err(e) => Err(PyValueError::new_err(e.to_string())),
    }
}

#[pyfunction]
pub fn decode_sysex(data: &[u8]) -> Event {
    Event::from(&live::decode_sysex(data))
}
