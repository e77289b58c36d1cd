mod io;
mod message;
mod util;
mod running_status;
mod track;
mod error;
pub mod config;
pub mod live;
pub mod logging;
#[cfg(feature = "python")]
mod python;

pub use crate::config::{DecoderConfig, SysexFraming};
pub use crate::error::{ConfigError, DecodeError, TrackError};
pub use crate::io::ByteReader;
pub use crate::live::{decode_message, decode_sysex, receive, Decoded, MessageStream, NativeEvent, Received};
pub use crate::message::{
    category_of, system_message_len, ChannelEvent, Event, EventKind, EventType, MessageCategory, MetaEvent,
    MetaStatus, PayloadLength, SysexEvent,
};
pub use crate::running_status::{EffectiveStatus, RunningStatus};
pub use crate::track::{EventReader, Track};
pub use crate::util::{read_variable_length, tempo2qpm};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn midiutils(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    let _ = logging::initialize_logging();
    m.add_class::<python::Track>()?;
    m.add_class::<python::Event>()?;
    m.add_function(wrap_pyfunction!(python::parse_track, m)?)?;
    m.add_function(wrap_pyfunction!(python::parse_chunk, m)?)?;
    m.add_function(wrap_pyfunction!(python::decode_message, m)?)?;
    m.add_function(wrap_pyfunction!(python::decode_sysex, m)?)?;
    Ok(())
}
