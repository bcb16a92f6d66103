//! Line-Oriented Device Link
//!
//! ## Wire Format
//!
//! Inbound, one reading per line:
//!
//! ```text
//! DATA:<temperature>,<humidity>,<light>\n
//! ```
//!
//! Outbound, one JSON object per line:
//!
//! ```text
//! {"switch":true}\n
//! ```
//!
//! ## Skip-Don't-Fail Parsing
//!
//! The device interleaves debug chatter with data frames, so any line that
//! does not start with the `DATA:` marker - or whose fields don't parse as
//! floats - is skipped silently. Skipped lines must not advance the forecast
//! loop's counter or touch its buffer, which is why [`DeviceLink::read_frame`]
//! distinguishes "skipped" (`Ok(None)`) from a transport error (`Err`).
//!
//! ## Shared Writer
//!
//! The reader belongs to the foreground loop; the writer is also needed by
//! the RPC handler running on the MQTT event thread. [`DeviceLink::writer`]
//! hands out a cloneable [`CommandWriter`] backed by a mutex so the two
//! contexts cannot interleave partial lines on the wire.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::{Arc, Mutex};
#[cfg(feature = "serial")]
use std::time::Duration;

use log::{debug, trace};
use serde_json::Value;
use thiserror::Error;

use aircast_core::Sample;

/// Marker prefix of an inbound data frame
pub const FRAME_PREFIX: &str = "DATA:";

/// Errors raised by the device link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Underlying transport failed (includes read timeouts)
    #[error("device link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the link (zero-byte read)
    #[error("device link closed by peer")]
    Disconnected,

    /// Outbound command could not be encoded
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One parsed sensor frame, field order as sent by the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Temperature in degrees Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
    /// Ambient light level
    pub light: f32,
}

impl From<SensorFrame> for Sample {
    fn from(frame: SensorFrame) -> Self {
        Sample::new(frame.humidity, frame.temperature)
    }
}

/// Parse one raw line into a frame
///
/// Returns `None` for anything that isn't a well-formed `DATA:` line:
/// wrong prefix, wrong field count, or unparseable floats. The caller
/// treats `None` as "skip this line".
pub fn parse_frame(line: &str) -> Option<SensorFrame> {
    let body = line.strip_prefix(FRAME_PREFIX)?;

    let mut fields = body.split(',');
    let temperature = fields.next()?.trim().parse::<f32>().ok()?;
    let humidity = fields.next()?.trim().parse::<f32>().ok()?;
    let light = fields.next()?.trim().parse::<f32>().ok()?;
    if fields.next().is_some() {
        return None;
    }

    Some(SensorFrame {
        temperature,
        humidity,
        light,
    })
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Handle for writing commands to the device from any thread
///
/// Cloning is cheap; all clones serialize writes through one mutex so a
/// command line is never interleaved with another.
#[derive(Clone)]
pub struct CommandWriter {
    inner: SharedWriter,
}

impl CommandWriter {
    /// Forward a switch command as `{"switch": <value>}\n`
    pub fn send_switch(&self, value: &Value) -> Result<(), LinkError> {
        let line = serde_json::to_string(&serde_json::json!({ "switch": value }))?;
        let mut writer = self.inner.lock().unwrap();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        trace!("device <- {}", line);
        Ok(())
    }
}

/// The point-to-point device link: buffered line reader plus shared writer
pub struct DeviceLink {
    reader: BufReader<Box<dyn Read + Send>>,
    writer: SharedWriter,
}

impl DeviceLink {
    /// Build a link over any byte transport (tests, TCP bridges, PTYs)
    pub fn from_parts(
        reader: impl Read + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            reader: BufReader::new(Box::new(reader)),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Open a serial port at the given path and baud rate
    ///
    /// The read timeout bounds how long one loop iteration can block on a
    /// silent device; a timeout surfaces as a `LinkError::Io` the caller
    /// logs and skips.
    #[cfg(feature = "serial")]
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, LinkError> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| LinkError::Io(e.into()))?;
        let writer = port
            .try_clone()
            .map_err(|e| LinkError::Io(e.into()))?;

        Ok(Self {
            reader: BufReader::new(Box::new(port)),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        })
    }

    /// Clone out the command writer for the RPC handler
    pub fn writer(&self) -> CommandWriter {
        CommandWriter {
            inner: Arc::clone(&self.writer),
        }
    }

    /// Read the next line and parse it
    ///
    /// - `Ok(Some(frame))`: a valid data frame arrived
    /// - `Ok(None)`: a line arrived but wasn't a frame; skip it
    /// - `Err(_)`: transport error or the peer closed the link
    pub fn read_frame(&mut self) -> Result<Option<SensorFrame>, LinkError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(LinkError::Disconnected);
        }

        let line = line.trim_end_matches(['\r', '\n']);
        match parse_frame(line) {
            Some(frame) => Ok(Some(frame)),
            None => {
                debug!("skipping non-frame line: {:?}", line);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Write sink the tests can inspect after the writer is boxed away
    #[derive(Clone, Default)]
    struct SharedVec(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedVec {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parses_well_formed_frame() {
        let frame = parse_frame("DATA:23.5,43.0,312.0").unwrap();
        assert_eq!(frame.temperature, 23.5);
        assert_eq!(frame.humidity, 43.0);
        assert_eq!(frame.light, 312.0);
    }

    #[test]
    fn frame_field_order_is_temperature_humidity_light() {
        let sample: Sample = parse_frame("DATA:20.0,40.0,100.0").unwrap().into();
        assert_eq!(sample, Sample::new(40.0, 20.0));
    }

    #[test]
    fn rejects_noise_and_malformed_frames() {
        assert_eq!(parse_frame("NOISE"), None);
        assert_eq!(parse_frame(""), None);
        assert_eq!(parse_frame("DATA:1.0,2.0"), None);
        assert_eq!(parse_frame("DATA:1.0,2.0,3.0,4.0"), None);
        assert_eq!(parse_frame("DATA:warm,2.0,3.0"), None);
        assert_eq!(parse_frame("data:1.0,2.0,3.0"), None);
    }

    #[test]
    fn tolerates_spaces_after_commas() {
        assert!(parse_frame("DATA: 23.5, 43.0, 312.0").is_some());
    }

    #[test]
    fn read_frame_skips_noise_lines() {
        let input = Cursor::new(b"boot ok\nDATA:23.0,43.0,300.0\nNOISE\n".to_vec());
        let mut link = DeviceLink::from_parts(input, SharedVec::default());

        assert!(link.read_frame().unwrap().is_none());
        let frame = link.read_frame().unwrap().unwrap();
        assert_eq!(frame.humidity, 43.0);
        assert!(link.read_frame().unwrap().is_none());
        assert!(matches!(link.read_frame(), Err(LinkError::Disconnected)));
    }

    #[test]
    fn read_frame_handles_crlf() {
        let input = Cursor::new(b"DATA:23.0,43.0,300.0\r\n".to_vec());
        let mut link = DeviceLink::from_parts(input, SharedVec::default());
        assert!(link.read_frame().unwrap().is_some());
    }

    #[test]
    fn switch_command_wire_format() {
        let sink = SharedVec::default();
        let link = DeviceLink::from_parts(Cursor::new(Vec::new()), sink.clone());

        link.writer()
            .send_switch(&serde_json::Value::Bool(true))
            .unwrap();

        let written = sink.0.lock().unwrap().clone();
        assert_eq!(written, b"{\"switch\":true}\n");
    }
}
