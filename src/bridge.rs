use core::fmt::Write;

use heapless::{String, Vec};

use crate::{
    codec::Scanner,
    gateway::SerialDriver,
    message::{CartDirection, CartMode, EscReport, Message, ObdReport, TscReport, VdcCommand},
    registry::NodeId,
    INPUT_CAPACITY, JSON_LINE_CAPACITY, OUTPUT_CAPACITY,
};

/// One newline-terminated JSON record bound for the host.
pub type JsonLine = String<JSON_LINE_CAPACITY>;

/// Errors raised while turning a serial line back into a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineParseError {
    #[error("Line is not a well-formed single-object JSON record")]
    Malformed,
    #[error("Role name is not a registered node")]
    UnknownRole,
    #[error("A field value lies outside its domain")]
    FieldRange,
    #[error("Line exceeded the input buffer and was discarded")]
    Overflow,
    #[error("Record carries a key no schema declares")]
    UnknownKey,
    #[error("The same key appeared twice in one record")]
    DuplicateField,
    #[error("A field the role's schema requires is missing")]
    MissingField,
}

/// Renders a message as a single-line JSON object. Key order is fixed (role
/// first, then the record's fields in declaration order) so the output of
/// [`from_json`] round-trips exactly.
pub fn to_json(message: &Message) -> JsonLine {
    let mut line = JsonLine::new();
    let role = message.node().role();

    match message {
        Message::Obd(report) => write!(
            line,
            r#"{{"role":"{}","mode":{},"rpm":{}}}"#,
            role,
            u8::from(report.mode),
            report.rpm,
        ),
        Message::EscA(report) | Message::EscB(report) => write!(
            line,
            r#"{{"role":"{}","mode":{},"throttle":{}}}"#,
            role,
            u8::from(report.mode),
            report.throttle,
        ),
        Message::Tsc(report) => write!(
            line,
            r#"{{"role":"{}","mode":{},"throttle":{},"steering":{}}}"#,
            role,
            u8::from(report.mode),
            report.throttle,
            report.steering,
        ),
        Message::Vdc(command) => write!(
            line,
            r#"{{"role":"{}","mode":{},"direction":{}}}"#,
            role,
            u8::from(command.mode),
            u8::from(command.direction),
        ),
    }
    .expect("Longest emitted line is far below the line capacity");

    line.push('\n')
        .expect("Longest emitted line is far below the line capacity");

    line
}

/// Field values collected from one record before the role schema is applied.
#[derive(Default)]
struct Fields {
    mode: Option<u32>,
    rpm: Option<u32>,
    throttle: Option<u32>,
    steering: Option<u32>,
    direction: Option<u32>,
}

impl Fields {
    fn set(&mut self, key: &[u8], value: u32) -> Result<(), LineParseError> {
        let slot = match key {
            b"mode" => &mut self.mode,
            b"rpm" => &mut self.rpm,
            b"throttle" => &mut self.throttle,
            b"steering" => &mut self.steering,
            b"direction" => &mut self.direction,
            _ => return Err(LineParseError::UnknownKey),
        };

        if slot.replace(value).is_some() {
            return Err(LineParseError::DuplicateField);
        }

        Ok(())
    }
}

fn byte_field(value: Option<u32>) -> Result<u8, LineParseError> {
    let value = value.ok_or(LineParseError::MissingField)?;

    u8::try_from(value).map_err(|_| LineParseError::FieldRange)
}

fn word_field(value: Option<u32>) -> Result<u16, LineParseError> {
    let value = value.ok_or(LineParseError::MissingField)?;

    u16::try_from(value).map_err(|_| LineParseError::FieldRange)
}

fn mode_field(value: Option<u32>) -> Result<CartMode, LineParseError> {
    CartMode::try_from(byte_field(value)?).map_err(|_| LineParseError::FieldRange)
}

fn direction_field(value: Option<u32>) -> Result<CartDirection, LineParseError> {
    CartDirection::try_from(byte_field(value)?).map_err(|_| LineParseError::FieldRange)
}

/// Parses one JSON line into a message. Interior whitespace and field order
/// are tolerated; the `role` key must come first so the schema is known
/// before the remaining fields are interpreted.
pub fn from_json(line: &[u8]) -> Result<Message, LineParseError> {
    let mut scanner = Scanner::new(line);

    scanner.expect(b'{')?;

    if scanner.quoted()? != b"role" {
        return Err(LineParseError::Malformed);
    }
    scanner.expect(b':')?;

    let role = scanner.quoted()?;
    let node = NodeId::from_role(role).ok_or(LineParseError::UnknownRole)?;

    let mut fields = Fields::default();

    loop {
        scanner.skip_whitespace();

        match scanner.advance() {
            Some(b',') => {
                let key = scanner.quoted()?;
                scanner.expect(b':')?;
                let value = scanner.number()?;

                fields.set(key, value)?;
            }
            Some(b'}') => break,
            _ => return Err(LineParseError::Malformed),
        }
    }

    if !scanner.at_end() {
        return Err(LineParseError::Malformed);
    }

    Ok(match node {
        NodeId::Obd => Message::Obd(ObdReport {
            mode: mode_field(fields.mode)?,
            rpm: word_field(fields.rpm)?,
        }),
        NodeId::EscA => Message::EscA(EscReport {
            mode: mode_field(fields.mode)?,
            throttle: byte_field(fields.throttle)?,
        }),
        NodeId::EscB => Message::EscB(EscReport {
            mode: mode_field(fields.mode)?,
            throttle: byte_field(fields.throttle)?,
        }),
        NodeId::Tsc => Message::Tsc(TscReport {
            mode: mode_field(fields.mode)?,
            throttle: byte_field(fields.throttle)?,
            steering: byte_field(fields.steering)?,
        }),
        NodeId::Vdc => Message::Vdc(VdcCommand {
            mode: mode_field(fields.mode)?,
            direction: direction_field(fields.direction)?,
        }),
    })
}

/// Accumulates serial bytes until a full line is available.
///
/// A line that outgrows the buffer is reported once as
/// [`LineParseError::Overflow`]; the buffer is reset and the remainder of the
/// oversized line is discarded up to the next terminator, so the stream
/// resynchronizes on its own.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    buf: Vec<u8, INPUT_CAPACITY>,
    discarding: bool,
}

impl LineAccumulator {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// Feeds one byte, returning a parsed message once a complete line has
    /// been consumed. Never blocks; blank lines are skipped.
    pub fn push(&mut self, byte: u8) -> Result<Option<Message>, LineParseError> {
        if self.discarding {
            if byte == b'\n' {
                self.discarding = false;
            }
            return Ok(None);
        }

        if byte == b'\n' {
            if self.buf.is_empty() {
                return Ok(None);
            }

            let parsed = from_json(&self.buf).map(Some);
            self.buf.clear();
            return parsed;
        }

        if self.buf.push(byte).is_err() {
            self.buf.clear();
            self.discarding = true;
            return Err(LineParseError::Overflow);
        }

        Ok(None)
    }

    /// Bytes of the line currently being accumulated.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Stages outbound serial bytes so the driver never sees a write larger than
/// its transmit window.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    buf: Vec<u8, OUTPUT_CAPACITY>,
}

impl OutputBuffer {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Writes a full line through the driver, flushing whenever the staging
    /// buffer fills and once more at the end. Nothing is left resident, so
    /// the host never observes a partially delivered line across polls.
    pub fn write_line<S: SerialDriver>(
        &mut self,
        serial: &mut S,
        line: &[u8],
    ) -> Result<(), S::Error> {
        for &byte in line {
            if self.buf.push(byte).is_err() {
                serial.write_bytes(&self.buf)?;
                self.buf.clear();
                self.buf.push(byte).unwrap();
            }
        }

        if !self.buf.is_empty() {
            serial.write_bytes(&self.buf)?;
            self.buf.clear();
        }

        Ok(())
    }
}
