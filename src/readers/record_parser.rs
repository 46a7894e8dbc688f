use crate::error::{ProcessingError, Result};
use crate::models::{FixedPoint, Measurements, StationMap};
use crate::utils::constants::{
    DECIMAL_POINT, FIELD_SEPARATOR, FIXED_POINT_SCALE, NEGATIVE_SIGN, RECORD_TERMINATOR,
};

/// Which part of the measurement is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberPart {
    /// After a minus sign, before any digit
    Leading,
    Integer,
    /// After the decimal point, before the fractional digit
    Fraction,
    /// The fractional digit has been read; only the terminator may follow
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Station,
    Measurement,
    Positive(NumberPart),
    Negative(NumberPart),
}

/// Resumable byte-level parser for `<station>;<value>\n` records.
///
/// All parsing state lives in the parser, so input can be fed in slices
/// that end anywhere, including in the middle of a station name or a
/// number. Completed records are folded straight into a [`StationMap`].
#[derive(Debug, Clone)]
pub struct RecordParser {
    station: Vec<u8>,
    measurement: i64,
    state: ParserState,
    offset: u64,
    record_start: u64,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a parser whose error offsets are relative to `offset`, the
    /// file position of the first byte it will be fed.
    pub fn starting_at(offset: u64) -> Self {
        Self {
            station: Vec::with_capacity(128),
            measurement: 0,
            state: ParserState::Station,
            offset,
            record_start: offset,
        }
    }

    /// Absolute offset of the next byte to be fed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_between_records(&self) -> bool {
        self.state == ParserState::Station && self.station.is_empty()
    }

    pub fn feed(&mut self, bytes: &[u8], stations: &mut StationMap) -> Result<()> {
        let mut position = 0;

        while position < bytes.len() {
            if self.state == ParserState::Station {
                // Copy the run of name bytes in one go.
                let rest = &bytes[position..];
                match rest
                    .iter()
                    .position(|&b| b == FIELD_SEPARATOR || b == RECORD_TERMINATOR)
                {
                    Some(index) => {
                        self.station.extend_from_slice(&rest[..index]);
                        self.offset += index as u64;
                        position += index;
                    }
                    None => {
                        self.station.extend_from_slice(rest);
                        self.offset += rest.len() as u64;
                        return Ok(());
                    }
                }
            }

            self.step(bytes[position], stations)?;
            self.offset += 1;
            position += 1;
        }

        Ok(())
    }

    /// Check that the input ended on a record boundary.
    pub fn finish(&self) -> Result<()> {
        if self.is_between_records() {
            Ok(())
        } else {
            Err(ProcessingError::malformed(
                self.record_start,
                "unterminated record at end of input",
            ))
        }
    }

    fn step(&mut self, byte: u8, stations: &mut StationMap) -> Result<()> {
        match self.state {
            ParserState::Station => match byte {
                FIELD_SEPARATOR if self.station.is_empty() => Err(self.error("empty station name")),
                FIELD_SEPARATOR => {
                    self.state = ParserState::Measurement;
                    Ok(())
                }
                RECORD_TERMINATOR => Err(self.error("missing ';' separator")),
                _ => {
                    self.station.push(byte);
                    Ok(())
                }
            },
            ParserState::Measurement => match byte {
                NEGATIVE_SIGN => {
                    self.measurement = 0;
                    self.state = ParserState::Negative(NumberPart::Leading);
                    Ok(())
                }
                b'0'..=b'9' => {
                    self.measurement = (byte - b'0') as i64;
                    self.state = ParserState::Positive(NumberPart::Integer);
                    Ok(())
                }
                RECORD_TERMINATOR => Err(self.error("missing measurement")),
                _ => Err(self.unexpected(byte)),
            },
            ParserState::Positive(part) => self.step_number(byte, part, false, stations),
            ParserState::Negative(part) => self.step_number(byte, part, true, stations),
        }
    }

    fn step_number(
        &mut self,
        byte: u8,
        part: NumberPart,
        negative: bool,
        stations: &mut StationMap,
    ) -> Result<()> {
        let next = match (part, byte) {
            (NumberPart::Complete, b'0'..=b'9') => {
                return Err(self.error("more than one fractional digit"))
            }
            (NumberPart::Fraction, b'0'..=b'9') => {
                self.push_digit(byte, negative)?;
                NumberPart::Complete
            }
            (_, b'0'..=b'9') => {
                self.push_digit(byte, negative)?;
                NumberPart::Integer
            }
            (NumberPart::Integer, DECIMAL_POINT) => NumberPart::Fraction,
            (NumberPart::Leading, DECIMAL_POINT) => {
                return Err(self.error("missing integer digits"))
            }
            (_, DECIMAL_POINT) => return Err(self.error("multiple decimal points")),
            (NumberPart::Complete, RECORD_TERMINATOR) => {
                self.finish_record(stations);
                return Ok(());
            }
            (_, RECORD_TERMINATOR) => return Err(self.error("missing fractional digit")),
            _ => return Err(self.unexpected(byte)),
        };

        self.state = if negative {
            ParserState::Negative(next)
        } else {
            ParserState::Positive(next)
        };
        Ok(())
    }

    fn push_digit(&mut self, byte: u8, negative: bool) -> Result<()> {
        let digit = (byte - b'0') as i64;
        let shifted = self.measurement.checked_mul(FIXED_POINT_SCALE);
        let value = if negative {
            shifted.and_then(|v| v.checked_sub(digit))
        } else {
            shifted.and_then(|v| v.checked_add(digit))
        };

        match value {
            Some(value) => {
                self.measurement = value;
                Ok(())
            }
            None => Err(self.error("measurement out of range")),
        }
    }

    fn finish_record(&mut self, stations: &mut StationMap) {
        let value = FixedPoint::from_tenths(self.measurement);

        match stations.get_mut(self.station.as_slice()) {
            Some(measurements) => measurements.record(value),
            None => {
                stations.insert(self.station.as_slice().into(), Measurements::from_value(value));
            }
        }

        self.station.clear();
        self.state = ParserState::Station;
        self.record_start = self.offset + 1;
    }

    fn error(&self, reason: &str) -> ProcessingError {
        ProcessingError::malformed(
            self.offset,
            format!(
                "{} (station \"{}\")",
                reason,
                String::from_utf8_lossy(&self.station)
            ),
        )
    }

    fn unexpected(&self, byte: u8) -> ProcessingError {
        self.error(&format!("unexpected byte '{}'", byte.escape_ascii()))
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}
