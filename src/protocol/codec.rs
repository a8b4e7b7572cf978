//! Record payload decoding and encoding
//!
//! All multi-byte fields are big-endian. Error frames carry three
//! length-prefixed strings; each consumes its two-byte size plus exactly that
//! many bytes, which is what positions the next field.

use crate::types::{ErrorRecord, Frame, FrameKind, LogRecord, PrintRecord};
use crate::{Result, RioLogError};

/// Fixed-size prefix of an error payload before its strings
const ERROR_FIXED_LEN: usize = 4 + 2 + 2 + 4 + 1;

/// Fixed-size prefix of a print payload before its line
const PRINT_FIXED_LEN: usize = 4 + 2;

/// Bounds-checked big-endian cursor over a payload
struct PayloadReader<'a> {
    data: &'a [u8],
    offset: usize,
    context: &'static str,
}

impl<'a> PayloadReader<'a> {
    fn new(data: &'a [u8], context: &'static str) -> Self {
        Self { data, offset: 0, context }
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self.offset + len;
        if end > self.data.len() {
            return Err(RioLogError::decode_error(
                self.context,
                format!(
                    "{} needs {} bytes at offset {}, payload has {}",
                    field,
                    len,
                    self.offset,
                    self.data.len()
                ),
            ));
        }
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u16(&mut self, field: &str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array(field)?))
    }

    fn i32(&mut self, field: &str) -> Result<i32> {
        Ok(i32::from_be_bytes(self.array(field)?))
    }

    fn f32(&mut self, field: &str) -> Result<f32> {
        Ok(f32::from_be_bytes(self.array(field)?))
    }

    /// `u16` byte count followed by that many UTF-8 bytes
    fn sized_string(&mut self, field: &str) -> Result<String> {
        let len = self.u16(field)? as usize;
        let bytes = self.take(len, field)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Everything left in the payload as UTF-8
    fn rest_string(&mut self) -> String {
        let bytes = &self.data[self.offset..];
        self.offset = self.data.len();
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Decode a frame payload of a known kind into a record
pub fn decode(kind: FrameKind, payload: &[u8]) -> Result<LogRecord> {
    match kind {
        FrameKind::Print => decode_print(payload).map(LogRecord::Print),
        FrameKind::ErrorOrWarning => decode_error(payload).map(LogRecord::Error),
    }
}

/// Decode a complete frame, `Ok(None)` when its tag is not a record type
pub fn decode_frame(frame: &Frame) -> Result<Option<LogRecord>> {
    frame.kind().map(|kind| decode(kind, &frame.payload)).transpose()
}

fn decode_print(payload: &[u8]) -> Result<PrintRecord> {
    let mut reader = PayloadReader::new(payload, "print record");
    let timestamp = reader.f32("timestamp")?;
    let seq_number = reader.u16("sequence number")?;
    let line = reader.rest_string();
    Ok(PrintRecord { timestamp, seq_number, line })
}

fn decode_error(payload: &[u8]) -> Result<ErrorRecord> {
    let mut reader = PayloadReader::new(payload, "error record");
    let timestamp = reader.f32("timestamp")?;
    let seq_number = reader.u16("sequence number")?;
    let occurrence_count = reader.u16("occurrence count")?;
    let error_code = reader.i32("error code")?;
    let flags = reader.u8("flags")?;
    let details = reader.sized_string("details")?;
    let location = reader.sized_string("location")?;
    let call_stack = reader.sized_string("call stack")?;

    Ok(ErrorRecord {
        timestamp,
        seq_number,
        occurrence_count,
        error_code,
        flags,
        details,
        location,
        call_stack,
    })
}

/// Encode a record as a complete wire frame, length header included
///
/// Strings longer than a `u16` can describe, or records whose frame would
/// exceed the length header, are rejected.
pub fn encode_record(record: &LogRecord) -> Result<Vec<u8>> {
    let (kind, payload) = match record {
        LogRecord::Print(print) => {
            let mut payload = Vec::with_capacity(PRINT_FIXED_LEN + print.line.len());
            payload.extend_from_slice(&print.timestamp.to_be_bytes());
            payload.extend_from_slice(&print.seq_number.to_be_bytes());
            payload.extend_from_slice(print.line.as_bytes());
            (FrameKind::Print, payload)
        }
        LogRecord::Error(error) => {
            let mut payload = Vec::with_capacity(
                ERROR_FIXED_LEN
                    + 6
                    + error.details.len()
                    + error.location.len()
                    + error.call_stack.len(),
            );
            payload.extend_from_slice(&error.timestamp.to_be_bytes());
            payload.extend_from_slice(&error.seq_number.to_be_bytes());
            payload.extend_from_slice(&error.occurrence_count.to_be_bytes());
            payload.extend_from_slice(&error.error_code.to_be_bytes());
            payload.push(error.flags);
            for (field, value) in [
                ("details", &error.details),
                ("location", &error.location),
                ("call stack", &error.call_stack),
            ] {
                let len = u16::try_from(value.len()).map_err(|_| {
                    RioLogError::decode_error(
                        "error record",
                        format!("{} is {} bytes, limit is {}", field, value.len(), u16::MAX),
                    )
                })?;
                payload.extend_from_slice(&len.to_be_bytes());
                payload.extend_from_slice(value.as_bytes());
            }
            (FrameKind::ErrorOrWarning, payload)
        }
    };

    encode_frame(&Frame::new(kind.tag(), payload))
}

/// Encode a raw frame with its length header
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>> {
    let len = u16::try_from(frame.wire_len()).map_err(|_| {
        RioLogError::decode_error(
            "frame",
            format!("body is {} bytes, limit is {}", frame.wire_len(), u16::MAX),
        )
    })?;

    let mut bytes = Vec::with_capacity(2 + frame.wire_len());
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.push(frame.tag);
    bytes.extend_from_slice(&frame.payload);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FrameReassembler;
    use crate::types::RecordKind;

    fn sample_error(flags: u8) -> ErrorRecord {
        ErrorRecord {
            timestamp: 42.5,
            seq_number: 3,
            occurrence_count: 2,
            error_code: 2345,
            flags,
            details: "Hello".to_string(),
            location: "World".to_string(),
            call_stack: "Test12ab".to_string(),
        }
    }

    #[test]
    fn decodes_literal_error_frame() {
        #[rustfmt::skip]
        let bytes: &[u8] = &[
            0x00, 0x16,             // length = 22
            0x0B,                   // tag = error/warning
            0x42, 0x28, 0x00, 0x00, // timestamp = 42.0
            0x00, 0x03,             // seq = 3
            0x00, 0x02,             // occurrences = 2
            0x3A, 0xDE, 0x68, 0xB1, // error code = 987654321
            0x01,                   // flags = error
            0x00, 0x02, b'H', b'i', // details
            0x00, 0x00,             // location
            0x00, 0x00,             // call stack
        ];

        let frames = FrameReassembler::new().feed(bytes);
        assert_eq!(frames.len(), 1);

        let record = decode_frame(&frames[0]).unwrap().unwrap();
        let LogRecord::Error(error) = &record else { panic!("expected error record") };
        assert_eq!(error.timestamp, 42.0);
        assert_eq!(error.seq_number, 3);
        assert_eq!(error.occurrence_count, 2);
        assert_eq!(error.error_code, 987_654_321);
        assert_eq!(error.flags, 1);
        assert_eq!(error.details, "Hi");
        assert_eq!(error.location, "");
        assert_eq!(error.call_stack, "");
        assert_eq!(record.kind(), RecordKind::Error);
    }

    #[test]
    fn negative_error_code_round_trips() {
        let mut record = sample_error(0);
        record.error_code = -1029;
        let bytes = encode_record(&record.clone().into()).unwrap();

        let frames = FrameReassembler::new().feed(&bytes);
        assert_eq!(decode_frame(&frames[0]).unwrap(), Some(LogRecord::Error(record)));
    }

    #[test]
    fn decodes_print_line_to_end_of_payload() {
        let mut payload = 1.25f32.to_be_bytes().to_vec();
        payload.extend_from_slice(&65535u16.to_be_bytes());
        payload.extend_from_slice("Robot program starting ✓".as_bytes());

        let record = decode(FrameKind::Print, &payload).unwrap();
        assert_eq!(
            record,
            LogRecord::Print(PrintRecord {
                timestamp: 1.25,
                seq_number: 65535,
                line: "Robot program starting ✓".to_string(),
            })
        );
    }

    #[test]
    fn forty_byte_frame_split_at_awkward_offsets() {
        let record: LogRecord = sample_error(1).into();
        let bytes = encode_record(&record).unwrap();
        assert_eq!(bytes.len(), 40);

        let whole = FrameReassembler::new().feed(&bytes);

        let mut reassembler = FrameReassembler::new();
        let mut split = Vec::new();
        let offsets = [0, 1, 2, 10, 39, 40];
        for window in offsets.windows(2) {
            split.extend(reassembler.feed(&bytes[window[0]..window[1]]));
        }

        assert_eq!(split.len(), 1);
        assert_eq!(split, whole);
        assert_eq!(decode_frame(&split[0]).unwrap(), Some(record));
    }

    #[test]
    fn sized_strings_consume_exact_lengths() {
        let mut record = sample_error(0);
        record.details = "ä".repeat(3);
        record.location = String::new();
        record.call_stack = "at frc.robot.Robot.teleopPeriodic(Robot.java:42)".to_string();

        let bytes = encode_record(&record.clone().into()).unwrap();
        let decoded = decode(FrameKind::ErrorOrWarning, &bytes[3..]).unwrap();
        assert_eq!(decoded, LogRecord::Error(record));
    }

    #[test]
    fn truncated_payloads_fail() {
        let bytes = encode_record(&sample_error(1).into()).unwrap();
        let payload = &bytes[3..];

        for cut in [0, 5, 12, 14, payload.len() - 1] {
            let err = decode(FrameKind::ErrorOrWarning, &payload[..cut]).unwrap_err();
            assert!(matches!(err, RioLogError::Decode { .. }), "cut at {}", cut);
        }

        assert!(decode(FrameKind::Print, &[0x42, 0x28, 0x00]).is_err());
    }

    #[test]
    fn string_length_past_payload_fails() {
        let mut payload = vec![0u8; ERROR_FIXED_LEN];
        payload.extend_from_slice(&10u16.to_be_bytes());
        payload.extend_from_slice(b"short");

        let err = decode(FrameKind::ErrorOrWarning, &payload).unwrap_err();
        assert!(err.to_string().contains("details"));
    }

    #[test]
    fn unknown_tags_are_not_records() {
        let frame = Frame::new(99, vec![1, 2, 3]);
        assert_eq!(decode_frame(&frame).unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut payload = 0f32.to_be_bytes().to_vec();
        payload.extend_from_slice(&1u16.to_be_bytes());
        payload.extend_from_slice(&[b'o', b'k', 0xFF]);

        let LogRecord::Print(print) = decode(FrameKind::Print, &payload).unwrap() else {
            panic!("expected print record");
        };
        assert_eq!(print.line, "ok\u{FFFD}");
    }
}
