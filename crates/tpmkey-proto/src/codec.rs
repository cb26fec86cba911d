//! Line framing: one compact JSON record per `\n`-terminated line.

use crate::{Record, RecordError};

/// Maximum size of one encoded line, delimiter included.
///
/// A weights-mode `tele` for a large machine is the biggest record; 64 KiB
/// leaves room for grids of several thousand weights.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Encodes a record as a single line including the trailing `\n`.
pub fn encode_line(record: &Record) -> Result<Vec<u8>, RecordError> {
    let mut line = serde_json::to_vec(record).map_err(RecordError::Encode)?;
    line.push(b'\n');

    if line.len() > MAX_FRAME_LEN {
        return Err(RecordError::FrameTooLarge { size: line.len(), max: MAX_FRAME_LEN });
    }

    Ok(line)
}

/// Decodes one line. A trailing `\n` (and `\r`) is accepted but not required.
pub fn decode_line(line: &[u8]) -> Result<Record, RecordError> {
    if line.len() > MAX_FRAME_LEN {
        return Err(RecordError::FrameTooLarge { size: line.len(), max: MAX_FRAME_LEN });
    }

    let body = line.strip_suffix(b"\n").unwrap_or(line);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    serde_json::from_slice(body).map_err(|e| RecordError::Decode { reason: e.to_string() })
}
