//! STOMP 1.2 text codec.
//!
//! `encode` always writes the real `content-length` of the body, dropping any
//! stale value carried by the frame. Decoding is incremental so the same
//! code serves whole WebSocket messages and a streamed broker connection.

use super::frame::headers;
use super::{FrameError, StompCommand, StompFrame};

/// Largest frame accepted by a decoder unless configured otherwise.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024;

/// Serializes a frame to its wire form, including the terminating NULL.
pub fn encode(frame: &StompFrame) -> Vec<u8> {
    let escape = frame.command.escapes_headers();
    let mut out = Vec::with_capacity(frame.body.len() + 128);

    out.extend_from_slice(frame.command.as_str().as_bytes());
    out.push(b'\n');

    for (name, value) in &frame.headers {
        if name == headers::CONTENT_LENGTH {
            continue;
        }
        write_header(&mut out, name, value, escape);
    }
    if !frame.body.is_empty() {
        write_header(
            &mut out,
            headers::CONTENT_LENGTH,
            &frame.body.len().to_string(),
            false,
        );
    }

    out.push(b'\n');
    out.extend_from_slice(&frame.body);
    out.push(0);
    out
}

/// Decodes a single complete frame, e.g. the payload of one WebSocket message.
///
/// Returns `Ok(None)` when the input is only heart-beat end-of-lines.
///
/// # Errors
///
/// Returns [`FrameError::Incomplete`] if the frame is cut short and
/// [`FrameError::TrailingData`] if anything but end-of-lines follows it.
pub fn decode(bytes: &[u8]) -> Result<Option<StompFrame>, FrameError> {
    let mut decoder = StompDecoder::new();
    decoder.extend(bytes);

    match decoder.next_frame()? {
        Some(frame) => {
            if decoder.next_frame()?.is_some() || decoder.buffered() > 0 {
                return Err(FrameError::TrailingData);
            }
            Ok(Some(frame))
        }
        None if decoder.buffered() == 0 => Ok(None),
        None => Err(FrameError::Incomplete),
    }
}

/// Incremental decoder over a byte stream.
///
/// After an error the buffer is left as-is and the connection should be
/// dropped. [`FrameError::TooLarge`] is the exception: [`StompDecoder::skip_frame`]
/// discards the offending frame and decoding resumes with the next one.
#[derive(Debug)]
pub struct StompDecoder {
    buffer: Vec<u8>,
    max_frame_size: usize,
    skipping: Option<Skip>,
}

/// What is left of a frame being discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Bytes(usize),
    UntilNull,
}

impl StompDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_size,
            skipping: None,
        }
    }

    /// Appends newly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes waiting to be decoded.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pops the next complete frame, skipping heart-beats.
    pub fn next_frame(&mut self) -> Result<Option<StompFrame>, FrameError> {
        if self.discard() {
            return Ok(None);
        }
        let skipped = skip_end_of_lines(&self.buffer);
        if skipped > 0 {
            self.buffer.drain(..skipped);
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match parse_frame(&self.buffer)? {
            Some((_, consumed)) if consumed > self.max_frame_size => Err(FrameError::TooLarge {
                max: self.max_frame_size,
            }),
            Some((frame, consumed)) => {
                self.buffer.drain(..consumed);
                Ok(Some(frame))
            }
            None if self.buffer.len() > self.max_frame_size => Err(FrameError::TooLarge {
                max: self.max_frame_size,
            }),
            None => Ok(None),
        }
    }

    /// Discards the frame at the head of the buffer, including bytes that
    /// have not arrived yet.
    ///
    /// The frame's end is found from its `content-length` when the headers
    /// are complete, otherwise from the next NULL octet.
    pub fn skip_frame(&mut self) {
        let skip = match parse_head(&self.buffer) {
            Ok(Some((head, body_start))) => match content_length(&head) {
                Ok(Some(length)) => Skip::Bytes(body_start.saturating_add(length).saturating_add(1)),
                _ => Skip::UntilNull,
            },
            _ => Skip::UntilNull,
        };
        self.skipping = Some(skip);
        self.discard();
    }

    /// Drops buffered bytes of a skipped frame. Returns `true` while the
    /// frame's end has not been reached.
    fn discard(&mut self) -> bool {
        match self.skipping {
            None => false,
            Some(Skip::Bytes(remaining)) => {
                let available = remaining.min(self.buffer.len());
                self.buffer.drain(..available);
                if available == remaining {
                    self.skipping = None;
                    false
                } else {
                    self.skipping = Some(Skip::Bytes(remaining - available));
                    true
                }
            }
            Some(Skip::UntilNull) => match self.buffer.iter().position(|b| *b == 0) {
                Some(end) => {
                    self.buffer.drain(..=end);
                    self.skipping = None;
                    false
                }
                None => {
                    self.buffer.clear();
                    true
                }
            },
        }
    }
}

impl Default for StompDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_header(out: &mut Vec<u8>, name: &str, value: &str, escape: bool) {
    if escape {
        out.extend_from_slice(escape_value(name).as_bytes());
        out.push(b':');
        out.extend_from_slice(escape_value(value).as_bytes());
    } else {
        out.extend_from_slice(name.as_bytes());
        out.push(b':');
        out.extend_from_slice(value.as_bytes());
    }
    out.push(b'\n');
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            ':' => escaped.push_str("\\c"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_value(raw: &str) -> Result<String, FrameError> {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => value.push('\\'),
            Some('r') => value.push('\r'),
            Some('n') => value.push('\n'),
            Some('c') => value.push(':'),
            _ => return Err(FrameError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(value)
}

fn skip_end_of_lines(buffer: &[u8]) -> usize {
    let mut index = 0;
    loop {
        match buffer.get(index) {
            Some(b'\n') => index += 1,
            Some(b'\r') if buffer.get(index + 1) == Some(&b'\n') => index += 2,
            _ => return index,
        }
    }
}

/// Reads one line starting at `start`, without its EOL.
fn read_line(buffer: &[u8], start: usize) -> Result<Option<(&str, usize)>, FrameError> {
    let Some(offset) = buffer[start..].iter().position(|b| *b == b'\n') else {
        return Ok(None);
    };
    let end = start + offset;
    let line = match buffer[start..end].last() {
        Some(b'\r') => &buffer[start..end - 1],
        _ => &buffer[start..end],
    };
    let line = std::str::from_utf8(line).map_err(|_| FrameError::InvalidUtf8)?;
    Ok(Some((line, end + 1)))
}

/// Parses command and headers at the start of `buffer`; returns the frame
/// without its body and the offset where the body starts.
fn parse_head(buffer: &[u8]) -> Result<Option<(StompFrame, usize)>, FrameError> {
    let Some((line, mut position)) = read_line(buffer, 0)? else {
        return Ok(None);
    };
    let command: StompCommand = line.parse()?;
    let escape = command.escapes_headers();

    let mut frame = StompFrame::new(command);
    loop {
        let Some((line, next)) = read_line(buffer, position)? else {
            return Ok(None);
        };
        position = next;
        if line.is_empty() {
            break;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
        let header = if escape {
            (unescape_value(name)?, unescape_value(value)?)
        } else {
            (name.to_string(), value.to_string())
        };
        frame.headers.push(header);
    }
    Ok(Some((frame, position)))
}

fn content_length(frame: &StompFrame) -> Result<Option<usize>, FrameError> {
    frame
        .header(headers::CONTENT_LENGTH)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(raw.to_string()))
        })
        .transpose()
}

/// Parses a frame at the start of `buffer`; `None` means more bytes are needed.
fn parse_frame(buffer: &[u8]) -> Result<Option<(StompFrame, usize)>, FrameError> {
    let Some((mut frame, position)) = parse_head(buffer)? else {
        return Ok(None);
    };

    let body_end = match content_length(&frame)? {
        Some(length) => {
            let end = position
                .checked_add(length)
                .ok_or_else(|| FrameError::InvalidContentLength(length.to_string()))?;
            match buffer.get(end) {
                None => return Ok(None),
                Some(0) => end,
                Some(_) => return Err(FrameError::MissingNullTerminator),
            }
        }
        None => match buffer[position..].iter().position(|b| *b == 0) {
            Some(offset) => position + offset,
            None => return Ok(None),
        },
    };

    frame.body = buffer[position..body_end].to_vec();
    Ok(Some((frame, body_end + 1)))
}
