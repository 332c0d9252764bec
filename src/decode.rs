//! Decoding of the upstream's line-delimited event stream.
//!
//! The chat endpoint answers with newline separated frames such as
//! `data: {"role":"assistant","message":"Hel","model":"gpt-4o-mini"}`.
//! Only lines mentioning `message` carry reply text; everything else
//! (`data: [DONE]`, blank keep-alives) is skipped.

use serde_json::Value;

const FRAME_PREFIX: &str = "data: ";
const MESSAGE_FIELD: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("line {line}: frame is not valid JSON: {reason}")]
    InvalidJson { line: usize, reason: String },

    #[error("line {line}: frame has no string `message` field")]
    MissingMessage { line: usize },
}

/// Concatenate the `message` fragment of every frame, in line order.
///
/// Line numbers in errors are 1-based.
pub fn decode_reply(body: &str) -> Result<String, DecodeError> {
    let mut reply = String::new();
    for (idx, line) in body.split('\n').enumerate() {
        let line = line.trim_end_matches('\r');
        if !line.contains(MESSAGE_FIELD) {
            continue;
        }
        reply.push_str(&decode_frame(idx + 1, line)?);
    }
    Ok(reply)
}

fn decode_frame(line_no: usize, line: &str) -> Result<String, DecodeError> {
    let payload = match line.split_once(FRAME_PREFIX) {
        Some((_, rest)) => rest,
        None => line,
    };
    let frame: Value = serde_json::from_str(payload).map_err(|e| DecodeError::InvalidJson {
        line: line_no,
        reason: e.to_string(),
    })?;
    frame
        .get(MESSAGE_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(DecodeError::MissingMessage { line: line_no })
}
