//! Exim-style bounces carrying an `X-Failed-Recipients` header.
//!
//! The header is authoritative: a comma-separated list of every envelope
//! recipient the MTA gave up on. No body scanning required.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use mailparse::ParsedMail;

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    let value = match msg.first_header("x-failed-recipients") {
        Some(value) => value,
        None => return DetectorResult::NotRecognized,
    };
    let addresses = value.split(',').filter_map(extract_address).collect();
    // The header's presence alone identifies the format.
    DetectorResult::permanent(addresses)
}
