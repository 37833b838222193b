//! Novell GroupWise bounces: multipart/mixed with an X-Mailer header and the
//! failed recipients listed in the first text/plain part, either bracketed or
//! as bare address lines.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"<(?P<addr>[^>]+)>").unwrap();
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    if msg.mime_type() != "multipart/mixed" || msg.first_header("x-mailer").is_none() {
        return DetectorResult::NotRecognized;
    }
    let text = msg.find_part(|p| p.subparts.is_empty() && p.mime_type() == "text/plain");
    let mut addresses = Vec::new();
    if let Some(part) = text {
        for line in part.text_lines() {
            if let Some(capture) = BRACKETED.captures(&line) {
                if let Some(addr) = extract_address(&capture["addr"]) {
                    addresses.push(addr);
                }
            } else if line.contains('@') && !line.starts_with(char::is_whitespace) {
                // bare address line; first token only
                if let Some(token) = line.split_whitespace().next() {
                    if let Some(addr) = extract_address(token) {
                        addresses.push(addr);
                    }
                }
            }
        }
    }
    // X-Mailer gate: the format is identified even with nothing extracted.
    DetectorResult::permanent(addresses)
}
