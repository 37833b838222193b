//! Bounces from sina.com's mailer daemon: the first subpart lists one
//! bracketed address per line.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref RECIPIENT: Regex = Regex::new(r"^<(?P<addr>[^>]+)>\s*$").unwrap();
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    let from = msg.first_header("from").unwrap_or_default().to_lowercase();
    if !from.contains("mailer-daemon@sina.com") || !msg.is_multipart() {
        return DetectorResult::NotRecognized;
    }

    let mut addresses = Vec::new();
    if let Some(first) = msg.subparts.first() {
        for line in first.text_lines() {
            if let Some(capture) = RECIPIENT.captures(&line) {
                if let Some(addr) = extract_address(&capture["addr"]) {
                    addresses.push(addr);
                }
            }
        }
    }
    DetectorResult::permanent(addresses)
}
