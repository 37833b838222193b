//! Microsoft SMTPSVC non-delivery reports: multipart/mixed whose first
//! subpart carries a sendmail-style session transcript. The format is poorly
//! specified and this heuristic is known to be a guess, so it never claims a
//! message it could not pull addresses from.

use crate::detector::DetectorResult;
use crate::detectors::first_email_token;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex = Regex::new(r"(?i)transcript of session follows").unwrap();
}

enum State {
    Seeking,
    Collecting,
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    if msg.mime_type() != "multipart/mixed" {
        return DetectorResult::NotRecognized;
    }
    let first = match msg.subparts.first() {
        Some(part) => part,
        None => return DetectorResult::NotRecognized,
    };

    let mut state = State::Seeking;
    let mut addresses = Vec::new();
    for line in first.text_lines() {
        match state {
            State::Seeking => {
                if ANCHOR.is_match(&line) {
                    state = State::Collecting;
                }
            }
            State::Collecting => {
                if line.contains('@') {
                    if let Some(addr) = first_email_token(&line) {
                        addresses.push(addr);
                    }
                }
            }
        }
    }
    if addresses.is_empty() {
        DetectorResult::NotRecognized
    } else {
        DetectorResult::permanent(addresses)
    }
}
