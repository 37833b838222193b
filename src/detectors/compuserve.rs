//! Compuserve textual bounces.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex = Regex::new(r"(?i)your message could not be delivered").unwrap();
    static ref INVALID: Regex =
        Regex::new(r"(?i)^\s*Invalid receiver address:\s*(?P<addr>\S+)").unwrap();
}

enum State {
    Seeking,
    Collecting,
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    let mut state = State::Seeking;
    let mut addresses = Vec::new();
    for line in msg.text_lines() {
        match state {
            State::Seeking => {
                if ANCHOR.is_match(&line) {
                    state = State::Collecting;
                }
            }
            State::Collecting => {
                if let Some(capture) = INVALID.captures(&line) {
                    if let Some(addr) = extract_address(&capture["addr"]) {
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
