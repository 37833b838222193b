//! AOL bounces. The recipient list that follows the banner line may hold
//! bare screen names; those are completed to `@aol.com`. Collection stops at
//! the first line containing whitespace, which is where prose resumes.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex =
        Regex::new(r"(?i)mail to the following recipients could not be delivered").unwrap();
}

enum State {
    Seeking,
    Collecting,
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    if msg.mime_type() != "text/plain" {
        return DetectorResult::NotRecognized;
    }
    let from = msg.first_header("from").unwrap_or_default().to_lowercase();
    if !from.trim_end().ends_with("@aol.com") {
        return DetectorResult::NotRecognized;
    }

    let mut state = State::Seeking;
    let mut addresses = Vec::new();
    for line in msg.text_lines() {
        let line = line.trim();
        match state {
            State::Seeking => {
                if ANCHOR.is_match(line) {
                    state = State::Collecting;
                }
            }
            State::Collecting => {
                if line.is_empty() {
                    continue;
                }
                if line.chars().any(char::is_whitespace) {
                    break;
                }
                let addr = if line.contains('@') {
                    extract_address(line)
                } else {
                    extract_address(&format!("{line}@aol.com"))
                };
                if let Some(addr) = addr {
                    addresses.push(addr);
                }
            }
        }
    }
    DetectorResult::permanent(addresses)
}
