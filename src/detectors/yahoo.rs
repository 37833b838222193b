//! Yahoo mailer-daemon bounces: `<address>:` lines between the "Message
//! from yahoo.com" banner and the quoted original.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex = Regex::new(r"(?i)message\s+from\s+yahoo\.\S+").unwrap();
    static ref RECIPIENT: Regex = Regex::new(r"<(?P<addr>[^>]+)>:").unwrap();
    static ref TERMINATOR: Regex = Regex::new(r"--- Original message follows").unwrap();
}

enum State {
    Seeking,
    Collecting,
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    let from = msg.first_header("from").unwrap_or_default().to_lowercase();
    if !from.contains("mailer-daemon@yahoo") {
        return DetectorResult::NotRecognized;
    }

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
                if TERMINATOR.is_match(&line) {
                    break;
                }
                if let Some(capture) = RECIPIENT.captures(&line) {
                    if let Some(addr) = extract_address(&capture["addr"]) {
                        addresses.push(addr);
                    }
                }
            }
        }
    }
    // From gate: definitively Yahoo even when nothing was extracted.
    DetectorResult::permanent(addresses)
}
