//! Yale's central mail system reports failures by bare username. Each name
//! is reported against both domains the system serves, since the report does
//! not say which one the member subscribed under.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex =
        Regex::new(r"(?i)Message not delivered to the following").unwrap();
    static ref TERMINATOR: Regex = Regex::new(r"(?i)Error Detail").unwrap();
}

enum State {
    Seeking,
    Collecting,
}

fn from_yale_daemon(msg: &ParsedMail) -> bool {
    let from = match msg.first_header("from") {
        Some(from) => from,
        None => return false,
    };
    let addr = match extract_address(&from) {
        Some(addr) => addr,
        None => return false,
    };
    let (local, domain) = match addr.split_once('@') {
        Some(pair) => pair,
        None => return false,
    };
    local.eq_ignore_ascii_case("mailer-daemon")
        && (domain == "yale.edu" || domain.ends_with(".yale.edu"))
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    if msg.is_multipart() || !from_yale_daemon(msg) {
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
                let name = line.trim().to_ascii_lowercase();
                if name.is_empty() || name.contains('@') || name.contains(char::is_whitespace) {
                    continue;
                }
                addresses.push(format!("{name}@yale.edu"));
                addresses.push(format!("{name}@cs.yale.edu"));
            }
        }
    }
    DetectorResult::permanent(addresses)
}
