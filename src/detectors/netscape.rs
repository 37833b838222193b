//! Netscape Messaging Server bounces. Structurally these are
//! multipart/report with `report-type=delivery-status`, but the usable
//! recipient list lives in a text/plain preamble that appears before the
//! status part, so this runs as a text recognizer rather than through the
//! delivery-status engine.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex =
        Regex::new(r"(?i)The following recipients did not receive your message:").unwrap();
    static ref BRACKETED: Regex = Regex::new(r"<(?P<addr>[^>]+)>").unwrap();
}

enum State {
    Seeking,
    Collecting,
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    if msg.mime_type() != "multipart/report" {
        return DetectorResult::NotRecognized;
    }
    let report_type = msg.param("report-type").map(str::trim).unwrap_or("");
    if !report_type.eq_ignore_ascii_case("delivery-status") {
        return DetectorResult::NotRecognized;
    }

    // Need a text/plain part sitting in front of any delivery-status part.
    let mut preamble = None;
    for part in msg.walk() {
        match part.mime_type() {
            "message/delivery-status" => {
                if preamble.is_none() {
                    return DetectorResult::NotRecognized;
                }
                break;
            }
            "text/plain" if preamble.is_none() => preamble = Some(part),
            _ => {}
        }
    }
    let preamble = match preamble {
        Some(part) => part,
        None => return DetectorResult::NotRecognized,
    };

    let mut state = State::Seeking;
    let mut addresses = Vec::new();
    for line in preamble.text_lines() {
        match state {
            State::Seeking => {
                if ANCHOR.is_match(&line) {
                    state = State::Collecting;
                }
            }
            State::Collecting => {
                for capture in BRACKETED.captures_iter(&line) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use mailparse::parse_mail;

    #[test]
    fn preamble_recipients_are_extracted() {
        let raw = "Content-Type: multipart/report; report-type=delivery-status; boundary=\"=n=\"\r\n\
                   \r\n\
                   --=n=\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   This Message was undeliverable due to the following reason:\r\n\
                   \r\n\
                   The following recipients did not receive your message:\r\n\
                   \r\n\
                   Recipient address rejected by the remote system\r\n\
                   <nobody@example.com>\r\n\
                   --=n=--\r\n";
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect(&msg),
            DetectorResult::permanent(vec!["nobody@example.com".to_string()])
        );
    }

    #[test]
    fn status_part_first_defers_to_the_dsn_engine() {
        let raw = "Content-Type: multipart/report; report-type=delivery-status; boundary=\"=n=\"\r\n\
                   \r\n\
                   --=n=\r\n\
                   Content-Type: message/delivery-status\r\n\
                   \r\n\
                   Reporting-MTA: dns; mx.example.com\r\n\
                   --=n=--\r\n";
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(detect(&msg), DetectorResult::NotRecognized);
    }
}
