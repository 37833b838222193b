//! Microsoft Exchange textual non-delivery reports.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref ANCHOR: Regex = Regex::new(r"(?i)did not reach the following recipient").unwrap();
    static ref TERMINATOR: Regex = Regex::new(r"MSEXCH:").unwrap();
    // Two shapes of the per-recipient line:
    //     SMTP=user@example.com; on 1/2/2003 ...
    //     user@example.com on 1/2/2003 ...
    static ref SMTP_FORM: Regex = Regex::new(r"(?i)SMTP=(?P<addr>[^;]+);\s+on\s").unwrap();
    static ref BARE_FORM: Regex = Regex::new(r"(?P<addr>[^\s@]+@[^\s@]+)\s+on\s").unwrap();
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
                if TERMINATOR.is_match(&line) {
                    break;
                }
                let capture = SMTP_FORM
                    .captures(&line)
                    .or_else(|| BARE_FORM.captures(&line));
                if let Some(addr) = capture.and_then(|c| extract_address(&c["addr"])) {
                    addresses.push(addr);
                }
            }
        }
    }
    // Anchor phrase is only a guess about the format; stay out of the way
    // unless it actually produced something.
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
    fn both_recipient_line_shapes_are_accepted() {
        let raw = "Content-Type: text/plain\r\n\r\n\
                   Your message did not reach the following recipient(s):\r\n\
                   \r\n\
                   SMTP=broken@example.com; on Mon, 2 Jan 2023\r\n\
                   other@example.org on Mon, 2 Jan 2023\r\n\
                   MSEXCH:IMS:EXAMPLE:SITE:MAILHUB 0 (000C05A6) Unknown Recipient\r\n\
                   after@example.net on Mon, 2 Jan 2023\r\n";
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect(&msg),
            DetectorResult::permanent(vec![
                "broken@example.com".to_string(),
                "other@example.org".to_string()
            ])
        );
    }

    #[test]
    fn anchor_without_addresses_is_not_a_match() {
        let raw = "Content-Type: text/plain\r\n\r\n\
                   did not reach the following recipient\r\n\
                   no addresses here\r\n";
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(detect(&msg), DetectorResult::NotRecognized);
    }
}
