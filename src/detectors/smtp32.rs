//! Ipswitch IMail / SMTP32 bounces, identified by their distinctive
//! `X-Mailer: <SMTP32 v…>` header. The body lists one failure reason per
//! recipient up to the quoted original message.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref TERMINATOR: Regex = Regex::new(r"(?i)original message follows").unwrap();
    static ref REASON: Regex = Regex::new(
        r"(?ix)^\s*
          (?: user[\ ]mailbox[^:]*:
            | delivery[\ ]failed[^:]*:
            | unknown[\ ]user[^:]*:
            | undeliverable[\ ]to
            | delivery[\ ]userid[^:]*:
          )
          \s*(?P<addr>\S+)"
    )
    .unwrap();
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    let mailer = msg.first_header("x-mailer").unwrap_or_default();
    if !mailer.trim_start().to_ascii_lowercase().starts_with("<smtp32 v") {
        return DetectorResult::NotRecognized;
    }

    let mut addresses = Vec::new();
    for line in msg.text_lines() {
        if TERMINATOR.is_match(&line) {
            break;
        }
        if let Some(capture) = REASON.captures(&line) {
            if let Some(addr) = extract_address(&capture["addr"]) {
                addresses.push(addr);
            }
        }
    }
    DetectorResult::permanent(addresses)
}
