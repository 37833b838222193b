//! LLNL's home-grown list manager wraps the failed address in commas
//! somewhere in the body. Weakest heuristic in the set; the registry runs it
//! last and it only ever claims the first match.

use crate::address::extract_address;
use crate::detector::DetectorResult;
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

lazy_static! {
    static ref COMMA_WRAPPED: Regex = Regex::new(r",\s*(?P<addr>\S+@\S+?),").unwrap();
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    for line in msg.text_lines() {
        if let Some(capture) = COMMA_WRAPPED.captures(&line) {
            if let Some(addr) = extract_address(&capture["addr"]) {
                return DetectorResult::permanent(vec![addr]);
            }
        }
    }
    DetectorResult::NotRecognized
}
