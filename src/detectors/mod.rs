//! Format-specific bounce recognizers.
//!
//! Each module exposes a single `detect` function. Recognizers gated on a
//! strong signal (an `X-Mailer` value, a mailer-daemon `From` domain, a
//! diagnostic header) return `Recognized` with an empty address list when
//! the format is certain but nothing could be extracted; recognizers that
//! only guess from body text return `NotRecognized` in that case.

pub mod aol;
pub mod compuserve;
pub mod exchange;
pub mod exim;
pub mod groupwise;
pub mod llnl;
pub mod microsoft;
pub mod netscape;
pub mod simple;
pub mod sina;
pub mod smtp32;
pub mod yahoo;
pub mod yale;

use crate::address::extract_address;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_TOKEN: Regex = Regex::new(r"[^\s<>,;]+@[^\s<>,;]+").unwrap();
}

/// First email-looking token on a line, canonicalized.
pub(crate) fn first_email_token(line: &str) -> Option<String> {
    EMAIL_TOKEN
        .find_iter(line)
        .find_map(|m| extract_address(m.as_str()))
}
