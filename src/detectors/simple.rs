//! The tabulated recognizer families. A long tail of MTAs (smail, sendmail,
//! Postfix, qmail, Exim's textual reports, a few gateway products) all share
//! one skeleton: an anchor phrase opens the recipient list, an optional end
//! phrase closes it, and a per-line pattern pulls the addresses in between.
//! The same skeleton with different anchors recognizes delayed-delivery
//! warnings, which must never be scored as permanent failures.

use crate::address::extract_address;
use crate::detector::{DetectorResult, FailureClass};
use crate::message::MessageExt;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

struct TableEntry {
    start: Regex,
    stop: Option<Regex>,
    address: Regex,
}

fn entry(start: &str, stop: Option<&str>, address: &str) -> TableEntry {
    TableEntry {
        start: Regex::new(start).unwrap(),
        stop: stop.map(|s| Regex::new(s).unwrap()),
        address: Regex::new(address).unwrap(),
    }
}

// A line that is nothing but an address, bracketed or bare.
const BARE_ADDRESS_LINE: &str = r"^\s*<?(?P<addr>[^\s<>]+@[^\s<>]+)>?\s*$";

lazy_static! {
    static ref MATCH_TABLE: Vec<TableEntry> = vec![
        // sdm.de
        entry(
            r"(?i)here is your list of failed recipients",
            Some(r"(?i)here is your returned mail"),
            r"<(?P<addr>[^>]+)>",
        ),
        // classic sendmail transcript
        entry(
            r"(?i)the following address(?:es)? had",
            Some(r"(?i)transcript of session follows"),
            r"<(?P<addr>[^>]+)>",
        ),
        // robanal
        entry(
            r"(?i)failed to deliver to",
            None,
            r"'(?P<addr>[^']+)'",
        ),
        // InterScan E-Mail VirusWall
        entry(
            r"(?i)message from interscan e-mail viruswall",
            Some(r"(?i)end of message"),
            r"(?i)rcpt to:\s*<(?P<addr>[^>]+)>",
        ),
        // smail
        entry(
            r"(?i)failed addresses follow:",
            Some(r"(?i)message text follows:"),
            r"^\s*(?P<addr>\S+@\S+)",
        ),
        // Postfix
        entry(
            r"(?i)^\s*the (?:postfix program|mail system)\s*$",
            None,
            r"^\s*<(?P<addr>[^>]+)>:",
        ),
        // Exim textual report
        entry(
            r"(?i)a message that you sent could not be delivered",
            Some(r"(?i)this is a copy of the message"),
            r"^\s{2,}(?P<addr>[^\s<>]+@[^\s<>]+)\s*$",
        ),
        // qmail
        entry(
            r"(?i)^hi\. this is the",
            Some(r"(?i)below this line is a copy"),
            r"^<(?P<addr>[^>]+)>:",
        ),
    ];

    static ref WARNING_TABLE: Vec<TableEntry> = vec![
        entry(
            r"(?i)delivery to the following recipient has been delayed",
            None,
            BARE_ADDRESS_LINE,
        ),
        entry(r"(?i)this is just a warning", None, BARE_ADDRESS_LINE),
        entry(r"(?i)this is an advisory-only email", None, BARE_ADDRESS_LINE),
        entry(
            r"(?i)delivery attempts will continue to be made",
            None,
            BARE_ADDRESS_LINE,
        ),
        entry(
            r"(?i)message has not yet been delivered",
            None,
            BARE_ADDRESS_LINE,
        ),
        entry(
            r"(?i)warning: message still undelivered",
            None,
            BARE_ADDRESS_LINE,
        ),
    ];
}

enum ScanState {
    Seeking,
    Collecting,
}

/// Run one table entry over the body lines. `None` means the anchor never
/// appeared; `Some` carries whatever addresses turned up after it.
fn scan(lines: &[String], entry: &TableEntry) -> Option<Vec<String>> {
    let mut state = ScanState::Seeking;
    let mut addresses = Vec::new();
    for line in lines {
        match state {
            ScanState::Seeking => {
                if entry.start.is_match(line) {
                    state = ScanState::Collecting;
                }
            }
            ScanState::Collecting => {
                if let Some(stop) = &entry.stop {
                    if stop.is_match(line) {
                        break;
                    }
                }
                for capture in entry.address.captures_iter(line) {
                    if let Some(addr) = capture.name("addr").and_then(|m| extract_address(m.as_str())) {
                        addresses.push(addr);
                    }
                }
            }
        }
    }
    match state {
        ScanState::Seeking => None,
        ScanState::Collecting => Some(addresses),
    }
}

/// Generic permanent-failure family. Anchors here are guesses, so an entry
/// that matched but extracted nothing does not claim the message.
pub fn detect_match(msg: &ParsedMail) -> DetectorResult {
    let lines = msg.text_lines();
    for entry in MATCH_TABLE.iter() {
        if let Some(addresses) = scan(&lines, entry) {
            if !addresses.is_empty() {
                return DetectorResult::permanent(addresses);
            }
        }
    }
    DetectorResult::NotRecognized
}

/// Delayed-delivery warnings. A matched anchor is definitive even without
/// addresses: the caller must know this is a warning, not an unrecognized
/// bounce, or the permanent heuristics downstream would misclassify it.
pub fn detect_warning(msg: &ParsedMail) -> DetectorResult {
    let lines = msg.text_lines();
    let mut matched = false;
    let mut addresses = Vec::new();
    for entry in WARNING_TABLE.iter() {
        if let Some(mut found) = scan(&lines, entry) {
            matched = true;
            addresses.append(&mut found);
        }
    }
    if !matched {
        return DetectorResult::NotRecognized;
    }
    if addresses.is_empty() {
        DetectorResult::recognized_empty(FailureClass::Delayed)
    } else {
        DetectorResult::delayed(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailparse::parse_mail;

    fn plain(body: &str) -> String {
        format!(
            "Content-Type: text/plain\r\n\r\n{}\r\n",
            body.replace('\n', "\r\n")
        )
    }

    #[test]
    fn sendmail_transcript_shape() {
        let raw = plain(
            "   ----- The following addresses had permanent fatal errors -----\n\
             <ghost@example.com>\n\
             \n\
             \x20  ----- Transcript of session follows -----\n\
             ... while talking to mx.example.com:\n\
             <other@example.net>",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect_match(&msg),
            DetectorResult::permanent(vec!["ghost@example.com".to_string()])
        );
    }

    #[test]
    fn postfix_shape() {
        let raw = plain(
            "This is the mail system at host mx.example.com.\n\
             \n\
             The mail system\n\
             \n\
             <missing@example.org>: host mx.example.org said: 550 5.1.1 unknown\n",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect_match(&msg),
            DetectorResult::permanent(vec!["missing@example.org".to_string()])
        );
    }

    #[test]
    fn qmail_shape() {
        let raw = plain(
            "Hi. This is the qmail-send program at example.net.\n\
             I'm afraid I wasn't able to deliver your message.\n\
             \n\
             <void@example.net>:\n\
             Sorry, no mailbox here by that name.\n\
             \n\
             --- Below this line is a copy of the message.\n\
             <quoted@example.net>:",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect_match(&msg),
            DetectorResult::permanent(vec!["void@example.net".to_string()])
        );
    }

    #[test]
    fn anchors_without_addresses_do_not_claim() {
        let raw = plain("The following addresses had permanent fatal errors\nbut no list");
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(detect_match(&msg), DetectorResult::NotRecognized);
    }

    #[test]
    fn delayed_warning_with_address() {
        let raw = plain(
            "Delivery to the following recipient has been delayed:\n\
             \n\
             \x20 pending@example.com\n\
             \n\
             Message will be retried for 2 more day(s)",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect_warning(&msg),
            DetectorResult::delayed(vec!["pending@example.com".to_string()])
        );
    }

    #[test]
    fn warning_without_address_is_recognized_empty() {
        let raw = plain("This is just a warning. You do not need to take any action.");
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect_warning(&msg),
            DetectorResult::recognized_empty(FailureClass::Delayed)
        );
    }

    #[test]
    fn warnings_are_not_permanent_matches() {
        let raw = plain(
            "Delivery to the following recipient has been delayed:\n\
             \x20 pending@example.com",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(detect_match(&msg), DetectorResult::NotRecognized);
    }
}
