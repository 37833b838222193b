//! RFC 1894 / RFC 3464 delivery-status notifications.
//!
//! The structured cousin of the textual recognizers in `detectors/`: a
//! `message/delivery-status` part whose body is a run of RFC 822-style field
//! blocks separated by blank lines. The first block describes the reporting
//! MTA; each later block describes one recipient. Unlike a full DSN parser
//! this one is deliberately lenient: bounces are generated by software we do
//! not control, so anything that does not parse simply contributes nothing.

use crate::address::extract_address;
use crate::detector::{DetectorResult, FailureClass};
use crate::message::MessageExt;
use mailparse::{parse_headers, ParsedMail};
use std::collections::HashMap;

/// One blank-line separated block, field names lowercased.
pub type FieldBlock = HashMap<String, String>;

/// Split a `message/delivery-status` body into its field blocks. Blocks that
/// fail to parse are dropped.
pub fn parse_status_blocks(part: &ParsedMail) -> Vec<FieldBlock> {
    let body = match part.get_body() {
        Ok(body) => body,
        Err(e) => {
            log::debug!("undecodable delivery-status body: {e}");
            return Vec::new();
        }
    };
    let body = body.replace("\r\n", "\n");
    body.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<FieldBlock> {
    let (headers, _) = parse_headers(block.trim_start().as_bytes()).ok()?;
    let mut fields = FieldBlock::new();
    for header in headers {
        fields.insert(header.get_key().to_ascii_lowercase(), header.get_value());
    }
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Only the leading token of an `Action` field is significant; MTAs append
/// comments like `failed (permanent)`.
fn action_token(value: &str) -> Option<String> {
    value
        .split_whitespace()
        .next()
        .map(|t| t.to_ascii_lowercase())
}

pub fn detect(msg: &ParsedMail) -> DetectorResult {
    if !msg.is_multipart() {
        return DetectorResult::NotRecognized;
    }
    let status = match msg.find_part(|p| p.mime_type() == "message/delivery-status") {
        Some(part) => part,
        None => return DetectorResult::NotRecognized,
    };

    let blocks = parse_status_blocks(status);
    if blocks.is_empty() {
        // Definitively a DSN, just an empty or unreadable one.
        return DetectorResult::recognized_empty(FailureClass::Permanent);
    }

    // The per-message block should not carry an Action, but some MTAs put
    // one there and omit it from the recipient blocks. Use it as a default.
    let default_action = blocks[0].get("action").and_then(|v| action_token(v));

    let mut addresses = Vec::new();
    let mut saw_failed = false;
    let mut saw_delayed = false;

    for block in &blocks[1..] {
        let action = block
            .get("action")
            .and_then(|v| action_token(v))
            .or_else(|| default_action.clone());
        match action.as_deref() {
            Some("failed") | Some("failure") => saw_failed = true,
            Some("delayed") => saw_delayed = true,
            // delivered / relayed / expanded are not bounces
            _ => continue,
        }

        // Original-Recipient is the address the sender submitted, which is
        // what membership rosters hold. X-Actual-Recipient is deliberately
        // ignored: MTAs disagree about what it means.
        let recipient = block
            .get("original-recipient")
            .or_else(|| block.get("final-recipient"));
        if let Some(addr) = recipient.and_then(|r| extract_address(r)) {
            addresses.push(addr);
        }
    }

    let class = if saw_delayed && !saw_failed {
        FailureClass::Delayed
    } else {
        FailureClass::Permanent
    };
    log::debug!(
        "delivery-status report: {} recipient block(s), {} address(es), {:?}",
        blocks.len() - 1,
        addresses.len(),
        class
    );
    match class {
        FailureClass::Permanent => DetectorResult::permanent(addresses),
        FailureClass::Delayed => DetectorResult::delayed(addresses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailparse::parse_mail;

    fn dsn(status_body: &str) -> String {
        format!(
            "From: Mail Delivery Subsystem <mailer-daemon@mx.example.com>\r\n\
             Content-Type: multipart/report; report-type=delivery-status; boundary=\"=b=\"\r\n\
             \r\n\
             --=b=\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             Your message could not be delivered.\r\n\
             --=b=\r\n\
             Content-Type: message/delivery-status\r\n\
             \r\n\
             {}\r\n\
             --=b=--\r\n",
            status_body.replace('\n', "\r\n")
        )
    }

    #[test]
    fn failed_recipients_are_extracted() {
        let raw = dsn(
            "Reporting-MTA: dns; mx.example.com\n\
             \n\
             Action: failed\n\
             Final-Recipient: rfc822; alice@example.com\n\
             \n\
             Action: failed\n\
             Final-Recipient: rfc822; bob@example.org",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect(&msg),
            DetectorResult::permanent(vec![
                "alice@example.com".to_string(),
                "bob@example.org".to_string()
            ])
        );
    }

    #[test]
    fn original_recipient_wins_over_final() {
        let raw = dsn(
            "Reporting-MTA: dns; mx.example.com\n\
             \n\
             Action: failed\n\
             Original-Recipient: rfc822; member@lists.example.com\n\
             Final-Recipient: rfc822; forwarded@elsewhere.example.net",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect(&msg).addresses(),
            &["member@lists.example.com".to_string()]
        );
    }

    #[test]
    fn delayed_only_is_classified_delayed() {
        let raw = dsn(
            "Reporting-MTA: dns; mx.example.com\n\
             \n\
             Action: delayed\n\
             Final-Recipient: rfc822; slow@example.net",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect(&msg),
            DetectorResult::delayed(vec!["slow@example.net".to_string()])
        );
    }

    #[test]
    fn permanent_wins_over_delayed() {
        let raw = dsn(
            "Reporting-MTA: dns; mx.example.com\n\
             \n\
             Action: delayed\n\
             Final-Recipient: rfc822; slow@example.net\n\
             \n\
             Action: failed (permanent)\n\
             Final-Recipient: rfc822; gone@example.net",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        let result = detect(&msg);
        assert_eq!(result.class(), Some(FailureClass::Permanent));
        assert!(result
            .addresses()
            .contains(&"gone@example.net".to_string()));
        assert!(result
            .addresses()
            .contains(&"slow@example.net".to_string()));
    }

    #[test]
    fn per_message_action_is_the_default() {
        let raw = dsn(
            "Reporting-MTA: dns; mx.example.com\n\
             Action: failed\n\
             \n\
             Final-Recipient: rfc822; quiet@example.com",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(
            detect(&msg).addresses(),
            &["quiet@example.com".to_string()]
        );
    }

    #[test]
    fn delivered_actions_contribute_nothing() {
        let raw = dsn(
            "Reporting-MTA: dns; mx.example.com\n\
             \n\
             Action: delivered\n\
             Final-Recipient: rfc822; happy@example.com",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        let result = detect(&msg);
        assert!(result.is_recognized());
        assert!(result.addresses().is_empty());
    }

    #[test]
    fn plain_text_is_not_a_dsn() {
        let raw = "Content-Type: text/plain\r\n\r\nAction: failed\r\n";
        let msg = parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(detect(&msg), DetectorResult::NotRecognized);
    }

    #[test]
    fn non_rfc822_recipient_types_are_skipped() {
        let raw = dsn(
            "Reporting-MTA: mailbus; SYS30\n\
             \n\
             Action: failed\n\
             Final-Recipient: unknown; nair_s",
        );
        let msg = parse_mail(raw.as_bytes()).unwrap();
        let result = detect(&msg);
        assert!(result.is_recognized());
        assert!(result.addresses().is_empty());
    }
}
