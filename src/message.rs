//! A thin read-only view over `mailparse`'s parsed MIME tree.
//!
//! Detectors never touch the parser directly for traversal or body access;
//! they go through this extension trait so every recognizer sees the same
//! projection of the message: depth-first part iteration, case-insensitive
//! header fetch, and a text-lines view that skips parts which cannot be
//! decoded instead of erroring.

use mailparse::{MailHeaderMap, ParsedMail};

pub trait MessageExt<'a> {
    /// Lowercase `type/subtype` of this part.
    fn mime_type(&self) -> &str;

    fn is_multipart(&self) -> bool;

    /// Content-Type parameter by (case-insensitive) name.
    fn param(&self, name: &str) -> Option<&str>;

    /// First value of the named header, matched case-insensitively.
    fn first_header(&self, name: &str) -> Option<String>;

    /// All parts of the tree, this part first, depth-first in document
    /// order. Each call returns a fresh iterator.
    fn walk<'p>(&'p self) -> Walk<'p, 'a>;

    /// First part (including self) satisfying the predicate.
    fn find_part<'p, P>(&'p self, predicate: P) -> Option<&'p ParsedMail<'a>>
    where
        P: FnMut(&ParsedMail<'a>) -> bool;

    /// The text-body projection of this part: its own decoded body for a
    /// leaf, or the concatenated bodies of all text/plain leaves in document
    /// order for a multipart. Lines carry no trailing CR/LF. Parts that
    /// cannot be decoded contribute nothing.
    fn text_lines(&self) -> Vec<String>;
}

pub struct Walk<'p, 'a> {
    stack: Vec<&'p ParsedMail<'a>>,
}

impl<'p, 'a> Iterator for Walk<'p, 'a> {
    type Item = &'p ParsedMail<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        // Children go on the stack reversed so they pop in document order.
        for sub in part.subparts.iter().rev() {
            self.stack.push(sub);
        }
        Some(part)
    }
}

impl<'a> MessageExt<'a> for ParsedMail<'a> {
    fn mime_type(&self) -> &str {
        &self.ctype.mimetype
    }

    fn is_multipart(&self) -> bool {
        self.ctype.mimetype.starts_with("multipart/")
    }

    fn param(&self, name: &str) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        self.ctype.params.get(&key).map(String::as_str)
    }

    fn first_header(&self, name: &str) -> Option<String> {
        self.headers.get_first_value(name)
    }

    fn walk<'p>(&'p self) -> Walk<'p, 'a> {
        Walk { stack: vec![self] }
    }

    fn find_part<'p, P>(&'p self, mut predicate: P) -> Option<&'p ParsedMail<'a>>
    where
        P: FnMut(&ParsedMail<'a>) -> bool,
    {
        self.walk().find(|part| predicate(part))
    }

    fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.subparts.is_empty() {
            push_body_lines(self, &mut lines);
        } else {
            for part in self.walk() {
                if part.subparts.is_empty() && part.ctype.mimetype == "text/plain" {
                    push_body_lines(part, &mut lines);
                }
            }
        }
        lines
    }
}

fn push_body_lines(part: &ParsedMail, lines: &mut Vec<String>) {
    let body = match part.get_body() {
        Ok(body) => body,
        Err(e) => {
            log::debug!("skipping undecodable {} part: {e}", part.ctype.mimetype);
            return;
        }
    };
    for line in body.lines() {
        lines.push(line.to_string());
    }
}
