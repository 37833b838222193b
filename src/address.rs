//! Canonicalization of extracted address tokens.

use std::collections::HashSet;

/// Reduce a free-form token to a bare `local@domain` address.
///
/// Tokens arrive in the shapes bounce reports actually use: RFC 3464
/// `rfc822; user@example.com` fields, angle-bracketed `<user@example.com>`,
/// display names with comments, or a bare address with trailing punctuation.
/// The local part keeps its original case; the domain is lowercased. Returns
/// `None` when no plausible address is present.
pub fn extract_address(token: &str) -> Option<String> {
    let mut t = token.trim();

    // An address-type prefix (`rfc822; addr`). Types other than rfc822 name
    // non-internet address spaces we cannot score against a membership.
    if let Some((atype, rest)) = t.split_once(';') {
        if !atype.contains('@') && !atype.contains('<') {
            if atype.trim().eq_ignore_ascii_case("rfc822") {
                t = rest.trim();
            } else {
                return None;
            }
        }
    }

    // The innermost angle-bracket form wins over any display name around it.
    if let (Some(lt), Some(gt)) = (t.rfind('<'), t.rfind('>')) {
        if lt < gt {
            t = &t[lt + 1..gt];
        }
    }

    let stripped = strip_comments(t);
    let cleaned = stripped
        .trim()
        .trim_matches('"')
        .trim_end_matches(['.', ',', ';', ':']);

    let (local, domain) = cleaned.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    if domain.contains('@') {
        return None;
    }
    if !domain.contains('.') {
        return None;
    }
    if local.chars().any(char::is_whitespace) {
        return None;
    }
    if domain
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return None;
    }

    Some(format!("{local}@{}", domain.to_ascii_lowercase()))
}

/// Remove RFC 822 comments (parenthesized runs, possibly nested).
fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Drop duplicate addresses, comparing case-insensitively and keeping the
/// first occurrence of each.
pub fn dedup(addresses: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|a| seen.insert(a.to_ascii_lowercase()))
        .collect()
}
