//! Tag 32: IRI references (RFC 3987), absolute or relative.

use crate::{CborError, ErrorCode};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Part {
    Path,
    Query,
    Fragment,
    RegName,
    UserInfo,
}

fn is_ucschar(c: char) -> bool {
    let cp = u32::from(c);
    if cp & 0xfffe == 0xfffe || (0xfdd0..=0xfdef).contains(&cp) {
        return false;
    }
    matches!(cp, 0xa0..=0xd7ff | 0xf900..=0xfdcf | 0xfdf0..=0xffef | 0x1_0000..=0xe_fffd)
}

fn is_iprivate(c: char) -> bool {
    matches!(u32::from(c), 0xe000..=0xf8ff | 0xf_0000..=0xf_fffd | 0x10_0000..=0x10_fffd)
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~') || is_ucschar(c)
}

const fn is_sub_delim(c: char) -> bool {
    matches!(
        c,
        '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '='
    )
}

/// Check `s` against the character set of `part`, accepting percent-escapes.
fn valid_chars(s: &str, part: Part) -> bool {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let ok = matches!((chars.next(), chars.next()), (Some(a), Some(b))
                if a.is_ascii_hexdigit() && b.is_ascii_hexdigit());
            if !ok {
                return false;
            }
            continue;
        }
        let allowed = is_unreserved(c)
            || is_sub_delim(c)
            || match part {
                Part::RegName => false,
                Part::UserInfo => c == ':',
                Part::Path => matches!(c, ':' | '@' | '/'),
                Part::Query => matches!(c, ':' | '@' | '/' | '?') || is_iprivate(c),
                Part::Fragment => matches!(c, ':' | '@' | '/' | '?'),
            };
        if !allowed {
            return false;
        }
    }
    true
}

fn valid_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn valid_ip_literal(s: &str) -> bool {
    if let Some(rest) = s.strip_prefix(['v', 'V']) {
        // IPvFuture: "v" 1*HEXDIG "." 1*( unreserved / sub-delims / ":" )
        return rest.split_once('.').is_some_and(|(ver, body)| {
            !ver.is_empty()
                && ver.chars().all(|c| c.is_ascii_hexdigit())
                && !body.is_empty()
                && body
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-._~:".contains(c) || is_sub_delim(c))
        });
    }
    s.contains(':') && s.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
}

fn valid_authority(auth: &str) -> bool {
    let (userinfo, hostport) = match auth.rsplit_once('@') {
        Some((u, h)) => (Some(u), h),
        None => (None, auth),
    };
    if userinfo.is_some_and(|u| !valid_chars(u, Part::UserInfo)) {
        return false;
    }
    let (host, port) = if let Some(rest) = hostport.strip_prefix('[') {
        let Some((literal, after)) = rest.split_once(']') else {
            return false;
        };
        if !valid_ip_literal(literal) {
            return false;
        }
        match after {
            "" => return true,
            p => match p.strip_prefix(':') {
                Some(port) => ("", port),
                None => return false,
            },
        }
    } else {
        match hostport.rsplit_once(':') {
            Some((h, p)) => (h, p),
            None => (hostport, ""),
        }
    };
    port.chars().all(|c| c.is_ascii_digit()) && valid_chars(host, Part::RegName)
}

/// Returns `true` iff `s` is an absolute IRI or a relative IRI reference.
#[must_use]
pub fn is_valid_iri(s: &str) -> bool {
    let (rest, fragment) = match s.split_once('#') {
        Some((r, f)) => (r, Some(f)),
        None => (s, None),
    };
    if fragment.is_some_and(|f| !valid_chars(f, Part::Fragment)) {
        return false;
    }
    let (rest, query) = match rest.split_once('?') {
        Some((r, q)) => (r, Some(q)),
        None => (rest, None),
    };
    if query.is_some_and(|q| !valid_chars(q, Part::Query)) {
        return false;
    }
    let first_segment_end = rest.find('/').unwrap_or(rest.len());
    let hier = match rest[..first_segment_end].split_once(':') {
        Some((scheme, _)) => {
            // A colon in the first segment must end a scheme.
            if !valid_scheme(scheme) {
                return false;
            }
            &rest[scheme.len() + 1..]
        }
        None => rest,
    };
    let path = match hier.strip_prefix("//") {
        Some(after) => {
            let end = after.find('/').unwrap_or(after.len());
            if !valid_authority(&after[..end]) {
                return false;
            }
            &after[end..]
        }
        None => hier,
    };
    valid_chars(path, Part::Path)
}

/// Validate a tag 32 payload.
///
/// # Errors
///
/// `TagUriInvalid` if `s` is not an IRI reference.
pub fn validate(s: &str) -> Result<(), CborError> {
    if is_valid_iri(s) {
        Ok(())
    } else {
        Err(CborError::at_start(ErrorCode::TagUriInvalid))
    }
}
