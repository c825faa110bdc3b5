//! Domain name checks and DNS-SD service name splitting.
//!
//! Names are in presentation format: labels separated by `.`, where a
//! literal dot or backslash inside a label is escaped as `\.` or `\\`, and
//! any byte can be written as `\DDD` in decimal.

use crate::error::{Error, Result};

/// Max length of a label, in bytes, not counting the length byte.
pub const LABEL_LEN_MAX: usize = 63;

/// Max length of a domain name in wire format, in bytes.
pub const DOMAIN_NAME_LEN_MAX: usize = 255;

/// Splits `name` into its (still escaped) labels.
///
/// Returns the labels and whether the name ends with the root dot.
fn split_labels(name: &str) -> Option<(Vec<&str>, bool)> {
    let mut labels = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in name.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '.' => {
                if i == start {
                    return None; // empty label
                }
                labels.push(&name[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if escaped {
        return None; // dangling backslash
    }

    let rooted = start == name.len() && !labels.is_empty();
    if !rooted {
        if start == name.len() {
            return None; // empty name
        }
        labels.push(&name[start..]);
    }

    Some((labels, rooted))
}

/// Returns the length in bytes of an escaped label once unescaped.
fn unescaped_len(label: &str) -> Option<usize> {
    let mut len = 0;
    let mut chars = label.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            len += c.len_utf8();
            continue;
        }
        let next = chars.next()?;
        if next.is_ascii_digit() {
            let d2 = chars.next()?.to_digit(10)?;
            let d3 = chars.next()?.to_digit(10)?;
            let value = next.to_digit(10)? * 100 + d2 * 10 + d3;
            if value > 255 {
                return None;
            }
            len += 1;
        } else {
            len += next.len_utf8();
        }
    }

    Some(len)
}

/// Returns the labels of `name` if it is a valid domain name.
fn checked_labels(name: &str) -> Option<(Vec<&str>, bool)> {
    let (labels, rooted) = split_labels(name)?;

    let mut wire_len = 1; // the root label
    for label in labels.iter() {
        let len = unescaped_len(label)?;
        if len > LABEL_LEN_MAX {
            return None;
        }
        wire_len += len + 1;
    }

    if wire_len > DOMAIN_NAME_LEN_MAX {
        return None;
    }

    Some((labels, rooted))
}

/// Checks that `name` is a valid, non-empty domain name.
pub fn check_domain_name(name: &str) -> Result<()> {
    match checked_labels(name) {
        Some(_) => Ok(()),
        None => Err(Error::InvalidDomainName(name.to_string())),
    }
}

/// Splits a Service Instance Name into (instance, service type, domain).
///
/// A Full Name = <Instance>.<Service>.<Domain>, where `<Service>` is
/// `_name._tcp` or `_name._udp`, see
/// [RFC 6763 section 7](https://www.rfc-editor.org/rfc/rfc6763#section-7).
///
/// The service type must have at least two labels starting with `_`, the
/// last one being `_tcp` or `_udp`. A name like `printer._ipp.local` is
/// rejected rather than split into the service type `_ipp` and domain `local`.
///
/// The instance label is returned as written (escapes kept). A trailing
/// root dot is kept on the domain.
///
/// For example, `myprinter._ipp._tcp.local` becomes
/// (`myprinter`, `_ipp._tcp`, `local`).
pub fn service_name_split(fullname: &str) -> Result<(String, String, String)> {
    let bad_name = || Error::BadServiceName(fullname.to_string());

    let (labels, rooted) = checked_labels(fullname).ok_or_else(bad_name)?;
    let (instance, rest) = labels.split_first().ok_or_else(bad_name)?;

    let type_len = rest.iter().take_while(|l| l.starts_with('_')).count();
    if type_len < 2 {
        return Err(bad_name());
    }

    let proto = rest[type_len - 1];
    if !(proto.eq_ignore_ascii_case("_tcp") || proto.eq_ignore_ascii_case("_udp")) {
        return Err(bad_name());
    }

    let domain_labels = &rest[type_len..];
    if domain_labels.is_empty() {
        return Err(bad_name());
    }

    let service_type = rest[..type_len].join(".");
    let mut domain = domain_labels.join(".");
    if rooted {
        domain.push('.');
    }

    Ok((instance.to_string(), service_type, domain))
}
