//! Registration validation
//!
//! A rejected registration is dropped silently at the request boundary: the
//! directory state is left untouched and the caller gets no error. That
//! policy is deliberate (cheap anti-abuse), so rejection is an explicit
//! outcome here rather than a swallowed failure.

use thiserror::Error;

/// Maximum length of the `name` and `info` fields
pub const MAX_FIELD_LEN: usize = 16;

/// Characters reserved by the persisted-format delimiters
pub const RESERVED_CHARS: [char; 4] = ['=', '[', ']', ';'];

/// Why a registration was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is empty")]
    Empty(&'static str),
    #[error("field `{0}` exceeds {MAX_FIELD_LEN} characters")]
    TooLong(&'static str),
    #[error("field `{0}` contains a reserved character")]
    ReservedChar(&'static str),
    #[error("field `{0}` is not numeric")]
    NotNumeric(&'static str),
}

/// A registration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub info: String,
    pub port: u16,
    pub protocol: u32,
}

/// Validate the fields of an announce/update request.
pub fn registration(
    name: Option<&str>,
    info: Option<&str>,
    port: Option<&str>,
    protocol: Option<&str>,
) -> Result<Registration, Rejection> {
    let name = text_field("name", name)?;
    let info = text_field("info", info)?;
    let port = numeric_field::<u16>("port", port)?;
    let protocol = numeric_field::<u32>("protocol", protocol)?;

    Ok(Registration {
        name: escape(name),
        info: escape(info),
        port,
        protocol,
    })
}

/// Backslash-escape quote characters so stored values never break the quoted
/// framing of the delimited listing. Length is checked on the raw input, so
/// an escaped value may exceed [`MAX_FIELD_LEN`] on disk.
fn escape(value: &str) -> String {
    value.replace('\'', "\\'").replace('"', "\\\"")
}

/// Validate a port on its own. The removal path only needs the address key,
/// never the other fields.
pub fn port(value: Option<&str>) -> Option<u16> {
    numeric_field("port", value).ok()
}

fn text_field<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, Rejection> {
    let value = value.ok_or(Rejection::MissingField(field))?;
    if value.is_empty() {
        return Err(Rejection::Empty(field));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(Rejection::TooLong(field));
    }
    if value.chars().any(|c| RESERVED_CHARS.contains(&c)) {
        return Err(Rejection::ReservedChar(field));
    }
    Ok(value)
}

fn numeric_field<T: std::str::FromStr>(
    field: &'static str,
    value: Option<&str>,
) -> Result<T, Rejection> {
    let value = value.ok_or(Rejection::MissingField(field))?;
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Rejection::NotNumeric(field));
    }
    // Digits only, so the parse can only fail on overflow
    value.parse().map_err(|_| Rejection::NotNumeric(field))
}
