//! Sectioned-file codec for the durable server list
//!
//! One section per address, four scalar fields:
//!
//! ```text
//! [1.2.3.4:27000]
//! time = 100
//! name = Foo
//! info = Bar
//! protocol = 3
//! ```
//!
//! `= [ ] ;` are delimiters and must never appear in stored values; the
//! validator rejects them on the way in and [`serialize`] refuses them as a
//! second line of defense. The parser drops malformed sections rather than
//! failing the request, so one corrupt section cannot take the directory down.

use std::collections::BTreeMap;
use std::io;

use crate::models::ServerEntry;
use crate::validate::RESERVED_CHARS;

const FIELD_TIME: &str = "time";
const FIELD_NAME: &str = "name";
const FIELD_INFO: &str = "info";
const FIELD_PROTOCOL: &str = "protocol";

/// Parse the file contents into a directory, skipping malformed sections.
pub fn parse(text: &str) -> BTreeMap<String, ServerEntry> {
    let mut dir = BTreeMap::new();
    let mut current: Option<(String, BTreeMap<String, String>)> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(address) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if let Some((address, fields)) = current.take() {
                if let Some(entry) = build_entry(&address, &fields) {
                    dir.insert(address, entry);
                }
            }
            current = Some((address.to_string(), BTreeMap::new()));
        } else if let Some((_, fields)) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
    if let Some((address, fields)) = current {
        if let Some(entry) = build_entry(&address, &fields) {
            dir.insert(address, entry);
        }
    }

    dir
}

/// Render a directory back to file contents.
///
/// Fails with `InvalidData` if any value smuggled in a delimiter character;
/// nothing is written in that case.
pub fn serialize(dir: &BTreeMap<String, ServerEntry>) -> io::Result<String> {
    let mut out = String::new();
    for (address, entry) in dir {
        check_value(address)?;
        check_value(&entry.name)?;
        check_value(&entry.info)?;
        out.push_str(&format!("[{address}]\n"));
        out.push_str(&format!("{FIELD_TIME} = {}\n", entry.last_heartbeat));
        out.push_str(&format!("{FIELD_NAME} = {}\n", entry.name));
        out.push_str(&format!("{FIELD_INFO} = {}\n", entry.info));
        out.push_str(&format!("{FIELD_PROTOCOL} = {}\n", entry.protocol));
        out.push('\n');
    }
    Ok(out)
}

fn build_entry(address: &str, fields: &BTreeMap<String, String>) -> Option<ServerEntry> {
    let last_heartbeat = fields.get(FIELD_TIME)?.parse().ok()?;
    let protocol = fields.get(FIELD_PROTOCOL)?.parse().ok()?;
    Some(ServerEntry {
        address: address.to_string(),
        name: fields.get(FIELD_NAME)?.clone(),
        info: fields.get(FIELD_INFO)?.clone(),
        protocol,
        last_heartbeat,
    })
}

fn check_value(value: &str) -> io::Result<()> {
    if value.chars().any(|c| RESERVED_CHARS.contains(&c) || c == '\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("value contains a reserved character: {value:?}"),
        ));
    }
    Ok(())
}
