//! Output formatter
//!
//! Renders a swept listing as one of two wire representations: an HTML table
//! for humans and a flat quoted-record format for launchers and scripts.
//! Both enumerate the same `(protocol, address, name, info)` tuples.

use crate::models::ServerEntry;

pub const CONTENT_TYPE_TABLE: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_DELIMITED: &str = "text/plain; charset=utf-8";

const COLUMNS: [&str; 4] = ["protocol", "address", "name", "info"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Table,
    Delimited,
}

impl OutputKind {
    /// Map the `format` request parameter to an output kind. Absent means
    /// `Table`; anything unrecognized is `None` and handled as an error by
    /// the caller.
    pub fn resolve(param: Option<&str>) -> Option<Self> {
        match param {
            None | Some("table") => Some(OutputKind::Table),
            Some("delimited") => Some(OutputKind::Delimited),
            Some(_) => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputKind::Table => CONTENT_TYPE_TABLE,
            OutputKind::Delimited => CONTENT_TYPE_DELIMITED,
        }
    }
}

/// Render the listing body for the given kind.
pub fn render(kind: OutputKind, entries: &[ServerEntry]) -> String {
    match kind {
        OutputKind::Table => render_table(entries),
        OutputKind::Delimited => render_delimited(entries),
    }
}

fn render_table(entries: &[ServerEntry]) -> String {
    let mut out = String::from("<html>\n<body>\n<table border=\"1\">\n<tr>");
    for column in COLUMNS {
        out.push_str(&format!("<th>{column}</th>"));
    }
    out.push_str("</tr>\n");
    for entry in entries {
        out.push_str("<tr>");
        out.push_str(&format!("<td>{}</td>", entry.protocol));
        out.push_str(&format!("<td>{}</td>", entry.address));
        out.push_str(&format!("<td>{}</td>", entry.name));
        out.push_str(&format!("<td>{}</td>", entry.info));
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn render_delimited(entries: &[ServerEntry]) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.map(|c| format!("\"{c}\"")).join(","));
    out.push('\n');
    for entry in entries {
        out.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\"\n",
            entry.protocol, entry.address, entry.name, entry.info
        ));
    }
    out
}
