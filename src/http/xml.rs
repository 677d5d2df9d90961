//! XML error document
//!
//! Builds the `<EXCEPTION>` envelope returned for every failed request.

use crate::handler::DispatchError;

/// Escape text for embedding in element content or a double-quoted attribute
///
/// `&`, `<`, `>` and `"` are replaced; single quotes are left as is.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a dispatch failure
///
/// `<DEBUGINFO>` is only written when `debug` is set and the failure carries
/// diagnostic detail.
pub fn error_document(err: &DispatchError, debug: bool) -> String {
    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
    doc.push_str(&format!("<EXCEPTION class=\"{}\">\n", escape(err.kind())));
    doc.push_str(&format!("<ERRORCODE>{}</ERRORCODE>\n", escape(err.error_code())));
    doc.push_str(&format!("<MESSAGE>{}</MESSAGE>\n", escape(&err.to_string())));
    if debug {
        if let Some(info) = err.debug_info() {
            doc.push_str(&format!("<DEBUGINFO>{}</DEBUGINFO>\n", escape(&info)));
        }
    }
    doc.push_str("</EXCEPTION>\n");
    doc
}
