//! Staged document composition

use crate::format::PrintFormat;

/// Build the full document written into a staging surface.
///
/// `body` is the cloned content's inner markup and is inserted verbatim.
pub fn compose(format: PrintFormat, body: &str) -> String {
    let mut doc = String::with_capacity(body.len() + format.stylesheet().len() + 160);
    doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    doc.push_str("<meta charset=\"utf-8\">\n");
    doc.push_str(&format!("<title>Print {}</title>\n", format.label()));
    doc.push_str("<style>");
    doc.push_str(format.stylesheet());
    doc.push_str("</style>\n</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("\n</body>\n</html>\n");
    doc
}
