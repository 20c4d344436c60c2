//! Email body flattening: visible text and table cells.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::rules::patterns::WHITESPACE;

/// Elements whose content is never visible.
const HIDDEN: &[&str] = &["head", "script", "style", "title", "noscript"];

/// Elements that end a line of visible text.
const BLOCK: &[&str] = &[
    "p", "div", "tr", "li", "ul", "ol", "table", "tbody", "thead", "tfoot", "section", "header",
    "footer", "article", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "pre",
];

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(
        r"(?i)<\s*(?:html|body|table|tr|td|div|p|br|span)\b"
    ).unwrap();

    static ref TABLE: Selector = Selector::parse("table").unwrap();
    static ref ROW: Selector = Selector::parse("tr").unwrap();
}

/// A table as rows of `<td>` cell texts, header row removed.
pub type TableRows = Vec<Vec<String>>;

/// A parsed email body.
///
/// HTML bodies are flattened to their visible text with one line per block
/// element; plain-text bodies are used as-is and have no tables.
#[derive(Debug, Clone, Default)]
pub struct EmailDocument {
    text: String,
    tables: Vec<TableRows>,
}

impl EmailDocument {
    /// Parse an email body. Markup errors are tolerated; the result is
    /// whatever the HTML parser recovered.
    pub fn parse(body: &str) -> Self {
        if !HTML_TAG.is_match(body) {
            return Self {
                text: body.to_string(),
                tables: Vec::new(),
            };
        }

        let html = Html::parse_document(body);
        let root = html.root_element();

        let mut text = String::new();
        collect_text(root, &mut text);

        let tables = html.select(&TABLE).map(table_rows).collect();

        Self { text, tables }
    }

    /// Visible text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tables in document order. Nested tables are listed on their own and
    /// their rows do not belong to the enclosing table.
    pub fn tables(&self) -> &[TableRows] {
        &self.tables
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }

        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if HIDDEN.contains(&name) {
            continue;
        }
        if name == "br" {
            out.push('\n');
            continue;
        }

        collect_text(child, out);

        if BLOCK.contains(&name) {
            out.push('\n');
        } else if name == "td" || name == "th" {
            out.push(' ');
        }
    }
}

fn table_rows(table: ElementRef<'_>) -> TableRows {
    table
        .select(&ROW)
        .filter(|row| owned_by(*row, table))
        .skip(1)
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| cell.value().name().eq_ignore_ascii_case("td"))
                .map(cell_text)
                .collect()
        })
        .collect()
}

/// Whether `table` is the nearest table ancestor of `row`.
fn owned_by(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(cell, &mut raw);
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_body() {
        let doc = EmailDocument::parse("收件人：王小明\n能量棒 x2 $300");
        assert_eq!(doc.text(), "收件人：王小明\n能量棒 x2 $300");
        assert!(doc.tables().is_empty());
    }

    #[test]
    fn test_visible_text_lines() {
        let doc = EmailDocument::parse(
            "<html><head><title>t</title><style>p{}</style></head><body>\
             <p>收件人：王小明</p><div>電話：0912<br>手機：0988</div>\
             <script>var x = 1;</script></body></html>",
        );
        let lines: Vec<&str> = doc.text().lines().collect();
        assert_eq!(lines, vec!["收件人：王小明", "電話：0912", "手機：0988"]);
    }

    #[test]
    fn test_entities_decoded() {
        let doc = EmailDocument::parse("<p>A &amp; B&nbsp;C</p>");
        assert!(doc.text().contains("A & B\u{a0}C"));
    }

    #[test]
    fn test_table_rows_skip_header() {
        let doc = EmailDocument::parse(
            "<table>\
             <tr><th>商品</th><th>數量</th><th>金額</th></tr>\
             <tr><td> 能量膠 -\n 柑橘口味 </td><td>3</td><td>NT$450</td></tr>\
             </table>",
        );
        assert_eq!(
            doc.tables(),
            &[vec![vec![
                "能量膠 - 柑橘口味".to_string(),
                "3".to_string(),
                "NT$450".to_string()
            ]]]
        );
    }

    #[test]
    fn test_nested_tables_are_separate() {
        let doc = EmailDocument::parse(
            "<table>\
             <tr><td>layout</td></tr>\
             <tr><td><table>\
               <tr><th>商品</th></tr>\
               <tr><td>A</td><td>1</td><td>10</td></tr>\
             </table></td></tr>\
             </table>",
        );
        let tables = doc.tables();
        assert_eq!(tables.len(), 2);
        // outer table keeps only its own second row (a single layout cell)
        assert_eq!(tables[0].len(), 1);
        assert_eq!(tables[0][0].len(), 1);
        assert_eq!(tables[1], vec![vec!["A".to_string(), "1".to_string(), "10".to_string()]]);
    }
}
