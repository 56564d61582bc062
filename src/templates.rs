//! Sample document descriptions for testing and demonstration.
//!
//! Each template exercises a different part of the control set.

use serde_json::{json, Value};

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 3] = ["invoice", "report", "long-table"];

/// Look a template up by name.
pub fn by_name(name: &str) -> Option<String> {
    match name {
        "invoice" => Some(invoice_template().to_string()),
        "report" => Some(report_template().to_string()),
        "long-table" => Some(long_table_template(120)),
        _ => None,
    }
}

/// Invoice with a header rule, a weighted four-column table and a footer
/// page number.
pub fn invoice_template() -> &'static str {
    r##"{
  "header": [
    { "type": "text", "text": "Acme Corp", "style": { "size": 16, "bold": true } },
    { "type": "line", "length": "auto", "color": "#1a365d",
      "layout": { "margin": "0 2mm" } }
  ],
  "body": [
    { "type": "text", "text": "Invoice #2024-001",
      "style": { "size": 20, "bold": true }, "color": "#1a365d",
      "layout": { "margin": "0 0 0 4mm" } },
    { "type": "text", "text": "Client Inc, 456 Client Ave, Los Angeles, CA 90001",
      "layout": { "margin": "0 0 0 6mm" } },
    { "type": "table", "columns": 4, "children": [
      { "type": "row", "header": true, "background": "#e2e8f0", "children": [
        { "type": "cell", "width": "3*", "children": [{ "type": "text", "text": "Item", "style": { "bold": true } }] },
        { "type": "cell", "width": "1*", "children": [{ "type": "text", "text": "Qty", "style": { "bold": true } }] },
        { "type": "cell", "width": "1*", "children": [{ "type": "text", "text": "Price", "style": { "bold": true } }] },
        { "type": "cell", "width": "1*", "children": [{ "type": "text", "text": "Total", "style": { "bold": true }, "align": "right" }] }
      ]},
      { "type": "row", "children": [
        { "type": "cell", "children": [{ "type": "text", "text": "Web Development" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "40" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$150.00" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$6,000.00", "align": "right" }] }
      ]},
      { "type": "row", "children": [
        { "type": "cell", "children": [{ "type": "text", "text": "Design Services" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "20" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$125.00" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$2,500.00", "align": "right" }] }
      ]},
      { "type": "row", "children": [
        { "type": "cell", "children": [{ "type": "text", "text": "Hosting (Annual)" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "1" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$500.00" }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$500.00", "align": "right" }] }
      ]},
      { "type": "row", "children": [
        { "type": "cell", "span": 3, "children": [{ "type": "text", "text": "Total", "style": { "bold": true } }] },
        { "type": "cell", "children": [{ "type": "text", "text": "$9,000.00", "style": { "bold": true }, "align": "right" }] }
      ]}
    ]}
  ],
  "footer": [
    { "type": "page_number", "align": "right" }
  ]
}"##
}

/// Report with bordered sections and wrapping paragraphs.
pub fn report_template() -> &'static str {
    r##"{
  "header": [
    { "type": "text", "text": "Quarterly Report", "style": { "size": 18, "bold": true } }
  ],
  "body": [
    { "type": "border", "background": "#f7fafc", "thickness": "1px", "color": "#a0aec0",
      "layout": { "padding": "3mm", "margin": "0 0 0 4mm" },
      "children": [
        { "type": "text", "text": "Executive Summary", "style": { "size": 14, "bold": true } },
        { "type": "text", "text": "Revenue grew by 23% year-over-year, reaching a total of $4.2M for the quarter. Our customer base expanded significantly with notable wins in the enterprise segment." }
      ]
    },
    { "type": "border", "layout": { "padding": "3mm" }, "children": [
      { "type": "text", "text": "Key Highlights", "style": { "size": 14, "bold": true } },
      { "type": "text", "text": "Customer acquisition cost reduced by 15%." },
      { "type": "text", "text": "Net promoter score improved to 72." },
      { "type": "text", "text": "Product reliability reached 99.97% uptime." }
    ]},
    { "type": "line", "length": "50%", "thickness": "2px",
      "layout": { "horizontal": "center", "margin": "0 4mm" } },
    { "type": "text", "text": "This document is confidential. Do not distribute without authorization.",
      "style": { "size": 8, "italic": true }, "color": "#718096", "align": "center" }
  ],
  "footer": [
    { "type": "page_number", "format": "{page} / {pages}", "align": "center" }
  ]
}"##
}

/// A table long enough to span several pages, with a repeating header row.
pub fn long_table_template(rows: usize) -> String {
    let cell = |text: String| json!({ "type": "cell", "children": [{ "type": "text", "text": text }] });
    let mut table_rows: Vec<Value> = vec![json!({
        "type": "row",
        "header": true,
        "background": "#e2e8f0",
        "children": [
            cell("Endpoint".into()),
            cell("Method".into()),
            cell("Description".into()),
        ]
    })];
    table_rows.extend((1..=rows).map(|i| {
        json!({
            "type": "row",
            "children": [
                cell(format!("/api/resource/{i}")),
                cell(if i % 2 == 0 { "GET" } else { "POST" }.to_string()),
                cell(format!("Operation number {i} on the resource collection")),
            ]
        })
    }));

    json!({
        "header": [{ "type": "text", "text": "API Reference", "style": { "size": 14, "bold": true } }],
        "body": [{ "type": "table", "columns": 3, "children": table_rows }],
        "footer": [{ "type": "page_number", "align": "right" }]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::DocumentDescription;

    #[test]
    fn every_template_builds() {
        for name in NAMES {
            let json = by_name(name).unwrap();
            DocumentDescription::from_json(&json)
                .and_then(DocumentDescription::build)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        }
        assert!(by_name("missing").is_none());
    }
}
