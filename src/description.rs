//! Document description – a serde binding for resolved control trees.
//!
//! Every node names its control type and carries fully resolved parameters;
//! there are no expressions or data lookups. Trees are built through the
//! container `add` API, so a description that nests controls illegally fails
//! with the same structural errors as code that does.
//!
//! ```json
//! {
//!   "body": [
//!     { "type": "table", "columns": 2, "children": [
//!       { "type": "row", "header": true, "children": [
//!         { "type": "cell", "children": [{ "type": "text", "text": "Item" }] },
//!         { "type": "cell", "children": [{ "type": "text", "text": "Qty" }] }
//!       ]}
//!     ]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::control::{
    add_child, BoxModel, Border, Control, ControlKind, Image, Line, Orientation, PageNumber, Table,
    TableCell, TableRow, TextAlign, TextBlock,
};
use crate::document::{Document, Zone};
use crate::error::{LayoutError, Result};
use crate::geometry::{ColumnLength, HorizontalAlignment, Length, Thickness, VerticalAlignment};
use crate::style::{Color, TextStyle};

/// The three zones of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentDescription {
    pub header: Vec<NodeDescription>,
    pub body: Vec<NodeDescription>,
    pub footer: Vec<NodeDescription>,
}

/// One control plus its box parameters and children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    #[serde(flatten)]
    pub control: ControlDescription,
    #[serde(default)]
    pub layout: Option<LayoutDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDescription>,
}

/// Box parameters for a node. Only the fields present are applied, so a
/// control keeps its own defaults (a cell stretching to its row) for the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Thickness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Thickness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<bool>,
}

impl LayoutDescription {
    /// Overwrite the parameters this description sets.
    pub fn apply(&self, layout: &mut BoxModel) {
        if let Some(margin) = self.margin {
            layout.margin = margin;
        }
        if let Some(padding) = self.padding {
            layout.padding = padding;
        }
        if let Some(horizontal) = self.horizontal {
            layout.horizontal = horizontal;
        }
        if let Some(vertical) = self.vertical {
            layout.vertical = vertical;
        }
        if self.width.is_some() {
            layout.width = self.width;
        }
        if self.height.is_some() {
            layout.height = self.height;
        }
        if let Some(clip) = self.clip {
            layout.clip = clip;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlDescription {
    Text {
        text: String,
        #[serde(default)]
        style: TextStyle,
        #[serde(default)]
        color: Option<Color>,
        #[serde(default)]
        align: TextAlign,
    },
    Line {
        #[serde(default)]
        orientation: Orientation,
        #[serde(default)]
        length: Option<Length>,
        #[serde(default)]
        thickness: Option<Length>,
        #[serde(default)]
        color: Option<Color>,
    },
    Image {
        src: String,
    },
    PageNumber {
        #[serde(default)]
        format: Option<String>,
        #[serde(default)]
        style: TextStyle,
        #[serde(default)]
        color: Option<Color>,
        #[serde(default)]
        align: TextAlign,
    },
    Border {
        #[serde(default)]
        background: Option<Color>,
        #[serde(default)]
        thickness: Option<Length>,
        #[serde(default)]
        color: Option<Color>,
    },
    Table {
        #[serde(default)]
        columns: usize,
    },
    Row {
        #[serde(default)]
        header: bool,
        #[serde(default)]
        background: Option<Color>,
    },
    Cell {
        #[serde(default = "default_span")]
        span: u32,
        #[serde(default)]
        width: ColumnLength,
        #[serde(default)]
        background: Option<Color>,
    },
}

fn default_span() -> u32 {
    1
}

impl DocumentDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the control tree. Fails on the first structural error.
    pub fn build(self) -> Result<Document> {
        let mut document = Document::new();
        for (zone, nodes) in [
            (Zone::Header, self.header),
            (Zone::Body, self.body),
            (Zone::Footer, self.footer),
        ] {
            for node in nodes {
                document.push_boxed(zone, node.build()?);
            }
        }
        Ok(document)
    }
}

impl NodeDescription {
    /// Build this node and, through `add`, its children.
    pub fn build(self) -> Result<Box<dyn Control>> {
        let mut control = self.control.instantiate(self.layout.as_ref())?;
        for child in self.children {
            add_child(control.as_mut(), child.build()?)?;
        }
        Ok(control)
    }
}

impl ControlDescription {
    fn instantiate(self, layout: Option<&LayoutDescription>) -> Result<Box<dyn Control>> {
        let apply = |target: &mut BoxModel| {
            if let Some(layout) = layout {
                layout.apply(target);
            }
        };
        let control: Box<dyn Control> = match self {
            ControlDescription::Text {
                text,
                style,
                color,
                align,
            } => {
                let mut block = TextBlock::new(text).with_style(style);
                block.color = color.unwrap_or(Color::BLACK);
                block.align = align;
                apply(&mut block.layout);
                Box::new(block)
            }
            ControlDescription::Line {
                orientation,
                length,
                thickness,
                color,
            } => {
                let mut line = Line::new(orientation, length.unwrap_or(Length::AUTO));
                if let Some(thickness) = thickness {
                    line.thickness = thickness;
                }
                if let Some(color) = color {
                    line.color = color;
                }
                apply(&mut line.layout);
                Box::new(line)
            }
            ControlDescription::Image { src } => {
                let mut image = Image::new(src);
                apply(&mut image.layout);
                Box::new(image)
            }
            ControlDescription::PageNumber {
                format,
                style,
                color,
                align,
            } => {
                let mut number = match format {
                    Some(format) => PageNumber::with_format(format),
                    None => PageNumber::new(),
                };
                number.style = style;
                number.color = color.unwrap_or(Color::BLACK);
                number.align = align;
                apply(&mut number.layout);
                Box::new(number)
            }
            ControlDescription::Border {
                background,
                thickness,
                color,
            } => {
                let mut border = Border::new();
                border.background = background;
                if let Some(thickness) = thickness {
                    border = border.with_outline(thickness, color.unwrap_or(Color::BLACK));
                }
                apply(&mut border.layout);
                Box::new(border)
            }
            ControlDescription::Table { columns } => {
                let mut table = Table::new().with_columns(columns);
                apply(&mut table.layout);
                Box::new(table)
            }
            ControlDescription::Row { header, background } => {
                if layout.is_some() {
                    return Err(LayoutError::UnsupportedLayout {
                        control: if header {
                            ControlKind::TableHeader
                        } else {
                            ControlKind::TableRow
                        },
                    });
                }
                let mut row = if header { TableRow::header() } else { TableRow::new() };
                row.background = background;
                Box::new(row)
            }
            ControlDescription::Cell {
                span,
                width,
                background,
            } => {
                let mut cell = TableCell::new().with_span(span).with_width(width);
                cell.background = background;
                apply(&mut cell.layout);
                Box::new(cell)
            }
        };
        Ok(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_table_tree() {
        let doc = DocumentDescription::from_json(
            r#"{
                "header": [{ "type": "text", "text": "Report", "align": "center" }],
                "body": [
                    { "type": "table", "columns": 3, "children": [
                        { "type": "row", "header": true, "children": [
                            { "type": "cell", "width": "2*", "children": [{ "type": "text", "text": "Name" }] },
                            { "type": "cell", "span": 2, "children": [{ "type": "text", "text": "Value" }] }
                        ]}
                    ]}
                ],
                "footer": [{ "type": "page_number", "format": "{page}/{pages}" }]
            }"#,
        )
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(doc.header.len(), 1);
        assert_eq!(doc.footer[0].kind(), ControlKind::PageNumber);
        let table = &doc.body[0];
        assert_eq!(table.kind(), ControlKind::Table);
        let rows = table.as_container().unwrap().children();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind(), ControlKind::TableHeader);
        assert_eq!(rows[0].as_container().unwrap().children().len(), 2);
    }

    #[test]
    fn box_parameters_are_read() {
        let doc = DocumentDescription::from_json(
            r##"{ "body": [{
                "type": "border",
                "background": "#eeeeee",
                "thickness": "1px",
                "layout": { "margin": "4px", "padding": "2mm", "horizontal": "center", "width": "50%" },
                "children": [{ "type": "line", "length": "auto" }]
            }]}"##,
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(doc.body[0].kind(), ControlKind::Border);
        assert_eq!(doc.body[0].as_container().unwrap().children().len(), 1);
    }

    #[test]
    fn illegal_nesting_is_a_structural_error() {
        let err = DocumentDescription::from_json(
            r#"{ "body": [{ "type": "table", "children": [{ "type": "text", "text": "x" }] }] }"#,
        )
        .unwrap()
        .build()
        .err()
        .unwrap();
        assert!(matches!(
            err,
            LayoutError::StructuralViolation {
                parent: ControlKind::Table,
                child: ControlKind::TextBlock,
                position: 0
            }
        ));
    }

    #[test]
    fn leaves_refuse_children() {
        let err = DocumentDescription::from_json(
            r#"{ "body": [{ "type": "text", "text": "x", "children": [{ "type": "text", "text": "y" }] }] }"#,
        )
        .unwrap()
        .build()
        .err()
        .unwrap();
        assert!(matches!(err, LayoutError::UnsupportedChild { .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            DocumentDescription::from_json("{ \"body\": [ { \"type\": \"nope\" } ] }"),
            Err(LayoutError::Description(_))
        ));
    }

    #[test]
    fn partial_layout_keeps_control_defaults() {
        let doc = DocumentDescription::from_json(
            r#"{ "body": [{ "type": "table", "children": [
                { "type": "row", "children": [
                    { "type": "cell", "layout": { "padding": "2px" } }
                ]}
            ]}]}"#,
        )
        .unwrap()
        .build()
        .unwrap();
        let table = doc.body.into_iter().next().unwrap();
        let table = table.into_any().downcast::<Table>().ok().unwrap();
        let cell = &table.rows()[0].cells()[0];
        assert_eq!(cell.layout.vertical, VerticalAlignment::Stretch);
        assert_eq!(cell.layout.padding, Thickness::uniform(Length::px(2.0)));
    }

    #[test]
    fn rows_reject_box_parameters() {
        let err = DocumentDescription::from_json(
            r#"{ "body": [{ "type": "table", "children": [
                { "type": "row", "layout": { "height": "500px" }, "children": [{ "type": "cell" }] }
            ]}]}"#,
        )
        .unwrap()
        .build()
        .err()
        .unwrap();
        assert!(matches!(
            err,
            LayoutError::UnsupportedLayout {
                control: ControlKind::TableRow
            }
        ));
    }

    #[test]
    fn unknown_layout_keys_are_rejected() {
        assert!(matches!(
            DocumentDescription::from_json(
                r#"{ "body": [{ "type": "text", "text": "x", "layout": { "hieght": "5px" } }] }"#
            ),
            Err(LayoutError::Description(_))
        ));
    }
}
