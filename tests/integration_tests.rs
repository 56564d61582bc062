//! Integration tests for the folio pipeline.
//!
//! These tests validate:
//! - Table scenarios through the public generator
//! - PDF and PNG output exist and have valid format
//! - Pagination, header repetition and page numbers
//! - Deterministic layout output

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use sha2::{Digest, Sha256};

use folio::control::{Control, Image, Line, Table, TableCell, TableRow, TextBlock};
use folio::description::DocumentDescription;
use folio::fonts::FontManager;
use folio::geometry::{Length, Rectangle, Size, Thickness};
use folio::layout_config::{LayoutConfig, PageCommand};
use folio::pipeline::{
    compute_layout_config, generate_pdf, generate_png_pages, layout_document, PipelineConfig,
};
use folio::render::render_pdf;
use folio::style::Color;
use folio::{templates, Document, Generator, LayoutError, Zone};

// =====================================================================
// Helper
// =====================================================================

fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// A 200×200 px page with no margins at 96 dpi.
fn square_page(fonts: &FontManager) -> Generator<'_> {
    Generator::new(fonts, 96.0, Size::new(200.0, 200.0), Thickness::default())
}

fn fixed_cell(width: f32, height: f32) -> TableCell {
    let mut cell = TableCell::new();
    cell.layout.width = Some(Length::px(width));
    cell.layout.height = Some(Length::px(height));
    cell
}

fn take_table(document: &mut Document) -> Table {
    let control = document.body.remove(0);
    *control.into_any().downcast::<Table>().ok().unwrap()
}

fn rects(config: &LayoutConfig, page: usize) -> Vec<[f32; 4]> {
    config.pages[page]
        .commands
        .iter()
        .filter_map(|c| match c {
            PageCommand::Rect { rect, .. } => Some(*rect),
            _ => None,
        })
        .collect()
}

// =====================================================================
// Table scenarios
// =====================================================================

#[test]
fn two_fixed_cells_fill_the_page_width() {
    let fonts = FontManager::default();
    let mut doc = Document::new();
    doc.push(
        Zone::Body,
        Table::new().row(TableRow::new().cell(fixed_cell(100.0, 100.0)).cell(fixed_cell(100.0, 100.0))),
    );
    square_page(&fonts).paint(&mut doc).unwrap();

    let table = take_table(&mut doc);
    assert_eq!(
        table.rows()[0].cell_bounds(),
        [
            Some(Rectangle::new(0.0, 0.0, 100.0, 100.0)),
            Some(Rectangle::new(100.0, 0.0, 100.0, 100.0)),
        ]
    );
}

#[test]
fn oversized_columns_shrink_proportionally() {
    let fonts = FontManager::default();
    let mut doc = Document::new();
    let cell = || TableCell::new().child(Line::horizontal(Length::px(2000.0))).unwrap();
    doc.push(Zone::Body, Table::new().row(TableRow::new().cell(cell()).cell(cell())));
    square_page(&fonts).paint(&mut doc).unwrap();

    let table = take_table(&mut doc);
    assert_eq!(table.column_widths(), [100.0, 100.0]);
}

#[test]
fn stacked_rows_accumulate_tops() {
    let fonts = FontManager::default();
    let mut doc = Document::new();
    doc.push(
        Zone::Body,
        Table::new()
            .row(TableRow::header().cell(fixed_cell(10.0, 25.0)))
            .row(TableRow::new().cell(fixed_cell(10.0, 50.0)))
            .row(TableRow::new().cell(fixed_cell(10.0, 50.0))),
    );
    let generator = Generator::new(&fonts, 96.0, Size::new(200.0, 125.0), Thickness::default());
    let painted = generator.paint(&mut doc).unwrap();
    assert_eq!(painted.page_count(), 1);

    let table = take_table(&mut doc);
    let tops: Vec<f32> = table.placements().iter().map(|p| p.top).collect();
    assert_eq!(tops, vec![0.0, 25.0, 75.0]);
    assert!(table.placements().iter().all(|p| !p.repeated));
}

#[test]
fn empty_table_splits_the_width_evenly() {
    let fonts = FontManager::default();
    let mut doc = Document::new();
    doc.push(Zone::Body, Table::new().with_columns(4));
    let painted = square_page(&fonts).paint(&mut doc).unwrap();
    assert_eq!(painted.body_height(), 0.0);

    let table = take_table(&mut doc);
    assert_eq!(table.column_widths(), [50.0, 50.0, 50.0, 50.0]);
    assert_eq!(table.column_widths().iter().sum::<f32>(), 200.0);
}

#[test]
fn cell_backgrounds_land_on_the_page() {
    let fonts = FontManager::default();
    let mut doc = Document::new();
    let filled = |w: f32| {
        let mut cell = fixed_cell(w, 40.0);
        cell.background = Some(Color::rgb(200, 200, 200));
        cell
    };
    doc.push(Zone::Body, Table::new().row(TableRow::new().cell(filled(100.0)).cell(filled(100.0))));
    let config = square_page(&fonts).generate(&mut doc).unwrap();
    assert_eq!(
        rects(&config, 0),
        vec![[0.0, 0.0, 100.0, 40.0], [100.0, 0.0, 100.0, 40.0]]
    );
}

#[test]
fn padded_description_cell_fills_its_row() {
    let fonts = FontManager::default();
    let mut doc = DocumentDescription::from_json(
        r##"{ "body": [{ "type": "table", "children": [
            { "type": "row", "children": [
                { "type": "cell", "width": "1*", "background": "#cccccc", "layout": { "padding": "2px" } },
                { "type": "cell", "width": "1*", "layout": { "height": "80px" } }
            ]}
        ]}]}"##,
    )
    .and_then(DocumentDescription::build)
    .unwrap();
    let config = square_page(&fonts).generate(&mut doc).unwrap();
    assert_eq!(rects(&config, 0), vec![[0.0, 0.0, 100.0, 80.0]]);

    let table = take_table(&mut doc);
    assert_eq!(table.rows()[0].height(), 80.0);
    assert_eq!(
        table.rows()[0].cells()[0].arrangement(),
        Rectangle::new(0.0, 0.0, 100.0, 80.0)
    );
}

// =====================================================================
// Pagination
// =====================================================================

#[test]
fn long_table_repeats_its_header_on_every_page() {
    let json = templates::long_table_template(150);
    let config = compute_layout_config(&json, &default_config()).unwrap();
    let pages = config.pages.len();
    assert!(pages >= 2, "expected several pages, got {pages}");

    for page in 0..pages {
        let texts = config.texts(page);
        assert!(texts.contains(&"API Reference"), "page {page}");
        assert!(texts.contains(&"Endpoint"), "page {page} lost the header row");
        let label = format!("Page {} of {pages}", page + 1);
        assert!(texts.contains(&label.as_str()), "page {page}: {texts:?}");
    }
}

#[test]
fn smaller_pages_never_need_fewer_pages() {
    let json = templates::long_table_template(80);
    let mut previous = 0;
    for height_mm in [297.0, 250.0, 200.0, 150.0, 120.0] {
        let config = PipelineConfig {
            page_height_mm: height_mm,
            ..default_config()
        };
        let pages = compute_layout_config(&json, &config).unwrap().pages.len();
        assert!(pages >= previous, "{height_mm}mm: {pages} < {previous}");
        previous = pages;
    }
}

#[test]
fn empty_document_still_has_one_page() {
    let config = compute_layout_config("{}", &default_config()).unwrap();
    assert_eq!(config.pages.len(), 1);
    assert!(config.pages[0].commands.is_empty());
    let bytes = render_pdf(&config).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn margins_offset_every_command() {
    let json = r#"{ "body": [{ "type": "text", "text": "Hello" }] }"#;
    let config = PipelineConfig {
        margin: Thickness::uniform(Length::px(30.0)),
        ..default_config()
    };
    let layout = compute_layout_config(json, &config).unwrap();
    match &layout.pages[0].commands[0] {
        PageCommand::Text { x, y, clip, .. } => {
            assert_eq!((*x, *y), (30.0, 30.0));
            assert_eq!((clip[0], clip[1]), (30.0, 30.0));
        }
        other => panic!("expected text, got {other:?}"),
    }
}

// =====================================================================
// Errors
// =====================================================================

#[test]
fn a_row_outside_a_table_is_detached() {
    let json = r#"{ "body": [{ "type": "row", "children": [{ "type": "cell" }] }] }"#;
    let err = compute_layout_config(json, &default_config()).unwrap_err();
    assert!(matches!(err, LayoutError::DetachedRow { .. }), "{err}");
}

#[test]
fn cells_cannot_sit_directly_in_tables() {
    let json = r#"{ "body": [{ "type": "table", "children": [{ "type": "cell" }] }] }"#;
    let err = compute_layout_config(json, &default_config()).unwrap_err();
    assert!(matches!(err, LayoutError::StructuralViolation { .. }), "{err}");
}

#[test]
fn oversized_header_and_footer_are_capped() {
    let fonts = FontManager::default();
    let mut doc = Document::new();
    let mut tall = TextBlock::new("tall");
    tall.layout.height = Some(Length::px(500.0));
    doc.push(Zone::Header, tall);
    doc.push(Zone::Body, TextBlock::new("body"));
    let painted = square_page(&fonts).paint(&mut doc).unwrap();
    assert_eq!(painted.zones().header, 50.0);
    assert_eq!(painted.zones().body, 150.0);
}

// =====================================================================
// Output
// =====================================================================

#[test]
fn all_templates_render_successfully() {
    for name in templates::NAMES {
        let json = templates::by_name(name).unwrap();
        let (bytes, layout) = generate_pdf(&json, &default_config())
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_valid_pdf(&bytes);
        assert!(!layout.pages.is_empty());
    }
}

#[test]
fn landscape_pages_are_wider_than_tall() {
    let (_, layout) = generate_pdf(templates::invoice_template(), &PipelineConfig::a4_landscape()).unwrap();
    assert!(layout.page_width > layout.page_height);
}

#[test]
fn png_pages_match_pdf_pages() {
    let json = templates::long_table_template(150);
    let pdf_pages = compute_layout_config(&json, &default_config()).unwrap().pages.len();
    let pngs = generate_png_pages(&json, &default_config()).unwrap();
    assert_eq!(pngs.len(), pdf_pages);
    for png in &pngs {
        assert_eq!(&png[1..4], b"PNG");
    }
}

#[test]
fn images_are_embedded() {
    let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([0, 128, 255, 255]));
    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let src = format!("data:image/png;base64,{}", BASE64_STD.encode(&png));

    let fonts = FontManager::default();
    let mut doc = Document::new();
    doc.push(Zone::Body, Image::new(src.clone()));
    let layout = layout_document(&mut doc, &default_config(), &fonts).unwrap();
    let image = layout.pages[0].commands.iter().find_map(|c| match c {
        PageCommand::Image { rect, src: s, .. } => Some((*rect, s.clone())),
        _ => None,
    });
    let (rect, embedded) = image.unwrap();
    assert_eq!((rect[2], rect[3]), (8.0, 4.0));
    assert_eq!(embedded, src);
    assert_valid_pdf(&render_pdf(&layout).unwrap());
}

#[test]
fn layout_config_json_roundtrip() {
    let layout = compute_layout_config(templates::report_template(), &default_config()).unwrap();
    let json = layout.to_json().unwrap();
    let back = LayoutConfig::from_json(&json).unwrap();
    assert_eq!(back, layout);
    assert_valid_pdf(&render_pdf(&back).unwrap());
}

// =====================================================================
// Golden-sample stability test
// =====================================================================

#[test]
fn layout_output_is_deterministic() {
    let digest = || {
        let layout = compute_layout_config(templates::invoice_template(), &default_config()).unwrap();
        Sha256::digest(layout.to_json().unwrap().as_bytes())
    };
    assert_eq!(digest(), digest());
}
