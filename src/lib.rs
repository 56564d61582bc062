//! # folio – Measure/Arrange/Render document layout
//!
//! This crate lays out trees of controls onto fixed-size pages and renders
//! the result as PDF or PNG. The pipeline stages are:
//!
//! 1. **Describe** – JSON description → control tree ([`description`])
//! 2. **Layout** – measure and arrange controls, negotiating table column
//!    widths ([`control`])
//! 3. **Paginate** – paint once into virtual canvases, replay per page
//!    ([`pagination`]) into a frozen [`layout_config::LayoutConfig`]
//! 4. **Render** – emit PDF bytes via printpdf ([`render`]) or PNG pages via
//!    tiny-skia ([`raster`])

pub mod canvas;
pub mod control;
pub mod description;
pub mod document;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use document::{Document, Zone};
pub use error::{LayoutError, Result};
pub use pagination::Generator;
pub use pipeline::{
    compute_layout_config, generate_pdf, generate_png_pages, PageOrientation, PipelineConfig,
};
