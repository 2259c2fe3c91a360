//! # Worksheet Module
//!
//! Renders an order as a printable fabrication worksheet (PDF) using Typst:
//! one table row per panel with every cut measurement the shop needs.
//!
//! ## Architecture
//!
//! - The Typst template is embedded as a string constant
//! - Order data is injected via string formatting before compilation
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! Presentation rules carried over from the paper worksheet this replaces:
//! double-leaf rows mark the handle and pleat cells with `(x2)` (one cut per
//! leaf), rope length is floored to whole centimeters, and window rows show
//! `-` in the short-rail column because the measurement does not exist for
//! windows.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use fab_core::order::Order;
//! use fab_core::worksheet::render_order_pdf;
//!
//! let order = Order::new("Riverside Apartments", NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(), None);
//! let pdf_bytes = render_order_pdf(&order).unwrap();
//! std::fs::write("riverside_worksheet.pdf", pdf_bytes).unwrap();
//! ```

use chrono::Utc;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{FabError, FabResult};
use crate::formula::CutSheet;
use crate::order::{LineItem, Order};

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct WorksheetWorld {
    /// The main source document
    main: Source,
    /// Font book
    book: LazyHash<FontBook>,
    /// Available fonts
    fonts: Vec<Font>,
    /// Library (standard functions)
    library: LazyHash<Library>,
}

impl WorksheetWorld {
    fn new(source: String) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        WorksheetWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }

    fn load_fonts() -> Vec<Font> {
        let mut fonts = Vec::new();
        for font_bytes in typst_assets::fonts() {
            let buffer = Bytes::new(font_bytes.to_vec());
            for font in Font::iter(buffer) {
                fonts.push(font);
            }
        }
        fonts
    }
}

impl World for WorksheetWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Worksheet Template
// ============================================================================

/// Typst template for the fabrication worksheet (landscape A4)
const WORKSHEET_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  flipped: true,
  margin: (top: 1.2cm, bottom: 1.4cm, left: 1.2cm, right: 1.2cm),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(2pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 8pt)[Site: #"{{SITE}}"]],
      align(center)[#text(size: 8pt)[Page #counter(page).display()]],
      align(right)[#text(size: 8pt)[Printed {{PRINT_DATE}}]],
    )
  ]
)

#set text(size: 9pt)

#text(size: 16pt, weight: "bold")[Work Order: #"{{SITE}}"]
#v(2pt)
#text(size: 10pt)[
  Start date: {{START_DATE}}
  #h(0.8cm) Status: {{STATUS}}
  #h(0.8cm) Panels: {{TOTAL}} ({{DOORS}} door, {{WINDOWS}} window)
]
#v(8pt)

#table(
  columns: 15,
  inset: 4pt,
  stroke: 0.5pt,
  align: center,
  table.header(
    [*\#*], [*Type*], [*Frame*], [*Mesh*], [*W*], [*H*],
    [*Handle*], [*Side rail*], [*Top/Bot*], [*Short*], [*Net*],
    [*Pleats*], [*Drill*], [*Rope*], [*Cords*],
  ),
{{ROWS}}
)
"##;

// ============================================================================
// Rendering
// ============================================================================

/// Render an order to a worksheet PDF.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(FabError::RenderError)` - If compilation fails
pub fn render_order_pdf(order: &Order) -> FabResult<Vec<u8>> {
    let source = WORKSHEET_TEMPLATE
        .replace("{{SITE}}", &escape_string(&order.meta.site_name))
        .replace(
            "{{START_DATE}}",
            &order.meta.start_date.format("%Y-%m-%d").to_string(),
        )
        .replace("{{STATUS}}", order.status.display_name())
        .replace("{{TOTAL}}", &order.item_count().to_string())
        .replace("{{DOORS}}", &order.door_count().to_string())
        .replace("{{WINDOWS}}", &order.window_count().to_string())
        .replace(
            "{{PRINT_DATE}}",
            &Utc::now().format("%Y-%m-%d").to_string(),
        )
        .replace("{{ROWS}}", &worksheet_rows(order));

    let world = WorksheetWorld::new(source);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        FabError::render_error(format!("Typst compilation failed: {}", messages.join("; ")))
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        FabError::render_error(format!("PDF rendering failed: {}", messages.join("; ")))
    })?;

    Ok(pdf_bytes)
}

/// Build the table-row cells for every line item.
fn worksheet_rows(order: &Order) -> String {
    let mut rows = String::new();
    for (index, item) in order.items.iter().enumerate() {
        rows.push_str("  ");
        rows.push_str(&item_row(index + 1, item));
        rows.push('\n');
    }
    rows
}

/// One worksheet row: 15 comma-separated Typst cells.
fn item_row(row_number: usize, item: &LineItem) -> String {
    let mut cells: Vec<String> = Vec::with_capacity(15);

    cells.push(format!("[{}]", row_number));
    cells.push(text_cell(&type_cell(item)));
    cells.push(text_cell(&item.frame_color));
    cells.push(text_cell(&item.mesh_color));
    cells.push(format!("[{:.1}]", item.spec.width));
    cells.push(format!("[{:.1}]", item.spec.height));

    match &item.cuts {
        CutSheet::Framed(cuts) => {
            // One cut per leaf: double panels get the (x2) marker on the
            // handle and pleat cells.
            let suffix = if cuts.double_leaf { " (x2)" } else { "" };
            cells.push(format!("[{:.1}{}]", cuts.handle, suffix));
            cells.push(format!("[{:.1}]", cuts.frame_rail));
            cells.push(format!("[{:.1}]", cuts.top_bottom_rail));
            cells.push(match cuts.short_rail {
                Some(short) => format!("[{:.1}]", short),
                None => "[-]".to_string(),
            });
            cells.push(format!("[{:.1}]", cuts.net_size));
            cells.push(format!("[{}{}]", cuts.cut_count, suffix));
            cells.push(format!("[{:.1}]", cuts.drill_pitch));
            // The shop cuts rope to whole centimeters.
            cells.push(format!("[{:.0}]", cuts.rope_length.floor()));
            cells.push(format!("[{}]", cuts.rope_count));
        }
        CutSheet::FreeForm(_) => {
            // Area-priced panel: no rail geometry on the worksheet.
            for _ in 0..9 {
                cells.push("[-]".to_string());
            }
        }
        CutSheet::Unsized => {
            // Placeholder row; dimensions were never entered.
            for _ in 0..9 {
                cells.push("[0]".to_string());
            }
        }
    }

    cells.join(", ") + ","
}

/// Type column: panel type plus hinge side or coverage area where relevant.
fn type_cell(item: &LineItem) -> String {
    match &item.cuts {
        CutSheet::FreeForm(est) => format!("free-form, {:.0} cm2", est.coverage),
        _ => match item.spec.side {
            Some(side) => format!("{}, {}", item.spec.type_label(), side),
            None => item.spec.type_label(),
        },
    }
}

/// Wrap free text in a Typst string expression so markup characters in
/// user-entered names/colors cannot break the template.
fn text_cell(text: &str) -> String {
    format!("[#\"{}\"]", escape_string(text))
}

fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{HingeSide, PanelCategory, PanelSpec, PanelVariant};
    use chrono::NaiveDate;

    fn sample_order() -> Order {
        let mut order = Order::new(
            "Riverside Apartments",
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            None,
        );
        order.add_item(
            PanelSpec::new(
                PanelCategory::Door,
                PanelVariant::Single,
                100.0,
                200.0,
                4,
                Some(HingeSide::Left),
            ),
            "black",
            "grey",
        );
        order.add_item(
            PanelSpec::new(
                PanelCategory::Door,
                PanelVariant::Double,
                100.0,
                200.0,
                4,
                None,
            ),
            "white",
            "grey",
        );
        order.add_item(
            PanelSpec::new(
                PanelCategory::Window,
                PanelVariant::Single,
                80.0,
                150.0,
                5,
                None,
            ),
            "white",
            "black",
        );
        order.add_item(
            PanelSpec::new(PanelCategory::Door, PanelVariant::Free, 50.0, 60.0, 2, None),
            "wood",
            "grey",
        );
        order
    }

    #[test]
    fn test_double_rows_carry_doubling_marker() {
        let order = sample_order();
        let rows = worksheet_rows(&order);

        // Double door: handle and pleat cells marked, rope floored to 127.
        assert!(rows.contains("[194.5 (x2)]"));
        assert!(rows.contains("[29 (x2)]"));
        assert!(rows.contains("[127]"));

        // Single door: no marker.
        assert!(rows.contains("[194.5]"));
        assert!(rows.contains("[54]"));
    }

    #[test]
    fn test_window_short_rail_renders_absent() {
        let order = sample_order();
        let window_row = item_row(3, &order.items[2]);
        assert!(window_row.contains("[-]"));
        assert!(window_row.contains("[147.5]"));
    }

    #[test]
    fn test_free_form_row_shows_coverage_only() {
        let order = sample_order();
        let free_row = item_row(4, &order.items[3]);
        assert!(free_row.contains("free-form, 3600 cm2"));
        // No rail measurements.
        assert!(!free_row.contains("[54]"));
    }

    #[test]
    fn test_hinge_side_in_type_cell() {
        let order = sample_order();
        assert_eq!(type_cell(&order.items[0]), "door, left");
        assert_eq!(type_cell(&order.items[1]), "door (double)");
    }

    #[test]
    fn test_unsized_row_renders_zeros() {
        let mut order = Order::new(
            "Site",
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            None,
        );
        order.add_item(
            PanelSpec::new(
                PanelCategory::Window,
                PanelVariant::Single,
                0.0,
                150.0,
                5,
                None,
            ),
            "white",
            "grey",
        );
        let row = item_row(1, &order.items[0]);
        assert!(row.contains("[0]"));
    }

    #[test]
    fn test_markup_characters_escaped() {
        assert_eq!(text_cell("a\"b"), "[#\"a\\\"b\"]");
        assert_eq!(text_cell("back\\slash"), "[#\"back\\\\slash\"]");
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let pdf = render_order_pdf(&sample_order()).unwrap();
        assert!(pdf.len() > 1000);
        assert_eq!(&pdf[0..5], b"%PDF-");
    }
}
