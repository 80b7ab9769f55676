// src/reports/pdf.rs
//! Paginated table renderer built directly on the `lopdf` object model.
//!
//! Columns flow right to left: the first configured column sits against the
//! right margin. Every label is printed in French and Arabic with one embedded
//! TrueType font (Type0, Identity-H), so data in either script survives.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::ApiResult;
use crate::reports::aggregator::{AggregatedReport, DateKey, Totals};
use crate::reports::fonts::{ReportFont, ShapedText};
use crate::reports::format::{
    date_range_summary, grand_total_label, group_banner, row_cells, subtotal_label, totals_cells,
};
use crate::reports::layout::{Align, Lang, ReportLayoutConfig};

// A4 landscape, in points
const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
const MARGIN: f32 = 28.0;
const FOOTER_HEIGHT: f32 = 18.0;
const CELL_PADDING: f32 = 3.0;

const FONT: &str = "F1";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub company_name: String,
    pub generated_at: NaiveDateTime,
    pub font: Arc<ReportFont>,
}

#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

#[derive(Clone, Copy)]
struct Fill(f32);

const HEADER_FILL: Fill = Fill(0.85);
const BANNER_FILL: Fill = Fill(0.93);
const SUBTOTAL_FILL: Fill = Fill(0.9);
const GRAND_TOTAL_FILL: Fill = Fill(0.78);

/// Renders grouped rows and totals into a complete PDF document.
pub fn render_pdf(
    layout: &ReportLayoutConfig,
    report: &AggregatedReport,
    options: &RenderOptions,
) -> ApiResult<RenderedPdf> {
    let mut writer = PdfTableWriter::new(layout, options);
    writer.start_page(report);

    let row_height = writer.row_height();
    for group in &report.groups {
        // keep the banner on the same page as at least one line below it
        writer.ensure_space(row_height * 2.0, report)?;
        writer.draw_banner(
            &group_banner(group.key, Lang::Fr),
            &group_banner(group.key, Lang::Ar),
            BANNER_FILL,
        );

        for row in &group.rows {
            writer.ensure_space(row_height, report)?;
            writer.draw_cells(&row_cells(layout, row), false, None);
        }

        writer.ensure_space(row_height, report)?;
        writer.draw_totals(TotalsLine::Group(group.key), &group.totals, SUBTOTAL_FILL);
    }

    writer.ensure_space(row_height, report)?;
    writer.draw_totals(TotalsLine::Grand, &report.grand_totals, GRAND_TOTAL_FILL);

    writer.finish()
}

#[derive(Clone, Copy)]
enum TotalsLine {
    Group(DateKey),
    Grand,
}

impl TotalsLine {
    fn label(self, lang: Lang) -> String {
        match self {
            TotalsLine::Group(key) => subtotal_label(key, lang),
            TotalsLine::Grand => grand_total_label(lang).to_string(),
        }
    }
}

struct PdfTableWriter<'a> {
    layout: &'a ReportLayoutConfig,
    options: &'a RenderOptions,
    font: Arc<ReportFont>,
    document: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    content: Content,
    cursor_y: f32,
    /// Glyph id → source text, for the ToUnicode map.
    used_glyphs: BTreeMap<u16, String>,
}

impl<'a> PdfTableWriter<'a> {
    fn new(layout: &'a ReportLayoutConfig, options: &'a RenderOptions) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        // filled in by `finish` once every glyph is known
        let font_id = document.new_object_id();
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! {
                FONT => font_id,
            },
        });

        Self {
            layout,
            options,
            font: options.font.clone(),
            document,
            pages_id,
            font_id,
            resources_id,
            page_ids: Vec::new(),
            content: Content { operations: vec![] },
            cursor_y: PAGE_HEIGHT - MARGIN,
            used_glyphs: BTreeMap::new(),
        }
    }

    fn row_height(&self) -> f32 {
        self.layout.font_size + 2.0 * CELL_PADDING + 2.0
    }

    fn right_edge(&self) -> f32 {
        PAGE_WIDTH - MARGIN
    }

    fn table_left(&self) -> f32 {
        self.right_edge() - self.layout.table_width()
    }

    fn bottom_limit(&self) -> f32 {
        MARGIN + FOOTER_HEIGHT
    }

    fn start_page(&mut self, report: &AggregatedReport) {
        self.content = Content { operations: vec![] };
        self.cursor_y = PAGE_HEIGHT - MARGIN;

        if self.page_ids.is_empty() {
            self.draw_title_block(report);
        }
        self.draw_column_header();
    }

    /// Breaks the page when `height` does not fit; the new page repeats the column header.
    fn ensure_space(&mut self, height: f32, report: &AggregatedReport) -> ApiResult<()> {
        if self.cursor_y - height < self.bottom_limit() {
            self.finish_page()?;
            self.start_page(report);
        }
        Ok(())
    }

    fn draw_title_block(&mut self, report: &AggregatedReport) {
        let title_size = self.layout.title_font_size;
        for lang in [Lang::Fr, Lang::Ar] {
            self.cursor_y -= title_size + 2.0;
            let title = self.font.shape(self.layout.title(lang));
            let x = (PAGE_WIDTH - title.width(title_size)) / 2.0;
            self.text(&title, title_size, x, self.cursor_y, true);
        }

        let info_size = self.layout.header_font_size + 1.0;
        self.cursor_y -= info_size + 8.0;
        let first_line = self.cursor_y;
        for lang in [Lang::Fr, Lang::Ar] {
            let summary = self.font.shape(&date_range_summary(report, lang));
            let x = (PAGE_WIDTH - summary.width(info_size)) / 2.0;
            self.text(&summary, info_size, x, self.cursor_y, false);
            self.cursor_y -= info_size + 3.0;
        }

        if !self.options.company_name.is_empty() {
            let company = self.font.shape(&self.options.company_name);
            self.text(&company, info_size, MARGIN, first_line, true);
        }

        let generated = self.font.shape(&format!(
            "Édité le {}",
            self.options.generated_at.format("%d/%m/%Y %H:%M")
        ));
        let x = self.right_edge() - generated.width(info_size);
        self.text(&generated, info_size, x, first_line, false);

        self.cursor_y -= 8.0;
    }

    /// Two-line header cells: French above, Arabic below.
    fn draw_column_header(&mut self) {
        let size = self.layout.header_font_size;
        let height = 2.0 * (size + 2.0) + 2.0 * CELL_PADDING;
        let layout = self.layout;

        if layout.has_category_header() {
            let top = self.cursor_y;
            let mut right = self.right_edge();
            let mut columns = layout.columns.iter();
            for category in layout.categories {
                let width: f32 = columns.by_ref().take(category.span).map(|c| c.width).sum();
                self.header_cell(right - width, top, width, height, category.label_fr, category.label_ar, size);
                right -= width;
            }
            self.cursor_y -= height;
        }

        let top = self.cursor_y;
        let mut right = self.right_edge();
        for column in layout.columns {
            self.header_cell(right - column.width, top, column.width, height, column.label_fr, column.label_ar, size);
            right -= column.width;
        }
        self.cursor_y -= height;
    }

    #[allow(clippy::too_many_arguments)]
    fn header_cell(&mut self, left: f32, top: f32, width: f32, height: f32, upper: &str, lower: &str, size: f32) {
        self.frame(left, top, width, height, Some(HEADER_FILL));
        let half = height / 2.0;
        self.cell_text(left, top, width, half, upper, Align::Center, true, size);
        self.cell_text(left, top - half, width, half, lower, Align::Center, true, size);
    }

    /// Full-width bar: French from the left, Arabic from the right.
    fn draw_banner(&mut self, french: &str, arabic: &str, fill: Fill) {
        let height = self.row_height();
        let width = self.layout.table_width();
        let left = self.table_left();
        let top = self.cursor_y;
        let size = self.layout.font_size;
        self.frame(left, top, width, height, Some(fill));
        self.cell_text(left, top, width / 2.0, height, french, Align::Left, true, size);
        self.cell_text(left + width / 2.0, top, width / 2.0, height, arabic, Align::Right, true, size);
        self.cursor_y -= height;
    }

    fn draw_cells(&mut self, cells: &[String], bold: bool, fill: Option<Fill>) {
        let height = self.row_height();
        let top = self.cursor_y;
        let size = self.layout.font_size;
        let layout = self.layout;

        let mut right = self.right_edge();
        for (column, text) in layout.columns.iter().zip(cells) {
            let left = right - column.width;
            self.frame(left, top, column.width, height, fill);
            self.cell_text(left, top, column.width, height, text, column.align, bold, size);
            right = left;
        }
        self.cursor_y -= height;
    }

    /// Totals line: the bilingual label spans the descriptive columns, the
    /// measures sit under their own headers.
    fn draw_totals(&mut self, line: TotalsLine, totals: &Totals, fill: Fill) {
        let height = self.row_height();
        let top = self.cursor_y;
        let size = self.layout.font_size;
        let layout = self.layout;
        let span = layout.label_span();
        let cells = totals_cells(layout, "", totals);

        let label_width: f32 = layout.columns.iter().take(span).map(|c| c.width).sum();
        let mut right = self.right_edge();
        let left = right - label_width;
        self.frame(left, top, label_width, height, Some(fill));
        self.cell_text(left, top, label_width / 2.0, height, &line.label(Lang::Fr), Align::Left, true, size);
        self.cell_text(left + label_width / 2.0, top, label_width / 2.0, height, &line.label(Lang::Ar), Align::Right, true, size);
        right = left;

        for (column, text) in layout.columns.iter().zip(&cells).skip(span) {
            let left = right - column.width;
            self.frame(left, top, column.width, height, Some(fill));
            self.cell_text(left, top, column.width, height, text, column.align, true, size);
            right = left;
        }
        self.cursor_y -= height;
    }

    fn frame(&mut self, left: f32, top: f32, width: f32, height: f32, fill: Option<Fill>) {
        let bottom = top - height;
        let ops = &mut self.content.operations;

        if let Some(Fill(gray)) = fill {
            ops.push(Operation::new("g", vec![gray.into()]));
            ops.push(Operation::new("re", vec![left.into(), bottom.into(), width.into(), height.into()]));
            ops.push(Operation::new("f", vec![]));
            ops.push(Operation::new("g", vec![0.0.into()]));
        }
        ops.push(Operation::new("w", vec![0.5.into()]));
        ops.push(Operation::new("re", vec![left.into(), bottom.into(), width.into(), height.into()]));
        ops.push(Operation::new("S", vec![]));
    }

    #[allow(clippy::too_many_arguments)]
    fn cell_text(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        text: &str,
        align: Align,
        bold: bool,
        size: f32,
    ) {
        let shaped = self.font.shape(text);
        if shaped.is_empty() {
            return;
        }

        // shrink long labels instead of spilling into the neighbour cell
        let available = width - 2.0 * CELL_PADDING;
        let natural = shaped.width(size);
        let size = if natural > available && natural > 0.0 {
            (size * available / natural).max(4.0)
        } else {
            size
        };
        let text_w = shaped.width(size);
        let x = match align {
            Align::Left => left + CELL_PADDING,
            Align::Center => left + (width - text_w) / 2.0,
            Align::Right => left + width - CELL_PADDING - text_w,
        };
        let y = top - height + (height - size) / 2.0 + 1.0;
        self.text(&shaped, size, x, y, bold);
    }

    /// Bold is simulated with fill-and-stroke rendering; one font file is embedded.
    fn text(&mut self, shaped: &ShapedText, size: f32, x: f32, y: f32, bold: bool) {
        for glyph in &shaped.glyphs {
            let entry = self.used_glyphs.entry(glyph.id).or_default();
            if entry.is_empty() {
                entry.clone_from(&glyph.text);
            }
        }

        let ops = &mut self.content.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![FONT.into(), size.into()]));
        if bold {
            ops.push(Operation::new("Tr", vec![2.into()]));
            ops.push(Operation::new("w", vec![(size * 0.035).into()]));
        } else {
            ops.push(Operation::new("Tr", vec![0.into()]));
        }
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new("TJ", vec![Object::Array(glyph_array(&self.font, shaped))]));
        ops.push(Operation::new("ET", vec![]));
    }

    fn finish_page(&mut self) -> ApiResult<()> {
        let page_no = self.page_ids.len() + 1;
        let footer = self.font.shape(&format!("Page {} - صفحة {}", page_no, page_no));
        let x = (PAGE_WIDTH - footer.width(8.0)) / 2.0;
        self.text(&footer, 8.0, x, MARGIN, false);

        let content = std::mem::replace(&mut self.content, Content { operations: vec![] });
        let content_id = self.document.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Type0 font over a CIDFontType2 descendant; CIDs are glyph ids.
    fn embed_font(&mut self) {
        let font = self.font.clone();
        let name = Object::Name(font.postscript_name().as_bytes().to_vec());
        let metrics = font.metrics;

        let font_file_id = self.document.add_object(Stream::new(
            dictionary! { "Length1" => font.data().len() as i64 },
            font.data().to_vec(),
        ));
        let descriptor_id = self.document.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => name.clone(),
            "Flags" => 32,
            "FontBBox" => metrics.bbox.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => metrics.ascent,
            "Descent" => metrics.descent,
            "CapHeight" => metrics.cap_height,
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let mut widths = Vec::with_capacity(self.used_glyphs.len() * 2);
        for (id, width) in font.advance_widths(self.used_glyphs.keys().copied()) {
            widths.push(Object::Integer(id as i64));
            widths.push(Object::Array(vec![Object::Real(width)]));
        }
        let descendant_id = self.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => name.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = self
            .document
            .add_object(Stream::new(dictionary! {}, to_unicode_cmap(&self.used_glyphs)));

        self.document.objects.insert(
            self.font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => name,
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::from(descendant_id)],
                "ToUnicode" => to_unicode_id,
            }),
        );
    }

    fn finish(mut self) -> ApiResult<RenderedPdf> {
        self.finish_page()?;
        self.embed_font();

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let pages = self.page_ids.len();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let title = format!("{} - {}", self.layout.title(Lang::Fr), self.layout.title(Lang::Ar));
        let info_id = self.document.add_object(dictionary! {
            "Title" => text_string(&title),
            "Producer" => Object::string_literal("farm-reports"),
        });
        self.document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(RenderedPdf { bytes, pages })
    }
}

/// `TJ` operand: two-byte glyph ids, with adjustments wherever the shaped
/// advance or offset differs from the font's default width.
fn glyph_array(font: &ReportFont, shaped: &ShapedText) -> Vec<Object> {
    let defaults = font.advance_widths(shaped.glyphs.iter().map(|g| g.id));
    let mut items = Vec::with_capacity(shaped.glyphs.len() * 2);
    let mut pending = 0.0_f32;

    for (glyph, (_, default)) in shaped.glyphs.iter().zip(defaults) {
        pending -= glyph.x_offset;
        if pending.abs() > 0.01 {
            items.push(Object::Real(pending));
        }
        items.push(Object::String(glyph.id.to_be_bytes().to_vec(), StringFormat::Hexadecimal));
        pending = default - glyph.advance + glyph.x_offset;
    }
    items
}

/// ToUnicode CMap so the text can be searched and copied.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, String>) -> Vec<u8> {
    let entries: Vec<(u16, &String)> = glyphs
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(id, text)| (*id, text))
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // at most 100 entries per block
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (id, text) in chunk {
            let utf16: String = text.encode_utf16().map(|unit| format!("{:04X}", unit)).collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", id, utf16));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap.into_bytes()
}

/// PDF text string in UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovementRow, ReportKind};
    use crate::reports::aggregator::group_by_date;
    use crate::reports::fonts::bundled_font;
    use crate::reports::layout::layout_for;
    use chrono::NaiveDate;
    use strum::IntoEnumIterator;

    fn options(company_name: &str) -> RenderOptions {
        RenderOptions {
            company_name: company_name.to_string(),
            generated_at: NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            font: bundled_font(),
        }
    }

    fn rows(count: usize) -> Vec<MovementRow> {
        (0..count)
            .map(|i| MovementRow {
                movement_id: format!("M{}", i % 7),
                center_id: "C1".to_string(),
                building_id: format!("B{}", i % 3),
                entry_date: Some(format!("2024-01-{:02}", 1 + i % 5)),
                day_of_cycle: Some(i as i32),
                headcount: Some(1000 + i as i64),
                batch_weight: Some(1500.5),
                mortality: Some(2),
                feed_consumption: Some(110.25),
                eggs_total: Some(800),
                ..Default::default()
            })
            .collect()
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    /// Hex form of a character as it appears in the ToUnicode map.
    fn cmap_code(ch: char) -> String {
        format!("<{:04X}>", ch as u32)
    }

    #[test]
    fn test_empty_report_renders_one_page() {
        for kind in ReportKind::iter() {
            let report = group_by_date(&[]);
            let pdf = render_pdf(layout_for(kind), &report, &options("Ferme Test")).unwrap();
            assert!(pdf.bytes.starts_with(b"%PDF-"));
            assert_eq!(pdf.pages, 1);
        }
    }

    #[test]
    fn test_long_report_paginates() {
        let layout = layout_for(ReportKind::DailyProduction);
        let small = render_pdf(layout, &group_by_date(&rows(5)), &options("Ferme Test")).unwrap();
        let large = render_pdf(layout, &group_by_date(&rows(400)), &options("Ferme Test")).unwrap();
        assert_eq!(small.pages, 1);
        assert!(large.pages > 5, "got {} pages", large.pages);
        assert!(large.bytes.len() > small.bytes.len());
    }

    #[test]
    fn test_font_is_embedded_as_identity_h() {
        let pdf = render_pdf(layout_for(ReportKind::Weight), &group_by_date(&rows(3)), &options("")).unwrap();
        for marker in ["/Type0", "/Identity-H", "/CIDFontType2", "/FontFile2", "/ToUnicode"] {
            assert!(contains(&pdf.bytes, marker), "missing {}", marker);
        }
        assert!(!contains(&pdf.bytes, "/WinAnsiEncoding"));
    }

    #[test]
    fn test_arabic_data_and_labels_survive() {
        let row = MovementRow {
            movement_id: "M1".to_string(),
            center_id: "C1".to_string(),
            building_id: "B1".to_string(),
            species: Some("دجاج".to_string()),
            entry_date: Some("2024-01-01".to_string()),
            headcount: Some(100),
            batch_weight: Some(150.0),
            ..Default::default()
        };
        let pdf = render_pdf(
            layout_for(ReportKind::Weight),
            &group_by_date(&[row]),
            &options("مزرعة السوق"),
        )
        .unwrap();

        // species cell: د ج ا
        for ch in ['د', 'ج', 'ا'] {
            assert!(contains(&pdf.bytes, &cmap_code(ch)), "species glyph {} lost", ch);
        }
        // company name: م ز ر ع ة س و ق
        for ch in ['م', 'ز', 'ر', 'ع', 'ة', 'س', 'و', 'ق'] {
            assert!(contains(&pdf.bytes, &cmap_code(ch)), "company glyph {} lost", ch);
        }
        // Arabic title "تقرير الوزن" and column labels
        for ch in ['ت', 'ي', 'ن', 'ك'] {
            assert!(contains(&pdf.bytes, &cmap_code(ch)), "label glyph {} lost", ch);
        }
        assert!(!contains(&pdf.bytes, "(????)"));
    }

    #[test]
    fn test_to_unicode_cmap_entries() {
        let mut glyphs = BTreeMap::new();
        glyphs.insert(3, "A".to_string());
        glyphs.insert(0x1F2, "لا".to_string());
        glyphs.insert(9, String::new());

        let cmap = String::from_utf8(to_unicode_cmap(&glyphs)).unwrap();
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0003> <0041>"));
        assert!(cmap.contains("<01F2> <06440627>"));
        assert!(!cmap.contains("<0009>"));
    }

    #[test]
    fn test_glyph_array_adjusts_only_when_advance_differs() {
        let font = bundled_font();
        let shaped = font.shape("2024");
        let items = glyph_array(&font, &shaped);
        // digits use their default width: glyph strings only
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|item| matches!(item, Object::String(bytes, _) if bytes.len() == 2)));
    }

    #[test]
    fn test_text_string_is_utf16_with_bom() {
        match text_string("Aب") {
            Object::String(bytes, _) => assert_eq!(bytes, vec![0xFE, 0xFF, 0x00, 0x41, 0x06, 0x28]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
