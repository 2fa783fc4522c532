//! Layout analysis for PDF pages.
//!
//! Interprets a page's content stream into positioned text spans, drawn
//! rectangles and form-object text, then groups spans into lines. Positions
//! are converted to top-down page coordinates.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{is_spaceless_script_char, BBox, Page, TextLine, TextSpan};

use super::backend::{
    get_number_from_value, BackendFontInfo, PageBox, PdfBackend, PdfValue,
    ResourceScope, DEFAULT_GLYPH_WIDTH,
};

/// Nesting limit for form XObjects drawing other forms.
const MAX_FORM_DEPTH: usize = 4;

/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Ascender and descender as fractions of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }
}

impl Matrix {
    fn new(m: [f32; 6]) -> Self {
        Self {
            a: m[0],
            b: m[1],
            c: m[2],
            d: m[3],
            e: m[4],
            f: m[5],
        }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Graphics state saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::default(),
            font: None,
            font_size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
        }
    }
}

/// Raw output of interpreting one page.
#[derive(Debug, Default)]
struct PageMarks {
    spans: Vec<TextSpan>,
    form_spans: Vec<TextSpan>,
    rects: Vec<BBox>,
}

/// Layout analyzer for extracting positioned text from PDF pages.
pub struct LayoutAnalyzer<'a, B: PdfBackend> {
    backend: &'a B,
}

impl<'a, B: PdfBackend> LayoutAnalyzer<'a, B> {
    /// Create a new layout analyzer.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Decode a page into lines, rectangles and form-object text.
    pub fn analyze_page(&self, page_num: u32) -> Result<Page> {
        let pages = self.backend.pages();
        let page_id = *pages
            .get(&page_num)
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

        let page_box = self.backend.page_box(page_id);
        let content = self.backend.page_content(page_id)?;

        let mut marks = PageMarks::default();
        let mut interpreter = Interpreter {
            backend: self.backend,
            page_box,
            marks: &mut marks,
        };
        interpreter.run(
            &content,
            ResourceScope::Page(page_id),
            GraphicsState::default(),
            0,
        )?;

        log::debug!(
            "Page {}: {} spans, {} form spans, {} rects",
            page_num,
            marks.spans.len(),
            marks.form_spans.len(),
            marks.rects.len()
        );

        let chrome = group_spans_into_lines(marks.form_spans.clone())
            .iter()
            .map(|l| l.text())
            .filter(|t| !t.trim().is_empty())
            .collect();

        let mut spans = marks.spans;
        spans.extend(marks.form_spans);

        Ok(Page::new(page_num, page_box.width, page_box.height)
            .with_lines(group_spans_into_lines(spans))
            .with_rects(marks.rects)
            .with_chrome(chrome))
    }
}

struct Interpreter<'a, 'm, B: PdfBackend> {
    backend: &'a B,
    page_box: PageBox,
    marks: &'m mut PageMarks,
}

/// Text object state between `BT` and `ET`.
#[derive(Debug, Clone, Copy, Default)]
struct TextObject {
    tm: Matrix,
    tlm: Matrix,
}

impl<'a, 'm, B: PdfBackend> Interpreter<'a, 'm, B> {
    fn run(
        &mut self,
        content: &[u8],
        scope: ResourceScope,
        initial: GraphicsState,
        depth: usize,
    ) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        let ops = self.backend.decode_content(content)?;

        let fonts: HashMap<Vec<u8>, BackendFontInfo> = match self.backend.fonts(scope) {
            Ok(fonts) => fonts.into_iter().map(|f| (f.name.clone(), f)).collect(),
            Err(e) => {
                log::warn!("Failed to read fonts: {}", e);
                HashMap::new()
            }
        };

        let mut gs = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text = TextObject::default();
        let in_form = depth > 0;

        for op in &ops {
            let nums: Vec<f32> = op.operands.iter().filter_map(get_number_from_value).collect();
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" if nums.len() >= 6 => {
                    let m = Matrix::new([nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]]);
                    gs.ctm = m.then(&gs.ctm);
                }
                "BT" => text = TextObject::default(),
                "Tf" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        gs.font = Some(name.clone());
                    }
                    if let Some(size) = op.operands.get(1).and_then(get_number_from_value) {
                        gs.font_size = size;
                    }
                }
                "TL" if !nums.is_empty() => gs.leading = nums[0],
                "Tc" if !nums.is_empty() => gs.char_spacing = nums[0],
                "Tw" if !nums.is_empty() => gs.word_spacing = nums[0],
                "Tz" if !nums.is_empty() => gs.horizontal_scale = nums[0] / 100.0,
                "Td" if nums.len() >= 2 => move_text(&mut text, nums[0], nums[1]),
                "TD" if nums.len() >= 2 => {
                    gs.leading = -nums[1];
                    move_text(&mut text, nums[0], nums[1]);
                }
                "Tm" if nums.len() >= 6 => {
                    let m = Matrix::new([nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]]);
                    text.tm = m;
                    text.tlm = m;
                }
                "T*" => next_line(&mut text, &gs),
                "Tj" => {
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        let pieces = [Piece::Text(bytes)];
                        self.show(&pieces, &mut text, &gs, &fonts, scope, in_form);
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        let pieces: Vec<Piece> = items
                            .iter()
                            .filter_map(|item| match item {
                                PdfValue::Str(bytes) => Some(Piece::Text(bytes)),
                                other => get_number_from_value(other).map(Piece::Adjust),
                            })
                            .collect();
                        self.show(&pieces, &mut text, &gs, &fonts, scope, in_form);
                    }
                }
                "'" => {
                    next_line(&mut text, &gs);
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        let pieces = [Piece::Text(bytes)];
                        self.show(&pieces, &mut text, &gs, &fonts, scope, in_form);
                    }
                }
                "\"" => {
                    if nums.len() >= 2 {
                        gs.word_spacing = nums[0];
                        gs.char_spacing = nums[1];
                    }
                    next_line(&mut text, &gs);
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                        let pieces = [Piece::Text(bytes)];
                        self.show(&pieces, &mut text, &gs, &fonts, scope, in_form);
                    }
                }
                "re" if nums.len() >= 4 => self.rect(&gs.ctm, nums[0], nums[1], nums[2], nums[3]),
                "Do" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        self.draw_form(name, scope, &gs, depth)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn draw_form(
        &mut self,
        name: &[u8],
        scope: ResourceScope,
        gs: &GraphicsState,
        depth: usize,
    ) -> Result<()> {
        if depth >= MAX_FORM_DEPTH {
            log::debug!("Form nesting limit reached, skipping {:?}", String::from_utf8_lossy(name));
            return Ok(());
        }
        let form = match self.backend.form_xobject(scope, name) {
            Some(form) => form,
            None => return Ok(()),
        };

        let mut inner = gs.clone();
        inner.ctm = Matrix::new(form.matrix).then(&gs.ctm);
        if let Err(e) = self.run(&form.content, form.scope, inner, depth + 1) {
            log::warn!("Skipping unreadable form XObject: {}", e);
        }
        Ok(())
    }

    fn show(
        &mut self,
        pieces: &[Piece<'_>],
        text: &mut TextObject,
        gs: &GraphicsState,
        fonts: &HashMap<Vec<u8>, BackendFontInfo>,
        scope: ResourceScope,
        in_form: bool,
    ) {
        let font_key = gs.font.clone().unwrap_or_default();
        let font = fonts.get(&font_key);
        let size = gs.font_size;
        let start = text.tm.then(&gs.ctm);

        let mut combined = String::new();
        let mut advance = 0.0_f32;

        for piece in pieces {
            match piece {
                Piece::Text(bytes) => {
                    let decoded = self.backend.decode_text(scope, &font_key, bytes);
                    let chars = decoded.chars().count();
                    let em = match font {
                        Some(f) => f.text_width(bytes, chars),
                        None => chars as f32 * DEFAULT_GLYPH_WIDTH,
                    };
                    let spaces = bytes.iter().filter(|b| **b == b' ').count() as f32;
                    advance += (em / 1000.0 * size
                        + gs.char_spacing * bytes.len() as f32
                        + gs.word_spacing * spaces)
                        * gs.horizontal_scale;
                    combined.push_str(&decoded);
                }
                Piece::Adjust(n) => {
                    advance -= n / 1000.0 * size * gs.horizontal_scale;
                    let ends_spaced = combined.is_empty()
                        || combined.ends_with(' ')
                        || combined.ends_with('\u{00A0}');
                    let last_spaceless = combined
                        .chars()
                        .last()
                        .map(is_spaceless_script_char)
                        .unwrap_or(false);
                    if -n > TJ_SPACE_THRESHOLD && !ends_spaced && !last_spaceless {
                        combined.push(' ');
                    }
                }
            }
        }

        text.tm = Matrix::translation(advance, 0.0).then(&text.tm);

        if combined.trim().is_empty() {
            return;
        }

        let effective_size = size * start.vertical_scale();
        let (x_start, baseline) = start.apply(0.0, 0.0);
        let (x_end, _) = start.apply(advance, 0.0);

        let x0 = x_start.min(x_end) - self.page_box.x0;
        let x1 = x_start.max(x_end) - self.page_box.x0;
        let baseline = baseline - self.page_box.y0;
        let top = self.page_box.height - (baseline + ASCENT * effective_size);
        let bottom = self.page_box.height - (baseline - DESCENT * effective_size);

        let (font_name, is_bold) = match font {
            Some(f) => (f.base_font.clone(), f.is_bold),
            None => (String::from_utf8_lossy(&font_key).to_string(), false),
        };
        let span = TextSpan::new(combined, font_name, effective_size, BBox::new(x0, top, x1, bottom))
            .with_bold(is_bold);

        if in_form {
            self.marks.form_spans.push(span);
        } else {
            self.marks.spans.push(span);
        }
    }

    fn rect(&mut self, ctm: &Matrix, x: f32, y: f32, w: f32, h: f32) {
        if w == 0.0 || h == 0.0 {
            return;
        }
        let (ax, ay) = ctm.apply(x, y);
        let (bx, by) = ctm.apply(x + w, y + h);
        let height = self.page_box.height;
        let ox = self.page_box.x0;
        let oy = self.page_box.y0;
        self.marks.rects.push(BBox::new(
            ax - ox,
            height - (ay - oy),
            bx - ox,
            height - (by - oy),
        ));
    }
}

/// Element of a text-showing operation.
enum Piece<'b> {
    Text(&'b [u8]),
    Adjust(f32),
}

fn move_text(text: &mut TextObject, tx: f32, ty: f32) {
    text.tlm = Matrix::translation(tx, ty).then(&text.tlm);
    text.tm = text.tlm;
}

fn next_line(text: &mut TextObject, gs: &GraphicsState) {
    // Streams that never set TL still expect T* to advance a line.
    let leading = if gs.leading != 0.0 {
        gs.leading
    } else {
        gs.font_size * 1.2
    };
    move_text(text, 0.0, -leading);
}

/// Baseline of a span in top-down coordinates.
fn baseline(span: &TextSpan) -> f32 {
    span.bbox.y1 - DESCENT * span.font_size
}

/// Group spans into lines by baseline, top to bottom.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    spans.sort_by(|a, b| {
        baseline(a)
            .total_cmp(&baseline(b))
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y = baseline(&span);
        let y_tolerance = span.font_size * 0.3;

        match current_y {
            Some(line_y) if (y - line_y).abs() <= y_tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}
