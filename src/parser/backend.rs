//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the layout analysis logic.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::is_bold_font_name;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Where a content stream looks up its fonts and XObjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// The page's own (possibly inherited) resources
    Page(PageId),
    /// A form XObject's resources, falling back to the page's
    Form { form: PageId, page: PageId },
}

impl ResourceScope {
    /// The page this scope belongs to.
    pub fn page(&self) -> PageId {
        match *self {
            ResourceScope::Page(page) => page,
            ResourceScope::Form { page, .. } => page,
        }
    }
}

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// First character code covered by `widths`.
    pub first_char: u32,
    /// Glyph advances in thousandths of an em.
    pub widths: Vec<f32>,
    /// Bold from the name, FontWeight or the ForceBold flag.
    pub is_bold: bool,
}

/// Em fraction used for glyphs without metrics.
pub const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

impl BackendFontInfo {
    /// Advance of a single-byte character code, in thousandths of an em.
    pub fn glyph_width(&self, code: u8) -> f32 {
        (code as u32)
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_GLYPH_WIDTH)
    }

    /// Advance of a whole string in thousandths of an em.
    ///
    /// Fonts without a `/Widths` table (standard 14, composite fonts) are
    /// measured per decoded character instead of per byte.
    pub fn text_width(&self, bytes: &[u8], decoded_chars: usize) -> f32 {
        if self.widths.is_empty() {
            decoded_chars as f32 * DEFAULT_GLYPH_WIDTH
        } else {
            bytes.iter().map(|b| self.glyph_width(*b)).sum()
        }
    }
}

/// Page geometry: MediaBox origin and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PageBox {
    /// US Letter.
    fn default() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            width: 612.0,
            height: 792.0,
        }
    }
}

/// A form XObject ready to be interpreted.
#[derive(Debug, Clone)]
pub struct FormXObject {
    pub scope: ResourceScope,
    pub content: Vec<u8>,
    /// Form matrix `[a b c d e f]`
    pub matrix: [f32; 6],
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, font info, content stream
/// decoding, and text decoding, without exposing any concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox.
    fn page_box(&self, page: PageId) -> PageBox;

    /// Return font info for a resource scope.
    fn fonts(&self, scope: ResourceScope) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Look up a form XObject by resource name; images and unknown names yield `None`.
    fn form_xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<FormXObject>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding in the given scope.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: implementation backed by lopdf
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

/// PDF font flag bit for synthetic bold (bit 19, 1-based).
const FORCE_BOLD_FLAG: i64 = 1 << 18;

/// Maximum depth when following `/Parent` links for inherited attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    ///
    /// Escape hatch for operations not covered by `PdfBackend`
    /// (metadata, outlines, named destinations).
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Resolve an object that may be a reference to a dictionary.
    pub(crate) fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Resolve an object that may be a reference to an array.
    pub(crate) fn resolve_array<'a>(&'a self, obj: &'a Object) -> Option<&'a Vec<Object>> {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).ok().and_then(|o| o.as_array().ok()),
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a page attribute, following `/Parent` for inheritable keys.
    fn inherited<'a>(&'a self, page: PageId, key: &[u8]) -> Option<&'a Object> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        self.inherited(page, b"Resources")
            .and_then(|r| self.resolve_dict(r))
    }

    fn scope_resources(&self, scope: ResourceScope) -> Option<&Dictionary> {
        match scope {
            ResourceScope::Page(page) => self.page_resources(page),
            ResourceScope::Form { form, page } => self
                .stream(form)
                .and_then(|s| s.dict.get(b"Resources").ok())
                .and_then(|r| self.resolve_dict(r))
                .or_else(|| self.page_resources(page)),
        }
    }

    fn stream(&self, id: ObjectId) -> Option<&Stream> {
        match self.doc.get_object(id) {
            Ok(Object::Stream(s)) => Some(s),
            _ => None,
        }
    }

    fn scope_font_dicts(&self, scope: ResourceScope) -> Result<BTreeMap<Vec<u8>, &Dictionary>> {
        match scope {
            ResourceScope::Page(page) => self
                .doc
                .get_page_fonts(page)
                .map_err(|e| Error::PdfParse(e.to_string())),
            ResourceScope::Form { .. } => {
                let mut fonts = BTreeMap::new();
                let font_res = self
                    .scope_resources(scope)
                    .and_then(|res| res.get(b"Font").ok())
                    .and_then(|f| self.resolve_dict(f));
                if let Some(font_res) = font_res {
                    for (name, obj) in font_res.iter() {
                        if let Some(font) = self.resolve_dict(obj) {
                            fonts.insert(name.clone(), font);
                        }
                    }
                }
                Ok(fonts)
            }
        }
    }

    fn font_info(&self, name: &[u8], font: &Dictionary) -> BackendFontInfo {
        let base_font = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0)
            .max(0) as u32;

        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|w| self.resolve_array(w))
            .map(|arr| arr.iter().map(|o| number(o).unwrap_or(0.0)).collect())
            .unwrap_or_default();

        let descriptor = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| self.resolve_dict(d));
        let heavy_weight = descriptor
            .and_then(|d| d.get(b"FontWeight").ok())
            .and_then(number)
            .map(|w| w >= 700.0)
            .unwrap_or(false);
        let force_bold = descriptor
            .and_then(|d| d.get(b"Flags").ok())
            .and_then(|f| f.as_i64().ok())
            .map(|f| f & FORCE_BOLD_FLAG != 0)
            .unwrap_or(false);

        BackendFontInfo {
            name: name.to_vec(),
            is_bold: is_bold_font_name(&base_font) || heavy_weight || force_bold,
            base_font,
            first_char,
            widths,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> PageBox {
        let coords: Option<Vec<f32>> = self
            .inherited(page, b"MediaBox")
            .and_then(|m| self.resolve_array(m))
            .map(|arr| arr.iter().filter_map(number).collect());

        match coords.as_deref() {
            Some([x0, y0, x1, y1, ..]) if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => {
                PageBox {
                    x0: x0.min(*x1),
                    y0: y0.min(*y1),
                    width: (x1 - x0).abs(),
                    height: (y1 - y0).abs(),
                }
            }
            _ => PageBox::default(),
        }
    }

    fn fonts(&self, scope: ResourceScope) -> Result<Vec<BackendFontInfo>> {
        let dicts = self.scope_font_dicts(scope)?;
        Ok(dicts
            .iter()
            .map(|(name, font)| self.font_info(name, font))
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => Ok(stream_bytes(s)),
                Ok(Object::Array(arr)) => Ok(self.concat_streams(arr)),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn form_xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<FormXObject> {
        let xobjects = self
            .scope_resources(scope)?
            .get(b"XObject")
            .ok()
            .and_then(|x| self.resolve_dict(x))?;
        let id = xobjects.get(name).ok()?.as_reference().ok()?;
        let stream = self.stream(id)?;

        if stream.dict.get(b"Subtype").ok()?.as_name().ok()? != b"Form" {
            return None;
        }

        let mut matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        if let Some(arr) = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| self.resolve_array(m))
        {
            for (slot, value) in matrix.iter_mut().zip(arr.iter()) {
                *slot = number(value).unwrap_or(*slot);
            }
        }

        Some(FormXObject {
            scope: ResourceScope::Form {
                form: id,
                page: scope.page(),
            },
            content: stream_bytes(stream),
            matrix,
        })
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.scope_font_dicts(scope) {
            if let Some(font_dict) = fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }
}

impl LopdfBackend {
    fn concat_streams(&self, refs: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in refs {
            if let Ok(r) = obj.as_reference() {
                if let Some(s) = self.stream(r) {
                    content.extend_from_slice(&stream_bytes(s));
                    content.push(b' ');
                }
            }
        }
        content
    }
}

/// Stream payload, decompressed when a filter is present.
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}
