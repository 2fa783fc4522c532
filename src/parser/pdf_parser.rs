//! PDF document access using lopdf.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use lopdf::{Dictionary, Object, ObjectId};

use crate::detect::{sniff_bytes, sniff_path, PdfHeader};
use crate::error::{Error, Result};
use crate::model::Page;
use crate::process::run_tool;

use super::backend::{LopdfBackend, PdfBackend};
use super::layout::LayoutAnalyzer;
use super::source::{Bookmark, DocumentSource, RasterRequest};

/// Guards against cyclic or absurdly deep outline and name trees.
const MAX_TREE_DEPTH: usize = 64;

/// Where the document bytes came from; needed to hand the file to a rasterizer.
enum Origin {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// PDF document parser.
pub struct PdfParser {
    backend: LopdfBackend,
    header: PdfHeader,
    origin: Origin,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let header = sniff_path(path)?;
        let backend = LopdfBackend::load_file(path).map_err(open_error)?;
        Ok(Self {
            backend,
            header,
            origin: Origin::File(path.to_path_buf()),
        })
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = sniff_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data).map_err(open_error)?;
        Ok(Self {
            backend,
            header,
            origin: Origin::Memory(data.to_vec()),
        })
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Header information sniffed at open time.
    pub fn header(&self) -> &PdfHeader {
        &self.header
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.backend.is_encrypted()
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.backend.version()
    }

    fn info_dict(&self) -> Option<&Dictionary> {
        let info = self.backend.raw_doc().trailer.get(b"Info").ok()?;
        self.backend.resolve_dict(info)
    }

    /// Recursively collect outline items, siblings in order, children after their parent.
    fn collect_outline(
        &self,
        first: ObjectId,
        depth: usize,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<Bookmark>,
    ) {
        if depth > MAX_TREE_DEPTH {
            log::warn!("Outline nesting exceeds {} levels; truncating", MAX_TREE_DEPTH);
            return;
        }

        let doc = self.backend.raw_doc();
        let mut next = Some(first);
        while let Some(item_ref) = next.take() {
            if !visited.insert(item_ref) {
                log::warn!("Cyclic outline reference {:?}; stopping", item_ref);
                return;
            }
            let item = match doc.get_dictionary(item_ref) {
                Ok(item) => item,
                Err(_) => return,
            };

            let title = get_string_from_dict(item, b"Title").unwrap_or_default();
            let page = self.outline_destination(item);
            out.push(Bookmark::new(depth, title.trim(), page));

            if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
                self.collect_outline(child, depth + 1, visited, out);
            }

            next = item.get(b"Next").and_then(Object::as_reference).ok();
        }
    }

    /// Get destination page from outline item.
    fn outline_destination(&self, item: &Dictionary) -> Option<u32> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.resolve_destination(dest, 0);
        }

        let action = item.get(b"A").ok().and_then(|a| self.backend.resolve_dict(a))?;
        let is_goto = action
            .get(b"S")
            .and_then(Object::as_name)
            .map(|s| s == b"GoTo")
            .unwrap_or(true);
        if !is_goto {
            return None;
        }
        self.resolve_destination(action.get(b"D").ok()?, 0)
    }

    /// Resolve an explicit or named destination to a page number.
    fn resolve_destination(&self, dest: &Object, depth: usize) -> Option<u32> {
        if depth > 4 {
            return None;
        }
        let doc = self.backend.raw_doc();

        match dest {
            Object::Reference(r) => match self.page_number_of(*r) {
                Some(number) => Some(number),
                None => self.resolve_destination(doc.get_object(*r).ok()?, depth + 1),
            },
            Object::Array(arr) => match arr.first()? {
                Object::Reference(page_ref) => self.page_number_of(*page_ref),
                // Remote-style destinations use a 0-based page index.
                Object::Integer(index) => u32::try_from(*index).ok().map(|i| i + 1),
                _ => None,
            },
            Object::Dictionary(d) => self.resolve_destination(d.get(b"D").ok()?, depth + 1),
            Object::Name(name) => {
                let target = self.named_destination(name)?;
                self.resolve_destination(target, depth + 1)
            }
            Object::String(name, _) => {
                let target = self.named_destination(name)?;
                self.resolve_destination(target, depth + 1)
            }
            _ => None,
        }
    }

    fn page_number_of(&self, page_ref: ObjectId) -> Option<u32> {
        self.backend
            .pages()
            .into_iter()
            .find(|(_, id)| *id == page_ref)
            .map(|(num, _)| num)
    }

    /// Look a name up in the catalog `/Dests` dictionary or the `/Names` tree.
    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.backend.raw_doc().catalog().ok()?;

        if let Some(dests) = catalog
            .get(b"Dests")
            .ok()
            .and_then(|d| self.backend.resolve_dict(d))
        {
            if let Ok(target) = dests.get(name) {
                return Some(target);
            }
        }

        let tree = catalog
            .get(b"Names")
            .ok()
            .and_then(|n| self.backend.resolve_dict(n))?
            .get(b"Dests")
            .ok()
            .and_then(|d| self.backend.resolve_dict(d))?;
        self.find_in_name_tree(tree, name, 0)
    }

    fn find_in_name_tree<'a>(
        &'a self,
        node: &'a Dictionary,
        key: &[u8],
        depth: usize,
    ) -> Option<&'a Object> {
        if depth > MAX_TREE_DEPTH {
            return None;
        }

        if let Some(names) = node
            .get(b"Names")
            .ok()
            .and_then(|n| self.backend.resolve_array(n))
        {
            for pair in names.chunks(2) {
                if let [Object::String(k, _), value] = pair {
                    if k.as_slice() == key {
                        return Some(value);
                    }
                }
            }
        }

        let kids = node
            .get(b"Kids")
            .ok()
            .and_then(|k| self.backend.resolve_array(k))?;
        kids.iter()
            .filter_map(|kid| self.backend.resolve_dict(kid))
            .find_map(|kid| self.find_in_name_tree(kid, key, depth + 1))
    }

    fn source_file(&self, out_dir: &Path) -> Result<PathBuf> {
        match &self.origin {
            Origin::File(path) => Ok(path.clone()),
            Origin::Memory(bytes) => {
                let path = out_dir.join("source.pdf");
                if !path.exists() {
                    std::fs::write(&path, bytes)?;
                }
                Ok(path)
            }
        }
    }
}

impl DocumentSource for PdfParser {
    fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    fn metadata_title(&self) -> Option<String> {
        self.info_dict()
            .and_then(|info| get_string_from_dict(info, b"Title"))
    }

    fn bookmarks(&self) -> Vec<Bookmark> {
        let mut out = Vec::new();
        let first = self
            .backend
            .raw_doc()
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Outlines").ok())
            .and_then(|o| self.backend.resolve_dict(o))
            .and_then(|outlines| outlines.get(b"First").ok())
            .and_then(|f| f.as_reference().ok());

        if let Some(first) = first {
            self.collect_outline(first, 1, &mut HashSet::new(), &mut out);
        }
        out
    }

    fn page(&self, number: u32) -> Result<Page> {
        LayoutAnalyzer::new(&self.backend)
            .analyze_page(number)
            .map_err(|e| match e {
                Error::PageOutOfRange(..) => e,
                other => Error::PageRead(number, other.to_string()),
            })
    }

    fn rasterize(&self, number: u32, request: &RasterRequest<'_>) -> Result<PathBuf> {
        let pdf = self.source_file(request.out_dir)?;
        let prefix = request.out_dir.join(format!("page-{}", number));

        let mut cmd = Command::new(request.pdftoppm);
        cmd.arg("-f")
            .arg(number.to_string())
            .arg("-l")
            .arg(number.to_string())
            .arg("-r")
            .arg(request.dpi.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(&pdf)
            .arg(&prefix);

        run_tool(
            cmd,
            "pdftoppm",
            request.timeout,
            request.cancel,
            &prefix.with_extension("err"),
        )?;

        let image = prefix.with_extension("png");
        if !image.exists() {
            return Err(Error::Ocr(format!("pdftoppm produced no image for page {}", number)));
        }
        Ok(image)
    }
}

fn open_error(e: Error) -> Error {
    match e {
        Error::Encrypted | Error::Io(_) => e,
        other => Error::DocumentOpen(other.to_string()),
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    })
}

/// Decode a text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Stream, StringFormat};

    /// Three single-line pages, an outline and a named destination.
    fn sample_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });

        let mut page_ids = Vec::new();
        for label in ["Introduction", "Methods", "Results"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 18.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(label)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => 3,
            }),
        );

        let outlines_id = doc.new_object_id();
        let intro_id = doc.new_object_id();
        let methods_id = doc.new_object_id();
        let results_id = doc.new_object_id();
        doc.objects.insert(
            intro_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::string_literal("Introduction"),
                "Parent" => outlines_id,
                "Next" => results_id,
                "First" => methods_id,
                "Last" => methods_id,
                "Dest" => vec![page_ids[0].into(), "Fit".into()],
            }),
        );
        doc.objects.insert(
            methods_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::String(vec![0xFE, 0xFF, 0x00, b'M', 0x00, b'e', 0x00, b't', 0x00, b'h', 0x00, b'o', 0x00, b'd', 0x00, b's'], StringFormat::Hexadecimal),
                "Parent" => intro_id,
                "A" => dictionary! { "S" => "GoTo", "D" => vec![page_ids[1].into(), "Fit".into()] },
            }),
        );
        doc.objects.insert(
            results_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::string_literal("Results"),
                "Parent" => outlines_id,
                "Prev" => intro_id,
                "Dest" => Object::Name(b"results".to_vec()),
            }),
        );
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => intro_id,
                "Last" => results_id,
                "Count" => 3,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Outlines" => outlines_id,
            "Dests" => dictionary! { "results" => vec![page_ids[2].into(), "Fit".into()] },
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Field Study"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_metadata_and_page_count() {
        let parser = PdfParser::from_bytes(&sample_pdf()).unwrap();
        assert_eq!(parser.page_count(), 3);
        assert_eq!(parser.metadata_title().as_deref(), Some("Field Study"));
        assert_eq!(parser.header().version, "1.5");
    }

    #[test]
    fn test_bookmarks_flattened_with_depth() {
        let parser = PdfParser::from_bytes(&sample_pdf()).unwrap();
        let bookmarks = parser.bookmarks();
        assert_eq!(
            bookmarks,
            vec![
                Bookmark::new(1, "Introduction", Some(1)),
                Bookmark::new(2, "Methods", Some(2)),
                Bookmark::new(1, "Results", Some(3)),
            ]
        );
    }

    #[test]
    fn test_page_layout_from_real_stream() {
        let parser = PdfParser::from_bytes(&sample_pdf()).unwrap();
        let page = parser.page(2).unwrap();
        assert_eq!(page.width, 612.0);
        assert_eq!(page.lines.len(), 1);
        assert_eq!(page.lines[0].text(), "Methods");
        assert!(page.lines[0].is_bold());
        assert!((page.lines[0].font_size() - 18.0).abs() < 0.01);
    }

    #[test]
    fn test_open_rejects_non_pdf() {
        assert!(matches!(
            PdfParser::from_bytes(b"<html>not a pdf</html>"),
            Err(Error::UnknownFormat)
        ));
        match PdfParser::from_bytes(b"%PDF-1.7\ntruncated") {
            Err(e) => assert!(e.is_fatal(), "unexpected error kind: {}", e),
            Ok(_) => panic!("truncated document opened"),
        }
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
        assert_eq!(decode_pdf_string(b"Plain"), "Plain");
        assert_eq!(decode_pdf_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }
}
