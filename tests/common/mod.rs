//! Small PDF fixtures assembled with lopdf.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// One line of text; `y` is the baseline measured from the top of the page.
struct Run {
    x: f32,
    y: f32,
    size: f32,
    bold: bool,
    text: String,
}

/// Content of a single page.
#[derive(Default)]
pub struct PageSpec {
    runs: Vec<Run>,
    /// (x, top, width, height), top-down
    rects: Vec<(f32, f32, f32, f32)>,
}

impl PageSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.runs.push(Run {
            x,
            y,
            size,
            bold: false,
            text: text.to_string(),
        });
        self
    }

    pub fn bold(mut self, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.runs.push(Run {
            x,
            y,
            size,
            bold: true,
            text: text.to_string(),
        });
        self
    }

    /// A paragraph line of 10pt body text at the left margin.
    pub fn body(self, y: f32, text: &str) -> Self {
        self.text(72.0, y, 10.0, text)
    }

    /// A stroked rectangle.
    pub fn rect(mut self, x: f32, top: f32, width: f32, height: f32) -> Self {
        self.rects.push((x, top, width, height));
        self
    }

    fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for &(x, top, w, h) in &self.rects {
            ops.push(Operation::new(
                "re",
                vec![x.into(), (PAGE_HEIGHT - top - h).into(), w.into(), h.into()],
            ));
            ops.push(Operation::new("S", vec![]));
        }
        for run in &self.runs {
            let font = if run.bold { "F2" } else { "F1" };
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font.into(), run.size.into()]),
                Operation::new("Td", vec![run.x.into(), (PAGE_HEIGHT - run.y).into()]),
                Operation::new("Tj", vec![Object::string_literal(run.text.as_str())]),
                Operation::new("ET", vec![]),
            ]);
        }
        ops
    }
}

/// Builder for a multi-page PDF with optional metadata title and bookmarks.
#[derive(Default)]
pub struct PdfBuilder {
    title: Option<String>,
    pages: Vec<PageSpec>,
    /// (depth, title, page) in document order
    bookmarks: Vec<(usize, String, u32)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn page(mut self, page: PageSpec) -> Self {
        self.pages.push(page);
        self
    }

    pub fn bookmark(mut self, depth: usize, title: &str, page: u32) -> Self {
        self.bookmarks.push((depth, title.to_string(), page));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });

        let mut page_ids = Vec::new();
        for spec in &self.pages {
            let content = Content {
                operations: spec.operations(),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => regular, "F2" => bold },
                },
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => page_ids.len() as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if let Some(outlines_id) = self.add_outlines(&mut doc, &page_ids) {
            catalog.set("Outlines", outlines_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Save the document as `name` inside `dir`.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }

    /// Link the flat bookmark list into an outline tree.
    fn add_outlines(&self, doc: &mut Document, page_ids: &[ObjectId]) -> Option<ObjectId> {
        if self.bookmarks.is_empty() {
            return None;
        }

        let root = doc.new_object_id();
        let ids: Vec<ObjectId> = self.bookmarks.iter().map(|_| doc.new_object_id()).collect();

        // parent index (None = root) for each entry
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        for (i, (depth, _, _)) in self.bookmarks.iter().enumerate() {
            while let Some(&top) = stack.last() {
                if self.bookmarks[top].0 >= *depth {
                    stack.pop();
                } else {
                    break;
                }
            }
            parents.push(stack.last().copied());
            stack.push(i);
        }

        let children_of = |parent: Option<usize>| -> Vec<usize> {
            (0..ids.len()).filter(|i| parents[*i] == parent).collect()
        };

        for (i, (_, title, page)) in self.bookmarks.iter().enumerate() {
            let siblings = children_of(parents[i]);
            let pos = siblings.iter().position(|s| *s == i).unwrap();
            let mut item = dictionary! {
                "Title" => Object::string_literal(title.as_str()),
                "Parent" => parents[i].map(|p| ids[p]).unwrap_or(root),
                "Dest" => vec![page_ids[*page as usize - 1].into(), "Fit".into()],
            };
            if pos > 0 {
                item.set("Prev", ids[siblings[pos - 1]]);
            }
            if let Some(next) = siblings.get(pos + 1) {
                item.set("Next", ids[*next]);
            }
            let kids = children_of(Some(i));
            if let (Some(first), Some(last)) = (kids.first(), kids.last()) {
                item.set("First", ids[*first]);
                item.set("Last", ids[*last]);
                item.set("Count", kids.len() as i64);
            }
            doc.objects.insert(ids[i], Object::Dictionary(item));
        }

        let top = children_of(None);
        doc.objects.insert(
            root,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => ids[top[0]],
                "Last" => ids[top[top.len() - 1]],
                "Count" => top.len() as i64,
            }),
        );
        Some(root)
    }
}

const BODY: &str = "The quarter closed with steady growth in all regions.";

/// A two-page report titled "Annual Report 2023" in its metadata.
///
/// Page 1 carries a 24pt bold "Executive Summary"; page 2 has numbered
/// sections "1 Results" and "1.1 Revenue" in body type.
pub fn annual_report() -> PdfBuilder {
    PdfBuilder::new()
        .title("Annual Report 2023")
        .page(
            PageSpec::new()
                .bold(72.0, 120.0, 24.0, "Executive Summary")
                .body(150.0, BODY)
                .body(165.0, BODY)
                .body(180.0, BODY),
        )
        .page(
            PageSpec::new()
                .text(72.0, 72.0, 10.0, "1 Results")
                .body(92.0, BODY)
                .text(72.0, 132.0, 10.0, "1.1 Revenue")
                .body(152.0, "Revenue rose across every product line this year."),
        )
}
