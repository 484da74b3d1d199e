//! Shopping list aggregation and PDF export.
//!
//! Every ingredient line of every recipe in a user's cart is summed per
//! (ingredient name, measurement unit) and rendered as a plain A4 document
//! set in an embedded Unicode font.
//! Items are ordered by name, then unit.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::ReportError;
use crate::pdf_font::EmbeddedFont;

pub const TITLE: &str = "Shopping list:";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const LEFT_MARGIN: i64 = 100;
const TOP: i64 = 800;
const BOTTOM_MARGIN: i64 = 50;
const TITLE_GAP: i64 = 30;
const LINE_HEIGHT: i64 = 20;
const FONT_SIZE: i64 = 12;

/// One recipe ingredient line reachable through the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

impl ShoppingItem {
    pub fn line(&self) -> String {
        format!("{} ({}) - {}", self.name, self.measurement_unit, self.total)
    }
}

pub fn aggregate<I>(entries: I) -> Vec<ShoppingItem>
where
    I: IntoIterator<Item = CartEntry>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for entry in entries {
        *totals
            .entry((entry.name, entry.measurement_unit))
            .or_insert(0) += i64::from(entry.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingItem {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// A line of text positioned on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
    pub y: i64,
    pub text: String,
}

/// Lay out the title and items top to bottom, starting a new page whenever
/// the cursor drops below the bottom margin.
pub fn layout(items: &[ShoppingItem]) -> Vec<Vec<PlacedLine>> {
    let mut pages = Vec::new();
    let mut page = vec![PlacedLine {
        y: TOP,
        text: TITLE.to_string(),
    }];
    let mut y = TOP - TITLE_GAP;

    for item in items {
        page.push(PlacedLine { y, text: item.line() });
        y -= LINE_HEIGHT;
        if y < BOTTOM_MARGIN {
            pages.push(std::mem::take(&mut page));
            y = TOP;
        }
    }

    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

pub fn render_pdf(items: &[ShoppingItem]) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut font = EmbeddedFont::dejavu_sans()?;

    let mut kids: Vec<Object> = Vec::new();
    for lines in layout(items) {
        let mut operations = Vec::with_capacity(lines.len() * 5);
        for line in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec!["F1".into(), Object::Integer(FONT_SIZE)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(LEFT_MARGIN), Object::Integer(line.y)],
            ));
            operations.push(Operation::new("Tj", vec![font.encode(&line.text)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let font_id = font.write(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, unit: &str, amount: i32) -> CartEntry {
        CartEntry {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    fn items(n: usize) -> Vec<ShoppingItem> {
        (0..n)
            .map(|i| ShoppingItem {
                name: format!("item {i:03}"),
                measurement_unit: "g".to_string(),
                total: 1,
            })
            .collect()
    }

    #[test]
    fn test_same_ingredient_across_recipes_is_summed() {
        let list = aggregate(vec![entry("Flour", "g", 200), entry("Flour", "g", 100)]);
        assert_eq!(
            list,
            vec![ShoppingItem {
                name: "Flour".to_string(),
                measurement_unit: "g".to_string(),
                total: 300,
            }]
        );
        assert_eq!(list[0].line(), "Flour (g) - 300");
    }

    #[test]
    fn test_units_are_kept_apart_and_sorted() {
        let list = aggregate(vec![
            entry("Sugar", "g", 50),
            entry("Milk", "ml", 200),
            entry("Milk", "cup", 1),
            entry("Sugar", "g", 25),
        ]);
        let lines: Vec<String> = list.iter().map(ShoppingItem::line).collect();
        assert_eq!(
            lines,
            vec!["Milk (cup) - 1", "Milk (ml) - 200", "Sugar (g) - 75"]
        );
    }

    #[test]
    fn test_totals_do_not_overflow_i32() {
        let list = aggregate((0..100_000).map(|_| entry("Salt", "g", 32_000)));
        assert_eq!(list[0].total, 3_200_000_000);
    }

    #[test]
    fn test_layout_empty_list_is_title_only() {
        let pages = layout(&[]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 1);
        assert_eq!(pages[0][0].text, TITLE);
    }

    #[test]
    fn test_layout_page_breaks() {
        // First page fits the title plus 37 items, later pages 38
        assert_eq!(layout(&items(36)).len(), 1);
        assert_eq!(layout(&items(37)).len(), 1);
        assert_eq!(layout(&items(38)).len(), 2);
        assert_eq!(layout(&items(37 + 38)).len(), 2);
        assert_eq!(layout(&items(37 + 39)).len(), 3);

        let pages = layout(&items(40));
        assert_eq!(pages[0].last().map(|l| l.y), Some(BOTTOM_MARGIN));
        assert_eq!(pages[1][0].y, TOP);
    }

    #[test]
    fn test_render_produces_loadable_pdf() {
        let bytes = render_pdf(&aggregate(vec![entry("Flour", "g", 300)])).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_render_long_list_spans_pages() {
        let bytes = render_pdf(&items(100)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), layout(&items(100)).len());
    }

    #[test]
    fn test_cyrillic_names_survive_rendering() {
        let list = aggregate(vec![
            entry("Мука", "г", 200),
            entry("Мука", "г", 100),
            entry("Яйца", "шт", 2),
        ]);
        let bytes = render_pdf(&list).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        assert_eq!(lines, vec![TITLE, "Мука (г) - 300", "Яйца (шт) - 2"]);
    }

    #[test]
    fn test_font_is_embedded() {
        let bytes = render_pdf(&[]).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.page_iter().next().unwrap();
        let fonts = doc.get_page_fonts(page_id).unwrap();
        let font = fonts.get(b"F1".as_slice()).unwrap();
        assert_eq!(font.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(font.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
    }
}
