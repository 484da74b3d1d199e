//! Embedded TrueType font for generated PDFs.
//!
//! The standard PDF fonts only cover WinAnsi, so ingredient names in Cyrillic
//! (the bulk of the catalogue) need a real font program. Text is written as
//! two-byte glyph ids (`Identity-H`) against a Type0 font whose descendant
//! embeds DejaVu Sans. A `ToUnicode` CMap maps glyph ids back to text for
//! search, copy and text extraction.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use ttf_parser::{Face, GlyphId};

use crate::error::ReportError;

const DEJAVU_SANS: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
const DEJAVU_SANS_NAME: &str = "DejaVuSans";

/// PDF limit on entries in one `beginbfchar` block.
const BFCHAR_BLOCK: usize = 100;

pub struct EmbeddedFont<'a> {
    name: &'a str,
    data: &'a [u8],
    face: Face<'a>,
    /// Glyph id -> the character it was first used for.
    used: BTreeMap<u16, char>,
}

impl EmbeddedFont<'static> {
    pub fn dejavu_sans() -> Result<Self, ReportError> {
        Self::parse(DEJAVU_SANS_NAME, DEJAVU_SANS)
    }
}

impl<'a> EmbeddedFont<'a> {
    pub fn parse(name: &'a str, data: &'a [u8]) -> Result<Self, ReportError> {
        let face = Face::parse(data, 0).map_err(|e| ReportError::Font(e.to_string()))?;
        Ok(Self {
            name,
            data,
            face,
            used: BTreeMap::new(),
        })
    }

    /// Encode `text` as a `Tj` operand. Characters the font lacks become
    /// glyph 0 (`.notdef`).
    pub fn encode(&mut self, text: &str) -> Object {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let gid = self.face.glyph_index(c).map(|g| g.0).unwrap_or(0);
            if gid != 0 {
                self.used.entry(gid).or_insert(c);
            }
            bytes.extend_from_slice(&gid.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    /// Add the Type0 font, its descendant, descriptor, program and ToUnicode
    /// map to `doc`. Call after all text has been encoded.
    pub fn write(self, doc: &mut Document) -> ObjectId {
        let units = f64::from(self.face.units_per_em());
        let scale = |v: f64| Object::Integer((v * 1000.0 / units).round() as i64);
        let bbox = self.face.global_bounding_box();
        let ascender = self.face.ascender();

        let program_id = doc.add_object(Stream::new(
            dictionary! {
                "Length1" => self.data.len() as i64,
            },
            self.data.to_vec(),
        ));

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => self.name,
            "Flags" => 32,
            "FontBBox" => vec![
                scale(f64::from(bbox.x_min)),
                scale(f64::from(bbox.y_min)),
                scale(f64::from(bbox.x_max)),
                scale(f64::from(bbox.y_max)),
            ],
            "ItalicAngle" => 0,
            "Ascent" => scale(f64::from(ascender)),
            "Descent" => scale(f64::from(self.face.descender())),
            "CapHeight" => scale(f64::from(self.face.capital_height().unwrap_or(ascender))),
            "StemV" => 80,
            "FontFile2" => program_id,
        });

        let widths: Vec<Object> = self
            .used
            .keys()
            .flat_map(|&gid| {
                let advance = self.face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
                [
                    Object::Integer(i64::from(gid)),
                    Object::Array(vec![scale(f64::from(advance))]),
                ]
            })
            .collect();

        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => self.name,
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

        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! {},
            to_unicode_cmap(&self.used).into_bytes(),
        ));

        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => self.name,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant_id)],
            "ToUnicode" => to_unicode_id,
        })
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().collect();
    for block in entries.chunks(BFCHAR_BLOCK) {
        let _ = writeln!(cmap, "{} beginbfchar", block.len());
        for (gid, c) in block {
            let mut units = [0u16; 2];
            let target: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            let _ = writeln!(cmap, "<{gid:04X}> <{target}>");
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_covers_latin_and_cyrillic() {
        let mut font = EmbeddedFont::dejavu_sans().unwrap();
        let Object::String(bytes, StringFormat::Hexadecimal) = font.encode("Мука g") else {
            panic!("expected a hex string");
        };
        assert_eq!(bytes.len(), 12);
        assert!(bytes.chunks(2).all(|gid| gid != [0u8, 0].as_slice()));
        // 'М', 'у', 'к', 'а', ' ', 'g'
        assert_eq!(font.used.len(), 6);
    }

    #[test]
    fn test_missing_glyph_is_notdef() {
        let mut font = EmbeddedFont::dejavu_sans().unwrap();
        // DejaVu Sans has no CJK ideographs
        let Object::String(bytes, _) = font.encode("中") else {
            panic!("expected a string");
        };
        assert_eq!(bytes, vec![0, 0]);
        assert!(font.used.is_empty());
    }

    #[test]
    fn test_to_unicode_blocks() {
        let used: BTreeMap<u16, char> = (1..=150u16)
            .map(|gid| (gid, char::from_u32(0x400 + u32::from(gid)).unwrap()))
            .collect();
        let cmap = to_unicode_cmap(&used);
        assert!(cmap.contains("100 beginbfchar\n"));
        assert!(cmap.contains("50 beginbfchar\n"));
        assert!(cmap.contains("<0001> <0401>\n"));
        assert!(cmap.ends_with("end\nend\n"));
    }
}
