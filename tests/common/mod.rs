#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use inspection_pdf::{Item, Photo, PhotoError, PhotoStore, Report, ReportKind, Room};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 120])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// In-memory photo store. Keys are `bucket/path`; listed keys fail on fetch.
#[derive(Default)]
pub struct MemoryPhotoStore {
    objects: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryPhotoStore {
    pub fn with_photo(mut self, bucket: &str, path: &str, bytes: Vec<u8>) -> Self {
        self.objects.insert(format!("{bucket}/{path}"), bytes);
        self
    }

    pub fn failing(mut self, bucket: &str, path: &str) -> Self {
        self.failing.insert(format!("{bucket}/{path}"));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn fetch_bytes(&self, bucket: &str, path: &str) -> Result<Vec<u8>, PhotoError> {
        let key = format!("{bucket}/{path}");
        self.requests.lock().unwrap().push(key.clone());
        if self.failing.contains(&key) {
            return Err(PhotoError::Other("simulated outage".into()));
        }
        self.objects.get(&key).cloned().ok_or(PhotoError::NotFound)
    }
}

pub fn report(kind: ReportKind, rooms: Vec<Room>) -> Report {
    Report {
        kind,
        inspected_at: None,
        place: Some("8 impasse des Tilleuls, Nantes".into()),
        general_notes: None,
        lease_ref: Some("BAIL-2024-117".into()),
        landlord: Some("Claire Martin".into()),
        tenants: vec!["Hugo Bernard".into()],
        rooms,
        unassigned_items: vec![],
    }
}

pub fn room(name: &str, level: Option<&str>, position: i64, items: Vec<Item>) -> Room {
    Room {
        name: name.into(),
        level: level.map(Into::into),
        notes: None,
        position,
        items,
    }
}

pub fn item(label: &str, category: &str) -> Item {
    Item {
        label: label.into(),
        category: Some(category.into()),
        ..Item::default()
    }
}

pub fn photo(bucket: &str, path: &str) -> Photo {
    Photo {
        bucket: Some(bucket.into()),
        path: Some(path.into()),
    }
}

// ---------------------------------------------------------------------------
// Minimal PDF text extraction: inflate every FlateDecode stream, keep the page
// content streams, and decode the string operands they show.
// ---------------------------------------------------------------------------

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn rfind(haystack: &[u8], needle: &[u8], before: usize) -> Option<usize> {
    haystack[..before]
        .windows(needle.len())
        .rposition(|w| w == needle)
}

/// Raw (still encoded) data of every stream object, in file order.
fn raw_streams(pdf: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(kw) = find(pdf, b"stream", pos) {
        pos = kw + 6;
        if kw >= 3 && &pdf[kw - 3..kw] == b"end" {
            continue;
        }
        let mut start = kw + 6;
        if pdf.get(start) == Some(&b'\r') {
            start += 1;
        }
        if pdf.get(start) != Some(&b'\n') {
            continue;
        }
        start += 1;
        let Some(dict) = rfind(pdf, b"/Length ", kw) else {
            continue;
        };
        let digits: String = pdf[dict + 8..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .map(|&b| b as char)
            .collect();
        let Ok(len) = digits.parse::<usize>() else {
            continue;
        };
        if let Some(data) = pdf.get(start..start + len) {
            out.push(data);
            pos = start + len;
        }
    }
    out
}

fn winansi_byte(b: u8) -> char {
    match b {
        0x85 => '\u{2026}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x80 => '\u{20AC}',
        _ => b as char,
    }
}

fn literal_string(data: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut out = Vec::new();
    let mut depth = 1;
    while i < data.len() {
        let b = data[i];
        i += 1;
        match b {
            b'\\' => {
                let Some(&next) = data.get(i) else { break };
                i += 1;
                match next {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'0'..=b'7' => {
                        let mut v = (next - b'0') as u32;
                        for _ in 0..2 {
                            match data.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    v = v * 8 + (d - b'0') as u32;
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push(v as u8);
                    }
                    other => out.push(other),
                }
            }
            b'(' => {
                depth += 1;
                out.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                out.push(b);
            }
            _ => out.push(b),
        }
    }
    (out, i)
}

fn hex_string(data: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut digits = Vec::new();
    while i < data.len() && data[i] != b'>' {
        if data[i].is_ascii_hexdigit() {
            digits.push(data[i]);
        }
        i += 1;
    }
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    let bytes = digits
        .chunks(2)
        .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
        .collect();
    (bytes, i + 1)
}

/// Raw string operands shown by one content stream.
fn shown_strings(content: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'(' => {
                let (bytes, next) = literal_string(content, i + 1);
                out.push(bytes);
                i = next;
            }
            b'<' if content.get(i + 1) != Some(&b'<') => {
                let (bytes, next) = hex_string(content, i + 1);
                out.push(bytes);
                i = next;
            }
            _ => i += 1,
        }
    }
    out
}

fn content_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    raw_streams(pdf)
        .into_iter()
        .filter_map(|raw| miniz_oxide::inflate::decompress_to_vec_zlib(raw).ok())
        .filter(|data| find(data, b" Tf", 0).is_some() && find(data, b"BT", 0).is_some())
        .collect()
}

/// Text of every page, in page order, with one shown fragment per line.
/// Strings are decoded as WinAnsi, as written with the base-14 fonts.
pub fn page_texts(pdf: &[u8]) -> Vec<String> {
    content_streams(pdf)
        .iter()
        .map(|data| {
            shown_strings(data)
                .into_iter()
                .map(|bytes| bytes.into_iter().map(winansi_byte).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// Glyph id to text, merged from every ToUnicode `bfchar` table in the file.
fn glyph_to_unicode(pdf: &[u8]) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    for stream in raw_streams(pdf) {
        let mut pos = 0;
        while let Some(begin) = find(stream, b"beginbfchar", pos) {
            let end = find(stream, b"endbfchar", begin).unwrap_or(stream.len());
            let mut hexes = Vec::new();
            let mut i = begin;
            while i < end {
                if stream[i] == b'<' {
                    let (bytes, next) = hex_string(stream, i + 1);
                    hexes.push(bytes);
                    i = next;
                } else {
                    i += 1;
                }
            }
            for pair in hexes.chunks(2) {
                let [src, dst] = pair else { continue };
                if src.len() != 2 {
                    continue;
                }
                let units: Vec<u16> = dst
                    .chunks(2)
                    .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]))
                    .collect();
                map.insert(
                    u16::from_be_bytes([src[0], src[1]]),
                    String::from_utf16_lossy(&units),
                );
            }
            pos = end;
        }
    }
    map
}

/// Like [`page_texts`] for documents drawn with an embedded CID font:
/// operands are two-byte glyph ids mapped back through the ToUnicode tables.
pub fn page_texts_cid(pdf: &[u8]) -> Vec<String> {
    let map = glyph_to_unicode(pdf);
    content_streams(pdf)
        .iter()
        .map(|data| {
            shown_strings(data)
                .into_iter()
                .map(|bytes| {
                    bytes
                        .chunks(2)
                        .map(|c| {
                            let gid = u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]);
                            map.get(&gid).map(String::as_str).unwrap_or("\u{FFFD}").to_string()
                        })
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// 1-based number of the first page whose text contains `needle`, searching
/// from page `from`.
pub fn first_page_containing(pages: &[String], needle: &str, from: usize) -> Option<usize> {
    pages
        .iter()
        .enumerate()
        .skip(from.saturating_sub(1))
        .find(|(_, text)| text.contains(needle))
        .map(|(i, _)| i + 1)
}
