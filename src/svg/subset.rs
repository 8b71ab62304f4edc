//! Embedded-SVG glyph subsetting.
//!
//! Color fonts can carry one SVG document for a whole range of glyphs.
//! [`SvgDocument`] tokenizes such a document once, recording the byte
//! span of every `glyph{n}` element and of every id-carrying element
//! inside `<defs>`. [`SvgDocument::subset_glyph`] then extracts the
//! smallest self-contained snippet for one glyph: the glyph's subtree
//! plus the transitive closure of the `<defs>` entries it references,
//! with every id rewritten under a fresh per-invocation prefix so that
//! repeated extractions never collide inside the host document.

use std::sync::{Arc, OnceLock};

use ahash::{HashMap, HashMapExt};

use crate::blob::Blob;

/// Tokenizer recursion bound; documents nesting deeper fail to parse.
const MAX_PARSE_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy)]
struct DefsEntry {
    /// Byte span of the element's `id` value.
    id: (u32, u32),
    /// Byte span of the element's outer XML.
    start: u32,
    end: u32,
}

/// One tokenized SVG document, shared read-only after parsing.
pub struct SvgDocument {
    blob: Blob,
    defs_entries: Vec<DefsEntry>,
    glyph_spans: HashMap<u32, (u32, u32)>,
}

impl std::fmt::Debug for SvgDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgDocument")
            .field("len", &self.blob.len())
            .field("defs_entries", &self.defs_entries.len())
            .field("glyphs", &self.glyph_spans.len())
            .finish()
    }
}

impl SvgDocument {
    /// Tokenizes `data`. Returns `None` for documents the minimal
    /// scanner cannot walk (non-UTF-8, unbalanced quotes, a tag without
    /// its closing `>`, or nesting beyond the depth bound).
    pub fn parse(data: &Blob) -> Option<SvgDocument> {
        let text = std::str::from_utf8(data.as_bytes()).ok()?;
        let (defs_entries, glyph_spans) = scan_document(text)?;
        Some(SvgDocument { blob: data.clone(), defs_entries, glyph_spans })
    }

    /// Whether the document contains an element with id `glyph{n}` for
    /// this glyph.
    pub fn covers_glyph(&self, glyph: u32) -> bool {
        self.glyph_spans.contains_key(&glyph)
    }

    fn text(&self) -> &str {
        std::str::from_utf8(self.blob.as_bytes()).unwrap_or("")
    }

    /// Extracts the subtree for `glyph` into `body_dst`, appending its
    /// dependency-closed `<defs>` entries to `defs_dst`. Every id and
    /// reference is rewritten under a fresh `hbimg{N}_` prefix drawn
    /// from `counter`. Returns `false` when the document has no span
    /// for the glyph.
    pub fn subset_glyph(
        &self,
        glyph: u32,
        counter: &mut u32,
        defs_dst: &mut String,
        body_dst: &mut String,
    ) -> bool {
        let text = self.text();
        let Some(&(glyph_start, glyph_end)) = self.glyph_spans.get(&glyph) else {
            return false;
        };

        // Collect referenced ids, then close over the defs entries they
        // pull in.
        let mut needed: Vec<(u32, u32)> = Vec::new();
        collect_refs(text, glyph_start, glyph_end, &mut needed);

        let mut chosen: Vec<usize> = Vec::new();
        let mut qi = 0;
        while qi < needed.len() {
            let need = needed[qi];
            for (idx, entry) in self.defs_entries.iter().enumerate() {
                if text[entry.id.0 as usize..entry.id.1 as usize]
                    == text[need.0 as usize..need.1 as usize]
                {
                    if !chosen.contains(&idx) {
                        chosen.push(idx);
                        collect_refs(text, entry.start, entry.end, &mut needed);
                    }
                    break;
                }
            }
            qi += 1;
        }

        let prefix = format!("hbimg{}_", *counter);
        *counter += 1;

        body_dst.reserve((glyph_end - glyph_start) as usize + prefix.len() + 32);

        for &idx in &chosen {
            let entry = &self.defs_entries[idx];
            append_with_prefix(
                defs_dst,
                &text[entry.start as usize..entry.end as usize],
                &prefix,
            );
            defs_dst.push('\n');
        }

        append_with_prefix(
            body_dst,
            &text[glyph_start as usize..glyph_end as usize],
            &prefix,
        );
        true
    }
}

/// Shared per-face store of parsed documents, one slot per document
/// index.
///
/// Slots are written at most once: a reader that finds its slot empty
/// parses outside any lock and installs the result with a single
/// compare-exchange; a racing writer that loses simply discards its
/// parse and adopts the winner's. After population the store is
/// read-only and freely shared across threads.
pub struct SvgDocumentStore {
    slots: Vec<OnceLock<Option<Arc<SvgDocument>>>>,
}

impl SvgDocumentStore {
    pub fn new(document_count: usize) -> Self {
        let mut slots = Vec::with_capacity(document_count);
        slots.resize_with(document_count, OnceLock::new);
        Self { slots }
    }

    pub fn document_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the parsed document for `index`, parsing `data` on the
    /// first call. A failed parse is cached as `None`.
    pub fn get_or_parse(&self, index: usize, data: &Blob) -> Option<Arc<SvgDocument>> {
        let slot = self.slots.get(index)?;
        if let Some(doc) = slot.get() {
            return doc.clone();
        }
        let parsed = SvgDocument::parse(data).map(Arc::new);
        let _ = slot.set(parsed);
        slot.get().cloned().flatten()
    }
}

/* ── Tokenizer ─────────────────────────────────────────────────────── */

struct OpenElem {
    start: u32,
    id: Option<(u32, u32)>,
    in_defs_content: bool,
    is_defs: bool,
}

fn find(s: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= s.len() {
        return None;
    }
    s[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

fn parse_id_in_start_tag(s: &[u8], tag_start: usize, tag_end: usize) -> Option<(u32, u32)> {
    let mut p = tag_start;
    while p + 4 <= tag_end {
        if &s[p..p + 4] == b"id=\"" || &s[p..p + 4] == b"id='" {
            let quote = s[p + 3];
            let b = p + 4;
            let mut e = b;
            while e < tag_end && s[e] != quote {
                e += 1;
            }
            if e > b {
                return Some((b as u32, e as u32));
            }
        }
        p += 1;
    }
    None
}

/// Decimal glyph id from an `id` value of the form `glyph{n}`.
fn parse_glyph_id(id: &str) -> Option<u32> {
    let digits = id.strip_prefix("glyph")?;
    if digits.is_empty() {
        return None;
    }
    let mut gid: u32 = 0;
    for c in digits.bytes() {
        if !c.is_ascii_digit() {
            return None;
        }
        gid = gid.checked_mul(10)?.checked_add((c - b'0') as u32)?;
    }
    Some(gid)
}

type ScanResult = (Vec<DefsEntry>, HashMap<u32, (u32, u32)>);

fn scan_document(text: &str) -> Option<ScanResult> {
    let s = text.as_bytes();
    let n = s.len();

    let mut defs_entries = Vec::new();
    let mut glyph_spans = HashMap::new();
    let mut stack: Vec<OpenElem> = Vec::new();
    let mut defs_depth = 0usize;

    let record = |elem: &OpenElem,
                  end: usize,
                  defs_entries: &mut Vec<DefsEntry>,
                  glyph_spans: &mut HashMap<u32, (u32, u32)>| {
        let Some(id) = elem.id else { return };
        if elem.in_defs_content {
            defs_entries.push(DefsEntry { id, start: elem.start, end: end as u32 });
        }
        if let Some(gid) = parse_glyph_id(&text[id.0 as usize..id.1 as usize]) {
            glyph_spans.insert(gid, (elem.start, end as u32));
        }
    };

    let mut i = 0usize;
    while i < n {
        if s[i] != b'<' {
            i += 1;
            continue;
        }

        if s[i..].starts_with(b"<!--") {
            i = find(s, i + 4, b"-->")? + 3;
            continue;
        }
        if s[i..].starts_with(b"<![CDATA[") {
            i = find(s, i + 9, b"]]>")? + 3;
            continue;
        }

        let closing = i + 1 < n && s[i + 1] == b'/';
        let special = i + 1 < n && (s[i + 1] == b'!' || s[i + 1] == b'?');

        // Quote-aware scan for the tag's closing '>'.
        let mut gt = i + 1;
        let mut quote = 0u8;
        while gt < n {
            let c = s[gt];
            if quote != 0 {
                if c == quote {
                    quote = 0;
                }
            } else if c == b'"' || c == b'\'' {
                quote = c;
            } else if c == b'>' {
                break;
            }
            gt += 1;
        }
        if gt >= n {
            return None;
        }

        if special {
            i = gt + 1;
            continue;
        }

        // Element name.
        let mut p = i + if closing { 2 } else { 1 };
        while p < gt && s[p].is_ascii_whitespace() {
            p += 1;
        }
        let name_start = p;
        while p < gt {
            let c = s[p];
            if !(c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c == b':') {
                break;
            }
            p += 1;
        }
        let is_defs = &s[name_start..p] == b"defs";

        if closing {
            let Some(elem) = stack.pop() else {
                i = gt + 1;
                continue;
            };
            let end = gt + 1;
            record(&elem, end, &mut defs_entries, &mut glyph_spans);
            if elem.is_defs && defs_depth > 0 {
                defs_depth -= 1;
            }
            i = end;
            continue;
        }

        let id = parse_id_in_start_tag(s, i, gt);

        let mut r = gt;
        while r > i && s[r - 1].is_ascii_whitespace() {
            r -= 1;
        }
        let self_closing = r > i && s[r - 1] == b'/';

        let elem = OpenElem {
            start: i as u32,
            id,
            in_defs_content: defs_depth > 0,
            is_defs,
        };

        if self_closing {
            record(&elem, gt + 1, &mut defs_entries, &mut glyph_spans);
        } else {
            if stack.len() >= MAX_PARSE_DEPTH {
                return None;
            }
            if is_defs {
                defs_depth += 1;
            }
            stack.push(elem);
        }

        i = gt + 1;
    }

    Some((defs_entries, glyph_spans))
}

/* ── Reference collection and rewriting ────────────────────────────── */

/// Reference syntaxes recognized inside element content: pattern text,
/// and the byte that terminates the id value.
const REF_PATTERNS: [(&[u8], u8); 9] = [
    (b"href=\"#", b'"'),
    (b"href='#", b'\''),
    (b"xlink:href=\"#", b'"'),
    (b"xlink:href='#", b'\''),
    (b"url(\"#", b'"'),
    (b"url('#", b'\''),
    (b"url(#", b')'),
    (b"id=\"", b'"'),
    (b"id='", b'\''),
];

/// Patterns that *reference* an id (excludes the `id=` declarations).
const COLLECT_PATTERNS: usize = 7;

/// Collects the spans of all ids referenced within `text[start..end]`,
/// deduplicated by value.
fn collect_refs(text: &str, start: u32, end: u32, ids: &mut Vec<(u32, u32)>) {
    let s = text.as_bytes();
    let mut i = start as usize;
    let end = end as usize;

    'outer: while i < end {
        for (pattern, delim) in REF_PATTERNS.iter().take(COLLECT_PATTERNS) {
            if s[i..end].starts_with(pattern) {
                i += pattern.len();
                let b = i;
                while i < end {
                    let c = s[i];
                    if c == *delim || c == b'"' || c == b'\'' || c == b' ' || c == b'>' {
                        break;
                    }
                    i += 1;
                }
                if i > b {
                    let span = (b as u32, i as u32);
                    let value = &text[b..i];
                    if !ids
                        .iter()
                        .any(|&(a, z)| &text[a as usize..z as usize] == value)
                    {
                        ids.push(span);
                    }
                }
                continue 'outer;
            }
        }
        i += 1;
    }
}

/// Copies `s` to `out`, inserting `prefix` after every id declaration
/// and id reference. Original quoting is preserved because only the
/// prefix is inserted, never the delimiters.
fn append_with_prefix(out: &mut String, s: &str, prefix: &str) {
    let bytes = s.as_bytes();
    let n = bytes.len();
    let mut i = 0usize;
    let mut run = 0usize;

    'outer: while i < n {
        for (pattern, delim) in REF_PATTERNS.iter() {
            if bytes[i..].starts_with(pattern) {
                // Flush up to and including the pattern, then the
                // prefix; the id value flows out with the next flush.
                out.push_str(&s[run..i + pattern.len()]);
                i += pattern.len();
                out.push_str(prefix);
                run = i;
                while i < n && bytes[i] != *delim {
                    i += 1;
                }
                continue 'outer;
            }
        }
        i += 1;
    }
    out.push_str(&s[run..n]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_id_parse_rejects_non_digits() {
        assert_eq!(parse_glyph_id("glyph12"), Some(12));
        assert_eq!(parse_glyph_id("glyph"), None);
        assert_eq!(parse_glyph_id("glyph12a"), None);
        assert_eq!(parse_glyph_id("gradient3"), None);
        assert_eq!(parse_glyph_id("glyph99999999999999"), None);
    }

    #[test]
    fn prefix_rewrite_preserves_quoting() {
        let mut out = String::new();
        append_with_prefix(
            &mut out,
            "<g id='a' fill=\"url(#b)\"><use xlink:href='#a'/></g>",
            "hbimg0_",
        );
        assert_eq!(
            out,
            "<g id='hbimg0_a' fill=\"url(#hbimg0_b)\"><use xlink:href='#hbimg0_a'/></g>"
        );
    }

    #[test]
    fn collect_refs_deduplicates() {
        let text = "<g fill=\"url(#g)\" stroke=\"url(#g)\"><use href=\"#p\"/></g>";
        let mut ids = Vec::new();
        collect_refs(text, 0, text.len() as u32, &mut ids);
        let values: Vec<&str> = ids
            .iter()
            .map(|&(a, b)| &text[a as usize..b as usize])
            .collect();
        assert_eq!(values, ["g", "p"]);
    }
}
