//! Source map (v3) emission for concatenated bundles.
//!
//! The bundle is built line-by-line from wrapped source files, so the map
//! is a line mapping: each output line points at the source file and line
//! it was copied from, or at nothing for generated wrapper lines. Fields
//! are base64-VLQ encoded per the source map v3 format. The output
//! contains no timestamps; identical input produces identical maps.

use serde_json::json;

const BASE64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Append the base64-VLQ encoding of a value.
fn encode_vlq(value: i64, out: &mut String) {
    let mut rest = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (rest & 0b1_1111) as usize;
        rest >>= 5;
        if rest != 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if rest == 0 {
            break;
        }
    }
}

/// Builder for a line-based source map.
#[derive(Debug, Clone)]
pub struct SourceMapBuilder {
    file: String,
    sources: Vec<String>,
    sources_content: Vec<String>,
    /// Per output line: the (source index, source line) it came from, or
    /// `None` for generated lines
    lines: Vec<Option<(usize, usize)>>,
}

impl SourceMapBuilder {
    /// Create a builder for the named output file.
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            sources: Vec::new(),
            sources_content: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Register a source file and return its index.
    pub fn add_source(&mut self, name: &str, content: &str) -> usize {
        self.sources.push(name.to_string());
        self.sources_content.push(content.to_string());
        self.sources.len() - 1
    }

    /// Record that the next output line was copied from a source line
    /// (both zero-based).
    pub fn map_line(&mut self, source: usize, line: usize) {
        self.lines.push(Some((source, line)));
    }

    /// Record a generated output line with no source.
    pub fn pad_line(&mut self) {
        self.lines.push(None);
    }

    /// Number of output lines recorded so far.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Keep only the output lines marked `true`, in order.
    ///
    /// Used when minification drops blank output lines after the map was
    /// recorded.
    pub fn retain_lines(&mut self, keep: &[bool]) {
        let mut index = 0;
        self.lines.retain(|_| {
            let keep_line = keep.get(index).copied().unwrap_or(true);
            index += 1;
            keep_line
        });
    }

    /// Render the map as JSON.
    pub fn to_json(&self) -> String {
        let mut mappings = String::new();
        let mut prev_source: i64 = 0;
        let mut prev_line: i64 = 0;

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                mappings.push(';');
            }
            if let Some((source, src_line)) = line {
                // Segment: [output column, source index, source line, source column]
                encode_vlq(0, &mut mappings);
                encode_vlq(*source as i64 - prev_source, &mut mappings);
                encode_vlq(*src_line as i64 - prev_line, &mut mappings);
                encode_vlq(0, &mut mappings);
                prev_source = *source as i64;
                prev_line = *src_line as i64;
            }
        }

        json!({
            "version": 3,
            "file": self.file,
            "sources": self.sources,
            "sourcesContent": self.sources_content,
            "names": [],
            "mappings": mappings,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(value, &mut s);
        s
    }

    #[test]
    fn test_vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(-16), "hB");
    }

    #[test]
    fn test_single_source_consecutive_lines() {
        let mut map = SourceMapBuilder::new("bundle.js");
        let src = map.add_source("a.js", "line0\nline1\n");
        map.map_line(src, 0);
        map.map_line(src, 1);

        let json: serde_json::Value = serde_json::from_str(&map.to_json()).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["file"], "bundle.js");
        assert_eq!(json["sources"][0], "a.js");
        // First line: col 0, source 0, line 0, col 0; second: line delta +1
        assert_eq!(json["mappings"], "AAAA;AACA");
    }

    #[test]
    fn test_pad_lines_produce_empty_segments() {
        let mut map = SourceMapBuilder::new("bundle.js");
        let src = map.add_source("a.js", "x\n");
        map.pad_line();
        map.map_line(src, 0);
        map.pad_line();

        let json: serde_json::Value = serde_json::from_str(&map.to_json()).unwrap();
        assert_eq!(json["mappings"], ";AAAA;");
    }

    #[test]
    fn test_source_switch_uses_deltas() {
        let mut map = SourceMapBuilder::new("bundle.js");
        let a = map.add_source("a.js", "a\n");
        let b = map.add_source("b.js", "b\n");
        map.map_line(a, 0);
        map.map_line(b, 0);

        let json: serde_json::Value = serde_json::from_str(&map.to_json()).unwrap();
        // Second segment: source delta +1, line delta 0
        assert_eq!(json["mappings"], "AAAA;ACAA");
    }

    #[test]
    fn test_retain_lines_drops_mappings() {
        let mut map = SourceMapBuilder::new("bundle.js");
        let src = map.add_source("a.js", "x\ny\nz\n");
        map.map_line(src, 0);
        map.map_line(src, 1);
        map.map_line(src, 2);

        map.retain_lines(&[true, false, true]);
        assert_eq!(map.line_count(), 2);

        let json: serde_json::Value = serde_json::from_str(&map.to_json()).unwrap();
        assert_eq!(json["mappings"], "AAAA;AAEA");
    }

    #[test]
    fn test_output_is_deterministic() {
        let build = || {
            let mut map = SourceMapBuilder::new("bundle.js");
            let src = map.add_source("a.js", "x\n");
            map.map_line(src, 0);
            map.to_json()
        };
        assert_eq!(build(), build());
    }
}
