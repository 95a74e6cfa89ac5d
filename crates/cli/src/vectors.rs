// A64Mask - AArch64 Logical Immediate Toolkit
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Test-vector file formats for the validation runner.
//!
//! Two formats are accepted, chosen by extension: a structured YAML
//! schema, and the legacy whitespace-separated text produced by the
//! original vector generator. Legacy fields are recognized by their
//! `N:` / `immr:` / `imms:` prefixes, never by byte offset.

use a64mask_core::{EncodingFields, MaskResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use tracing::warn;

const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

fn default_schema_version() -> String {
    SUPPORTED_SCHEMA_VERSION.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("Invalid YAML vector file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Malformed vector line {0}: {1}")]
    Malformed(usize, String),
}

/// One expected decoding: the encoding fields and the immediate they
/// must materialize (already truncated to the register width N selects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorRecord {
    #[serde(serialize_with = "ser_hex", deserialize_with = "de_hex")]
    pub imm: u64,
    pub n: u8,
    pub immr: u8,
    pub imms: u8,
}

impl VectorRecord {
    pub fn encoding(&self) -> MaskResult<EncodingFields> {
        EncodingFields::try_new(self.n, self.imms, self.immr)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VectorFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub vectors: Vec<VectorRecord>,
}

fn ser_hex<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:#x}"))
}

/// Accepts the immediate as an integer or as a hex string, with or
/// without a `0x` prefix.
fn de_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Int(value) => Ok(value),
        Repr::Text(text) => parse_hex_u64(&text).map_err(serde::de::Error::custom),
    }
}

fn parse_hex_u64(text: &str) -> Result<u64, String> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid hex immediate '{text}': {e}"))
}

/// Parses a vector file already read into memory. YAML for `.yaml` /
/// `.yml`, the legacy text format for everything else.
pub fn parse_vectors(path: &Path, text: &str) -> Result<Vec<VectorRecord>, VectorError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if matches!(extension, "yaml" | "yml") {
        let file: VectorFile = serde_yaml::from_str(text)?;
        if file.schema_version != SUPPORTED_SCHEMA_VERSION {
            warn!(
                "Vector schema version '{}' differs from supported '{}'",
                file.schema_version, SUPPORTED_SCHEMA_VERSION
            );
        }
        Ok(file.vectors)
    } else {
        parse_legacy_text(text)
    }
}

/// Legacy format: one record per line, whitespace separated. Field 1 is
/// the expected immediate in hex; field 5 is `N:<0|1>`, field 6
/// `immr:<binary>`, field 7 `imms:<binary>`. Fields 2-4 (the
/// disassembly text the generator emitted) are ignored. Blank lines and
/// `#` comments are skipped.
pub fn parse_legacy_text(text: &str) -> Result<Vec<VectorRecord>, VectorError> {
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let lineno = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(VectorError::Malformed(
                lineno,
                format!("expected 7 fields, found {}", fields.len()),
            ));
        }

        let imm =
            parse_hex_u64(fields[0]).map_err(|reason| VectorError::Malformed(lineno, reason))?;
        let n = parse_field(fields[4], "N:", 10, lineno)?;
        let immr = parse_field(fields[5], "immr:", 2, lineno)?;
        let imms = parse_field(fields[6], "imms:", 2, lineno)?;

        records.push(VectorRecord { imm, n, immr, imms });
    }

    Ok(records)
}

fn parse_field(field: &str, prefix: &str, radix: u32, lineno: usize) -> Result<u8, VectorError> {
    let digits = field.strip_prefix(prefix).ok_or_else(|| {
        VectorError::Malformed(lineno, format!("expected '{prefix}' field, found '{field}'"))
    })?;
    u8::from_str_radix(digits, radix).map_err(|e| {
        VectorError::Malformed(lineno, format!("bad '{prefix}' value '{digits}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_legacy_line() {
        let text = "e000000003ffffff orr x0, #imm N:1 immr:000011 imms:011100\n";
        let records = parse_legacy_text(text).unwrap();
        assert_eq!(
            records,
            vec![VectorRecord {
                imm: 0xE000_0000_03FF_FFFF,
                n: 1,
                immr: 3,
                imms: 28,
            }]
        );
    }

    #[test]
    fn test_parse_legacy_skips_blank_and_comment_lines() {
        let text = "\n# header comment\n55555555 and w0, #imm N:0 immr:000000 imms:111100\n\n";
        let records = parse_legacy_text(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].imm, 0x5555_5555);
        assert_eq!(records[0].imms, 0b111100);
    }

    #[test]
    fn test_parse_legacy_rejects_bad_prefix_with_line_number() {
        let text = "ff and w0, #imm X:0 immr:000000 imms:000000\n";
        let err = parse_legacy_text(text).unwrap_err();
        match err {
            VectorError::Malformed(line, reason) => {
                assert_eq!(line, 1);
                assert!(reason.contains("N:"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_legacy_rejects_short_line() {
        let err = parse_legacy_text("deadbeef N:1\n").unwrap_err();
        assert!(matches!(err, VectorError::Malformed(1, _)));
    }

    #[test]
    fn test_parse_yaml_hex_and_integer_immediates() {
        let yaml = r#"
schema_version: "1.0"
vectors:
  - { imm: "0xe000000003ffffff", n: 1, immr: 3, imms: 28 }
  - { imm: 257, n: 0, immr: 0, imms: 48 }
"#;
        let path = PathBuf::from("vectors.yaml");
        let records = parse_vectors(&path, yaml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].imm, 0xE000_0000_03FF_FFFF);
        assert_eq!(records[1].imm, 257);
    }

    #[test]
    fn test_encoding_range_check() {
        let record = VectorRecord {
            imm: 0,
            n: 1,
            immr: 64,
            imms: 0,
        };
        assert!(record.encoding().is_err());
    }
}
