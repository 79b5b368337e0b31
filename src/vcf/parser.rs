//! Tolerant parser for the single-sample VCF subset used for genotype calls.
//!
//! Malformed input never aborts: problems are reported as line-level
//! [`ParseWarning`]s and the overall outcome is carried by
//! [`ParseResult::success`], which only reflects the presence of a valid
//! `#CHROM` header. Data rows are still recovered when the header is missing.

use super::variant::{ParseResult, ParseWarning, Variant, Zygosity};
use std::collections::BTreeMap;

/// Mandatory leading columns of the `#CHROM` header line.
const MANDATORY_COLUMNS: [&str; 8] = [
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO",
];

const FORMAT_COLUMN: usize = 8;
const FIRST_SAMPLE_COLUMN: usize = 9;

/// Line number used for warnings that concern the file as a whole.
pub const FILE_LEVEL: usize = 0;

struct Header {
    sample_name: Option<String>,
    sample_count: usize,
}

/// Parses raw variant-file bytes. Pure: identical input yields identical output.
pub fn parse_variants(bytes: &[u8]) -> ParseResult {
    let text = String::from_utf8_lossy(bytes);
    let mut result = ParseResult::default();
    let mut header_seen = false;
    let mut header_valid = false;
    let mut warned_headerless_row = false;

    let warn = |result: &mut ParseResult, line: usize, message: String| {
        log::debug!("Variant file line {}: {}", line, message);
        result.warnings.push(ParseWarning { line, message });
    };

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with("##") {
            continue;
        }

        if line.starts_with('#') && !is_header_line(line) {
            warn(
                &mut result,
                line_number,
                "Comment line ignored".to_string(),
            );
            continue;
        }

        if is_header_line(line) {
            if header_seen {
                warn(
                    &mut result,
                    line_number,
                    "Duplicate header line ignored".to_string(),
                );
                continue;
            }
            header_seen = true;
            match parse_header(line) {
                Ok(header) => {
                    header_valid = true;
                    if header.sample_count > 1 {
                        warn(
                            &mut result,
                            line_number,
                            format!(
                                "Found {} samples; only the first sample is used",
                                header.sample_count
                            ),
                        );
                    }
                    result.sample_name = header.sample_name;
                }
                Err(message) => warn(&mut result, line_number, message),
            }
            continue;
        }

        if !header_seen && !warned_headerless_row {
            warned_headerless_row = true;
            warn(
                &mut result,
                line_number,
                "Data row found before the #CHROM header".to_string(),
            );
        }

        match parse_record(line) {
            Ok((variant, notes)) => {
                for note in notes {
                    warn(&mut result, line_number, note);
                }
                result.variants.push(variant);
            }
            Err(message) => warn(&mut result, line_number, format!("Skipped row: {}", message)),
        }
    }

    if !header_seen {
        warn(
            &mut result,
            FILE_LEVEL,
            "Missing #CHROM header line".to_string(),
        );
    }

    result.success = header_valid;
    result
}

fn is_header_line(line: &str) -> bool {
    line.get(..MANDATORY_COLUMNS[0].len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MANDATORY_COLUMNS[0]))
}

fn split_columns(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    }
}

fn parse_header(line: &str) -> Result<Header, String> {
    let columns = split_columns(line);
    if columns.len() < MANDATORY_COLUMNS.len() {
        return Err(format!(
            "Malformed header: expected at least {} columns, found {}",
            MANDATORY_COLUMNS.len(),
            columns.len()
        ));
    }

    for (expected, found) in MANDATORY_COLUMNS.iter().zip(columns.iter()) {
        if !expected.eq_ignore_ascii_case(found.trim()) {
            return Err(format!(
                "Malformed header: expected column '{}', found '{}'",
                expected, found
            ));
        }
    }

    let samples = columns.get(FIRST_SAMPLE_COLUMN..).unwrap_or_default();
    Ok(Header {
        sample_name: samples
            .first()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        sample_count: samples.len(),
    })
}

/// Parses one data row. Non-fatal oddities are returned alongside the variant.
fn parse_record(line: &str) -> Result<(Variant, Vec<String>), String> {
    let columns = split_columns(line);
    if columns.len() < MANDATORY_COLUMNS.len() {
        return Err(format!(
            "expected at least {} columns, found {}",
            MANDATORY_COLUMNS.len(),
            columns.len()
        ));
    }

    let chrom = columns[0].trim();
    if chrom.is_empty() {
        return Err("empty chromosome".to_string());
    }

    let pos = columns[1]
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|&p| p >= 1)
        .ok_or_else(|| format!("invalid position '{}'", columns[1]))?;

    let ref_allele = columns[3].trim();
    if ref_allele.is_empty() || ref_allele == "." {
        return Err("missing reference allele".to_string());
    }
    let alt_allele = columns[4].trim();
    if alt_allele.is_empty() {
        return Err("missing alternate allele".to_string());
    }

    let id = match columns[2].trim() {
        "" | "." => None,
        id => Some(id.to_string()),
    };

    let mut notes = Vec::new();
    let info = decode_info(columns[7], &mut notes);
    let zygosity = decode_sample_gt(&columns, &mut notes);

    let variant = Variant {
        chrom: chrom.to_string(),
        pos,
        id,
        ref_allele: ref_allele.to_string(),
        alt_allele: alt_allele.to_string(),
        info,
        zygosity,
    };
    Ok((variant, notes))
}

fn decode_info(field: &str, notes: &mut Vec<String>) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();
    let field = field.trim();
    if field == "." {
        return info;
    }

    for entry in field.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (entry, "true"),
        };
        if key.is_empty() {
            notes.push(format!("Ignored INFO entry without a key: '{}'", entry));
            continue;
        }
        if info.contains_key(key) {
            notes.push(format!("Duplicate INFO key '{}' ignored", key));
            continue;
        }
        info.insert(key.to_string(), value.to_string());
    }
    info
}

fn decode_sample_gt(columns: &[&str], notes: &mut Vec<String>) -> Option<Zygosity> {
    let format = columns.get(FORMAT_COLUMN)?;
    let sample = columns.get(FIRST_SAMPLE_COLUMN)?;
    let gt_index = format.split(':').position(|key| key.trim() == "GT")?;
    let gt = sample.split(':').nth(gt_index)?.trim();
    let zygosity = Zygosity::from_gt(gt);
    if zygosity.is_none() {
        notes.push(format!("Unrecognized genotype '{}'", gt));
    }
    zygosity
}
