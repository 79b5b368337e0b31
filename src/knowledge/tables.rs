use crate::utils::Result;
use semver::Version;
use std::io::BufRead;

const VERSION_PREFIX: &str = "#version=";

/// A tab-separated knowledge-base table.
#[derive(Debug)]
pub struct Table {
    pub name: String,
    pub version: Version,
    pub rows: Vec<TableRow>,
}

#[derive(Debug)]
pub struct TableRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl TableRow {
    pub fn field(&self, index: usize) -> &str {
        &self.fields[index]
    }
}

/// Reads a table whose first line declares its version (`#version=X.Y.Z`).
/// Further `#` lines are comments; every data row must have exactly
/// `field_count` tab-separated fields.
pub fn read_table<R: BufRead>(name: &str, reader: R, field_count: usize) -> Result<Table> {
    let mut version = None;
    let mut rows = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line.map_err(|e| format!("Error reading {} line {}: {}", name, line_number, e))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if version.is_none() {
            version = Some(parse_version(name, line_number, line)?);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let fields: Vec<String> = line.split('\t').map(|f| f.trim().to_string()).collect();
        if fields.len() != field_count {
            return Err(format!(
                "Error at {} line {}: expected {} fields, found {}",
                name,
                line_number,
                field_count,
                fields.len()
            ));
        }
        if fields.iter().any(|f| f.is_empty()) {
            return Err(format!(
                "Error at {} line {}: empty field (use '.' for missing values)",
                name, line_number
            ));
        }
        rows.push(TableRow {
            line: line_number,
            fields,
        });
    }

    let version = version.ok_or_else(|| format!("Table {} is empty", name))?;
    Ok(Table {
        name: name.to_string(),
        version,
        rows,
    })
}

fn parse_version(name: &str, line_number: usize, line: &str) -> Result<Version> {
    let encoded = line.strip_prefix(VERSION_PREFIX).ok_or_else(|| {
        format!(
            "Error at {} line {}: expected '{}X.Y.Z' as the first line",
            name, line_number, VERSION_PREFIX
        )
    })?;
    Version::parse(encoded.trim()).map_err(|e| {
        format!(
            "Error at {} line {}: invalid version '{}': {}",
            name, line_number, encoded, e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_table_with_comments() {
        let data = "#version=1.2.0\n#drug\tgene\nCODEINE\tCYP2D6\n\nWARFARIN\tCYP2C9\n";
        let table = read_table("drugs", data.as_bytes(), 2).unwrap();
        assert_eq!(table.version, Version::new(1, 2, 0));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].line, 5);
        assert_eq!(table.rows[1].field(1), "CYP2C9");
    }

    #[test]
    fn missing_version_line_is_an_error() {
        let data = "CODEINE\tCYP2D6\n";
        assert_eq!(
            read_table("drugs", data.as_bytes(), 2).unwrap_err(),
            "Error at drugs line 1: expected '#version=X.Y.Z' as the first line"
        );
    }

    #[test]
    fn invalid_version_is_an_error() {
        let data = "#version=one\n";
        assert!(read_table("drugs", data.as_bytes(), 2)
            .unwrap_err()
            .contains("invalid version"));
    }

    #[test]
    fn wrong_field_count_is_an_error() {
        let data = "#version=1.0.0\nCODEINE\tCYP2D6\textra\n";
        assert_eq!(
            read_table("drugs", data.as_bytes(), 2).unwrap_err(),
            "Error at drugs line 2: expected 2 fields, found 3"
        );
    }

    #[test]
    fn empty_table_is_an_error() {
        assert_eq!(
            read_table("rules", "".as_bytes(), 10).unwrap_err(),
            "Table rules is empty"
        );
    }
}
