//! Defines the `JsonWriter` struct for writing assessment results as a JSON array.
//!

use crate::assess::DrugResult;
use crate::utils::Result;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

/// Structure for writing drug results to a file or to standard output.
pub struct JsonWriter {
    writer: Box<dyn Write>,
    pretty: bool,
}

impl JsonWriter {
    /// Constructs a new `JsonWriter`; a path of `-` writes to standard output.
    pub fn new(output_path: &str, pretty: bool) -> Result<JsonWriter> {
        let writer: Box<dyn Write> = if output_path == "-" {
            Box::new(BufWriter::new(io::stdout()))
        } else {
            let file = File::create(output_path)
                .map_err(|e| format!("Failed to create {}: {}", output_path, e))?;
            Box::new(BufWriter::new(file))
        };
        Ok(JsonWriter { writer, pretty })
    }

    #[cfg(test)]
    fn from_writer(writer: Box<dyn Write>, pretty: bool) -> JsonWriter {
        JsonWriter { writer, pretty }
    }

    /// Writes all results as one JSON array followed by a newline.
    pub fn write(&mut self, results: &[DrugResult]) -> Result<()> {
        let encoded = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, results)
        } else {
            serde_json::to_writer(&mut self.writer, results)
        };
        encoded.map_err(|e| format!("Failed to write results: {}", e))?;
        writeln!(self.writer).map_err(|e| format!("Failed to write results: {}", e))?;
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush results: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::{assess, AssessParams};
    use crate::knowledge::KnowledgeBase;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn results() -> Vec<DrugResult> {
        let kb = KnowledgeBase::builtin().unwrap();
        let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                   chr10\t94981296\trs1057910\tA\tC\t.\tPASS\tGENE=CYP2C9\n";
        let drugs = vec!["WARFARIN".to_string(), "CODEINE".to_string()];
        assess(vcf.as_bytes(), &drugs, &kb, &AssessParams::default())
            .unwrap()
            .results
    }

    #[test]
    fn writes_result_records() {
        let buffer = SharedBuffer::default();
        let mut writer = JsonWriter::from_writer(Box::new(buffer.clone()), false);
        writer.write(&results()).unwrap();

        let bytes = buffer.0.lock().unwrap().clone();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);

        let warfarin = &records[0];
        assert_eq!(warfarin["drug"], "WARFARIN");
        assert_eq!(warfarin["patient_id"], "PATIENT_UNKNOWN");
        assert_eq!(warfarin["risk_assessment"]["risk_label"], "Toxic");
        assert_eq!(warfarin["risk_assessment"]["severity"], "critical");
        assert_eq!(warfarin["pharmacogenomic_profile"]["diplotype"], "*3/*3");
        assert_eq!(warfarin["pharmacogenomic_profile"]["phenotype"], "poor_metabolizer");
        assert_eq!(
            warfarin["pharmacogenomic_profile"]["detected_variants"][0]["id"],
            "rs1057910"
        );
        assert_eq!(
            warfarin["clinical_recommendation"]["action"],
            "avoid_or_severe_reduction"
        );
        assert_eq!(warfarin["quality_metrics"]["vcf_parsing_success"], true);
        assert_eq!(warfarin["llm_generated_explanation"], "pending");
    }

    #[test]
    fn writes_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let path = path.to_str().unwrap();
        let mut writer = JsonWriter::new(path, true).unwrap();
        writer.write(&results()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(JsonWriter::new(path.to_str().unwrap(), false)
            .err()
            .unwrap()
            .starts_with("Failed to create"));
    }
}
