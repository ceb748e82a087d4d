//! JSON Lines record output
//!
//! One record per line, tagged with `"kind": "summary"` or
//! `"kind": "product"`.

use crate::catalog::Record;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends records to a `.jsonl` file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the file at `path`, creating parent directories
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn write_record(&self, record: &Record) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| OutputError::Write(format!("{} writer poisoned", self.path.display())))?;

        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&self) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| OutputError::Write(format!("{} writer poisoned", self.path.display())))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BaseProduct, CategoryPath, CrawlContext};
    use crate::catalog::to_summary;
    use tempfile::TempDir;

    fn summary(sku: &str) -> Record {
        let context = CrawlContext::new("sa", "en", "SAR", "markavip")
            .for_listing(CategoryPath::new(["Men"]));
        let product = BaseProduct::from_listing(
            &context,
            sku,
            format!("https://markavip.com/p/{}.html", sku),
            None,
        );
        Record::Summary(to_summary(&product))
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/records.jsonl");

        let sink = JsonLinesSink::create(&path).unwrap();
        sink.write_record(&summary("1")).unwrap();
        sink.write_record(&summary("2")).unwrap();
        sink.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "summary");
        assert_eq!(first["base_sku"], "1");
        assert_eq!(first["category_path"], serde_json::json!(["Men"]));
        assert!(first.get("referer_url").is_none());
    }

    #[test]
    fn test_records_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");

        let sink = JsonLinesSink::create(&path).unwrap();
        sink.write_record(&summary("9")).unwrap();
        sink.finish().unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        let record: Record = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record, summary("9"));
    }
}
