pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use water_footprint_common::{EstimationEvent, Summary};

/// JSON出力の形
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryExport<'a> {
    summary: &'a Summary,
    events: &'a [EstimationEvent],
}

fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.with_extension(extension)
    }
}

pub fn write_json(events: &[EstimationEvent], summary: &Summary, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&HistoryExport { summary, events })?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// 履歴を出力し、書き出したファイルを返す
pub fn export_history(
    events: &[EstimationEvent],
    summary: &Summary,
    format: &ExportFormat,
    output: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let path = output_path_for_format(output, title, "json");
        write_json(events, summary, &path)?;
        println!("✔ JSON出力: {}", path.display());
        written.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_path_for_format(output, title, "xlsx");
        println!("- Excelを生成中...");
        excel::generate_excel(events, summary, &path)?;
        println!("✔ Excel出力: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path_for_format(dir.path(), "履歴", "xlsx");
        assert_eq!(path, dir.path().join("履歴.xlsx"));
    }

    #[test]
    fn test_output_path_replaces_extension() {
        let path = output_path_for_format(Path::new("out/history.json"), "履歴", "xlsx");
        assert_eq!(path, PathBuf::from("out/history.xlsx"));
    }
}
