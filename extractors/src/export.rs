use serde::Serialize;
use serde_json::{Map, Value};
use shared_types::ExpenseRecord;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write export to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize expenses: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Records sorted by date, most recent first, each as a flat map in field
/// declaration order. Ties keep their batch order.
pub fn export(records: &[ExpenseRecord]) -> Vec<Map<String, Value>> {
    let mut sorted: Vec<&ExpenseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.date().cmp(a.date()));

    sorted
        .into_iter()
        .filter_map(|record| match serde_json::to_value(record) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect()
}

/// Exported records as a JSON array indented with four spaces
pub fn to_json_string(records: &[ExpenseRecord]) -> Result<String, ExportError> {
    let exported = export(records);

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    exported.serialize(&mut serializer)?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes the export to `path`, creating its parent directory if needed
pub fn write_json_file(path: &Path, records: &[ExpenseRecord]) -> Result<String, ExportError> {
    let json = to_json_string(records)?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, &json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Exported {} expenses to {:?}", records.len(), path);
    Ok(json)
}
