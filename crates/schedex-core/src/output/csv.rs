//! Append-only CSV writers.
//!
//! Each writer opens its file per panel, appends, and closes it again, so a
//! crash mid-run keeps every panel written so far. The column header row is
//! written only when the file is new or empty.

use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::SchedexError;
use crate::model::{Circuit, PanelHeader, PanelRecord};

/// Placeholder load description for panels whose circuit table came back empty.
pub const NO_CIRCUITS: &str = "NO CIRCUITS FOUND";

#[derive(Debug, Serialize)]
struct HeaderRow<'a> {
    #[serde(rename = "Source Image")]
    source_image: &'a str,
    #[serde(rename = "Panel Name")]
    panel_name: &'a str,
    #[serde(rename = "Main Rating")]
    main_rating: &'a str,
    #[serde(rename = "Voltage")]
    voltage: &'a str,
    #[serde(rename = "Phase")]
    phase: &'a str,
    #[serde(rename = "Wire")]
    wire: &'a str,
    #[serde(rename = "Poles")]
    poles: &'a str,
    #[serde(rename = "KAIC")]
    kaic: &'a str,
    #[serde(rename = "Enclosure")]
    enclosure: &'a str,
    #[serde(rename = "Circuit Count")]
    circuit_count: usize,
}

#[derive(Debug, Serialize)]
struct CircuitRow<'a> {
    #[serde(rename = "Source Image")]
    source_image: &'a str,
    #[serde(rename = "Panel Name")]
    panel_name: &'a str,
    #[serde(rename = "Circuit Number")]
    circuit_number: &'a str,
    #[serde(rename = "Load Description")]
    load_description: &'a str,
    #[serde(rename = "OCP Size")]
    ocp_size: &'a str,
    #[serde(rename = "Poles")]
    poles: &'a str,
    #[serde(rename = "Feeder")]
    feeder: &'a str,
}

#[derive(Debug, Serialize)]
struct CombinedRow<'a> {
    #[serde(rename = "Source Image")]
    source_image: &'a str,
    #[serde(rename = "Panel Name")]
    panel_name: &'a str,
    #[serde(rename = "Main Rating")]
    main_rating: &'a str,
    #[serde(rename = "Voltage")]
    voltage: &'a str,
    #[serde(rename = "Phase")]
    phase: &'a str,
    #[serde(rename = "Wire")]
    wire: &'a str,
    #[serde(rename = "Poles")]
    poles: &'a str,
    #[serde(rename = "KAIC")]
    kaic: &'a str,
    #[serde(rename = "Enclosure")]
    enclosure: &'a str,
    #[serde(rename = "Circuit Number")]
    circuit_number: &'a str,
    #[serde(rename = "Load Description")]
    load_description: &'a str,
    #[serde(rename = "OCP Size")]
    ocp_size: &'a str,
    #[serde(rename = "Circuit Poles")]
    circuit_poles: &'a str,
    #[serde(rename = "Feeder")]
    feeder: &'a str,
}

impl<'a> CombinedRow<'a> {
    fn new(source_image: &'a str, header: &'a PanelHeader, circuit: Option<&'a Circuit>) -> Self {
        CombinedRow {
            source_image,
            panel_name: &header.panel_name,
            main_rating: &header.main_rating,
            voltage: &header.voltage,
            phase: &header.phase,
            wire: &header.wire,
            poles: &header.poles,
            kaic: &header.kaic,
            enclosure: &header.enclosure,
            circuit_number: circuit.map_or("", |c| c.circuit_number.as_str()),
            load_description: circuit.map_or(NO_CIRCUITS, |c| c.load_description.as_str()),
            ocp_size: circuit.map_or("", |c| c.ocp_size.as_str()),
            circuit_poles: circuit.map_or("", |c| c.poles.as_str()),
            feeder: circuit.map_or("", |c| c.feeder.as_str()),
        }
    }
}

/// Append `rows` to `path`, writing the column header first if the file is empty.
fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SchedexError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_empty = file.metadata()?.len() == 0;
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(is_empty)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per panel with its header fields.
#[derive(Debug, Clone)]
pub struct HeadersCsvWriter {
    path: PathBuf,
}

impl HeadersCsvWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HeadersCsvWriter { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_panel(&self, panel: &PanelRecord, source_image: &str) -> Result<(), SchedexError> {
        let h = &panel.panel_header;
        let row = HeaderRow {
            source_image,
            panel_name: &h.panel_name,
            main_rating: &h.main_rating,
            voltage: &h.voltage,
            phase: &h.phase,
            wire: &h.wire,
            poles: &h.poles,
            kaic: &h.kaic,
            enclosure: &h.enclosure,
            circuit_count: panel.circuits.len(),
        };
        append_rows(&self.path, &[row])
    }
}

/// One row per circuit, keyed by source image and panel name.
#[derive(Debug, Clone)]
pub struct CircuitsCsvWriter {
    path: PathBuf,
}

impl CircuitsCsvWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CircuitsCsvWriter { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Panels without circuits contribute no rows.
    pub fn write_panel(&self, panel: &PanelRecord, source_image: &str) -> Result<(), SchedexError> {
        let panel_name = panel.panel_header.panel_name.as_str();
        let rows: Vec<CircuitRow<'_>> = panel
            .circuits
            .iter()
            .map(|c| CircuitRow {
                source_image,
                panel_name,
                circuit_number: &c.circuit_number,
                load_description: &c.load_description,
                ocp_size: &c.ocp_size,
                poles: &c.poles,
                feeder: &c.feeder,
            })
            .collect();
        if rows.is_empty() {
            return Ok(());
        }
        append_rows(&self.path, &rows)
    }
}

/// Header fields repeated on every circuit row.
#[derive(Debug, Clone)]
pub struct CombinedCsvWriter {
    path: PathBuf,
}

impl CombinedCsvWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CombinedCsvWriter { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A panel without circuits still gets one row, marked [`NO_CIRCUITS`].
    pub fn write_panel(&self, panel: &PanelRecord, source_image: &str) -> Result<(), SchedexError> {
        let header = &panel.panel_header;
        let rows: Vec<CombinedRow<'_>> = if panel.circuits.is_empty() {
            vec![CombinedRow::new(source_image, header, None)]
        } else {
            panel
                .circuits
                .iter()
                .map(|c| CombinedRow::new(source_image, header, Some(c)))
                .collect()
        };
        append_rows(&self.path, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_panel() -> PanelRecord {
        PanelRecord {
            panel_header: PanelHeader {
                panel_name: "PC-LP-01-01".into(),
                main_rating: "400A MCB".into(),
                voltage: "208Y/120".into(),
                kaic: "22,000".into(),
                ..Default::default()
            },
            circuits: vec![
                Circuit {
                    load_description: "Lighting".into(),
                    ocp_size: "20A".into(),
                    poles: "1".into(),
                    circuit_number: "1".into(),
                    ..Default::default()
                },
                Circuit {
                    load_description: "RTU-1".into(),
                    ocp_size: "60A".into(),
                    poles: "3".into(),
                    feeder: "3#6, 1#10G".into(),
                    circuit_number: "2".into(),
                },
            ],
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn header_row_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_headers.csv");
        let writer = HeadersCsvWriter::new(&path);
        writer.write_panel(&sample_panel(), "E-601.png").unwrap();
        // A second writer on the same file appends without a new header.
        HeadersCsvWriter::new(&path)
            .write_panel(&PanelRecord::default(), "E-602.png")
            .unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Source Image,Panel Name,Main Rating,Voltage,Phase,Wire,Poles,KAIC,Enclosure,Circuit Count"
        );
        assert_eq!(
            lines[1],
            "E-601.png,PC-LP-01-01,400A MCB,208Y/120,,,,\"22,000\",,2"
        );
        assert_eq!(lines[2], "E-602.png,,,,,,,,,0");
    }

    #[test]
    fn circuits_csv_has_one_row_per_circuit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_circuits.csv");
        let writer = CircuitsCsvWriter::new(&path);
        writer.write_panel(&sample_panel(), "E-601.png").unwrap();
        writer.write_panel(&PanelRecord::default(), "E-602.png").unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Source Image,Panel Name,Circuit Number,Load Description,OCP Size,Poles,Feeder"
        );
        assert_eq!(lines[2], "E-601.png,PC-LP-01-01,2,RTU-1,60A,3,\"3#6, 1#10G\"");
    }

    #[test]
    fn combined_csv_marks_panels_without_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.csv");
        let writer = CombinedCsvWriter::new(&path);
        let empty = PanelRecord {
            panel_header: PanelHeader {
                panel_name: "LP-9".into(),
                ..Default::default()
            },
            circuits: vec![],
        };
        writer.write_panel(&empty, "E-700.png").unwrap();
        writer.write_panel(&sample_panel(), "E-601.png").unwrap();

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 14);
        assert_eq!(&headers[12], "Circuit Poles");

        let records: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][1], "LP-9");
        assert_eq!(&records[0][10], NO_CIRCUITS);
        assert_eq!(&records[2][10], "RTU-1");
        assert_eq!(&records[2][2], "400A MCB");
    }
}
