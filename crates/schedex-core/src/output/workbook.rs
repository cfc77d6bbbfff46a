use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

use crate::error::SchedexError;
use crate::model::{Circuit, PanelRecord};

pub const SHEET_NAME: &str = "Panel Schedules";

const COLUMN_HEADERS: [&str; 5] = [
    "Load Description",
    "Overcurrent Protection Size (Fuse or CB Trip Size)",
    "Poles",
    "Feeder",
    "Circuit #",
];

const COLUMN_WIDTHS: [f64; 5] = [40.0, 30.0, 10.0, 30.0, 12.0];

/// Blank rows between consecutive panels.
const PANEL_SPACING: u32 = 4;

/// Single-sheet workbook with panels stacked vertically.
///
/// Per panel: a bold description line, a column header row, then one row
/// per circuit.
pub struct WorkbookWriter {
    worksheet: Worksheet,
    current_row: u32,
    panels_written: usize,
    title_format: Format,
    header_format: Format,
}

impl WorkbookWriter {
    pub fn new() -> Result<Self, SchedexError> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(SHEET_NAME)?;
        Ok(WorkbookWriter {
            worksheet,
            current_row: 0,
            panels_written: 0,
            title_format: Format::new().set_bold().set_font_size(12),
            header_format: Format::new().set_bold().set_text_wrap(),
        })
    }

    pub fn write_all_panels(&mut self, panels: &[PanelRecord]) -> Result<(), SchedexError> {
        for panel in panels {
            self.write_panel(panel)?;
        }
        Ok(())
    }

    pub fn write_panel(&mut self, panel: &PanelRecord) -> Result<(), SchedexError> {
        if self.panels_written > 0 {
            self.current_row += PANEL_SPACING;
        }

        let title = panel.panel_header.describe();
        self.worksheet
            .write_string_with_format(self.current_row, 0, title, &self.title_format)?;
        self.current_row += 1;

        for (col, header) in COLUMN_HEADERS.iter().enumerate() {
            self.worksheet.write_string_with_format(
                self.current_row,
                col as u16,
                *header,
                &self.header_format,
            )?;
        }
        self.current_row += 1;

        for circuit in &panel.circuits {
            self.write_circuit(circuit)?;
        }

        self.panels_written += 1;
        Ok(())
    }

    fn write_circuit(&mut self, circuit: &Circuit) -> Result<(), SchedexError> {
        let values = [
            &circuit.load_description,
            &circuit.ocp_size,
            &circuit.poles,
            &circuit.feeder,
            &circuit.circuit_number,
        ];
        for (col, value) in values.iter().enumerate() {
            self.worksheet
                .write_string(self.current_row, col as u16, value.as_str())?;
        }
        self.current_row += 1;
        Ok(())
    }

    /// Apply column widths and write the workbook to `path`.
    pub fn save(mut self, path: &Path) -> Result<(), SchedexError> {
        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            self.worksheet.set_column_width(col as u16, *width)?;
        }
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.worksheet);
        workbook.save(path)?;
        info!(path = %path.display(), panels = self.panels_written, "workbook saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PanelHeader;
    use calamine::{open_workbook, Data, Reader, Xlsx};

    fn panel(name: &str, circuits: usize) -> PanelRecord {
        PanelRecord {
            panel_header: PanelHeader {
                panel_name: name.into(),
                main_rating: "225A MLO".into(),
                ..Default::default()
            },
            circuits: (1..=circuits)
                .map(|n| Circuit {
                    load_description: format!("Load {n}"),
                    ocp_size: "20A".into(),
                    poles: "1".into(),
                    circuit_number: n.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn cell(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
        match range.get_value((row, col)) {
            Some(Data::String(s)) => s.clone(),
            Some(Data::Empty) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    #[test]
    fn panels_are_stacked_with_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_schedules.xlsx");

        let mut writer = WorkbookWriter::new().unwrap();
        writer
            .write_all_panels(&[panel("LP-1", 2), panel("LP-2", 1)])
            .unwrap();
        writer.save(&path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        assert_eq!(cell(&range, 0, 0), "Panel LP-1, 225A MLO");
        assert_eq!(cell(&range, 1, 1), COLUMN_HEADERS[1]);
        assert_eq!(cell(&range, 2, 0), "Load 1");
        assert_eq!(cell(&range, 3, 4), "2");
        // Rows 4..8 are spacing; the second panel starts at row 8.
        assert_eq!(cell(&range, 4, 0), "");
        assert_eq!(cell(&range, 8, 0), "Panel LP-2, 225A MLO");
        assert_eq!(cell(&range, 10, 0), "Load 1");
    }
}
