use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::detect::locate::locate_panels;
use crate::detect::{
    detect_regions, located_crop_name, save_contour_crops, save_crops, CandidateRegion, Rect,
};
use crate::error::SchedexError;
use crate::extract_panels;
use crate::extraction::VisionModel;
use crate::model::{ExtractionOutcome, PanelRecord};
use crate::output::csv::{CircuitsCsvWriter, CombinedCsvWriter, HeadersCsvWriter};
use crate::output::workbook::WorkbookWriter;
use crate::output::{CIRCUITS_CSV, COMBINED_CSV, HEADERS_CSV, WORKBOOK};
use crate::render::{ensure_non_empty, is_image_path, is_pdf_path, load_image, PdfRenderer};

/// How a page is divided before it goes to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionStrategy {
    /// Send the page as is.
    Whole,
    /// Contour-based rectangle detection.
    #[default]
    Contour,
    /// Ask the model for bounding boxes first.
    Model,
}

impl fmt::Display for RegionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionStrategy::Whole => write!(f, "whole"),
            RegionStrategy::Contour => write!(f, "contour"),
            RegionStrategy::Model => write!(f, "model"),
        }
    }
}

impl FromStr for RegionStrategy {
    type Err = SchedexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whole" | "page" => Ok(RegionStrategy::Whole),
            "contour" | "opencv" => Ok(RegionStrategy::Contour),
            "model" | "gemini" => Ok(RegionStrategy::Model),
            other => Err(SchedexError::ConfigInvalid(format!(
                "unknown region strategy '{other}' (expected whole, contour or model)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Image,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFile {
    pub path: PathBuf,
    pub kind: InputKind,
}

impl InputFile {
    fn from_path(path: &Path) -> Option<InputFile> {
        let kind = if is_image_path(path) {
            InputKind::Image
        } else if is_pdf_path(path) {
            InputKind::Pdf
        } else {
            return None;
        };
        Some(InputFile {
            path: path.to_path_buf(),
            kind,
        })
    }
}

/// One page ready for region location.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Image file name, or `<pdf stem>_page_<NN>` for rendered pages.
    pub label: String,
    pub image: DynamicImage,
}

/// Collect supported inputs from files and (recursively) directories.
///
/// Explicit files keep their order; directory contents are sorted by name.
/// Unsupported files are skipped.
pub fn discover_inputs(paths: &[PathBuf]) -> Vec<InputFile> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        found.extend(InputFile::from_path(entry.path()));
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "skipping unreadable directory entry"),
                }
            }
        } else {
            match InputFile::from_path(path) {
                Some(input) => found.push(input),
                None => warn!(path = %path.display(), "skipping unsupported input"),
            }
        }
    }
    found
}

/// Decode an image input, or render every page of a PDF input.
pub fn load_pages(
    input: &InputFile,
    renderer: &dyn PdfRenderer,
    dpi: u32,
) -> Result<Vec<PageImage>, SchedexError> {
    match input.kind {
        InputKind::Image => Ok(vec![PageImage {
            label: file_name(&input.path),
            image: load_image(&input.path)?,
        }]),
        InputKind::Pdf => {
            let bytes = std::fs::read(&input.path)?;
            debug!(
                input = %input.path.display(),
                backend = renderer.backend_name(),
                dpi,
                "rendering PDF"
            );
            let stem = input
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".into());
            renderer
                .render_pages(&bytes, dpi)?
                .into_iter()
                .enumerate()
                .map(|(i, image)| {
                    ensure_non_empty(&image)?;
                    Ok(PageImage {
                        label: format!("{stem}_page_{:02}", i + 1),
                        image,
                    })
                })
                .collect()
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Remove output files left by a previous run, returning those removed.
pub fn clear_previous_outputs(output_dir: &Path) -> Result<Vec<PathBuf>, SchedexError> {
    let mut removed = Vec::new();
    for name in [HEADERS_CSV, CIRCUITS_CSV, COMBINED_CSV, WORKBOOK] {
        let path = output_dir.join(name);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

/// An input or page that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub item: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionInfo {
    pub name: String,
    pub bounds: Rect,
    pub padded: Rect,
}

impl From<&CandidateRegion> for RegionInfo {
    fn from(region: &CandidateRegion) -> Self {
        RegionInfo {
            name: region.name.clone(),
            bounds: region.bounds,
            padded: region.padded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageDetection {
    pub page: String,
    pub page_index: usize,
    pub width: u32,
    pub height: u32,
    pub regions: Vec<RegionInfo>,
    pub saved_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionSummary {
    pub strategy: RegionStrategy,
    pub debug_dir: PathBuf,
    pub pages: Vec<PageDetection>,
    pub failed_items: Vec<FailedItem>,
}

impl DetectionSummary {
    pub fn region_count(&self) -> usize {
        self.pages.iter().map(|p| p.regions.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageReport {
    pub page: String,
    pub regions: usize,
    /// Names of the panels extracted from this page, in order.
    pub panels: Vec<String>,
    /// Regions whose reply listed no panels.
    pub empty_regions: usize,
    pub parse_failures: Vec<String>,
    /// Regions whose model request failed, or whose panels could not be written.
    pub failed_regions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputFiles {
    pub headers_csv: PathBuf,
    pub circuits_csv: PathBuf,
    pub combined_csv: PathBuf,
    pub workbook: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub strategy: RegionStrategy,
    pub pages: Vec<PageReport>,
    pub failed_items: Vec<FailedItem>,
    pub outputs: OutputFiles,
}

impl RunSummary {
    pub fn panel_count(&self) -> usize {
        self.pages.iter().map(|p| p.panels.len()).sum()
    }

    pub fn parse_failure_count(&self) -> usize {
        self.pages.iter().map(|p| p.parse_failures.len()).sum()
    }
}

/// Drives pages through location, extraction and writing.
///
/// A failure on one input or page is logged and recorded in the summary;
/// the batch always continues with the next item.
pub struct Pipeline<'a> {
    config: &'a Config,
    renderer: &'a dyn PdfRenderer,
    model: Option<&'a dyn VisionModel>,
    strategy: RegionStrategy,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, renderer: &'a dyn PdfRenderer) -> Self {
        Pipeline {
            config,
            renderer,
            model: None,
            strategy: RegionStrategy::default(),
        }
    }

    pub fn with_model(mut self, model: &'a dyn VisionModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_strategy(mut self, strategy: RegionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn model(&self) -> Result<&'a dyn VisionModel, SchedexError> {
        self.model.ok_or_else(|| {
            SchedexError::ConfigInvalid("this operation needs a vision model".into())
        })
    }

    /// Split one page into the regions that will be sent to the model.
    pub fn locate(&self, page: &PageImage) -> Result<Vec<CandidateRegion>, SchedexError> {
        match self.strategy {
            RegionStrategy::Whole => Ok(vec![CandidateRegion::whole_page(
                page.label.clone(),
                &page.image,
            )]),
            RegionStrategy::Contour => Ok(detect_regions(&page.image, &self.config.detector)),
            RegionStrategy::Model => locate_panels(&page.image, self.model()?),
        }
    }

    /// Locate regions on every page and save the crops for review.
    pub fn run_detection(&self, inputs: &[InputFile]) -> Result<DetectionSummary, SchedexError> {
        if self.strategy == RegionStrategy::Model {
            self.model()?;
        }
        let debug_dir = self.config.paths.ensure_debug_dir()?;
        let mut summary = DetectionSummary {
            strategy: self.strategy,
            debug_dir: debug_dir.to_path_buf(),
            ..Default::default()
        };

        let mut pages = Vec::new();
        self.for_each_page(inputs, &mut summary.failed_items, |page_index, page| {
            let regions = self.locate(page)?;
            if regions.is_empty() {
                info!(page = %page.label, "no panels detected on this page");
            } else {
                info!(page = %page.label, count = regions.len(), "detected panel(s)");
            }

            let saved_files = match self.strategy {
                RegionStrategy::Model => save_crops(&regions, debug_dir, |seq, region| {
                    located_crop_name(page_index, seq, &region.name)
                }),
                _ => save_contour_crops(&regions, page_index, debug_dir),
            };

            pages.push(PageDetection {
                page: page.label.clone(),
                page_index,
                width: page.image.width(),
                height: page.image.height(),
                regions: regions.iter().map(RegionInfo::from).collect(),
                saved_files,
            });
            Ok(())
        });
        summary.pages = pages;

        Ok(summary)
    }

    /// Extract panels from every page, appending each one to the CSV outputs
    /// as soon as it is parsed and writing the workbook at the end.
    pub fn run_extraction(&self, inputs: &[InputFile]) -> Result<RunSummary, SchedexError> {
        let model = self.model()?;
        let output_dir = self.config.paths.ensure_output_dir()?;

        let headers = HeadersCsvWriter::new(output_dir.join(HEADERS_CSV));
        let circuits = CircuitsCsvWriter::new(output_dir.join(CIRCUITS_CSV));
        let combined = CombinedCsvWriter::new(output_dir.join(COMBINED_CSV));

        let mut summary = RunSummary {
            strategy: self.strategy,
            outputs: OutputFiles {
                headers_csv: headers.path().to_path_buf(),
                circuits_csv: circuits.path().to_path_buf(),
                combined_csv: combined.path().to_path_buf(),
                workbook: None,
            },
            ..Default::default()
        };

        let mut all_panels: Vec<PanelRecord> = Vec::new();
        let mut reports = Vec::new();
        let total = inputs.len();

        self.for_each_page(inputs, &mut summary.failed_items, |_, page| {
            let regions = self.locate(page)?;
            let mut report = PageReport {
                page: page.label.clone(),
                regions: regions.len(),
                ..Default::default()
            };
            if regions.is_empty() {
                info!(page = %page.label, "no panels detected on this page");
            }

            for region in &regions {
                let outcome = match extract_panels(&region.image, model) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(
                            page = %page.label,
                            region = %region.name,
                            error = %e,
                            "extraction request failed"
                        );
                        report.failed_regions.push(format!("{}: {e}", region.name));
                        continue;
                    }
                };

                match outcome {
                    ExtractionOutcome::Extracted(panels) => {
                        for panel in panels {
                            let written = headers
                                .write_panel(&panel, &page.label)
                                .and_then(|_| circuits.write_panel(&panel, &page.label))
                                .and_then(|_| combined.write_panel(&panel, &page.label));
                            if let Err(e) = written {
                                error!(
                                    page = %page.label,
                                    panel = panel.display_name(),
                                    error = %e,
                                    "could not write panel"
                                );
                                report.failed_regions.push(format!(
                                    "{}: writing {}: {e}",
                                    region.name,
                                    panel.display_name()
                                ));
                                continue;
                            }
                            report.panels.push(panel.display_name().to_string());
                            all_panels.push(panel);
                        }
                    }
                    ExtractionOutcome::Empty => {
                        info!(page = %page.label, region = %region.name, "no panels in region");
                        report.empty_regions += 1;
                    }
                    ExtractionOutcome::ParseFailure(reason) => {
                        report.parse_failures.push(format!("{}: {reason}", region.name));
                    }
                }
            }

            reports.push(report);
            Ok(())
        });
        summary.pages = reports;
        info!(inputs = total, panels = all_panels.len(), "extraction finished");

        if all_panels.is_empty() {
            warn!("no panels were extracted");
        } else {
            let path = output_dir.join(WORKBOOK);
            let mut workbook = WorkbookWriter::new()?;
            workbook.write_all_panels(&all_panels)?;
            workbook.save(&path)?;
            summary.outputs.workbook = Some(path);
        }

        Ok(summary)
    }

    /// Run `f` on every page of every input with per-item isolation.
    ///
    /// `f` receives a 1-based page counter running across all inputs.
    fn for_each_page<F>(&self, inputs: &[InputFile], failed: &mut Vec<FailedItem>, mut f: F)
    where
        F: FnMut(usize, &PageImage) -> Result<(), SchedexError>,
    {
        let mut page_index = 0;
        for (i, input) in inputs.iter().enumerate() {
            info!(
                input = %input.path.display(),
                "processing input {} of {}",
                i + 1,
                inputs.len()
            );
            let pages = match load_pages(input, self.renderer, self.config.render.dpi) {
                Ok(pages) => pages,
                Err(e) => {
                    error!(input = %input.path.display(), error = %e, "could not load input");
                    failed.push(FailedItem {
                        item: input.path.display().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for page in &pages {
                page_index += 1;
                if let Err(e) = f(page_index, page) {
                    error!(page = %page.label, error = %e, "page failed");
                    failed.push(FailedItem {
                        item: page.label.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
