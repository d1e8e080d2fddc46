//! Exporting sensor series as downloadable artifacts.
//!
//! ## Submodules
//!
//! - [`align`]: Union alignment of per-sensor series into one table
//! - [`format`]: [`ExportFormat`] and the CSV and JSON serializers
//! - [`orchestrator`]: Request resolution, filenames and dispatch ([`Exporter`])
//! - [`sink`]: Where finished artifacts go ([`ExportSink`], [`DirectorySink`])
//!
//! ## Data Flow
//!
//! ```text
//! SensorBoard::readings() ──▶ SeriesSet
//!                                 │
//!                                 ▼
//!              Exporter::export(ExportRequest) ──▶ ExportArtifact
//!                                                      │
//!                                                      ▼
//!                                              ExportSink::deliver()
//! ```

pub mod align;
pub mod format;
pub mod orchestrator;
pub mod sink;

pub use align::{align, ExportRow, ExportTable, SensorId, SeriesSet};
pub use format::{render_csv, render_json, ExportFormat, SensorMeta};
pub use orchestrator::{export_filename, ExportArtifact, ExportRequest, Exporter, SensorSpec};
pub use sink::{DirectorySink, ExportSink, MemorySink};
