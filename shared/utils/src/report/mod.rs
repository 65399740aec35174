//! Report assembly, xlsx rendering and download packaging.

pub mod assembler;
pub mod writer;
pub mod archive;
pub mod generator;

pub use assembler::{assemble, assemble_subset};
pub use writer::{render_report, GeneratedReport, ReportWriter, XlsxReportWriter};
pub use archive::{zip_reports, ARCHIVE_NAME};
pub use generator::{select_reports, ReportGenerator, UploadedFile, WorkbookInput};
