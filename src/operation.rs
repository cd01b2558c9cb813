//! Logical operations and their argument encoding.
//!
//! Encoding is a pure function of the request: no I/O, no hidden state.

use crate::engine::Worker;
use crate::page_range::PageSelection;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Merge,
    Rotate,
    Split,
    ExtractPages,
    Compress,
    Ocr,
    ArchiveExtract,
    ArchiveCreate,
    ArchiveConvert,
    ImageConvert,
    ImageCompress,
    ImagesToPdf,
    DocToPdf,
    PageCount,
    Decrypt,
}

/// How a worker's stdout is interpreted on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Unit,
    FilePathList,
    Integer,
    RawText,
}

impl Operation {
    pub fn worker(self) -> Worker {
        match self {
            Operation::Merge
            | Operation::Rotate
            | Operation::Split
            | Operation::ExtractPages
            | Operation::Compress
            | Operation::PageCount
            | Operation::Decrypt => Worker::PdfTools,
            Operation::Ocr => Worker::OcrEngine,
            Operation::ArchiveExtract | Operation::ArchiveCreate | Operation::ArchiveConvert => {
                Worker::ArchiveTools
            }
            Operation::ImageConvert | Operation::ImageCompress | Operation::ImagesToPdf => {
                Worker::MediaTools
            }
            Operation::DocToPdf => Worker::DocTools,
        }
    }

    /// Subcommand understood by the worker. The OCR engine takes none.
    pub fn subcommand(self) -> Option<&'static str> {
        let sub = match self {
            Operation::Merge => "merge",
            Operation::Rotate => "rotate",
            Operation::Split => "split",
            Operation::ExtractPages => "extract",
            Operation::Compress => "compress",
            Operation::PageCount => "count",
            Operation::Decrypt => "decrypt",
            Operation::Ocr => return None,
            Operation::ArchiveExtract => "extract",
            Operation::ArchiveCreate => "create",
            Operation::ArchiveConvert => "convert",
            Operation::ImageConvert => "convert_image",
            Operation::ImageCompress => "compress_image",
            Operation::ImagesToPdf => "images_to_pdf",
            Operation::DocToPdf => "convert_to_pdf",
        };
        Some(sub)
    }

    pub fn result_shape(self) -> ResultShape {
        match self {
            Operation::Split => ResultShape::FilePathList,
            Operation::PageCount => ResultShape::Integer,
            _ => ResultShape::Unit,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Merge => "merge",
            Operation::Rotate => "rotate",
            Operation::Split => "split",
            Operation::ExtractPages => "extractPages",
            Operation::Compress => "compress",
            Operation::Ocr => "ocr",
            Operation::ArchiveExtract => "archiveExtract",
            Operation::ArchiveCreate => "archiveCreate",
            Operation::ArchiveConvert => "archiveConvert",
            Operation::ImageConvert => "imageConvert",
            Operation::ImageCompress => "imageCompress",
            Operation::ImagesToPdf => "imagesToPdf",
            Operation::DocToPdf => "docToPdf",
            Operation::PageCount => "pageCount",
            Operation::Decrypt => "decrypt",
        };
        f.write_str(name)
    }
}

/// An operation together with its typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Merge { inputs: Vec<PathBuf>, output: PathBuf },
    Rotate { input: PathBuf, degrees: i32 },
    Split { input: PathBuf, output_dir: PathBuf },
    ExtractPages { input: PathBuf, pages: PageSelection, output: PathBuf },
    Compress { input: PathBuf, output: PathBuf },
    PageCount { input: PathBuf },
    Decrypt { input: PathBuf, output: PathBuf },
    Ocr { input: PathBuf, output: PathBuf },
    ArchiveExtract { input: PathBuf, output_dir: PathBuf },
    ArchiveCreate { inputs: Vec<PathBuf>, output: PathBuf },
    ArchiveConvert { input: PathBuf, output: PathBuf },
    ImageConvert { input: PathBuf, output: PathBuf },
    ImageCompress { input: PathBuf, output: PathBuf, target_size: u64 },
    ImagesToPdf { inputs: Vec<PathBuf>, output: PathBuf },
    DocToPdf { input: PathBuf, output: PathBuf },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Merge { .. } => Operation::Merge,
            Request::Rotate { .. } => Operation::Rotate,
            Request::Split { .. } => Operation::Split,
            Request::ExtractPages { .. } => Operation::ExtractPages,
            Request::Compress { .. } => Operation::Compress,
            Request::PageCount { .. } => Operation::PageCount,
            Request::Decrypt { .. } => Operation::Decrypt,
            Request::Ocr { .. } => Operation::Ocr,
            Request::ArchiveExtract { .. } => Operation::ArchiveExtract,
            Request::ArchiveCreate { .. } => Operation::ArchiveCreate,
            Request::ArchiveConvert { .. } => Operation::ArchiveConvert,
            Request::ImageConvert { .. } => Operation::ImageConvert,
            Request::ImageCompress { .. } => Operation::ImageCompress,
            Request::ImagesToPdf { .. } => Operation::ImagesToPdf,
            Request::DocToPdf { .. } => Operation::DocToPdf,
        }
    }

    /// Every input path the request reads from.
    pub fn inputs(&self) -> Vec<&PathBuf> {
        match self {
            Request::Merge { inputs, .. }
            | Request::ArchiveCreate { inputs, .. }
            | Request::ImagesToPdf { inputs, .. } => inputs.iter().collect(),
            Request::Rotate { input, .. }
            | Request::Split { input, .. }
            | Request::ExtractPages { input, .. }
            | Request::Compress { input, .. }
            | Request::PageCount { input }
            | Request::Decrypt { input, .. }
            | Request::Ocr { input, .. }
            | Request::ArchiveExtract { input, .. }
            | Request::ArchiveConvert { input, .. }
            | Request::ImageConvert { input, .. }
            | Request::ImageCompress { input, .. }
            | Request::DocToPdf { input, .. } => vec![input],
        }
    }

    /// Worker arguments, excluding any interpreter or script prefix.
    pub fn encode(&self) -> Vec<OsString> {
        let mut args = ArgList::default();
        if let Some(sub) = self.operation().subcommand() {
            args.push(sub);
        }

        match self {
            Request::Merge { inputs, output } | Request::ArchiveCreate { inputs, output } => {
                args.group("--inputs", inputs);
                args.path("--output_path", output);
            }
            Request::Rotate { input, degrees } => {
                args.path("--input_path", input);
                args.flag("--degrees", degrees.to_string());
            }
            Request::Split { input, output_dir } | Request::ArchiveExtract { input, output_dir } => {
                args.path("--input_path", input);
                args.path("--output_dir", output_dir);
            }
            Request::ExtractPages {
                input,
                pages,
                output,
            } => {
                args.path("--input_path", input);
                args.flag("--pages", pages.to_arg());
                args.path("--output_path", output);
            }
            Request::PageCount { input } => {
                args.path("--input_path", input);
            }
            Request::Ocr { input, output } => {
                args.path("--input_pdf_path", input);
                args.path("--output_docx_path", output);
            }
            Request::ImageCompress {
                input,
                output,
                target_size,
            } => {
                args.path("--input_path", input);
                args.path("--output_path", output);
                args.flag("--target_size", target_size.to_string());
            }
            Request::ImagesToPdf { inputs, output } => {
                for p in inputs {
                    args.positional(p);
                }
                args.path("--output_path", output);
            }
            Request::Compress { input, output }
            | Request::Decrypt { input, output }
            | Request::ArchiveConvert { input, output }
            | Request::ImageConvert { input, output }
            | Request::DocToPdf { input, output } => {
                args.path("--input_path", input);
                args.path("--output_path", output);
            }
        }

        args.0
    }
}

#[derive(Default)]
struct ArgList(Vec<OsString>);

impl ArgList {
    fn push(&mut self, value: impl Into<OsString>) {
        self.0.push(value.into());
    }

    fn flag(&mut self, name: &str, value: impl Into<OsString>) {
        self.push(name);
        self.push(value);
    }

    fn path(&mut self, name: &str, value: &Path) {
        self.push(name);
        self.positional(value);
    }

    fn group(&mut self, name: &str, values: &[PathBuf]) {
        self.push(name);
        for v in values {
            self.positional(v);
        }
    }

    fn positional(&mut self, value: &Path) {
        self.push(path_arg(value));
    }
}

/// A relative path starting with `-` would be read as a flag; anchor it to `.`.
fn path_arg(p: &Path) -> OsString {
    if p.as_os_str().to_string_lossy().starts_with('-') {
        Path::new(".").join(p).into_os_string()
    } else {
        p.as_os_str().to_os_string()
    }
}
