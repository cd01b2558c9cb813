use docforge::{
    engine::{ExecutableResolver, Invocation, Platform, RuntimeMode, Worker, WorkerLayout},
    report::{DoctorReport, RunReport},
    Decoded, DecodedResult, Operation,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

// sha256("hello")
const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn layout(root: &Path) -> WorkerLayout {
    WorkerLayout {
        sidecars_dir: root.join("py-sidecars"),
        venv_dir: root.join("py-sidecars").join("venv"),
        resources_dir: root.join("resources"),
    }
}

#[test]
fn doctor_flags_the_missing_worker_and_hashes_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());
    let bin = layout.binaries_dir();
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(bin.join("pdf_tools"), "hello").unwrap();
    for worker in [Worker::ArchiveTools, Worker::MediaTools, Worker::DocTools] {
        std::fs::write(bin.join(worker.name()), "stub").unwrap();
    }

    let resolver =
        ExecutableResolver::new(RuntimeMode::Packaged, layout).with_platform(Platform::Unix);
    let report = DoctorReport::collect(&resolver);

    assert!(!report.ok);
    assert_eq!(report.mode, RuntimeMode::Packaged);
    assert!(report.interpreter.is_none());
    assert_eq!(report.workers.len(), Worker::ALL.len());

    let pdf = report.workers.iter().find(|d| d.worker == Worker::PdfTools).unwrap();
    assert!(pdf.exists);
    assert_eq!(pdf.sha256.as_deref(), Some(HELLO_SHA256));
    assert!(pdf.error.is_none());

    let ocr = report.workers.iter().find(|d| d.worker == Worker::OcrEngine).unwrap();
    assert!(!ocr.exists);
    assert!(ocr.sha256.is_none());
    assert_eq!(ocr.error.as_deref(), Some("not found"));
    assert!(ocr.path.ends_with("ocr_engine"));
}

#[test]
fn doctor_passes_when_every_worker_is_installed() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());
    let bin = layout.binaries_dir();
    std::fs::create_dir_all(&bin).unwrap();
    for worker in Worker::ALL {
        std::fs::write(bin.join(worker.name()), "hello").unwrap();
    }

    let resolver =
        ExecutableResolver::new(RuntimeMode::Packaged, layout).with_platform(Platform::Unix);
    let report = DoctorReport::collect(&resolver);
    assert!(report.ok);
    assert!(report.workers.iter().all(|d| d.sha256.as_deref() == Some(HELLO_SHA256)));
}

#[test]
fn doctor_in_source_mode_requires_the_interpreter() {
    let dir = tempfile::tempdir().unwrap();
    let layout = layout(dir.path());
    std::fs::create_dir_all(&layout.sidecars_dir).unwrap();
    for worker in Worker::ALL {
        std::fs::write(layout.sidecars_dir.join(format!("{}.py", worker.name())), "hello").unwrap();
    }

    let resolver =
        ExecutableResolver::new(RuntimeMode::Source, layout).with_platform(Platform::Unix);
    let report = DoctorReport::collect(&resolver);
    assert!(!report.ok);
    assert!(report.interpreter.unwrap().ends_with("python"));
    assert!(report.workers.iter().all(|d| d.exists));
}

#[test]
fn run_report_carries_invocation_and_result() {
    let invocation = Invocation {
        worker: Worker::PdfTools,
        command: PathBuf::from("/opt/docforge/resources/bin/pdf_tools"),
        args: vec!["split".into(), "--input_path".into(), "a.pdf".into()],
        working_dir: None,
    };
    let decoded = Decoded {
        result: DecodedResult::FilePathList(vec!["a_1.pdf".into(), "a_2.pdf".into()]),
        warning: None,
    };

    let report = RunReport::new(
        Operation::Split,
        RuntimeMode::Packaged,
        &invocation,
        "2026-01-01T00:00:00Z".to_string(),
        "2026-01-01T00:00:01Z".to_string(),
        Duration::from_millis(1250),
        decoded,
    );
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["operation"], "split");
    assert_eq!(value["worker"], "pdf_tools");
    assert_eq!(value["mode"], "packaged");
    assert_eq!(value["args"], json!(["split", "--input_path", "a.pdf"]));
    assert_eq!(value["duration_ms"], 1250);
    assert_eq!(
        value["result"],
        json!({"kind": "file_path_list", "value": ["a_1.pdf", "a_2.pdf"]})
    );
    assert!(value.get("warning").is_none());
}
