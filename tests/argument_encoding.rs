use docforge::{operation::Request, page_range::PageSelection, Operation};
use std::ffi::OsString;
use std::path::PathBuf;

fn strs(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

const FLAGS: &[&str] = &[
    "--inputs",
    "--input_path",
    "--output_path",
    "--output_dir",
    "--degrees",
    "--pages",
    "--target_size",
    "--input_pdf_path",
    "--output_docx_path",
];

fn sample_requests() -> Vec<Request> {
    let pages = PageSelection::from_indices([0, 2, 7]).unwrap();
    vec![
        Request::Merge { inputs: vec![p("a.pdf"), p("b.pdf")], output: p("out.pdf") },
        Request::Rotate { input: p("a.pdf"), degrees: -90 },
        Request::Split { input: p("a.pdf"), output_dir: p("parts") },
        Request::ExtractPages { input: p("a.pdf"), pages, output: p("x.pdf") },
        Request::Compress { input: p("a.pdf"), output: p("c.pdf") },
        Request::PageCount { input: p("a.pdf") },
        Request::Decrypt { input: p("a.pdf"), output: p("d.pdf") },
        Request::Ocr { input: p("scan.pdf"), output: p("scan.docx") },
        Request::ArchiveExtract { input: p("a.zip"), output_dir: p("unz") },
        Request::ArchiveCreate { inputs: vec![p("x"), p("y")], output: p("o.7z") },
        Request::ArchiveConvert { input: p("a.rar"), output: p("a.zip") },
        Request::ImageConvert { input: p("a.png"), output: p("a.webp") },
        Request::ImageCompress { input: p("a.jpg"), output: p("b.jpg"), target_size: 250_000 },
        Request::ImagesToPdf { inputs: vec![p("1.png"), p("2.png")], output: p("all.pdf") },
        Request::DocToPdf { input: p("a.docx"), output: p("a.pdf") },
    ]
}

#[test]
fn merge_uses_flagged_group() {
    let req = Request::Merge {
        inputs: vec![p("a.pdf"), p("b.pdf"), p("c.pdf")],
        output: p("out.pdf"),
    };
    assert_eq!(
        strs(&req.encode()),
        ["merge", "--inputs", "a.pdf", "b.pdf", "c.pdf", "--output_path", "out.pdf"]
    );
}

#[test]
fn rotate_renders_plain_decimal() {
    let req = Request::Rotate { input: p("a.pdf"), degrees: -90 };
    assert_eq!(
        strs(&req.encode()),
        ["rotate", "--input_path", "a.pdf", "--degrees", "-90"]
    );
}

#[test]
fn images_to_pdf_puts_positionals_first() {
    let req = Request::ImagesToPdf {
        inputs: vec![p("1.png"), p("2.png")],
        output: p("all.pdf"),
    };
    assert_eq!(
        strs(&req.encode()),
        ["images_to_pdf", "1.png", "2.png", "--output_path", "all.pdf"]
    );
}

#[test]
fn extract_joins_zero_based_indices() {
    let req = Request::ExtractPages {
        input: p("a.pdf"),
        pages: PageSelection::from_indices([7, 0, 2]).unwrap(),
        output: p("x.pdf"),
    };
    assert_eq!(
        strs(&req.encode()),
        ["extract", "--input_path", "a.pdf", "--pages", "0,2,7", "--output_path", "x.pdf"]
    );
}

#[test]
fn ocr_has_no_subcommand() {
    let req = Request::Ocr { input: p("scan.pdf"), output: p("scan.docx") };
    assert_eq!(
        strs(&req.encode()),
        ["--input_pdf_path", "scan.pdf", "--output_docx_path", "scan.docx"]
    );
}

#[test]
fn image_compress_passes_target_bytes() {
    let req = Request::ImageCompress {
        input: p("a.jpg"),
        output: p("b.jpg"),
        target_size: 1_500_000,
    };
    assert_eq!(
        strs(&req.encode()),
        ["compress_image", "--input_path", "a.jpg", "--output_path", "b.jpg", "--target_size", "1500000"]
    );
}

#[test]
fn dash_leading_paths_cannot_pose_as_flags() {
    let req = Request::Merge {
        inputs: vec![p("--help"), p("ok.pdf")],
        output: p("-o.pdf"),
    };
    let args = strs(&req.encode());
    assert_eq!(args[2], format!(".{}--help", std::path::MAIN_SEPARATOR));
    assert_eq!(args[5], format!(".{}-o.pdf", std::path::MAIN_SEPARATOR));
}

#[test]
fn encoding_is_deterministic() {
    for (a, b) in sample_requests().iter().zip(sample_requests().iter()) {
        assert_eq!(a.encode(), b.encode());
    }
}

#[test]
fn only_genuine_flags_start_with_double_dash() {
    for req in sample_requests() {
        for arg in strs(&req.encode()) {
            if arg.starts_with("--") {
                assert!(FLAGS.contains(&arg.as_str()), "{arg} in {:?}", req.operation());
            }
        }
    }
}

#[test]
fn every_request_maps_to_its_worker_subcommand() {
    for req in sample_requests() {
        let op = req.operation();
        let args = strs(&req.encode());
        match op.subcommand() {
            Some(sub) => assert_eq!(args[0], sub),
            None => assert_eq!(op, Operation::Ocr),
        }
    }
}
