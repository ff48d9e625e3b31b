//! Run the compliance battery on a photo and optionally write the normalized export.
//!
//! Usage:
//!   RUST_LOG=info cargo run --example check_photo -- <photo> [export.png] [--wide]

use photocheck::{CheckStatus, FileMetadata, PhotoChecker, Preset, RasterImage};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let wide = args.iter().any(|a| a == "--wide");
    let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let Some(input_path) = paths.first() else {
        eprintln!("usage: check_photo <photo> [export.png] [--wide]");
        std::process::exit(2);
    };

    let bytes = std::fs::read(input_path)
        .unwrap_or_else(|e| panic!("failed to read {input_path}: {e}"));
    let image = RasterImage::decode(&bytes).unwrap();
    let metadata = FileMetadata::sniff(&bytes);

    let preset = if wide { Preset::Wide } else { Preset::Standard };
    let checker = PhotoChecker::new().preset(preset);

    let detection = checker.detect(&image);
    println!(
        "{input_path}: {}x{}, face {} ({:?}, {:.0}%)",
        image.width(),
        image.height(),
        detection.reason.message_id(),
        detection.method,
        detection.confidence * 100.0
    );

    let verdict = checker
        .analyze_with(&image, metadata.as_ref(), &detection)
        .unwrap();
    for result in &verdict.results {
        let mark = match result.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        };
        println!(
            "  [{mark}] {:<22} {:<14} {}",
            result.title,
            result.value.to_string(),
            result.message
        );
    }
    println!(
        "overall: {:?} ({} passed, {} warnings, {} critical)",
        verdict.overall, verdict.summary.passes, verdict.summary.warnings, verdict.summary.critical
    );

    if let Some(output_path) = paths.get(1) {
        let exported = checker.export(&image).unwrap();
        exported.as_rgba().save(output_path).unwrap();
        println!("wrote {output_path} ({}x{})", exported.width(), exported.height());
    }
}
