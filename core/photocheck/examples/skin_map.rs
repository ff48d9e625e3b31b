//! Render which pixels the skin rule table accepts, at analysis resolution.
//!
//! Usage:
//!   cargo run --example skin_map -- <photo> <map.png>
//!
//! Skin samples keep their colour, everything else is drawn dark grey.

use image::{Rgba, RgbaImage};
use photocheck::sampler::ANALYSIS_RESOLUTION;
use photocheck::skin::{is_skin, matching_rules};
use photocheck::{PixelSampler, RasterImage};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [input_path, output_path] = args.as_slice() else {
        eprintln!("usage: skin_map <photo> <map.png>");
        std::process::exit(2);
    };

    let bytes = std::fs::read(input_path)
        .unwrap_or_else(|e| panic!("failed to read {input_path}: {e}"));
    let image = RasterImage::decode(&bytes).unwrap();
    let samples = PixelSampler::new()
        .sample(&image, ANALYSIS_RESOLUTION, ANALYSIS_RESOLUTION)
        .unwrap();

    let mut map = RgbaImage::new(samples.width(), samples.height());
    let mut rule_hits = [0usize; 6];
    for (x, y, [r, g, b, _]) in samples.iter() {
        for rule in matching_rules(r, g, b) {
            rule_hits[rule as usize] += 1;
        }
        let pixel = if is_skin(r, g, b) {
            Rgba([r, g, b, 255])
        } else {
            Rgba([40, 40, 40, 255])
        };
        map.put_pixel(x, y, pixel);
    }
    map.save(output_path).unwrap();

    println!("{input_path}: {} samples", samples.len());
    for (rule, hits) in photocheck::skin::SKIN_RULES.iter().zip(rule_hits) {
        println!("  {rule:?}: {hits}");
    }
    println!("wrote {output_path}");
}
