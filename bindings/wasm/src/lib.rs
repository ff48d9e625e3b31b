use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use photocheck::{
    ComplianceRules, FaceDetection, FileMetadata, NormalizeOptions, PhotoCheckError,
    PhotoChecker, Preset, RasterImage, Verdict,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// JPEG quality used by `exportJpeg` (0.95 on the canvas scale).
const EXPORT_JPEG_QUALITY: u8 = 95;

/// Options passed as a JavaScript object.
///
/// All fields are optional. `preset` is applied after `normalize`, so it only
/// overrides the margin factor.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckOptions {
    pub preset: Option<String>,
    pub rules: Option<ComplianceRules>,
    pub normalize: Option<NormalizeOptions>,
    /// Overrides the MIME type sniffed from the bytes, e.g. the browser `File.type`.
    pub mime_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReport<'a> {
    detection: &'a FaceDetection,
    verdict: &'a Verdict,
    width: u32,
    height: u32,
}

fn string_to_preset(preset: &str) -> Result<Preset, JsValue> {
    match preset {
        "standard" => Ok(Preset::Standard),
        "wide" => Ok(Preset::Wide),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown preset: {preset}"),
        )),
    }
}

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Convert a `PhotoCheckError` into a JS `Error` with a machine-readable `code` property.
fn to_js_error(e: PhotoCheckError) -> JsValue {
    let code = match &e {
        PhotoCheckError::DecodeError(_) => "DECODE_ERROR",
        PhotoCheckError::ZeroDimensions => "ZERO_DIMENSIONS",
        PhotoCheckError::BufferSizeMismatch { .. } => "BUFFER_SIZE_MISMATCH",
        PhotoCheckError::InvalidDimension { .. } => "INVALID_DIMENSION",
        PhotoCheckError::AnalysisFailure(_) => "ANALYSIS_FAILURE",
        PhotoCheckError::DetectorUnavailable(_) => "DETECTOR_UNAVAILABLE",
        PhotoCheckError::InvalidTargetSize(_) => "INVALID_TARGET_SIZE",
        PhotoCheckError::InvalidMarginFactor(_) => "INVALID_MARGIN_FACTOR",
        PhotoCheckError::InvalidTransition { .. } => "INVALID_TRANSITION",
    };
    make_error(code, &e.to_string())
}

fn parse_options(options: JsValue) -> Result<CheckOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(CheckOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))
    }
}

/// Build a `PhotoChecker` from parsed options.
fn build_checker(opts: &CheckOptions) -> Result<PhotoChecker, JsValue> {
    let mut checker = PhotoChecker::new();
    if let Some(ref rules) = opts.rules {
        checker = checker.rules(rules.clone());
    }
    if let Some(ref normalize) = opts.normalize {
        checker = checker.normalize_options(normalize.clone());
    }
    if let Some(ref p) = opts.preset {
        checker = checker.preset(string_to_preset(p)?);
    }
    Ok(checker)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| make_error("SERIALIZE_ERROR", &e.to_string()))
}

/// Run face detection and the compliance battery on an encoded photo.
///
/// @param input - Raw image bytes (JPEG, PNG, WebP, ...)
/// @param options - Optional object with fields: preset, rules, normalize, mimeType
/// @returns `{ detection, verdict, width, height }`
#[wasm_bindgen]
pub fn analyze(input: Vec<u8>, options: JsValue) -> Result<JsValue, JsValue> {
    let opts = parse_options(options)?;
    let checker = build_checker(&opts)?;

    let image = RasterImage::decode(&input).map_err(to_js_error)?;
    let metadata = match opts.mime_type {
        Some(mime) => Some(FileMetadata::new(input.len() as u64, mime)),
        None => FileMetadata::sniff(&input),
    };

    let detection = checker.detect(&image);
    let verdict = checker
        .analyze_with(&image, metadata.as_ref(), &detection)
        .map_err(to_js_error)?;

    to_js(&AnalysisReport {
        detection: &detection,
        verdict: &verdict,
        width: image.width(),
        height: image.height(),
    })
}

/// Fit an encoded photo onto a white square canvas.
///
/// @returns `{ data: Uint8Array (RGBA), size, placement, enhanced }`
#[wasm_bindgen]
pub fn normalize(input: Vec<u8>, options: JsValue) -> Result<JsValue, JsValue> {
    let opts = parse_options(options)?;
    let checker = build_checker(&opts)?;

    let image = RasterImage::decode(&input).map_err(to_js_error)?;
    let artifact = checker.normalize(&image).map_err(to_js_error)?;

    let obj = js_sys::Object::new();
    let data = js_sys::Uint8Array::from(artifact.image().as_raw());
    js_sys::Reflect::set(&obj, &"data".into(), &data)?;
    js_sys::Reflect::set(&obj, &"size".into(), &JsValue::from(artifact.size()))?;
    js_sys::Reflect::set(&obj, &"placement".into(), &to_js(&artifact.placement())?)?;
    js_sys::Reflect::set(&obj, &"enhanced".into(), &JsValue::from(artifact.enhanced()))?;

    Ok(JsValue::from(obj))
}

/// Normalize an encoded photo and encode the 600×600 export as JPEG.
#[wasm_bindgen(js_name = "exportJpeg")]
pub fn export_jpeg(input: Vec<u8>, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let opts = parse_options(options)?;
    let checker = build_checker(&opts)?;

    let image = RasterImage::decode(&input).map_err(to_js_error)?;
    let exported = checker.export(&image).map_err(to_js_error)?;
    encode_jpeg(&exported)
}

fn encode_jpeg(image: &RasterImage) -> Result<Vec<u8>, JsValue> {
    let rgb = DynamicImage::ImageRgba8(image.as_rgba().clone()).to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, EXPORT_JPEG_QUALITY)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| make_error("ENCODE_ERROR", &format!("failed to encode JPEG: {e}")))?;
    Ok(buffer)
}
