//! Coordinator-level tests for the alt-text pipeline.
//!
//! All external services are replaced with deterministic in-process mocks
//! injected through the config's client slots, so these tests exercise the
//! full normalize → extract → correct → prompt → caption sequencing without
//! any network access. Retry delays are set to zero to keep the suite fast.

use async_trait::async_trait;
use img2alt::{
    process_image, prompts, AltTextError, CaptionClient, CaptionError, CaptionResponse,
    Dictionary, OcrClient, OcrError, PipelineConfig, PromptSpec, GENERATION_ERROR,
    GENERATION_FAILED,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────

/// A small valid PNG.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([20, 90, 200]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode test PNG");
    buf
}

/// OCR mock: fails the first `fail_first` attempts, then returns `texts`.
struct ScriptedOcr {
    attempts: AtomicU32,
    fail_first: u32,
    texts: Vec<String>,
}

impl ScriptedOcr {
    fn new(fail_first: u32, texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicU32::new(0),
            fail_first,
            texts: texts.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrClient for ScriptedOcr {
    async fn recognize(&self, _image: &[u8], _media_type: &str) -> Result<Vec<String>, OcrError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first {
            Err(OcrError::Unavailable {
                detail: format!("scripted failure {n}"),
            })
        } else {
            Ok(self.texts.clone())
        }
    }
}

/// OCR mock whose response shape is always unexpected.
struct MalformedOcr {
    attempts: AtomicU32,
}

#[async_trait]
impl OcrClient for MalformedOcr {
    async fn recognize(&self, _image: &[u8], _media_type: &str) -> Result<Vec<String>, OcrError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(OcrError::Malformed {
            detail: "scripted shape mismatch".into(),
        })
    }
}

/// Caption mock: records the prompt it received and returns a fixed answer.
struct RecordingCaption {
    response: Result<CaptionResponse, CaptionError>,
    seen: Mutex<Vec<PromptSpec>>,
}

impl RecordingCaption {
    fn ok(content: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(CaptionResponse {
                content: Some(content.to_string()),
            }),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            response: Ok(CaptionResponse { content: None }),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: Err(CaptionError::Service {
                detail: "scripted network failure".into(),
            }),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last_user_text(&self) -> String {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|s| s.user.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CaptionClient for RecordingCaption {
    async fn complete(&self, spec: &PromptSpec) -> Result<CaptionResponse, CaptionError> {
        self.seen.lock().unwrap().push(spec.clone());
        self.response.clone()
    }
}

fn config_with(
    ocr: Option<Arc<dyn OcrClient>>,
    captioner: Arc<dyn CaptionClient>,
) -> PipelineConfig {
    let mut builder = PipelineConfig::builder()
        .ocr_retry_delay_ms(0)
        .caption_client(captioner);
    if let Some(ocr) = ocr {
        builder = builder.ocr_client(ocr);
    }
    builder.build().unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_image_always_yields_nonempty_alt_tag() {
    let captioner = RecordingCaption::ok("A blue banner.");
    let config = config_with(None, captioner);

    let result = process_image(&png_bytes(100, 60), "image/png", &config)
        .await
        .unwrap();

    assert!(!result.alt_tag.is_empty());
    assert_eq!(result.alt_tag, "A blue banner.");
    // No OCR stage executed, so ocrTexts is absent.
    assert!(result.ocr_texts.is_none());
    assert!(result.stats.ocr_attempts.is_none());
}

#[tokio::test]
async fn ocr_fragments_keep_reading_order() {
    let ocr = ScriptedOcr::new(0, &["A", "B", "C"]);
    let captioner = RecordingCaption::ok("A B C poster.");
    let config = config_with(Some(ocr as _), Arc::clone(&captioner) as _);

    let result = process_image(&png_bytes(100, 60), "image/png", &config)
        .await
        .unwrap();

    assert_eq!(
        result.ocr_texts,
        Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
    );
    // The prompt carries the joined form with the documented separator.
    assert!(captioner.last_user_text().contains("A\nB\nC"));
}

#[tokio::test]
async fn ocr_retries_then_uses_third_attempt() {
    let ocr = ScriptedOcr::new(2, &["웰컴저축은행"]);
    let captioner = RecordingCaption::ok("배너");
    let config = config_with(Some(Arc::clone(&ocr) as _), captioner);

    let result = process_image(&png_bytes(64, 64), "image/png", &config)
        .await
        .unwrap();

    assert_eq!(ocr.attempts(), 3);
    assert_eq!(result.stats.ocr_attempts, Some(3));
    assert_eq!(result.ocr_texts, Some(vec!["웰컴저축은행".to_string()]));
}

#[tokio::test]
async fn ocr_exhaustion_degrades_to_empty_without_error() {
    let ocr = ScriptedOcr::new(u32::MAX, &[]);
    let captioner = RecordingCaption::ok("A plain blue image.");
    let config = config_with(Some(Arc::clone(&ocr) as _), Arc::clone(&captioner) as _);

    let result = process_image(&png_bytes(64, 64), "image/png", &config)
        .await
        .unwrap();

    assert_eq!(ocr.attempts(), 3);
    assert_eq!(result.stats.ocr_attempts, Some(3));
    // Stage executed, found nothing: present but empty.
    assert_eq!(result.ocr_texts, Some(vec![]));
    // Empty transcript selects the scene-only user instruction.
    assert_eq!(captioner.last_user_text(), prompts::SCENE_USER_INSTRUCTION);
}

#[tokio::test]
async fn malformed_ocr_response_is_not_retried() {
    let ocr = Arc::new(MalformedOcr {
        attempts: AtomicU32::new(0),
    });
    let captioner = RecordingCaption::ok("A plain blue image.");
    let config = config_with(Some(Arc::clone(&ocr) as _), captioner);

    let result = process_image(&png_bytes(64, 64), "image/png", &config)
        .await
        .unwrap();

    assert_eq!(ocr.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(result.stats.ocr_attempts, Some(1));
    assert_eq!(result.ocr_texts, Some(vec![]));
}

#[tokio::test]
async fn empty_caption_response_yields_generation_failed() {
    let config = config_with(None, RecordingCaption::empty());
    let result = process_image(&png_bytes(64, 64), "image/png", &config)
        .await
        .unwrap();
    assert_eq!(result.alt_tag, GENERATION_FAILED);
}

#[tokio::test]
async fn caption_service_error_yields_generation_error() {
    let config = config_with(None, RecordingCaption::failing());
    let result = process_image(&png_bytes(64, 64), "image/png", &config)
        .await
        .unwrap();
    assert_eq!(result.alt_tag, GENERATION_ERROR);
}

#[tokio::test]
async fn corrected_text_reaches_prompt_raw_text_reaches_caller() {
    let ocr = ScriptedOcr::new(0, &["웰컴저축은햄"]);
    let captioner = RecordingCaption::ok("웰컴저축은행 배너");
    let config = PipelineConfig::builder()
        .ocr_retry_delay_ms(0)
        .dictionary(Dictionary::new(["웰컴저축은행", "웰컴금융그룹"]))
        .ocr_client(ocr)
        .caption_client(Arc::clone(&captioner) as _)
        .build()
        .unwrap();

    let result = process_image(&png_bytes(64, 64), "image/png", &config)
        .await
        .unwrap();

    // The prompt sees the corrected form; the caller sees the raw fragments.
    assert!(captioner.last_user_text().contains("웰컴저축은행"));
    assert_eq!(result.ocr_texts, Some(vec!["웰컴저축은햄".to_string()]));
}

#[tokio::test]
async fn pipeline_is_idempotent_under_deterministic_mocks() {
    let bytes = png_bytes(200, 120);

    let mut runs = Vec::new();
    for _ in 0..2 {
        let ocr = ScriptedOcr::new(0, &["OPEN", "9AM-6PM"]);
        let captioner = RecordingCaption::ok("A sign reading OPEN, 9AM-6PM.");
        let config = config_with(Some(ocr as _), captioner);
        runs.push(
            process_image(&bytes, "image/png", &config)
                .await
                .unwrap(),
        );
    }

    assert_eq!(runs[0].alt_tag, runs[1].alt_tag);
    assert_eq!(runs[0].ocr_texts, runs[1].ocr_texts);
}

#[tokio::test]
async fn undecodable_bytes_abort_with_invalid_image() {
    let config = config_with(None, RecordingCaption::ok("unused"));
    let err = process_image(b"not an image at all", "image/png", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, AltTextError::InvalidImage { .. }));
}

#[tokio::test]
async fn empty_upload_aborts_with_invalid_image() {
    let config = config_with(None, RecordingCaption::ok("unused"));
    let err = process_image(&[], "image/png", &config).await.unwrap_err();
    assert!(matches!(err, AltTextError::InvalidImage { .. }));
}

#[tokio::test]
async fn wide_upload_is_normalized_before_captioning() {
    let captioner = RecordingCaption::ok("A wide blue banner.");
    let config = config_with(None, Arc::clone(&captioner) as _);

    process_image(&png_bytes(1600, 400), "image/png", &config)
        .await
        .unwrap();

    // The caption request carries the downscaled JPEG, not the original.
    let spec = captioner.seen.lock().unwrap().last().unwrap().clone();
    let b64 = spec
        .image_data_uri
        .strip_prefix("data:image/jpeg;base64,")
        .expect("data URI prefix");
    use base64::Engine as _;
    let jpeg = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
    let img = image::load_from_memory(&jpeg).unwrap();
    assert!(img.width() <= 512);
}
