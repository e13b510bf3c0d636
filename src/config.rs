//! Configuration for the alt-text pipeline.
//!
//! All behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`] once at process start and passed by reference
//! into every pipeline invocation. The struct is never mutated after
//! `build()`: concurrent requests share it without locking.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::AltTextError;
use crate::pipeline::caption::CaptionClient;
use crate::pipeline::correct::Dictionary;
use crate::pipeline::ocr::OcrClient;
use std::fmt;
use std::sync::Arc;

/// Default vision-language model, matching the deployed service.
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-VL-Instruct";

/// Configuration for alt-text synthesis.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use img2alt::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_width(512)
///     .ocr_endpoint("http://localhost:5001/ocr")
///     .model("Qwen/Qwen2.5-VL-Instruct")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Maximum image width in pixels after normalization. Default: 512.
    ///
    /// 512 px keeps the base64 payload small enough that the inference call
    /// dominates request latency rather than the upload, while logos and
    /// signage stay readable to the model. Images narrower than the cap are
    /// never upscaled.
    pub max_width: u32,

    /// JPEG quality for the normalized image, 1–100. Default: 80.
    ///
    /// Quality 80 roughly halves the payload versus 95 with no measurable
    /// effect on caption quality for photos and screenshots.
    pub jpeg_quality: u8,

    /// OCR endpoint URL. Default: None (resolved from `IMG2ALT_OCR_URL`,
    /// or the OCR stage is skipped entirely).
    pub ocr_endpoint: Option<String>,

    /// Total OCR attempts before degrading to an empty transcript. Default: 3.
    ///
    /// The OCR sidecar restarts in seconds; three attempts spaced by
    /// [`ocr_retry_delay_ms`](Self::ocr_retry_delay_ms) cover that window.
    /// Counted as attempts, not retries, so the ceiling reads directly.
    pub ocr_max_attempts: u32,

    /// Fixed delay between OCR attempts in milliseconds. Default: 2000.
    pub ocr_retry_delay_ms: u64,

    /// Per-OCR-call timeout in seconds. Default: 30.
    pub ocr_timeout_secs: u64,

    /// Similarity threshold for dictionary correction, 0.0–1.0. Default: 0.7.
    ///
    /// Below this score the recognized text passes through unchanged.
    /// 0.7 on the Dice scale corrects one mangled syllable in a six-syllable
    /// brand name without capturing unrelated words.
    pub similarity_threshold: f64,

    /// Canonical domain strings for fuzzy correction.
    ///
    /// Loaded once at startup; read-only at request time.
    pub dictionary: Dictionary,

    /// Vision-language model identifier. Default: [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Chat-completions endpoint URL. Default: None (resolved from
    /// `IMG2ALT_API_BASE`, falling back to the Hugging Face router).
    pub api_base: Option<String>,

    /// API key for the caption endpoint. Default: None (resolved from
    /// `IMG2ALT_API_KEY`, then `HUGGING_FACE_API_KEY`).
    pub api_key: Option<String>,

    /// Sampling temperature for the caption completion. Default: 0.2.
    ///
    /// Low temperature keeps the description faithful to what is on the
    /// image — creativity works against verbatim text preservation.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 300.
    ///
    /// Alt text is two sentences plus preserved text; 300 covers dense
    /// multi-line signage without paying for runaway generations.
    pub max_tokens: u32,

    /// Per-caption-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system instruction. If None, the built-in variants apply.
    pub system_prompt: Option<String>,

    /// Pre-constructed OCR client. Takes precedence over `ocr_endpoint`.
    ///
    /// Useful in tests or when the caller needs custom middleware.
    pub ocr: Option<Arc<dyn OcrClient>>,

    /// Pre-constructed caption client. Takes precedence over `api_base`.
    pub captioner: Option<Arc<dyn CaptionClient>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_width: 512,
            jpeg_quality: 80,
            ocr_endpoint: None,
            ocr_max_attempts: 3,
            ocr_retry_delay_ms: 2000,
            ocr_timeout_secs: 30,
            similarity_threshold: 0.7,
            dictionary: Dictionary::default(),
            model: None,
            api_base: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 300,
            api_timeout_secs: 60,
            system_prompt: None,
            ocr: None,
            captioner: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("max_width", &self.max_width)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_max_attempts", &self.ocr_max_attempts)
            .field("ocr_retry_delay_ms", &self.ocr_retry_delay_ms)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("dictionary", &self.dictionary)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn OcrClient>"))
            .field("captioner", &self.captioner.as_ref().map(|_| "<dyn CaptionClient>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_width(mut self, px: u32) -> Self {
        self.config.max_width = px.max(64);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = Some(url.into());
        self
    }

    pub fn ocr_max_attempts(mut self, n: u32) -> Self {
        self.config.ocr_max_attempts = n.max(1);
        self
    }

    pub fn ocr_retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.ocr_retry_delay_ms = ms;
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn similarity_threshold(mut self, t: f64) -> Self {
        self.config.similarity_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn dictionary(mut self, dict: Dictionary) -> Self {
        self.config.dictionary = dict;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn ocr_client(mut self, client: Arc<dyn OcrClient>) -> Self {
        self.config.ocr = Some(client);
        self
    }

    pub fn caption_client(mut self, client: Arc<dyn CaptionClient>) -> Self {
        self.config.captioner = Some(client);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, AltTextError> {
        let c = &self.config;
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(AltTextError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.ocr_max_attempts == 0 {
            return Err(AltTextError::InvalidConfig(
                "OCR attempt count must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.similarity_threshold) {
            return Err(AltTextError::InvalidConfig(format!(
                "Similarity threshold must be 0.0–1.0, got {}",
                c.similarity_threshold
            )));
        }
        Ok(self.config)
    }
}
