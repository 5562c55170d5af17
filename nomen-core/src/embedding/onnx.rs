//! Speaker embedding backend via the `ort` crate.
//!
//! Targets an ECAPA-TDNN speaker verification export (e.g. the
//! `spkrec-ecapa-voxceleb` family): raw waveform `[1, n_samples]` in,
//! embedding `[1, 192]` out. Feature extraction (fbank) lives inside the
//! exported graph, so the only preprocessing this backend needs is the
//! normalizer's mono/16 kHz contract.
//!
//! Input and output tensor names plus the embedding dimensionality are
//! discovered from the graph at warm-up, so sibling exports with different
//! naming load without a code change.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{Session, SessionInputValue};
use ort::value::{TensorRef, Value};
use ort::{
    ep,
    session::builder::{GraphOptimizationLevel, SessionBuilder},
};
use tracing::{debug, info};

use crate::audio::Waveform;
use crate::embedding::{Embedding, VoiceEncoder};
use crate::error::{NomenError, Result};

/// Warm-up forward pass length: one second of silence at the target rate.
const WARM_UP_SAMPLES: usize = 16_000;

#[cfg(target_os = "windows")]
const DEVICE: &str = "directml";
#[cfg(not(target_os = "windows"))]
const DEVICE: &str = "cpu";

pub struct OnnxEncoderConfig {
    pub model_path: PathBuf,
    /// Expected embedding dimensionality. Overridden by the graph's declared
    /// output shape at warm-up when the export specifies one.
    pub embedding_dim: usize,
}

impl Default for OnnxEncoderConfig {
    fn default() -> Self {
        Self {
            model_path: selected_models_dir().join("speaker_embedding.onnx"),
            embedding_dim: 192,
        }
    }
}

fn selected_models_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var("NOMEN_MODEL_DIR") {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    default_models_dir()
}

pub fn default_models_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| {
                PathBuf::from(p)
                    .join("Lattice Labs")
                    .join("Nomen")
                    .join("models")
            })
            .unwrap_or_else(|| PathBuf::from("models"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("nomen")
            .join("models")
    }
}

fn create_session(model_path: &Path) -> Result<Session> {
    let logical_cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let intra_threads = logical_cores.clamp(2, 8);

    let builder = SessionBuilder::new()
        .map_err(|e| NomenError::OnnxSession(e.to_string()))?
        .with_intra_threads(intra_threads)
        .map_err(|e| NomenError::OnnxSession(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::All)
        .map_err(|e| NomenError::OnnxSession(e.to_string()))?;

    #[cfg(target_os = "windows")]
    let builder = builder
        .with_execution_providers([
            ep::DirectML::default()
                .with_device_id(0)
                .build()
                .fail_silently(),
            ep::CPU::default().build(),
        ])
        .map_err(|e| NomenError::OnnxSession(e.to_string()))?;

    #[cfg(not(target_os = "windows"))]
    let builder = builder
        .with_execution_providers([ep::CPU::default().build()])
        .map_err(|e| NomenError::OnnxSession(e.to_string()))?;

    info!(intra_threads, logical_cores, device = DEVICE, "ONNX session configured");

    builder
        .commit_from_file(model_path)
        .map_err(|e| NomenError::OnnxSession(e.to_string()))
}

/// ECAPA-style ONNX speaker encoder.
pub struct OnnxEncoder {
    config: OnnxEncoderConfig,
    session: Option<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxEncoder {
    pub fn new(config: OnnxEncoderConfig) -> Self {
        Self {
            config,
            session: None,
            input_name: String::new(),
            output_name: String::new(),
        }
    }
}

impl VoiceEncoder for OnnxEncoder {
    fn warm_up(&mut self) -> Result<()> {
        let path = &self.config.model_path;
        if !path.exists() {
            return Err(NomenError::ModelNotFound { path: path.clone() });
        }
        let size_mb = std::fs::metadata(path)
            .map(|m| m.len() as f64 / 1_048_576.0)
            .unwrap_or(0.0);
        info!("loading speaker model from {:?} ({:.2} MB)", path, size_mb);

        let mut session = create_session(path)?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| NomenError::OnnxSession("model graph has no inputs".into()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| NomenError::OnnxSession("model graph has no outputs".into()))?;
        info!(input = %input_name, output = %output_name, "speaker model graph");

        // Embedding dimensionality from the declared output shape, when the
        // export carries one (dynamic dims come through as -1 and are ignored).
        if let Some(shape) = session
            .outputs()
            .first()
            .and_then(|o| o.dtype().tensor_shape())
        {
            if let Some(&dim) = shape.last() {
                if dim > 0 && dim as usize != self.config.embedding_dim {
                    info!(
                        previous = self.config.embedding_dim,
                        detected = dim,
                        "detected embedding dimension; updating"
                    );
                    self.config.embedding_dim = dim as usize;
                }
            }
        }

        // Dummy forward pass to populate kernels and caches. The output is
        // discarded, so a degenerate silence embedding is fine here.
        let dummy = Array2::<f32>::zeros((1, WARM_UP_SAMPLES));
        let dummy_val = Value::from_array(dummy)
            .map_err(|e: ort::Error| NomenError::OnnxSession(e.to_string()))?;
        let mut inputs: Vec<(String, SessionInputValue<'_>)> = Vec::with_capacity(1);
        inputs.push((input_name.clone(), SessionInputValue::from(dummy_val)));
        session
            .run(inputs)
            .map_err(|e| NomenError::OnnxSession(e.to_string()))?;

        self.session = Some(session);
        self.input_name = input_name;
        self.output_name = output_name;

        info!(dim = self.config.embedding_dim, "speaker model warm-up complete");
        Ok(())
    }

    fn encode(&mut self, waveform: &Waveform) -> Result<Embedding> {
        let Some(session) = self.session.as_mut() else {
            return Err(NomenError::OnnxSession(
                "model not loaded — call warm_up()".into(),
            ));
        };

        let n = waveform.samples.len();
        // Zero-copy view over the waveform to avoid a per-request tensor copy.
        let input = TensorRef::from_array_view(([1_i64, n as i64], waveform.samples.as_slice()))
            .map_err(|e| NomenError::OnnxSession(e.to_string()))?;
        let mut inputs: Vec<(String, SessionInputValue<'_>)> = Vec::with_capacity(1);
        inputs.push((self.input_name.clone(), SessionInputValue::from(input)));

        let outputs = session
            .run(inputs)
            .map_err(|e| NomenError::OnnxSession(e.to_string()))?;
        let (_, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| NomenError::OnnxSession(e.to_string()))?;

        debug!(samples = n, dim = data.len(), "extracted embedding");
        Embedding::from_raw(data.to_vec(), self.config.embedding_dim)
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    fn device(&self) -> String {
        DEVICE.into()
    }
}
