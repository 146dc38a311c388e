use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::device::{select_device, DeviceKind};
use super::pooling::{cls_pool, l2_normalize};
use crate::config::ServiceConfig;

/// Files needed to build the encoder, either from a local snapshot or the HF cache.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// BERT-family encoder producing unit-length [CLS] embeddings.
///
/// Loaded once at startup and shared read-only behind an `Arc`.
pub struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    device_kind: DeviceKind,
    model_id: String,
    hidden_size: usize,
    max_len: usize,
}

impl BertEncoder {
    pub fn load(cfg: &ServiceConfig) -> Result<Self> {
        info!("loading model {} (revision {})", cfg.model_id, cfg.revision);
        let files = resolve_model_files(&cfg.model_id, &cfg.revision)?;
        let (device, device_kind) = select_device(cfg.use_cuda, cfg.use_mps);
        Self::from_files(&cfg.model_id, &files, device, device_kind, cfg.max_seq_len)
    }

    pub fn from_files(
        model_id: &str,
        files: &ModelFiles,
        device: Device,
        device_kind: DeviceKind,
        max_seq_len: Option<usize>,
    ) -> Result<Self> {
        let config = load_config(&files.config)?;

        let max_len = max_seq_len
            .map(|len| len.min(config.max_position_embeddings))
            .unwrap_or(config.max_position_embeddings);

        let tokenizer = load_tokenizer(&files.tokenizer, max_len)?;

        let vb = build_var_builder(&files.weights, DType::F32, &device)?;
        let model = BertModel::load(vb, &config)
            .with_context(|| format!("failed to build BERT model from {}", files.weights.display()))?;

        info!(
            "model {} ready on {} (hidden={}, max_len={})",
            model_id, device_kind, config.hidden_size, max_len
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            device_kind,
            model_id: model_id.to_string(),
            hidden_size: config.hidden_size,
            max_len,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn device_kind(&self) -> DeviceKind {
        self.device_kind
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Encodes the batch in one forward pass; output order follows `texts`.
    pub fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("tokenizer encode error: {e}"))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);
        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for enc in &encodings {
            if enc.len() != seq_len {
                return Err(anyhow!(
                    "ragged batch after padding: expected {seq_len} tokens, got {}",
                    enc.len()
                ));
            }
            ids.extend_from_slice(enc.get_ids());
            mask.extend_from_slice(enc.get_attention_mask());
        }
        debug!(batch, seq_len, "encoding batch");

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (batch, seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .context("encoder forward pass failed")?;

        let pooled = l2_normalize(&cls_pool(&hidden)?)?;
        pooled
            .to_vec2::<f32>()
            .map_err(|e| anyhow!("failed to read embeddings back: {e}"))
    }
}

/// A local directory wins; anything else is treated as a Hub repo id.
pub fn resolve_model_files(model_id: &str, revision: &str) -> Result<ModelFiles> {
    let local = Path::new(model_id);
    if local.is_dir() {
        return local_model_files(local);
    }

    let api = Api::new().context("failed to initialize the Hugging Face Hub client")?;
    let repo = api.repo(Repo::with_revision(
        model_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let config = repo
        .get("config.json")
        .with_context(|| format!("failed to fetch config.json for {model_id}"))?;
    let tokenizer = repo
        .get("tokenizer.json")
        .with_context(|| format!("failed to fetch tokenizer.json for {model_id}"))?;
    let weights = match repo.get("model.safetensors") {
        Ok(path) => path,
        Err(err) => {
            debug!("no model.safetensors for {model_id} ({err}), trying pytorch_model.bin");
            repo.get("pytorch_model.bin")
                .with_context(|| format!("no model weights found for {model_id}"))?
        }
    };

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

pub fn local_model_files(snapshot: &Path) -> Result<ModelFiles> {
    let config = snapshot.join("config.json");
    if !config.exists() {
        return Err(anyhow!("config.json not found under {}", snapshot.display()));
    }
    let tokenizer = snapshot.join("tokenizer.json");
    if !tokenizer.exists() {
        return Err(anyhow!(
            "tokenizer.json not found under {}",
            snapshot.display()
        ));
    }
    let weights = find_model_weights(snapshot)
        .ok_or_else(|| anyhow!("no model weights found under {}", snapshot.display()))?;

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

fn find_model_weights(snapshot: &Path) -> Option<PathBuf> {
    ["model.safetensors", "pytorch_model.bin"]
        .into_iter()
        .map(|candidate| snapshot.join(candidate))
        .find(|path| path.exists())
}

fn load_config(path: &Path) -> Result<Config> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_tokenizer(path: &Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("tokenizer load failed ({}): {e}", path.display()))?;

    let (pad_id, pad_token) = pad_token(&tokenizer);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("failed to configure truncation: {e}"))?;

    Ok(tokenizer)
}

fn pad_token(tokenizer: &Tokenizer) -> (u32, String) {
    if let Some(params) = tokenizer.get_padding() {
        return (params.pad_id, params.pad_token.clone());
    }
    ["[PAD]", "<pad>"]
        .into_iter()
        .find_map(|tok| tokenizer.token_to_id(tok).map(|id| (id, tok.to_string())))
        .unwrap_or((0, "[PAD]".to_string()))
}

fn build_var_builder(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "safetensors" {
        let files = vec![path.to_path_buf()];
        unsafe {
            VarBuilder::from_mmaped_safetensors(&files, dtype, device)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
        }
    } else {
        VarBuilder::from_pth(path, dtype, device)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
    }
}
