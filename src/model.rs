use ndarray::{Array2, ArrayView1, Axis};
use ort::{session::Session, value::Tensor};
use rand::Rng;

use crate::{error::EngineError, vocab::VOCAB};

/// Parameters governing one generation call and the surrounding retry
/// loop. Process-wide constants in the running service, but carried
/// explicitly so tests can exercise alternate budgets.
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    /// Upper bound on tokens decoded per generation call.
    pub max_new_tokens: usize,
    /// Softmax temperature; 1.0 leaves the distribution untouched.
    pub temperature: f32,
    /// Nucleus-sampling threshold: sampling is restricted to the
    /// smallest set of tokens whose probability mass reaches this value.
    pub top_p: f32,
    /// Generation attempts before the sampler falls back to a random
    /// legal move.
    pub retries: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 6,
            temperature: 0.9,
            top_p: 0.95,
            retries: 12,
        }
    }
}

/// The generation capability behind the move sampler.
///
/// Implementations return the newly generated continuation only — the
/// prompt is never echoed back. Output is randomized: repeated calls
/// with the same prompt may yield different text.
pub trait MoveGenerator: Send {
    fn generate(&mut self, prompt: &str, cfg: &SamplingConfig) -> Result<String, EngineError>;
}

/// A UCI-trained causal language model behind an ONNX Runtime session.
///
/// The export takes `input_ids` and `attention_mask` (`[batch, seq]`,
/// i64) and yields `logits` (`[batch, seq, vocab]`, f32). Sequences stay
/// short enough that re-running the full prefix each step is cheaper
/// than carrying a KV cache through the export.
pub struct ChessLm {
    session: Session,
}

impl ChessLm {
    /// Initialize from a local `.onnx` file path
    pub fn from_file(path: &str) -> Result<Self, EngineError> {
        let session = Session::builder()?.commit_from_file(path)?;

        Ok(Self { session })
    }

    /// Initialize from raw bytes
    pub fn from_memory(model_bytes: &[u8]) -> Result<Self, EngineError> {
        let session = Session::builder()?.commit_from_memory(model_bytes)?;

        Ok(Self { session })
    }

    /// Run one forward pass over the current sequence and sample the
    /// next token id from the final position's logits.
    fn next_token(
        &mut self,
        ids: &[i64],
        cfg: &SamplingConfig,
        rng: &mut impl Rng,
    ) -> Result<i64, EngineError> {
        let seq = ids.len();
        let input_ids = Array2::from_shape_vec((1, seq), ids.to_vec())?;
        let attention_mask = Array2::<i64>::ones((1, seq));

        let outputs = self.session.run(ort::inputs! {
            "input_ids" => Tensor::from_array(input_ids)?,
            "attention_mask" => Tensor::from_array(attention_mask)?,
        })?;

        let logits = outputs["logits"]
            .try_extract_array::<f32>()?
            .into_dimensionality::<ndarray::Ix3>()?;
        let step = logits.index_axis(Axis(0), 0);
        let step = step.index_axis(Axis(0), seq - 1);

        Ok(sample_from_logits(step, cfg, rng) as i64)
    }
}

impl MoveGenerator for ChessLm {
    fn generate(&mut self, prompt: &str, cfg: &SamplingConfig) -> Result<String, EngineError> {
        let mut ids = VOCAB.encode_prompt(prompt)?;
        let prompt_len = ids.len();
        let mut rng = rand::thread_rng();

        for _ in 0..cfg.max_new_tokens {
            let next = self.next_token(&ids, cfg, &mut rng)?;
            if next == VOCAB.eos_id() {
                break;
            }
            ids.push(next);
        }

        Ok(VOCAB.decode(&ids[prompt_len..]))
    }
}

fn sample_from_logits(logits: ArrayView1<f32>, cfg: &SamplingConfig, rng: &mut impl Rng) -> usize {
    let scaled: Vec<f32> = logits.iter().map(|&l| l / cfg.temperature).collect();
    let probs = softmax(&scaled);
    nucleus_sample(&probs, cfg.top_p, rng)
}

/// Softmax with the max-subtraction trick to keep exponentials in range.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let mut max_logit = f32::NEG_INFINITY;
    for &l in logits {
        if l > max_logit {
            max_logit = l;
        }
    }

    let mut sum_exp = 0.0;
    let mut exps = Vec::with_capacity(logits.len());
    for &l in logits {
        let exp = (l - max_logit).exp();
        sum_exp += exp;
        exps.push(exp);
    }

    for e in &mut exps {
        *e /= sum_exp;
    }
    exps
}

/// Draw an index from the nucleus of the distribution: the smallest
/// probability-sorted prefix whose mass reaches `top_p`.
fn nucleus_sample(probs: &[f32], top_p: f32, rng: &mut impl Rng) -> usize {
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].partial_cmp(&probs[a]).unwrap());

    let mut kept = 0;
    let mut mass = 0.0f32;
    for &i in &order {
        kept += 1;
        mass += probs[i];
        if mass >= top_p {
            break;
        }
    }

    let mut r = rng.gen_range(0.0..mass);
    for &i in &order[..kept] {
        r -= probs[i];
        if r <= 0.0 {
            return i;
        }
    }
    // floating-point slack lands on the last nucleus member
    order[kept - 1]
}
