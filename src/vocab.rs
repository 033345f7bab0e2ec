use std::{collections::HashMap, sync::LazyLock};

use crate::error::EngineError;

// JSON representation of the fixed move vocabulary used by the language
// model. The file maps UCI strings (plus the special tokens below) to
// indices in the model's embedding/output layers. The `include_str!`
// macro embeds the data at compile time, avoiding an extra filesystem
// dependency at runtime.
const VOCAB_JSON: &str = include_str!("data/vocab.json");

pub const PAD_TOKEN: &str = "<pad>";
pub const BOS_TOKEN: &str = "<s>";
pub const EOS_TOKEN: &str = "</s>";

/// Mapping between UCI move tokens and the model's token ids.
///
/// This map is lazily initialized on first access. Using `LazyLock`
/// avoids the cost of parsing the JSON when the crate is simply linked
/// but not used.
pub static VOCAB: LazyLock<MoveVocab> = LazyLock::new(|| {
    let parsed: HashMap<String, i64> =
        serde_json::from_str(VOCAB_JSON).expect("Failed to parse vocab.json");
    MoveVocab::from_entries(parsed)
});

/// The model's move-level tokenizer: a forward token→id map and the
/// derived reverse id→token table.
pub struct MoveVocab {
    forward: HashMap<String, i64>,
    reverse: Vec<String>,
    pad_id: i64,
    bos_id: i64,
    eos_id: i64,
}

impl MoveVocab {
    fn from_entries(forward: HashMap<String, i64>) -> Self {
        let size = forward.len();
        let mut reverse = vec![String::new(); size];
        for (token, &id) in &forward {
            // ids are dense in 0..size
            assert!((id as usize) < size, "non-dense id {id} for token {token}");
            reverse[id as usize] = token.clone();
        }

        let special = |token: &str| {
            *forward
                .get(token)
                .unwrap_or_else(|| panic!("vocab.json is missing the {token} token"))
        };
        let pad_id = special(PAD_TOKEN);
        let bos_id = special(BOS_TOKEN);
        let eos_id = special(EOS_TOKEN);

        Self {
            forward,
            reverse,
            pad_id,
            bos_id,
            eos_id,
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn bos_id(&self) -> i64 {
        self.bos_id
    }

    pub fn eos_id(&self) -> i64 {
        self.eos_id
    }

    pub fn id(&self, token: &str) -> Option<i64> {
        self.forward.get(token).copied()
    }

    pub fn token(&self, id: i64) -> Option<&str> {
        self.reverse.get(id as usize).map(String::as_str)
    }

    fn is_special(&self, id: i64) -> bool {
        id == self.pad_id || id == self.bos_id || id == self.eos_id
    }

    /// Encode a space-joined UCI move history into model ids, prefixed
    /// with the beginning-of-sequence token. The empty prompt encodes to
    /// `[<s>]` alone.
    pub fn encode_prompt(&self, prompt: &str) -> Result<Vec<i64>, EngineError> {
        let mut ids = vec![self.bos_id];
        for token in prompt.split_whitespace() {
            let id = self
                .id(token)
                .ok_or_else(|| EngineError::OutOfVocabulary(token.to_string()))?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Decode sampled ids back into space-joined UCI text, dropping
    /// special tokens.
    pub fn decode(&self, ids: &[i64]) -> String {
        let tokens: Vec<&str> = ids
            .iter()
            .filter(|&&id| !self.is_special(id))
            .filter_map(|&id| self.token(id))
            .collect();
        tokens.join(" ")
    }
}
