//! Token estimation.
//!
//! Local models do not report a tokenizer up front, so counts are estimates from an embedded
//! BPE vocabulary.  Which vocabulary is used for a model is decided by an explicit table of
//! model-name prefixes.  A vocabulary that cannot be loaded leaves the estimator unavailable;
//! callers report zero with a warning instead of failing.

use std::fmt;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;

/// Estimates the number of tokens in a piece of text.
pub trait TokenEstimator: Send + Sync {
    /// Estimate the token count.  Empty input is zero.
    fn estimate(&self, text: &str) -> usize;
}

/// The embedded vocabularies an estimator can be built from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// The cl100k_base vocabulary.
    Cl100kBase,
    /// The p50k_base vocabulary.
    P50kBase,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::P50kBase => write!(f, "p50k_base"),
        }
    }
}

/// Model-name prefixes and the vocabulary that approximates them best.  First match wins.
const ENCODING_TABLE: &[(&str, Encoding)] = &[
    ("gpt-4", Encoding::Cl100kBase),
    ("gpt-3.5", Encoding::Cl100kBase),
    ("text-davinci", Encoding::P50kBase),
    ("code-davinci", Encoding::P50kBase),
    ("codellama", Encoding::P50kBase),
    ("llama", Encoding::Cl100kBase),
    ("mistral", Encoding::Cl100kBase),
    ("phi", Encoding::Cl100kBase),
    ("qwen", Encoding::Cl100kBase),
    ("gemma", Encoding::Cl100kBase),
];

/// Vocabulary used for models that match no entry in the table.
const DEFAULT_ENCODING: Encoding = Encoding::Cl100kBase;

/// Resolves the vocabulary for a model name.
pub fn encoding_for_model(model: &str) -> Encoding {
    let model = model.to_lowercase();
    ENCODING_TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, encoding)| *encoding)
        .unwrap_or(DEFAULT_ENCODING)
}

/// A [`TokenEstimator`] backed by a tiktoken vocabulary.
pub struct BpeEstimator {
    bpe: CoreBPE,
}

impl BpeEstimator {
    /// Loads the given vocabulary.
    pub fn load(encoding: Encoding) -> Result<Self, String> {
        let bpe = match encoding {
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
        }
        .map_err(|e| format!("could not load {encoding}: {e}"))?;
        Ok(Self { bpe })
    }
}

impl TokenEstimator for BpeEstimator {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Caches one estimator per vocabulary, loaded on first use.
#[derive(Default)]
pub struct EstimatorRegistry {
    loaded: Vec<(Encoding, Option<Arc<dyn TokenEstimator>>)>,
}

impl EstimatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an estimator for an encoding, replacing any loaded one.
    ///
    /// `None` marks the encoding as unavailable.
    pub fn insert(&mut self, encoding: Encoding, estimator: Option<Arc<dyn TokenEstimator>>) {
        self.loaded.retain(|(e, _)| *e != encoding);
        self.loaded.push((encoding, estimator));
    }

    /// Returns the estimator for `model`, or `None` if its vocabulary is unavailable.
    pub fn for_model(&mut self, model: &str) -> Option<Arc<dyn TokenEstimator>> {
        let encoding = encoding_for_model(model);
        if let Some((_, estimator)) = self.loaded.iter().find(|(e, _)| *e == encoding) {
            return estimator.clone();
        }
        let estimator = match BpeEstimator::load(encoding) {
            Ok(estimator) => Some(Arc::new(estimator) as Arc<dyn TokenEstimator>),
            Err(err) => {
                tracing::warn!(%encoding, error = %err, "token estimator unavailable");
                None
            }
        };
        self.loaded.push((encoding, estimator.clone()));
        estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl TokenEstimator for Fixed {
        fn estimate(&self, _: &str) -> usize {
            self.0
        }
    }

    #[test]
    fn model_lookup() {
        assert_eq!(encoding_for_model("llama3.2"), Encoding::Cl100kBase);
        assert_eq!(encoding_for_model("CodeLlama:7b"), Encoding::P50kBase);
        assert_eq!(encoding_for_model("text-davinci-003"), Encoding::P50kBase);
        assert_eq!(encoding_for_model("something-new"), DEFAULT_ENCODING);
    }

    #[test]
    fn bpe_estimates() {
        let estimator = BpeEstimator::load(Encoding::Cl100kBase).unwrap();
        assert_eq!(estimator.estimate(""), 0);
        let count = estimator.estimate("Hello, world! This is a test.");
        assert!(count > 0 && count < 20, "{count}");
    }

    #[test]
    fn registry_caches_and_overrides() {
        let mut registry = EstimatorRegistry::new();
        registry.insert(Encoding::Cl100kBase, Some(Arc::new(Fixed(7))));
        let estimator = registry.for_model("llama3.2").unwrap();
        assert_eq!(estimator.estimate("anything"), 7);

        registry.insert(Encoding::Cl100kBase, None);
        assert!(registry.for_model("mistral").is_none());
    }
}
