//! Generation intents and their parameter profiles
//!
//! Every completion names an intent, and the intent fixes the full sampling
//! parameter set for that one call. Profiles are immutable consts resolved
//! per request, so concurrent generations can never observe each other's
//! tuning.

use serde::{Deserialize, Serialize};

/// What kind of output the caller wants from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Precise, low-variance output (code, structured facts)
    Technical,
    /// High-variance prose (descriptions, story text)
    Creative,
    /// Focused reasoning with penalized repetition (classification, estimates)
    Analytical,
    /// Provider-neutral defaults
    #[default]
    Default,
}

/// The complete sampling parameter set for one completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProfile {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

const TECHNICAL: GenerationProfile = GenerationProfile {
    max_tokens: 4096,
    temperature: 0.2,
    top_p: 0.4,
    frequency_penalty: 0.0,
    presence_penalty: 0.0,
};

const CREATIVE: GenerationProfile = GenerationProfile {
    max_tokens: 4096,
    temperature: 1.5,
    top_p: 1.0,
    frequency_penalty: 0.0,
    presence_penalty: 1.0,
};

const ANALYTICAL: GenerationProfile = GenerationProfile {
    max_tokens: 4096,
    temperature: 0.5,
    top_p: 0.8,
    frequency_penalty: 0.5,
    presence_penalty: 0.0,
};

const DEFAULT: GenerationProfile = GenerationProfile {
    max_tokens: 4096,
    temperature: 1.0,
    top_p: 1.0,
    frequency_penalty: 0.0,
    presence_penalty: 0.0,
};

impl Intent {
    /// The fixed profile for this intent
    pub const fn profile(self) -> GenerationProfile {
        match self {
            Self::Technical => TECHNICAL,
            Self::Creative => CREATIVE,
            Self::Analytical => ANALYTICAL,
            Self::Default => DEFAULT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Creative => "creative",
            Self::Analytical => "analytical",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
