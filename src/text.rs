//! Text mood classifier.
//!
//! Scores lowercase word tokens against the polarity lexicon, maps the
//! length-normalized score onto a mood through fixed thresholds, then lets a
//! substring keyword scan override the result.
//!
//! ```text
//! comparative = score / max(1, tokens)
//! mood        = first threshold t where comparative >= t
//! confidence  = breakpoint(|comparative|), floor 0.5
//! keywords    = mood with most substring hits; overrides, +0.2 capped at 0.95
//! ```

use crate::error::{MoodError, MoodResult};
use crate::lexicon::Lexicon;
use crate::mood::{DetectionMethod, Mood, MoodSignal};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

lazy_static::lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"\b\w+\b").expect("word pattern compiles");
}

/// Thresholds that turn a comparative score into a mood and a confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct TextScoringContext {
    /// Evaluated top-down; first `comparative >= threshold` wins.
    pub mood_thresholds: Vec<(f64, Mood)>,
    /// Mood for anything below the last threshold.
    pub below_thresholds: Mood,
    /// Evaluated top-down on `|comparative|`; first match wins.
    pub confidence_breakpoints: Vec<(f64, f64)>,
    pub confidence_floor: f64,
    pub keyword_boost: f64,
    pub keyword_cap: f64,
}

impl Default for TextScoringContext {
    fn default() -> Self {
        Self {
            mood_thresholds: vec![
                (0.5, Mood::Happy),
                (0.1, Mood::Energetic),
                (-0.1, Mood::Neutral),
                (-0.3, Mood::Sad),
                (-0.5, Mood::Angry),
            ],
            below_thresholds: Mood::Sad,
            confidence_breakpoints: vec![(0.5, 0.9), (0.3, 0.8), (0.1, 0.7), (0.05, 0.6)],
            confidence_floor: 0.5,
            keyword_boost: 0.2,
            keyword_cap: 0.95,
        }
    }
}

/// Coarse energy reading of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    /// Value usable as a playlist energy override.
    pub const fn approximate_value(self) -> f64 {
        match self {
            EnergyLevel::Low => 0.3,
            EnergyLevel::Medium => 0.5,
            EnergyLevel::High => 0.8,
        }
    }
}

/// Full text analysis; `signal` is what downstream stages consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnalysis {
    pub signal: MoodSignal,
    pub score: i64,
    pub comparative: f64,
    pub tokens: Vec<String>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    /// Mood picked by the keyword pass, if any keyword matched.
    pub keyword_mood: Option<Mood>,
}

/// Deterministic, rule-based text classifier.
#[derive(Debug, Clone)]
pub struct TextMoodClassifier {
    lexicon: Arc<Lexicon>,
    context: TextScoringContext,
}

impl TextMoodClassifier {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self::with_context(lexicon, TextScoringContext::default())
    }

    pub fn with_context(lexicon: Arc<Lexicon>, context: TextScoringContext) -> Self {
        Self { lexicon, context }
    }

    /// Classify `text` into a mood signal.
    pub fn classify(&self, text: &str) -> MoodResult<MoodSignal> {
        self.analyze(text).map(|analysis| analysis.signal)
    }

    /// Like [`classify`](Self::classify) but keeps the evidence.
    pub fn analyze(&self, text: &str) -> MoodResult<TextAnalysis> {
        self.analyze_at(text, Utc::now())
    }

    /// Analysis stamped with a caller-supplied time.
    pub fn analyze_at(&self, text: &str, timestamp: DateTime<Utc>) -> MoodResult<TextAnalysis> {
        if text.trim().is_empty() {
            return Err(MoodError::EmptyInput);
        }

        let lowered = text.to_lowercase();
        let tokens = tokenize(&lowered);

        let mut score: i64 = 0;
        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for token in &tokens {
            if self.lexicon.is_positive(token) {
                positive.push(token.clone());
                score += 1;
            } else if self.lexicon.is_negative(token) {
                negative.push(token.clone());
                score -= 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let comparative = score as f64 / tokens.len().max(1) as f64;
        let base_mood = self.mood_for(comparative);
        let base_confidence = self.confidence_for(comparative);
        trace!(
            "Text score {score}, comparative {comparative:.3} -> {base_mood} ({base_confidence})"
        );

        let keyword_mood = self.keyword_mood(&lowered);
        let (mood, confidence) = match &keyword_mood {
            Some(keyword_mood) => {
                debug!("Keyword override: {base_mood} -> {keyword_mood}");
                (
                    keyword_mood.clone(),
                    (base_confidence + self.context.keyword_boost).min(self.context.keyword_cap),
                )
            }
            None => (base_mood, base_confidence),
        };

        #[allow(clippy::cast_precision_loss)]
        let signal = MoodSignal::at(
            mood,
            confidence,
            DetectionMethod::Text,
            Some(score as f64),
            timestamp,
        );

        Ok(TextAnalysis {
            signal,
            score,
            comparative,
            tokens,
            positive,
            negative,
            keyword_mood,
        })
    }

    /// Count high- vs low-energy keywords (substring match).
    pub fn detect_energy_level(&self, text: &str) -> EnergyLevel {
        let lowered = text.to_lowercase();
        let high = count_hits(&lowered, &self.lexicon.high_energy);
        let low = count_hits(&lowered, &self.lexicon.low_energy);

        match high.cmp(&low) {
            std::cmp::Ordering::Greater => EnergyLevel::High,
            std::cmp::Ordering::Less => EnergyLevel::Low,
            std::cmp::Ordering::Equal => EnergyLevel::Medium,
        }
    }

    pub fn suggestions(&self, mood: &Mood) -> &[String] {
        self.lexicon.suggestions_for(mood)
    }

    fn mood_for(&self, comparative: f64) -> Mood {
        self.context
            .mood_thresholds
            .iter()
            .find(|(threshold, _)| comparative >= *threshold)
            .map_or_else(|| self.context.below_thresholds.clone(), |(_, mood)| mood.clone())
    }

    fn confidence_for(&self, comparative: f64) -> f64 {
        let magnitude = comparative.abs();
        self.context
            .confidence_breakpoints
            .iter()
            .find(|(breakpoint, _)| magnitude >= *breakpoint)
            .map_or(self.context.confidence_floor, |(_, confidence)| *confidence)
    }

    /// Mood with the most keyword hits; ties go to the first declared mood.
    fn keyword_mood(&self, lowered: &str) -> Option<Mood> {
        let mut best: Option<(&Mood, usize)> = None;
        for entry in &self.lexicon.mood_keywords {
            let hits = count_hits(lowered, &entry.keywords);
            if hits > best.map_or(0, |(_, max)| max) {
                best = Some((&entry.mood, hits));
            }
        }
        best.map(|(mood, _)| mood.clone())
    }
}

impl Default for TextMoodClassifier {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::default()))
    }
}

fn tokenize(lowered: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(lowered)
        .map(|word| word.as_str().to_string())
        .collect()
}

fn count_hits(haystack: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| haystack.contains(keyword.as_str()))
        .count()
}
