//! Facial-expression mood classifier.
//!
//! The face model itself lives outside this crate behind [`ExpressionModel`];
//! it turns one still frame into a probability per expression label. This
//! module picks the dominant label and maps it to a mood.

use crate::error::{MoodError, MoodResult};
use crate::mood::{clamp_unit, DetectionMethod, Mood, MoodSignal};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Expression classes reported by the face model, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionLabel {
    Happy,
    Sad,
    Angry,
    Surprised,
    Fearful,
    Disgusted,
    Neutral,
}

impl ExpressionLabel {
    pub const ALL: [ExpressionLabel; 7] = [
        ExpressionLabel::Happy,
        ExpressionLabel::Sad,
        ExpressionLabel::Angry,
        ExpressionLabel::Surprised,
        ExpressionLabel::Fearful,
        ExpressionLabel::Disgusted,
        ExpressionLabel::Neutral,
    ];

    pub const fn mood(self) -> Mood {
        match self {
            ExpressionLabel::Happy => Mood::Happy,
            ExpressionLabel::Sad => Mood::Sad,
            ExpressionLabel::Angry => Mood::Angry,
            ExpressionLabel::Surprised => Mood::Surprise,
            ExpressionLabel::Fearful => Mood::Fear,
            ExpressionLabel::Disgusted => Mood::Disgust,
            ExpressionLabel::Neutral => Mood::Neutral,
        }
    }
}

impl fmt::Display for ExpressionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExpressionLabel::Happy => "happy",
            ExpressionLabel::Sad => "sad",
            ExpressionLabel::Angry => "angry",
            ExpressionLabel::Surprised => "surprised",
            ExpressionLabel::Fearful => "fearful",
            ExpressionLabel::Disgusted => "disgusted",
            ExpressionLabel::Neutral => "neutral",
        };
        f.pad(label)
    }
}

/// Probability per expression label, each in `[0, 1]`. Missing labels read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionProbabilities {
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub surprised: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub neutral: f64,
}

impl ExpressionProbabilities {
    pub fn get(&self, label: ExpressionLabel) -> f64 {
        let value = match label {
            ExpressionLabel::Happy => self.happy,
            ExpressionLabel::Sad => self.sad,
            ExpressionLabel::Angry => self.angry,
            ExpressionLabel::Surprised => self.surprised,
            ExpressionLabel::Fearful => self.fearful,
            ExpressionLabel::Disgusted => self.disgusted,
            ExpressionLabel::Neutral => self.neutral,
        };
        clamp_unit(value)
    }

    /// Label with the highest probability; the first one wins ties.
    #[must_use]
    pub fn dominant(&self) -> (ExpressionLabel, f64) {
        ExpressionLabel::ALL
            .iter()
            .map(|&label| (label, self.get(label)))
            .fold((ExpressionLabel::Happy, f64::NEG_INFINITY), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }

    /// Probabilities rounded to two decimals, for display only.
    pub fn rounded(&self) -> BTreeMap<ExpressionLabel, f64> {
        ExpressionLabel::ALL
            .iter()
            .map(|&label| (label, (self.get(label) * 100.0).round() / 100.0))
            .collect()
    }
}

/// Classifier output: the signal plus the display map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionAnalysis {
    pub signal: MoodSignal,
    pub dominant: ExpressionLabel,
    pub expressions: BTreeMap<ExpressionLabel, f64>,
}

/// Maps expression probabilities to a mood. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionMoodClassifier;

impl ExpressionMoodClassifier {
    pub fn classify(&self, probabilities: &ExpressionProbabilities) -> MoodSignal {
        self.analyze(probabilities).signal
    }

    /// Confidence is the winning label's own probability, not renormalized.
    pub fn analyze(&self, probabilities: &ExpressionProbabilities) -> ExpressionAnalysis {
        let (dominant, probability) = probabilities.dominant();
        debug!("Dominant expression {dominant} ({probability:.2})");

        ExpressionAnalysis {
            signal: MoodSignal::new(dominant.mood(), probability, DetectionMethod::Facial, None),
            dominant,
            expressions: probabilities.rounded(),
        }
    }
}

/// Upstream face-expression model for one still frame.
pub trait ExpressionModel: Send + Sync {
    /// Detect expression probabilities in `frame`.
    fn detect(&self, frame: &[u8]) -> MoodResult<ExpressionProbabilities>;
}

/// Model adapter for frames that already carry the detector's JSON output.
///
/// A frame is `{"happy": 0.1, ...}` or `{"face": {"happy": 0.1, ...}}`; an
/// empty frame, `null`, or `{"face": null}` means no face was found.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedExpressions;

impl ExpressionModel for PrecomputedExpressions {
    fn detect(&self, frame: &[u8]) -> MoodResult<ExpressionProbabilities> {
        if frame.iter().all(u8::is_ascii_whitespace) {
            return Err(MoodError::NoFaceDetected);
        }
        let unreadable = |err: serde_json::Error| {
            debug!("Unreadable expression frame: {err}");
            MoodError::NoFaceDetected
        };
        let mut value: Value = serde_json::from_slice(frame).map_err(unreadable)?;
        if let Some(face) = value.get_mut("face") {
            value = face.take();
        }
        if !value.is_object() {
            return Err(MoodError::NoFaceDetected);
        }
        serde_json::from_value(value).map_err(unreadable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probabilities() -> ExpressionProbabilities {
        ExpressionProbabilities {
            happy: 0.1,
            sad: 0.05,
            angry: 0.02,
            surprised: 0.01,
            fearful: 0.01,
            disgusted: 0.01,
            neutral: 0.8,
        }
    }

    #[test]
    fn test_dominant_neutral_face() {
        let signal = ExpressionMoodClassifier.classify(&probabilities());
        assert_eq!(signal.mood, Mood::Neutral);
        assert!((signal.confidence - 0.8).abs() < 1e-9);
        assert_eq!(signal.method, DetectionMethod::Facial);
        assert_eq!(signal.raw_score, None);
    }

    #[test]
    fn test_label_to_mood_mapping() {
        let cases = [
            (ExpressionLabel::Surprised, Mood::Surprise),
            (ExpressionLabel::Fearful, Mood::Fear),
            (ExpressionLabel::Disgusted, Mood::Disgust),
            (ExpressionLabel::Sad, Mood::Sad),
        ];
        for (label, mood) in cases {
            assert_eq!(label.mood(), mood);
        }

        let surprised = ExpressionProbabilities {
            surprised: 0.6,
            happy: 0.3,
            ..Default::default()
        };
        assert_eq!(ExpressionMoodClassifier.classify(&surprised).mood, Mood::Surprise);
    }

    #[test]
    fn test_ties_go_to_first_label() {
        let tied = ExpressionProbabilities {
            sad: 0.4,
            angry: 0.4,
            neutral: 0.2,
            ..Default::default()
        };
        let (label, value) = tied.dominant();
        assert_eq!(label, ExpressionLabel::Sad);
        assert!((value - 0.4).abs() < 1e-9);

        let all_zero = ExpressionProbabilities::default();
        assert_eq!(all_zero.dominant().0, ExpressionLabel::Happy);
        assert_eq!(ExpressionMoodClassifier.classify(&all_zero).confidence, 0.0);
    }

    #[test]
    fn test_confidence_is_not_renormalized() {
        let spread = ExpressionProbabilities {
            happy: 0.3,
            sad: 0.2,
            angry: 0.2,
            neutral: 0.1,
            ..Default::default()
        };
        let signal = ExpressionMoodClassifier.classify(&spread);
        assert!((signal.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_probabilities_are_clamped() {
        let noisy = ExpressionProbabilities {
            happy: 1.4,
            sad: -0.3,
            ..Default::default()
        };
        let signal = ExpressionMoodClassifier.classify(&noisy);
        assert_eq!(signal.mood, Mood::Happy);
        assert_eq!(signal.confidence, 1.0);
    }

    #[test]
    fn test_rounded_expression_map() {
        let raw = ExpressionProbabilities {
            happy: 0.123_456,
            neutral: 0.876_5,
            ..Default::default()
        };
        let analysis = ExpressionMoodClassifier.analyze(&raw);
        assert_eq!(analysis.expressions.len(), 7);
        assert_eq!(analysis.expressions[&ExpressionLabel::Happy], 0.12);
        assert_eq!(analysis.expressions[&ExpressionLabel::Neutral], 0.88);
        // Display map does not feed the signal.
        assert!((analysis.signal.confidence - 0.876_5).abs() < 1e-9);
    }

    #[test]
    fn test_precomputed_frames() {
        let model = PrecomputedExpressions;
        let probabilities = model
            .detect(br#"{"happy": 0.7, "neutral": 0.2}"#)
            .unwrap();
        assert_eq!(probabilities.happy, 0.7);
        assert_eq!(probabilities.sad, 0.0);

        let nested = model.detect(br#"{"face": {"sad": 0.9}}"#).unwrap();
        assert_eq!(nested.sad, 0.9);

        for frame in [&b""[..], b"  \n", b"null", br#"{"face": null}"#, b"not json", b"[1, 2]"] {
            assert!(
                matches!(model.detect(frame), Err(MoodError::NoFaceDetected)),
                "frame {:?} should report no face",
                String::from_utf8_lossy(frame)
            );
        }
    }
}
