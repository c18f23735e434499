//! Word lists used by the text classifier.
//!
//! A [`Lexicon`] is plain data: build the default with [`Lexicon::default`] or
//! load an alternate one from JSON and hand it to the classifier at
//! construction time. Nothing here is global or mutable.

use crate::mood::Mood;
use serde::{Deserialize, Serialize};

/// Keywords that vote for one mood during the keyword-override pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodKeywords {
    pub mood: Mood,
    pub keywords: Vec<String>,
}

/// Advice lines shown next to a detected mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSuggestions {
    pub mood: Mood,
    pub lines: Vec<String>,
}

/// Text-analysis tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Exact-token matches add +1 to the polarity score.
    pub positive: Vec<String>,
    /// Exact-token matches add -1 to the polarity score.
    pub negative: Vec<String>,
    /// Declaration order is the tie-break order.
    pub mood_keywords: Vec<MoodKeywords>,
    pub high_energy: Vec<String>,
    pub low_energy: Vec<String>,
    pub suggestions: Vec<MoodSuggestions>,
}

impl Lexicon {
    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.iter().any(|word| word == token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.iter().any(|word| word == token)
    }

    /// Suggestions for `mood`, or neutral's when the mood has none.
    pub fn suggestions_for(&self, mood: &Mood) -> &[String] {
        self.suggestions
            .iter()
            .find(|entry| &entry.mood == mood)
            .or_else(|| self.suggestions.iter().find(|entry| entry.mood == Mood::Neutral))
            .map_or(&[], |entry| entry.lines.as_slice())
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| (*word).to_string()).collect()
}

fn keywords(mood: Mood, list: &[&str]) -> MoodKeywords {
    MoodKeywords {
        mood,
        keywords: words(list),
    }
}

fn suggestions(mood: Mood, list: &[&str]) -> MoodSuggestions {
    MoodSuggestions {
        mood,
        lines: words(list),
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            positive: words(&[
                "happy", "joy", "excited", "awesome", "great", "fantastic", "wonderful", "love",
                "amazing", "brilliant", "cheerful", "delighted", "pleased", "satisfied",
                "thrilled", "ecstatic", "elated", "euphoric", "motivated", "inspired",
                "energetic", "pumped", "enthusiastic", "passionate", "optimistic",
            ]),
            negative: words(&[
                "sad", "angry", "frustrated", "upset", "disappointed", "depressed", "miserable",
                "awful", "terrible", "horrible", "hate", "furious", "annoyed", "irritated",
                "worried", "anxious", "stressed", "overwhelmed", "exhausted", "tired", "lonely",
                "hurt", "betrayed", "devastated", "heartbroken",
            ]),
            mood_keywords: vec![
                keywords(
                    Mood::Happy,
                    &[
                        "joy", "excited", "awesome", "great", "fantastic", "wonderful", "love",
                        "amazing", "brilliant", "cheerful",
                    ],
                ),
                keywords(
                    Mood::Energetic,
                    &[
                        "pumped", "motivated", "active", "dynamic", "vigorous", "lively",
                        "spirited", "enthusiastic",
                    ],
                ),
                keywords(
                    Mood::Calm,
                    &[
                        "peaceful", "relaxed", "serene", "tranquil", "quiet", "gentle",
                        "soothing", "meditative",
                    ],
                ),
                keywords(
                    Mood::Sad,
                    &[
                        "sad", "depressed", "down", "blue", "melancholy", "heartbroken",
                        "disappointed", "grieving",
                    ],
                ),
                keywords(
                    Mood::Angry,
                    &[
                        "angry", "furious", "mad", "irritated", "frustrated", "annoyed", "rage",
                        "livid",
                    ],
                ),
                keywords(
                    Mood::Anxious,
                    &[
                        "anxious", "worried", "nervous", "stressed", "tense", "concerned",
                        "uneasy", "restless",
                    ],
                ),
                keywords(
                    Mood::Neutral,
                    &["okay", "fine", "normal", "usual", "typical", "standard", "regular"],
                ),
            ],
            high_energy: words(&[
                "excited", "pumped", "energetic", "hyped", "thrilled", "enthusiastic", "vibrant",
            ]),
            low_energy: words(&[
                "tired", "exhausted", "sleepy", "drained", "weary", "lethargic", "sluggish",
            ]),
            suggestions: vec![
                suggestions(
                    Mood::Happy,
                    &[
                        "Keep the positive vibes going!",
                        "Share your joy with uplifting music",
                        "Celebrate this moment",
                    ],
                ),
                suggestions(
                    Mood::Energetic,
                    &[
                        "Channel that energy into action",
                        "Try some upbeat, motivational tracks",
                        "Get moving with high-tempo music",
                    ],
                ),
                suggestions(
                    Mood::Calm,
                    &[
                        "Embrace the tranquility",
                        "Enjoy some peaceful, ambient sounds",
                        "Take time to relax and reflect",
                    ],
                ),
                suggestions(
                    Mood::Sad,
                    &[
                        "It's okay to feel this way",
                        "Try some comforting music",
                        "Be gentle with yourself",
                    ],
                ),
                suggestions(
                    Mood::Angry,
                    &[
                        "Take deep breaths",
                        "Try some calming music to cool down",
                        "Channel that energy positively",
                    ],
                ),
                suggestions(
                    Mood::Anxious,
                    &[
                        "Focus on breathing",
                        "Try some relaxing, meditative music",
                        "Ground yourself in the present",
                    ],
                ),
                suggestions(
                    Mood::Neutral,
                    &[
                        "Explore different music styles",
                        "Maybe try something new today",
                        "See what mood strikes you",
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_polarity_lists() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.positive.len(), 25);
        assert_eq!(lexicon.negative.len(), 25);
        assert!(lexicon.is_positive("happy"));
        assert!(lexicon.is_negative("heartbroken"));
        assert!(!lexicon.is_positive("happiness"), "matches are exact, not substring");
    }

    #[test]
    fn test_keyword_table_declaration_order() {
        let order: Vec<Mood> = Lexicon::default()
            .mood_keywords
            .into_iter()
            .map(|entry| entry.mood)
            .collect();
        assert_eq!(
            order,
            vec![
                Mood::Happy,
                Mood::Energetic,
                Mood::Calm,
                Mood::Sad,
                Mood::Angry,
                Mood::Anxious,
                Mood::Neutral
            ]
        );
    }

    #[test]
    fn test_suggestions_fall_back_to_neutral() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.suggestions_for(&Mood::Happy)[0], "Keep the positive vibes going!");
        assert_eq!(
            lexicon.suggestions_for(&Mood::Disgust),
            lexicon.suggestions_for(&Mood::Neutral)
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults_for_missing_lists() {
        let lexicon: Lexicon = serde_json::from_str(r#"{"positive": ["sunny"]}"#).unwrap();
        assert_eq!(lexicon.positive, vec!["sunny".to_string()]);
        assert_eq!(lexicon.negative, Lexicon::default().negative);
    }
}
