use clap::ValueEnum;

pub const DEFAULT_THRESHOLD: f32 = 0.75;

/// How the similarity threshold and the YES/NO classifier combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GatePolicy {
    /// Similarity threshold only; the classifier is never called.
    #[default]
    Score,
    /// Classifier verdict decides, provided the index returned anything.
    Classifier,
    /// Threshold must pass, then the classifier may veto.
    ScoreWithVeto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceGate {
    pub policy: GatePolicy,
    pub threshold: f32,
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self {
            policy: GatePolicy::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Outcome of the gate plus the evidence it was based on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceDecision {
    pub grounded: bool,
    pub match_count: usize,
    pub max_score: f32,
    /// `None` when the classifier was not consulted.
    pub classifier: Option<bool>,
}

impl RelevanceGate {
    /// Highest score among the matches, 0 when there are none.
    pub fn max_score(scores: &[f32]) -> f32 {
        scores.iter().copied().fold(0.0, f32::max)
    }

    pub fn score_passes(&self, scores: &[f32]) -> bool {
        !scores.is_empty() && Self::max_score(scores) >= self.threshold
    }

    /// Whether the classifier has to be asked before deciding.
    pub fn needs_classifier(&self, scores: &[f32]) -> bool {
        match self.policy {
            GatePolicy::Score => false,
            GatePolicy::Classifier => !scores.is_empty(),
            GatePolicy::ScoreWithVeto => self.score_passes(scores),
        }
    }

    pub fn decide(&self, scores: &[f32], classifier: Option<bool>) -> RelevanceDecision {
        let grounded = match self.policy {
            GatePolicy::Score => self.score_passes(scores),
            GatePolicy::Classifier => !scores.is_empty() && classifier == Some(true),
            GatePolicy::ScoreWithVeto => self.score_passes(scores) && classifier != Some(false),
        };
        RelevanceDecision {
            grounded,
            match_count: scores.len(),
            max_score: Self::max_score(scores),
            classifier,
        }
    }
}

/// A classifier reply counts as YES only when its first word is "yes".
pub fn parse_verdict(reply: &str) -> bool {
    reply
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .is_some_and(|w| w.eq_ignore_ascii_case("yes"))
}
