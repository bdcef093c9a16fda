use async_trait::async_trait;

/// Minimum characters for a top-level strategy result to be accepted as final.
pub const MIN_TRANSCRIPT_CHARS: usize = 500;

/// Minimum characters for a parsed caption payload to count as usable.
pub const MIN_CAPTION_CHARS: usize = 100;

/// Minimum characters for a video description to serve as a fallback.
pub const MIN_DESCRIPTION_CHARS: usize = 200;

/// Outcome of a single acquisition attempt.
///
/// Strategies never raise past their call boundary; every failure mode is
/// folded into one of these variants at the point of occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// The strategy produced text (possibly below the acceptance gate).
    Success(String),
    /// The strategy ran but produced nothing usable.
    Empty,
    /// The strategy could not run to completion.
    Failed(String),
}

impl Acquisition {
    /// Wrap text, mapping blank output to `Empty`.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            Acquisition::Empty
        } else {
            Acquisition::Success(text)
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Acquisition::Success(text) => Some(text),
            _ => None,
        }
    }

    pub fn chars(&self) -> usize {
        self.text().map(|t| t.chars().count()).unwrap_or(0)
    }

    /// Whether this result clears the given length gate.
    pub fn meets(&self, gate: usize) -> bool {
        self.chars() > gate
    }
}

/// Inputs shared by every strategy attempt.
#[derive(Debug, Clone)]
pub struct StrategyInput {
    pub url: String,
    pub video_id: String,
}

/// A single transcript acquisition method.
///
/// Implementations are attempted by the orchestrator in priority order;
/// `attempt` is a total function and must not panic or error out.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, input: &StrategyInput) -> Acquisition;
}
