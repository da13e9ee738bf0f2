use crate::client::FetchError;
use crate::models::{Author, Story, StoryCard};

/// Page state for a single load. Starts in `Loading` and settles exactly once.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Ready(Vec<StoryCard>),
    Errored,
}

impl SessionState {
    /// Applies the pipeline outcome. A settled state is terminal and ignores
    /// any further outcome.
    pub fn settle(self, outcome: Result<Vec<StoryCard>, FetchError>) -> Self {
        match self {
            SessionState::Loading => match outcome {
                Ok(cards) => SessionState::Ready(cards),
                Err(_) => SessionState::Errored,
            },
            settled => settled,
        }
    }

    pub fn loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn errored(&self) -> bool {
        matches!(self, SessionState::Errored)
    }

    pub fn cards(&self) -> &[StoryCard] {
        match self {
            SessionState::Ready(cards) => cards,
            _ => &[],
        }
    }

    pub fn stories(&self) -> Vec<&Story> {
        self.cards().iter().map(|c| &c.story).collect()
    }

    pub fn authors(&self) -> Vec<&Author> {
        self.cards().iter().map(|c| &c.author).collect()
    }
}
