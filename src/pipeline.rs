use std::collections::HashMap;
use std::future::Future;

use futures::future::try_join_all;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{FetchError, HnClient};
use crate::config::{Config, FetchMode};
use crate::models::{Author, Story, StoryCard};
use crate::sampler;

/// Loads one page worth of stories: listing, sample, details, rank, authors, join.
pub struct Pipeline {
    client: HnClient,
    sample_size: usize,
    mode: FetchMode,
}

impl Pipeline {
    pub fn new(client: HnClient, sample_size: usize, mode: FetchMode) -> Self {
        Self {
            client,
            sample_size,
            mode,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = HnClient::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self::new(client, config.sample_size, config.fetch_mode))
    }

    pub async fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<Vec<StoryCard>, FetchError> {
        let client = &self.client;

        let listing = client.top_story_ids(cancel).await?;
        let picked = sampler::sample(&listing, self.sample_size, rng);
        info!(
            "Sampled {} of {} top stories ({:?})",
            picked.len(),
            listing.len(),
            self.mode
        );

        let stories = self
            .fetch_in_order(picked, |id| client.story(id, cancel))
            .await?;
        let ranked = rank(stories);

        let author_ids: Vec<String> = ranked.iter().map(|s| s.by.clone()).collect();
        let authors = self
            .fetch_in_order(author_ids, |by| async move {
                client.author(&by, cancel).await
            })
            .await?;

        let cards = join_authors(ranked, authors)?;
        info!("Loaded {} stories", cards.len());
        Ok(cards)
    }

    /// Runs one fetch per key and returns the results in key order. Fails on
    /// the first error, dropping everything fetched so far.
    async fn fetch_in_order<K, T, F, Fut>(
        &self,
        keys: Vec<K>,
        fetch: F,
    ) -> Result<Vec<T>, FetchError>
    where
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        match self.mode {
            FetchMode::Sequential => {
                let mut out = Vec::with_capacity(keys.len());
                for key in keys {
                    out.push(fetch(key).await?);
                }
                Ok(out)
            }
            FetchMode::Concurrent => try_join_all(keys.into_iter().map(fetch)).await,
        }
    }
}

/// Stable ascending sort by score.
pub fn rank(mut stories: Vec<Story>) -> Vec<Story> {
    stories.sort_by(|a, b| a.score.total_cmp(&b.score));
    stories
}

/// Pairs each story with its author by id rather than by position.
pub fn join_authors(
    stories: Vec<Story>,
    authors: Vec<Author>,
) -> Result<Vec<StoryCard>, FetchError> {
    let by_id: HashMap<String, Author> = authors
        .into_iter()
        .map(|author| (author.id.clone(), author))
        .collect();

    stories
        .into_iter()
        .map(|story| {
            let author = by_id
                .get(&story.by)
                .cloned()
                .ok_or_else(|| FetchError::MissingAuthor(story.by.clone()))?;
            Ok(StoryCard { story, author })
        })
        .collect()
}
