use chrono::DateTime;
use serde::{de, Deserialize, Deserializer};

pub type ItemId = u64;

const DISCUSSION_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Story {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(deserialize_with = "score_from_number_or_text")]
    pub score: f64,
    pub time: i64,
    pub by: String,
}

impl Story {
    /// Where the card links to. Text posts have no url and link to their thread.
    pub fn link(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}{}", DISCUSSION_URL, self.id),
        }
    }

    pub fn published(&self) -> String {
        format_publish_date(self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Author {
    pub id: String,
    pub karma: i64,
}

/// A ranked story together with the author record it was submitted by.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryCard {
    pub story: Story,
    pub author: Author,
}

/// Formats epoch seconds as `MM/DD/YYYY` in UTC.
pub fn format_publish_date(epoch_secs: i64) -> String {
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(dt) => dt.format("%m/%d/%Y").to_string(),
        None => "unknown".to_string(),
    }
}

fn score_from_number_or_text<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f64),
        Text(String),
    }

    match RawScore::deserialize(deserializer)? {
        RawScore::Number(n) => Ok(n),
        RawScore::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("score is not numeric: {:?}", s))),
    }
}
