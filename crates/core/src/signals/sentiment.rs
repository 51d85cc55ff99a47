use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: [&str; 8] = [
    "rise", "up", "gain", "positive", "growth", "profit", "beat", "surge",
];
const NEGATIVE_WORDS: [&str; 8] = [
    "fall", "down", "drop", "negative", "loss", "miss", "plunge", "cut",
];

const STRONG_MARGIN: i64 = 5;
const MARGIN: i64 = 2;

/// Articles older than this are ignored when scoring.
pub const RECENT_NEWS_HOURS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsSentiment {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    /// RFC 3339 timestamp as published by the news feed.
    pub published_at: String,
}

impl NewsArticle {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.published_at.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Keyword tally over headlines. Each keyword counts at most once per title,
/// matched as a case-insensitive substring.
pub fn score<'a, I>(titles: I) -> NewsSentiment
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positive = 0i64;
    let mut negative = 0i64;
    for title in titles {
        let title = title.to_lowercase();
        positive += POSITIVE_WORDS.iter().filter(|w| title.contains(*w)).count() as i64;
        negative += NEGATIVE_WORDS.iter().filter(|w| title.contains(*w)).count() as i64;
    }

    let net = positive - negative;
    if net > STRONG_MARGIN {
        NewsSentiment::VeryPositive
    } else if net > MARGIN {
        NewsSentiment::Positive
    } else if -net > STRONG_MARGIN {
        NewsSentiment::VeryNegative
    } else if -net > MARGIN {
        NewsSentiment::Negative
    } else {
        NewsSentiment::Neutral
    }
}

/// Articles published strictly after `now - RECENT_NEWS_HOURS`. Unparseable
/// timestamps are dropped.
pub fn recent(articles: &[NewsArticle], now: DateTime<Utc>) -> Vec<&NewsArticle> {
    let cutoff = now - Duration::hours(RECENT_NEWS_HOURS);
    articles
        .iter()
        .filter(|a| a.published_at().is_some_and(|t| t > cutoff))
        .collect()
}

/// Sentiment of the recent articles, or `None` when nothing recent was published.
pub fn score_recent(articles: &[NewsArticle], now: DateTime<Utc>) -> Option<NewsSentiment> {
    let recent = recent(articles, now);
    if recent.is_empty() {
        return None;
    }
    let sentiment = score(recent.iter().map(|a| a.title.as_str()));
    tracing::debug!(
        articles = articles.len(),
        recent = recent.len(),
        ?sentiment,
        "scored news sentiment"
    );
    Some(sentiment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str, published_at: &str) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            published_at: published_at.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap()
    }

    #[test]
    fn thresholds() {
        // "profit", "beat", "surge" -> +3
        assert_eq!(score(["Profit beat sparks surge"]), NewsSentiment::Positive);
        // two more titles of +3 -> +9
        assert_eq!(
            score([
                "Profit beat sparks surge",
                "Profit beat sparks surge",
                "Profit beat sparks surge"
            ]),
            NewsSentiment::VeryPositive
        );
        // "fall", "loss", "miss" -> -3
        assert_eq!(score(["Shares fall on loss, miss"]), NewsSentiment::Negative);
        assert_eq!(
            score(["Shares fall on loss, miss", "Plunge after cut, drop"]),
            NewsSentiment::VeryNegative
        );
    }

    #[test]
    fn margins_are_exclusive() {
        // +2 is not enough for Positive
        assert_eq!(score(["Gain and profit"]), NewsSentiment::Neutral);
        // +5 is Positive, not VeryPositive
        assert_eq!(
            score(["Gain, profit, beat, surge, growth"]),
            NewsSentiment::Positive
        );
        assert_eq!(
            score(["Fall, loss, miss, plunge, drop"]),
            NewsSentiment::Negative
        );
    }

    #[test]
    fn mixed_or_empty_news_is_neutral() {
        assert_eq!(score(std::iter::empty()), NewsSentiment::Neutral);
        assert_eq!(score(["Profit beat, but shares fall on loss"]), NewsSentiment::Neutral);
    }

    #[test]
    fn keywords_match_case_insensitively_once_per_title() {
        // "surge" appears twice but counts once; "up" matches inside "upgrade"
        assert_eq!(score(["SURGE surge after UPGRADE"]), NewsSentiment::Neutral);
        assert_eq!(
            score(["SURGE surge after UPGRADE", "Growth"]),
            NewsSentiment::Positive
        );
    }

    #[test]
    fn only_articles_within_six_hours_are_recent() {
        let articles = vec![
            article("fresh", "2026-03-10T17:59:00Z"),
            article("offset", "2026-03-10T09:30:00-05:00"),
            article("cutoff", "2026-03-10T12:00:00Z"),
            article("stale", "2026-03-10T11:59:59Z"),
            article("garbled", "yesterday"),
        ];
        let titles: Vec<&str> = recent(&articles, now())
            .into_iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["fresh", "offset"]);
    }

    #[test]
    fn stale_news_has_no_sentiment() {
        let articles = vec![article("Profit beat sparks surge", "2026-03-09T18:00:00Z")];
        assert_eq!(score_recent(&articles, now()), None);

        let articles = vec![article("Profit beat sparks surge", "2026-03-10T16:00:00Z")];
        assert_eq!(score_recent(&articles, now()), Some(NewsSentiment::Positive));
    }

    #[test]
    fn decodes_feed_field_names() {
        let a: NewsArticle = serde_json::from_value(serde_json::json!({
            "title": "Stock rises",
            "publishedAt": "2026-03-10T15:00:00Z"
        }))
        .unwrap();
        assert_eq!(a.published_at(), Some(Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()));
    }
}
