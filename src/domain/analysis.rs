use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::error::{AppError, Result};
use crate::domain::schema::TaskKind;

/// Allowed distance from 100 for the three sentiment percentages.
pub const PERCENT_TOLERANCE: f64 = 1.0;

pub const MIN_SENTIMENT_SCORE: i64 = 1;
pub const MAX_SENTIMENT_SCORE: i64 = 5;

/// Typed payload for one task.
///
/// `text_fields` and `apply_translations` must walk the same fields in the
/// same order; the translator aligns results positionally.
pub trait TaskOutput: Serialize + DeserializeOwned + Send {
    const TASK: TaskKind;

    fn text_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply_translations(&mut self, _translated: Vec<String>) {}

    /// Post-parse consistency step. `sample_ids` lists the ids presented in the prompt.
    fn reconcile(&mut self, _sample_ids: &[String], _raw: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub column: String,
    pub trend: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_rows: f64,
    pub avg_value: f64,
    pub top_columns: Vec<String>,
    pub top_values: Vec<String>,
    pub most_active: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: String,
    pub statistics: Statistics,
    pub trend_analysis: Vec<Trend>,
    pub insights: Vec<String>,
}

impl TaskOutput for AnalysisReport {
    const TASK: TaskKind = TaskKind::Analysis;

    fn text_fields(&self) -> Vec<String> {
        std::iter::once(self.summary.clone())
            .chain(self.trend_analysis.iter().map(|t| t.trend.clone()))
            .chain(self.insights.iter().cloned())
            .collect()
    }

    fn apply_translations(&mut self, translated: Vec<String>) {
        let mut iter = translated.into_iter();
        if let Some(summary) = iter.next() {
            self.summary = summary;
        }
        for trend in self.trend_analysis.iter_mut() {
            if let Some(text) = iter.next() {
                trend.trend = text;
            }
        }
        for insight in self.insights.iter_mut() {
            if let Some(text) = iter.next() {
                *insight = text;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentCount {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_percent: f64,
}

impl SentimentCount {
    /// Sum of the three counts, `None` when it does not fit in a `u64`.
    pub fn total(&self) -> Option<u64> {
        self.positive
            .checked_add(self.negative)?
            .checked_add(self.neutral)
    }

    pub fn percent_sum(&self) -> f64 {
        self.positive_percent + self.negative_percent + self.neutral_percent
    }

    /// True when percentages agree with the counts within tolerance.
    pub fn is_consistent(&self) -> bool {
        let Some(total) = self.total() else {
            return false;
        };
        if total == 0 {
            return true;
        }
        let share = |count: u64| count as f64 * 100.0 / total as f64;
        (self.percent_sum() - 100.0).abs() <= PERCENT_TOLERANCE
            && (self.positive_percent - share(self.positive)).abs() <= PERCENT_TOLERANCE
            && (self.negative_percent - share(self.negative)).abs() <= PERCENT_TOLERANCE
            && (self.neutral_percent - share(self.neutral)).abs() <= PERCENT_TOLERANCE
    }

    pub fn recompute_percentages(&mut self) {
        let total = match self.total() {
            Some(total) if total > 0 => total,
            _ => return,
        };
        let share = |count: u64| (count as f64 * 10_000.0 / total as f64).round() / 100.0;
        self.positive_percent = share(self.positive);
        self.negative_percent = share(self.negative);
        self.neutral_percent = share(self.neutral);
    }
}

impl TaskOutput for SentimentCount {
    const TASK: TaskKind = TaskKind::SentimentCount;

    fn reconcile(&mut self, _sample_ids: &[String], raw: &str) -> Result<()> {
        if self.total().is_none() {
            return Err(AppError::malformed("sentiment counts overflow", raw));
        }
        if !self.is_consistent() {
            tracing::warn!(
                positive = self.positive,
                negative = self.negative,
                neutral = self.neutral,
                percent_sum = self.percent_sum(),
                "Sentiment percentages disagree with counts; recomputing"
            );
            self.recompute_percentages();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub sentiment_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub count: usize,
    pub sentiments: Vec<SentimentScore>,
}

impl TaskOutput for SentimentScores {
    const TASK: TaskKind = TaskKind::SentimentScores;

    /// Every presented id must be scored exactly once with a score in range.
    /// The list is returned in presentation order.
    fn reconcile(&mut self, sample_ids: &[String], raw: &str) -> Result<()> {
        let mut by_id: HashMap<&str, i64> = HashMap::with_capacity(self.sentiments.len());
        for entry in &self.sentiments {
            if !(MIN_SENTIMENT_SCORE..=MAX_SENTIMENT_SCORE).contains(&entry.sentiment_score) {
                return Err(AppError::malformed(
                    format!(
                        "score {} for id '{}' is outside {}..={}",
                        entry.sentiment_score, entry.id, MIN_SENTIMENT_SCORE, MAX_SENTIMENT_SCORE
                    ),
                    raw,
                ));
            }
            if by_id.insert(entry.id.as_str(), entry.sentiment_score).is_some() {
                return Err(AppError::malformed(
                    format!("id '{}' scored more than once", entry.id),
                    raw,
                ));
            }
        }

        if let Some(unknown) = self
            .sentiments
            .iter()
            .find(|entry| !sample_ids.contains(&entry.id))
        {
            return Err(AppError::malformed(
                format!("id '{}' was not part of the sample", unknown.id),
                raw,
            ));
        }

        let mut ordered = Vec::with_capacity(sample_ids.len());
        for id in sample_ids {
            let score = by_id.get(id.as_str()).copied().ok_or_else(|| {
                AppError::malformed(format!("no score returned for id '{}'", id), raw)
            })?;
            ordered.push(SentimentScore {
                id: id.clone(),
                sentiment_score: score,
            });
        }

        self.count = ordered.len();
        self.sentiments = ordered;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendList {
    pub trends: Vec<Trend>,
}

impl TaskOutput for TrendList {
    const TASK: TaskKind = TaskKind::Trends;

    fn text_fields(&self) -> Vec<String> {
        self.trends.iter().map(|t| t.trend.clone()).collect()
    }

    fn apply_translations(&mut self, translated: Vec<String>) {
        for (trend, text) in self.trends.iter_mut().zip(translated) {
            trend.trend = text;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightList {
    pub insights: Vec<String>,
}

impl TaskOutput for InsightList {
    const TASK: TaskKind = TaskKind::Insights;

    fn text_fields(&self) -> Vec<String> {
        self.insights.clone()
    }

    fn apply_translations(&mut self, translated: Vec<String>) {
        for (insight, text) in self.insights.iter_mut().zip(translated) {
            *insight = text;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: String,
}

impl TaskOutput for SummaryReport {
    const TASK: TaskKind = TaskKind::Summary;

    fn text_fields(&self) -> Vec<String> {
        vec![self.summary.clone()]
    }

    fn apply_translations(&mut self, translated: Vec<String>) {
        if let Some(summary) = translated.into_iter().next() {
            self.summary = summary;
        }
    }
}

/// How a result was derived. Attached after validation, never requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(rename = "fullRows")]
    pub full_record_count: usize,
    #[serde(rename = "sampledRows")]
    pub sampled_record_count: usize,
    #[serde(rename = "estimatedTokens")]
    pub estimated_cost: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult<T> {
    #[serde(flatten)]
    pub payload: T,
    pub metadata: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultEnvelope<T> {
    Native(AnalysisResult<T>),
    Translated {
        target_language: String,
        result: AnalysisResult<T>,
    },
}

impl<T> ResultEnvelope<T> {
    pub fn result(&self) -> &AnalysisResult<T> {
        match self {
            ResultEnvelope::Native(result) => result,
            ResultEnvelope::Translated { result, .. } => result,
        }
    }

    pub fn target_language(&self) -> Option<&str> {
        match self {
            ResultEnvelope::Native(_) => None,
            ResultEnvelope::Translated {
                target_language, ..
            } => Some(target_language),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
