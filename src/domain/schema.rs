use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::error::{AppError, Result};

/// Analytical tasks the pipeline can run. Each maps to one immutable schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Analysis,
    SentimentCount,
    SentimentScores,
    Trends,
    Insights,
    Summary,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Analysis,
        TaskKind::SentimentCount,
        TaskKind::SentimentScores,
        TaskKind::Trends,
        TaskKind::Insights,
        TaskKind::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Analysis => "analysis",
            TaskKind::SentimentCount => "sentiment_count",
            TaskKind::SentimentScores => "sentiment_scores",
            TaskKind::Trends => "trends",
            TaskKind::Insights => "insights",
            TaskKind::Summary => "summary",
        }
    }

    pub fn schema(&self) -> &'static SchemaContract {
        match self {
            TaskKind::Analysis => &ANALYSIS_SCHEMA,
            TaskKind::SentimentCount => &SENTIMENT_COUNT_SCHEMA,
            TaskKind::SentimentScores => &SENTIMENT_SCORES_SCHEMA,
            TaskKind::Trends => &TRENDS_SCHEMA,
            TaskKind::Insights => &INSIGHTS_SCHEMA,
            TaskKind::Summary => &SUMMARY_SCHEMA,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<SchemaContract>),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    /// Properties in the order the service should emit them
    pub properties: Vec<(String, SchemaContract)>,
    pub required: Vec<String>,
    pub allow_additional: bool,
}

/// Declarative output shape handed to the generation service
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContract {
    pub kind: SchemaKind,
    pub description: Option<String>,
}

impl SchemaContract {
    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn array(items: SchemaContract) -> Self {
        Self::of(SchemaKind::Array(Box::new(items)))
    }

    /// Object with every listed property required and no extra keys.
    pub fn object(properties: Vec<(&str, SchemaContract)>) -> Self {
        let required = properties.iter().map(|(name, _)| name.to_string()).collect();
        Self::of(SchemaKind::Object(ObjectSchema {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required,
            allow_additional: false,
        }))
    }

    pub fn allow_additional(mut self) -> Self {
        if let SchemaKind::Object(object) = &mut self.kind {
            object.allow_additional = true;
        }
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
        }
    }

    /// Structural self-check: required names must be declared properties,
    /// property names must be unique and non-empty.
    pub fn check(&self, path: &str) -> Result<()> {
        match &self.kind {
            SchemaKind::Array(items) => items.check(&format!("{}[]", path)),
            SchemaKind::Object(object) => {
                let mut names = HashSet::new();
                for (name, schema) in &object.properties {
                    if name.trim().is_empty() {
                        return Err(AppError::ValidationError(format!(
                            "schema {} has an unnamed property",
                            path
                        )));
                    }
                    if !names.insert(name.as_str()) {
                        return Err(AppError::ValidationError(format!(
                            "schema {} declares property '{}' twice",
                            path, name
                        )));
                    }
                    schema.check(&format!("{}.{}", path, name))?;
                }
                if let Some(missing) = object
                    .required
                    .iter()
                    .find(|name| !names.contains(name.as_str()))
                {
                    return Err(AppError::ValidationError(format!(
                        "schema {} requires undeclared property '{}'",
                        path, missing
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Checks every task schema once. Called during startup.
pub fn validate_all() -> Result<()> {
    for task in TaskKind::ALL {
        task.schema().check(task.as_str())?;
    }
    Ok(())
}

fn trend_schema() -> SchemaContract {
    SchemaContract::object(vec![
        ("column", SchemaContract::string()),
        (
            "trend",
            SchemaContract::string().describe("Short description of the trend"),
        ),
        ("value", SchemaContract::number()),
    ])
}

static ANALYSIS_SCHEMA: Lazy<SchemaContract> = Lazy::new(|| {
    SchemaContract::object(vec![
        ("summary", SchemaContract::string()),
        (
            "statistics",
            SchemaContract::object(vec![
                ("total_rows", SchemaContract::number()),
                ("avg_value", SchemaContract::number()),
                ("top_columns", SchemaContract::array(SchemaContract::string())),
                ("top_values", SchemaContract::array(SchemaContract::string())),
                ("most_active", SchemaContract::array(SchemaContract::string())),
            ])
            .allow_additional(),
        ),
        ("trend_analysis", SchemaContract::array(trend_schema())),
        ("insights", SchemaContract::array(SchemaContract::string())),
    ])
});

static SENTIMENT_COUNT_SCHEMA: Lazy<SchemaContract> = Lazy::new(|| {
    SchemaContract::object(vec![
        ("positive", SchemaContract::integer()),
        ("negative", SchemaContract::integer()),
        ("neutral", SchemaContract::integer()),
        ("positive_percent", SchemaContract::number()),
        ("negative_percent", SchemaContract::number()),
        ("neutral_percent", SchemaContract::number()),
    ])
});

static SENTIMENT_SCORES_SCHEMA: Lazy<SchemaContract> = Lazy::new(|| {
    SchemaContract::object(vec![
        ("count", SchemaContract::integer()),
        (
            "sentiments",
            SchemaContract::array(SchemaContract::object(vec![
                ("id", SchemaContract::string()),
                (
                    "sentiment_score",
                    SchemaContract::integer()
                        .describe("1 = very negative, 3 = neutral, 5 = very positive"),
                ),
            ])),
        ),
    ])
});

static TRENDS_SCHEMA: Lazy<SchemaContract> =
    Lazy::new(|| SchemaContract::object(vec![("trends", SchemaContract::array(trend_schema()))]));

static INSIGHTS_SCHEMA: Lazy<SchemaContract> = Lazy::new(|| {
    SchemaContract::object(vec![(
        "insights",
        SchemaContract::array(SchemaContract::string()),
    )])
});

static SUMMARY_SCHEMA: Lazy<SchemaContract> =
    Lazy::new(|| SchemaContract::object(vec![("summary", SchemaContract::string())]));
