use crate::domain::analysis::{MAX_SENTIMENT_SCORE, MIN_SENTIMENT_SCORE};
use crate::domain::schema::TaskKind;

const ROLE: &str = "You are a data analyst. You receive a CSV sample of a larger dataset and answer strictly in the requested JSON format.";

pub(crate) fn instruction(task: TaskKind) -> String {
    let body = match task {
        TaskKind::Analysis => "Analyse the dataset. Provide: a concise summary of what the data contains; \
statistics with total_rows (the full dataset size), avg_value (the average of the most meaningful numeric column, 0 if none), \
top_columns (the most informative columns), top_values (the most frequent values) and most_active (the most active users or entities); \
trend_analysis as a list of notable trends, each with the column it concerns, a short description and a numeric value; \
and insights as a list of actionable observations. Additional numeric or textual statistics may be added."
            .to_string(),
        TaskKind::SentimentCount => "Classify the sentiment of every row as positive, negative or neutral. \
Report the estimated number of positive, negative and neutral rows for the full dataset, \
and the percentage of each. The three percentages must be computed from the same total and sum to 100."
            .to_string(),
        TaskKind::SentimentScores => format!(
            "Score the sentiment of every row on an integer scale from {} (very negative) through 3 (neutral) to {} (very positive). \
Return exactly one entry per row, using the row's value from the id column unchanged, and set count to the number of rows scored. \
Do not skip, merge or invent rows.",
            MIN_SENTIMENT_SCORE, MAX_SENTIMENT_SCORE
        ),
        TaskKind::Trends => "Identify the most notable trends in the dataset. For each trend give the column it concerns, \
a short description of the trend and a representative numeric value."
            .to_string(),
        TaskKind::Insights => "List the most important actionable insights that can be drawn from the dataset, \
each as one self-contained sentence."
            .to_string(),
        TaskKind::Summary => "Write a concise summary of the dataset: what it contains, its dominant topics, \
and anything unusual."
            .to_string(),
    };
    format!("{}\n\n{}", ROLE, body)
}
