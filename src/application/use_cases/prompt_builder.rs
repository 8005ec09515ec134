use crate::domain::dataset::Sample;
use crate::domain::llm_config::GenerationRequest;
use crate::domain::schema::{SchemaContract, TaskKind};

/// Rendered request for one task run. Built fresh per request.
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub task: TaskKind,
    pub instruction: String,
    pub data: String,
    pub note: String,
    pub schema: &'static SchemaContract,
}

impl PromptPayload {
    pub fn parts(&self) -> Vec<String> {
        vec![
            self.instruction.clone(),
            self.data.clone(),
            self.note.clone(),
        ]
    }

    /// Full prompt text as sent, used for cost estimation
    pub fn text(&self) -> String {
        self.parts().join("\n\n")
    }

    pub fn to_request(&self, model: &str) -> GenerationRequest {
        GenerationRequest::structured(model, self.parts(), self.schema)
    }
}

/// Per-record ids rendered as a leading `id` column.
/// `column` is the dataset column they were taken from; it is not repeated.
#[derive(Debug, Clone, Copy)]
pub struct RecordIds<'a> {
    pub column: &'a str,
    pub values: &'a [String],
}

/// Render a sample plus instruction into a prompt and pick the task schema.
pub fn build_prompt(
    task: TaskKind,
    instruction: &str,
    sample: &Sample<'_>,
    ids: Option<RecordIds<'_>>,
    full_record_count: usize,
) -> PromptPayload {
    PromptPayload {
        task,
        instruction: instruction.trim().to_string(),
        data: render_sample(sample, ids),
        note: extrapolation_note(sample.len(), full_record_count),
        schema: task.schema(),
    }
}

/// Header line plus one quoted, comma-joined line per record
pub fn render_sample(sample: &Sample<'_>, ids: Option<RecordIds<'_>>) -> String {
    let skipped = ids.map(|ids| ids.column);
    let mut header: Vec<&str> = Vec::with_capacity(sample.column_count() + 1);
    if ids.is_some() {
        header.push("id");
    }
    header.extend(
        sample
            .columns
            .iter()
            .map(|c| c.as_str())
            .filter(|c| Some(*c) != skipped),
    );

    let mut lines = Vec::with_capacity(sample.len() + 1);
    lines.push(header.join(","));

    for (position, record) in sample.records.iter().enumerate() {
        let mut cells: Vec<String> = Vec::with_capacity(header.len());
        if let Some(ids) = ids {
            cells.push(quote(
                ids.values.get(position).map(String::as_str).unwrap_or(""),
            ));
        }
        cells.extend(
            record
                .fields
                .iter()
                .filter(|f| Some(f.name.as_str()) != skipped)
                .map(|f| quote(&f.value)),
        );
        lines.push(cells.join(","));
    }

    lines.join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn extrapolation_note(sampled: usize, total: usize) -> String {
    format!(
        "Note: the rows above are a sample of {} rows taken from a dataset of {} rows in total. \
Extrapolate counts and statistics to the full dataset of {} rows.",
        sampled, total, total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Record;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_render_quotes_and_escapes() {
        let cols = columns(&["user", "tweet"]);
        let records = vec![
            Record::from_values(0, &cols, &["ana", "say \"hi\", ok"]),
            Record::from_values(1, &cols, &["bo", ""]),
        ];
        let sample = Sample {
            offset: 0,
            columns: &cols,
            records: &records,
        };

        let rendered = render_sample(&sample, None);
        assert_eq!(
            rendered,
            "user,tweet\n\"ana\",\"say \"\"hi\"\", ok\"\n\"bo\",\"\""
        );
    }

    #[test]
    fn test_render_with_ids_replaces_id_column() {
        let cols = columns(&["id", "tweet"]);
        let records = vec![Record::from_values(0, &cols, &["x1", "great"])];
        let sample = Sample {
            offset: 0,
            columns: &cols,
            records: &records,
        };
        let ids = vec!["x1".to_string()];
        let ids = RecordIds {
            column: "id",
            values: &ids,
        };

        let rendered = render_sample(&sample, Some(ids));
        assert_eq!(rendered, "id,tweet\n\"x1\",\"great\"");
    }

    #[test]
    fn test_render_skips_configured_id_column_only() {
        let cols = columns(&["id", "tweet_id", "tweet"]);
        let records = vec![Record::from_values(0, &cols, &["7", "tw-1", "great"])];
        let sample = Sample {
            offset: 0,
            columns: &cols,
            records: &records,
        };
        let ids = sample.record_ids("tweet_id");
        let ids = RecordIds {
            column: "tweet_id",
            values: &ids,
        };

        let rendered = render_sample(&sample, Some(ids));
        assert_eq!(rendered, "id,id,tweet\n\"tw-1\",\"7\",\"great\"");
    }

    #[test]
    fn test_render_with_positional_ids() {
        let cols = columns(&["tweet"]);
        let records = vec![
            Record::from_values(4, &cols, &["a"]),
            Record::from_values(5, &cols, &["b"]),
        ];
        let sample = Sample {
            offset: 4,
            columns: &cols,
            records: &records,
        };
        let ids = sample.record_ids("id");
        let ids = RecordIds {
            column: "id",
            values: &ids,
        };

        let rendered = render_sample(&sample, Some(ids));
        assert_eq!(rendered, "id,tweet\n\"4\",\"a\"\n\"5\",\"b\"");
    }

    #[test]
    fn test_build_prompt_selects_schema_and_note() {
        let cols = columns(&["tweet"]);
        let records = vec![Record::from_values(0, &cols, &["a"])];
        let sample = Sample {
            offset: 0,
            columns: &cols,
            records: &records,
        };

        let payload = build_prompt(TaskKind::Summary, "  Summarise.  ", &sample, None, 40);
        assert_eq!(payload.instruction, "Summarise.");
        assert!(std::ptr::eq(payload.schema, TaskKind::Summary.schema()));
        assert!(payload.note.contains("1 rows"));
        assert!(payload.note.contains("40 rows"));

        let text = payload.text();
        assert!(text.starts_with("Summarise.\n\ntweet\n\"a\""));

        let request = payload.to_request("gemini-2.0-flash");
        assert_eq!(request.parts.len(), 3);
        assert_eq!(request.prompt_text(), text);
    }
}
