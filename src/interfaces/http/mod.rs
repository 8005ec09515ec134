use crate::application::TaskRequest;
use crate::domain::analysis::{
    AnalysisReport, InsightList, SentimentCount, SentimentScores, SummaryReport, TaskOutput,
    TrendList,
};
use crate::domain::error::AppError;
use crate::infrastructure::bootstrap::AppState;
use actix_cors::Cors;
use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use validator::Validate;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::SourceNotFound(_) => StatusCode::NOT_FOUND,
        AppError::EmptyDataset(_) | AppError::ValidationError(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::BudgetExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AppError::ServiceUnavailable(_)
        | AppError::SchemaRejected(_)
        | AppError::EmptyOutput
        | AppError::MalformedOutput { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: &AppError) -> HttpResponse {
    HttpResponse::build(status_for(err)).json(ErrorBody {
        error: err.code(),
        message: err.to_string(),
    })
}

async fn run_task<T: TaskOutput>(data: &HttpState, query: &TaskRequest) -> HttpResponse {
    let task = T::TASK;
    if let Err(e) = query.validate() {
        let err = AppError::ValidationError(e.to_string());
        add_log(&data.logs, "WARN", "HttpApi", &format!("{} rejected: {}", task, err));
        return error_response(&err);
    }

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Running {} (lang={:?} offset={:?} limit={:?})",
            task, query.target_language, query.offset, query.limit
        ),
    );

    match data.app_state.analysis.execute::<T>(query).await {
        Ok(envelope) => {
            info!(task = %task, "Task completed");
            HttpResponse::Ok().json(envelope)
        }
        Err(e) => {
            error!(task = %task, error_code = e.code(), error = %e, "Task failed");
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("{} failed: {}", task, e),
            );
            error_response(&e)
        }
    }
}

#[get("/analysis")]
async fn analysis(data: web::Data<HttpState>, query: web::Query<TaskRequest>) -> impl Responder {
    run_task::<AnalysisReport>(&data, &query).await
}

#[get("/sentiment")]
async fn sentiment(data: web::Data<HttpState>, query: web::Query<TaskRequest>) -> impl Responder {
    run_task::<SentimentCount>(&data, &query).await
}

#[get("/sentiment/scores")]
async fn sentiment_scores(
    data: web::Data<HttpState>,
    query: web::Query<TaskRequest>,
) -> impl Responder {
    run_task::<SentimentScores>(&data, &query).await
}

#[get("/trends")]
async fn trends(data: web::Data<HttpState>, query: web::Query<TaskRequest>) -> impl Responder {
    run_task::<TrendList>(&data, &query).await
}

#[get("/insights")]
async fn insights(data: web::Data<HttpState>, query: web::Query<TaskRequest>) -> impl Responder {
    run_task::<InsightList>(&data, &query).await
}

#[get("/summary")]
async fn summary(data: web::Data<HttpState>, query: web::Query<TaskRequest>) -> impl Responder {
    run_task::<SummaryReport>(&data, &query).await
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    match data.logs.lock() {
        Ok(logs) => HttpResponse::Ok().json(&*logs),
        Err(_) => error_response(&AppError::Internal("log buffer poisoned".to_string())),
    }
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = error_response(&AppError::ValidationError(err.to_string()));
    InternalError::from_response(err, response).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error_handler));
    cfg.service(
        web::scope("/api")
            .service(analysis)
            .service(sentiment_scores)
            .service(sentiment)
            .service(trends)
            .service(insights)
            .service(summary)
            .service(get_logs),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    bind: (String, u16),
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::StubClient;
    use crate::application::{AnalysisUseCase, PipelineSettings, TranslateUseCase};
    use crate::domain::dataset::{Dataset, Record};
    use crate::infrastructure::csv::{DatasetSource, StaticDatasetSource};
    use actix_web::test as actix_test;
    use serde_json::Value;

    fn dataset() -> Dataset {
        let columns = vec!["id".to_string(), "tweet".to_string()];
        let records = vec![
            Record::from_values(0, &columns, &["1", "great product"]),
            Record::from_values(1, &columns, &["2", "awful support"]),
        ];
        Dataset::new(columns, records).unwrap()
    }

    fn state_with(
        client: StubClient,
        source: Arc<dyn DatasetSource + Send + Sync>,
    ) -> web::Data<HttpState> {
        let client = Arc::new(client);
        let settings = PipelineSettings {
            model: "gemini-2.0-flash".to_string(),
            sample_size: 100,
            sample_offset: 0,
            max_prompt_tokens: 30_000,
            id_column: "id".to_string(),
            default_target_language: None,
        };
        let translator =
            TranslateUseCase::new(client.clone(), settings.model.clone(), "en".into(), 2);
        let use_case = AnalysisUseCase::new(client, source, translator, settings);
        web::Data::new(HttpState {
            app_state: Arc::new(AppState { analysis: use_case }),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn state(client: StubClient) -> web::Data<HttpState> {
        state_with(client, Arc::new(StaticDatasetSource::new(dataset())))
    }

    #[actix_web::test]
    async fn test_summary_route_returns_envelope() {
        let data = state(StubClient::responding(r#"{"summary":"Mixed feedback"}"#));
        let app = actix_test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = actix_test::TestRequest::get().uri("/api/summary").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["summary"], "Mixed feedback");
        assert_eq!(body["metadata"]["fullRows"], 2);
        assert_eq!(body["metadata"]["sampledRows"], 2);
    }

    #[actix_web::test]
    async fn test_lang_query_wraps_translated_result() {
        let data = state(StubClient::responding(r#"{"insights":["Buy more"]}"#));
        let app = actix_test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/insights?lang=id")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["target_language"], "id");
        assert_eq!(body["result"]["insights"][0], "[id] Buy more");
    }

    #[actix_web::test]
    async fn test_scores_route_is_not_shadowed() {
        let raw = r#"{"count":2,"sentiments":[{"id":"2","sentiment_score":1},{"id":"1","sentiment_score":5}]}"#;
        let data = state(StubClient::responding(raw));
        let app = actix_test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/sentiment/scores")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["sentiments"][0]["id"], "1");
        assert_eq!(body["sentiments"][1]["sentiment_score"], 1);
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let empty = state_with(
            StubClient::responding("{}"),
            Arc::new(StaticDatasetSource::empty()),
        );
        let app = actix_test::init_service(App::new().app_data(empty).configure(configure)).await;
        let req = actix_test::TestRequest::get().uri("/api/trends").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "empty_dataset");

        let broken = state(StubClient::responding("not json"));
        let app = actix_test::init_service(App::new().app_data(broken).configure(configure)).await;
        let req = actix_test::TestRequest::get().uri("/api/sentiment").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "malformed_output");
    }

    #[actix_web::test]
    async fn test_out_of_range_limit_rejected() {
        let data = state(StubClient::responding(r#"{"summary":"x"}"#));
        let app = actix_test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/summary?limit=0")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = actix_test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, "WARN");
    }

    #[actix_web::test]
    async fn test_unparseable_query_is_json_validation_error() {
        let data = state(StubClient::responding(r#"{"summary":"x"}"#));
        let app = actix_test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/summary?offset=abc")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn test_status_mapping() {
        let budget = AppError::BudgetExceeded {
            estimated: 10,
            ceiling: 5,
            suggested_rows: 1,
        };
        assert_eq!(status_for(&budget), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            status_for(&AppError::SourceNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_for(&AppError::EmptyOutput), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&AppError::SchemaRejected("bad".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_log_ring_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
