//! Shared test fixtures: a scripted stand-in for the search API and config
//! helpers.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use channel_harvester::config::Config;

pub const SEARCH_PATH: &str = "/v1/search/channel";

/// One request as seen by the fake API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub raw_query: String,
    pub query: HashMap<String, String>,
    pub body: Value,
}

struct ApiState {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Replays `(status, body)` responses in order. Once the script runs out it
/// answers with an empty last page.
pub struct FakeApi {
    pub base_url: String,
    state: Arc<ApiState>,
}

impl FakeApi {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let state = Arc::new(ApiState {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(SEARCH_PATH, post(handle_search))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}{}", addr, SEARCH_PATH),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle_search(
    State(state): State<Arc<ApiState>>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(RecordedRequest {
        raw_query: raw_query.unwrap_or_default(),
        query,
        body,
    });

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| (200, r#"{"list":[],"cursor":""}"#.to_string()));

    (StatusCode::from_u16(status).unwrap(), body)
}

/// A page body in the API's wire shape.
pub fn page_json(items: &[(&str, &str, i64)], cursor: &str) -> String {
    let list: Vec<Value> = items
        .iter()
        .map(|(name, description, subs)| {
            serde_json::json!({
                "name": name,
                "description": description,
                "subscriberCount": subs,
                "thumbnail": "https://img.example/x.jpg",
            })
        })
        .collect();
    serde_json::json!({ "list": list, "cursor": cursor }).to_string()
}

/// Config pointing at `root/harvest.sqlite` and `base_url`, with no delays.
pub fn test_config(root: &Path, base_url: &str) -> Config {
    let content = test_config_toml(root, base_url, "");
    toml::from_str(&content).unwrap()
}

pub fn test_config_toml(root: &Path, base_url: &str, extra: &str) -> String {
    format!(
        r#"
[db]
path = "{}"

[api]
base_url = "{}"
timeout_secs = 5

[api.subscribers]
from = 50
to = 100000000

[harvest]
keywords = "learn spanish"
delay_min_secs = 0
delay_max_secs = 0
{}
"#,
        root.join("harvest.sqlite").display(),
        base_url,
        extra
    )
}
