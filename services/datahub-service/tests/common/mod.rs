use datahub_service::app::{AppState, build_router};
use datahub_service::config::ServiceConfig;

pub const ACCESS_ID: &str = "test_access_id";
pub const ACCESS_KEY: &str = "test_access_key";
pub const OTHER_ACCESS_ID: &str = "other_access_id";
pub const OTHER_ACCESS_KEY: &str = "other_access_key";

pub type TestApp = axum::routing::RouterIntoService<axum::body::Body, ()>;

pub fn test_app() -> TestApp {
    let mut config = ServiceConfig::local(ACCESS_ID, ACCESS_KEY);
    config
        .accounts
        .push(datahub_common::auth::Credentials::new(
            OTHER_ACCESS_ID,
            OTHER_ACCESS_KEY,
        ));
    build_router(AppState::in_memory(&config)).into_service()
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
