mod common;
mod http_helpers;

use axum::http::StatusCode;
use common::{ACCESS_ID, ACCESS_KEY, read_json, test_app};
use datahub_common::auth::Credentials;
use http_helpers::{json_request, signed_request};
use tower::ServiceExt;

fn owner() -> Credentials {
    Credentials::new(ACCESS_ID, ACCESS_KEY)
}

fn schema_body() -> serde_json::Value {
    serde_json::json!({
        "ShardCount": 3,
        "Lifecycle": 7,
        "RecordType": "TUPLE",
        "RecordSchema": {
            "fields": [
                {"name": "bigint_field", "type": "BIGINT"},
                {"name": "string_field", "type": "STRING"}
            ]
        },
        "Comment": "smoke topic"
    })
}

#[tokio::test]
async fn subscription_lifecycle_smoke() {
    let app = test_app();
    let creds = owner();

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "POST",
            "/projects/smoke_project",
            serde_json::json!({"Comment": "smoke"}),
        ))
        .await
        .expect("project");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "POST",
            "/projects/smoke_project/topics/smoke_topic",
            schema_body(),
        ))
        .await
        .expect("topic");
    assert_eq!(response.status(), StatusCode::CREATED);
    let topic = read_json(response).await;
    assert_eq!(topic["ShardCount"], 3);
    assert_eq!(topic["RecordType"], "TUPLE");

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "POST",
            "/projects/smoke_project/topics/smoke_topic/subscriptions",
            serde_json::json!({"Comment": "first comment"}),
        ))
        .await
        .expect("subscription");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key("x-datahub-request-id"));
    let created = read_json(response).await;
    let sub_id = created["SubId"].as_str().expect("sub id").to_string();
    assert!(!sub_id.is_empty());
    let sub_uri = format!("/projects/smoke_project/topics/smoke_topic/subscriptions/{sub_id}");

    let response = app
        .clone()
        .oneshot(signed_request(&creds, "GET", &sub_uri, None))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let sub = read_json(response).await;
    assert_eq!(sub["SubId"], sub_id.as_str());
    assert_eq!(sub["TopicName"], "smoke_topic");
    assert_eq!(sub["Comment"], "first comment");
    assert_eq!(sub["IsOwner"], true);
    assert_eq!(sub["State"], "ACTIVE");
    assert_eq!(sub["Type"], 0);
    assert!(sub["CreateTime"].as_i64().expect("create time") > 0);

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "PUT",
            &sub_uri,
            serde_json::json!({"Comment": "second comment"}),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["Comment"], "second comment");
    assert_eq!(updated["CreateTime"], sub["CreateTime"]);
    assert_eq!(updated["State"], "ACTIVE");

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "PUT",
            &format!("{sub_uri}/state"),
            serde_json::json!({"State": "INACTIVE"}),
        ))
        .await
        .expect("state");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["State"], "INACTIVE");

    let response = app
        .clone()
        .oneshot(signed_request(
            &creds,
            "GET",
            "/projects/smoke_project/topics/smoke_topic/subscriptions?search=second&pageIndex=1&pageSize=10",
            None,
        ))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json(response).await;
    assert_eq!(listed["TotalCount"], 1);
    assert_eq!(listed["Subscriptions"][0]["SubId"], sub_id.as_str());

    let response = app
        .clone()
        .oneshot(signed_request(&creds, "DELETE", &sub_uri, None))
        .await
        .expect("delete sub");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(signed_request(&creds, "GET", &sub_uri, None))
        .await
        .expect("get deleted");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["ErrorCode"], "NoSuchSubscription");

    let response = app
        .clone()
        .oneshot(signed_request(
            &creds,
            "DELETE",
            "/projects/smoke_project/topics/smoke_topic",
            None,
        ))
        .await
        .expect("delete topic");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(signed_request(
            &creds,
            "DELETE",
            "/projects/smoke_project",
            None,
        ))
        .await
        .expect("delete project");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(signed_request(&creds, "GET", "/projects", None))
        .await
        .expect("list projects");
    assert_eq!(read_json(response).await["ProjectNames"], serde_json::json!([]));
}

#[tokio::test]
async fn project_update_and_topic_listing_smoke() {
    let app = test_app();
    let creds = owner();

    for name in ["alpha_project", "beta_project"] {
        let response = app
            .clone()
            .oneshot(json_request(
                &creds,
                "POST",
                &format!("/projects/{name}"),
                serde_json::json!({"Comment": "initial"}),
            ))
            .await
            .expect("project");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "PUT",
            "/projects/alpha_project",
            serde_json::json!({"Comment": "changed"}),
        ))
        .await
        .expect("update project");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(signed_request(&creds, "GET", "/projects/alpha_project", None))
        .await
        .expect("get project");
    assert_eq!(read_json(response).await["Comment"], "changed");

    let response = app
        .clone()
        .oneshot(json_request(
            &creds,
            "POST",
            "/projects/alpha_project/topics/blob_topic",
            serde_json::json!({"ShardCount": 1, "Lifecycle": 1, "RecordType": "BLOB"}),
        ))
        .await
        .expect("blob topic");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(signed_request(
            &creds,
            "GET",
            "/projects/alpha_project/topics",
            None,
        ))
        .await
        .expect("list topics");
    assert_eq!(
        read_json(response).await["TopicNames"],
        serde_json::json!(["blob_topic"])
    );

    let response = app
        .clone()
        .oneshot(signed_request(&creds, "GET", "/projects", None))
        .await
        .expect("list projects");
    assert_eq!(
        read_json(response).await["ProjectNames"],
        serde_json::json!(["alpha_project", "beta_project"])
    );
}
