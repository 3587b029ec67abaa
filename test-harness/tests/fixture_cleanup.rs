use datahub_client::{ClientConfig, DatahubClient};
use datahub_service::config::ServiceConfig;
use datahub_test_harness::{LocalService, TestEnv};
use datahub_test_harness::cleanup::{clean_project, clean_subscription, clean_topic};
use datahub_test_harness::fixture::{TopicFixture, ensure_project, ensure_topic, with_topic};
use datahub_test_harness::naming::PROJECT_PREFIX;
use std::io::Write;
use std::process::Command;
use std::sync::{Arc, Mutex};

async fn seeded(client: &DatahubClient, case: u32) -> TopicFixture {
    let fixture = TopicFixture::new(case).expect("fixture");
    ensure_project(client, &fixture.project).await.expect("project");
    ensure_topic(client, &fixture).await.expect("topic");
    fixture
}

#[tokio::test]
async fn teardown_runs_when_the_body_fails() {
    let env = TestEnv::local().await.expect("local env");
    let seen: Arc<Mutex<Option<TopicFixture>>> = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&seen);

    let err = with_topic(env.client(), 9, |client, fx| async move {
        *captured.lock().expect("lock") = Some(fx.clone());
        client
            .create_subscription(&fx.project, &fx.topic, "left behind")
            .await?;
        Err::<(), anyhow::Error>(anyhow::anyhow!("scenario exploded"))
    })
    .await
    .expect_err("body error is reported");
    assert!(err.to_string().contains("scenario exploded"));

    let fixture = seen.lock().expect("lock").clone().expect("fixture");
    let lookup = env
        .client()
        .get_project(&fixture.project)
        .await
        .expect_err("project removed");
    assert!(lookup.is_not_found());
    env.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn existing_project_and_topic_are_tolerated() {
    let env = TestEnv::local().await.expect("local env");
    let client = env.client();
    let fixture = seeded(client, 6).await;
    ensure_project(client, &fixture.project)
        .await
        .expect("second project create");
    ensure_topic(client, &fixture)
        .await
        .expect("second topic create");
    clean_project(client, PROJECT_PREFIX, true)
        .await
        .expect("cleanup");
    env.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn clean_subscription_pages_past_one_listing() {
    let env = TestEnv::local().await.expect("local env");
    let client = env.client();
    let fixture = seeded(client, 7).await;
    for index in 0..120 {
        client
            .create_subscription(&fixture.project, &fixture.topic, &format!("bulk {index}"))
            .await
            .expect("subscription");
    }

    clean_subscription(client, &fixture.project, &fixture.topic)
        .await
        .expect("clean subscriptions");
    let listed = client
        .list_subscription(&fixture.project, &fixture.topic, "", 1, 100)
        .await
        .expect("list");
    assert_eq!(listed.total_count, 0);

    clean_topic(client, &fixture.project, false)
        .await
        .expect("clean topics");
    client
        .delete_project(&fixture.project)
        .await
        .expect("project now empty");
    env.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn clean_subscription_fits_smaller_service_page_caps() {
    for max_page_size in [50, 4] {
        let mut config = ServiceConfig::local("cap_id", "cap_key");
        config.max_page_size = max_page_size;
        let service = LocalService::start_with_config(config)
            .await
            .expect("local service");
        let client = DatahubClient::new(&ClientConfig::new("cap_id", "cap_key", service.endpoint()))
            .expect("client");
        let fixture = seeded(&client, 8).await;
        for index in 0..9 {
            client
                .create_subscription(&fixture.project, &fixture.topic, &format!("capped {index}"))
                .await
                .expect("subscription");
        }

        clean_subscription(&client, &fixture.project, &fixture.topic)
            .await
            .expect("clean subscriptions under a page cap");
        let listed = client
            .list_subscription(&fixture.project, &fixture.topic, "", 1, 1)
            .await
            .expect("list");
        assert_eq!(listed.total_count, 0, "max_page_size {max_page_size}");

        drop(client);
        service.shutdown().await.expect("shutdown");
    }
}

#[tokio::test]
async fn clean_project_respects_prefix_and_force() {
    let env = TestEnv::local().await.expect("local env");
    let client = env.client();
    let busy = seeded(client, 8).await;
    client
        .create_subscription(&busy.project, &busy.topic, "keeps topic busy")
        .await
        .expect("subscription");
    client
        .create_project("keep_me", "unrelated")
        .await
        .expect("unrelated project");

    clean_project(client, PROJECT_PREFIX, false)
        .await
        .expect("non-forced cleanup skips busy projects");
    let names = client.list_project().await.expect("list").project_names;
    assert!(names.contains(&busy.project));

    clean_project(client, PROJECT_PREFIX, true)
        .await
        .expect("forced cleanup");
    let names = client.list_project().await.expect("list").project_names;
    assert_eq!(names, vec!["keep_me".to_string()]);
    env.shutdown().await.expect("shutdown");
}

#[test]
fn runner_exits_255_without_settings() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "datahub:\n  access_id: only_an_id").expect("write");
    let output = Command::new(env!("CARGO_BIN_EXE_subscription-suite"))
        .arg("--config")
        .arg(file.path())
        .env_remove("DATAHUB_ACCESS_ID")
        .env_remove("DATAHUB_ACCESS_KEY")
        .env_remove("DATAHUB_ENDPOINT")
        .output()
        .expect("run suite binary");
    assert_eq!(output.status.code(), Some(255));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[access_id, access_key, endpoint] must be set"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("access_id: only_an_id"));
}
