use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scriptreel::script::{CharacterId, DialogueLine, ScriptId, VideoJobStatus};
use scriptreel::service::{HttpScriptService, ScriptService, ServiceError};

fn script_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "dialogue": [
            {"speaker": "alice", "text": "hi"},
            {"speaker": "bob", "text": "yo"}
        ],
        "selectedCharacters": ["alice", "bob"],
        "originalPrompt": "two friends meet",
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:05:00Z",
        "hasAudio": true,
        "videoJobStatus": "none",
        "videoJobProgress": 0
    })
}

fn service(server: &MockServer, token: &str) -> HttpScriptService {
    HttpScriptService::new(&server.uri(), token, Duration::from_secs(5))
        .expect("client should build")
}

#[tokio::test]
async fn list_scripts_decodes_listing_and_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scripts"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scripts": [script_json("s1"), script_json("s2")],
            "userTokenBalance": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let listing = service(&server, "secret").list_scripts().await.unwrap();
    assert_eq!(listing.scripts.len(), 2);
    assert_eq!(listing.user_token_balance, 7);
    assert_eq!(listing.scripts[0].original_prompt, "two friends meet");
    assert!(listing.scripts[1].has_audio);
}

#[tokio::test]
async fn update_sends_the_whole_dialogue() {
    let server = MockServer::start().await;
    let dialogue = vec![
        DialogueLine::new(CharacterId::new("bob"), "first"),
        DialogueLine::new(CharacterId::new("alice"), "second"),
    ];

    let mut updated = script_json("s1");
    updated["dialogue"] = json!([
        {"speaker": "bob", "text": "first"},
        {"speaker": "alice", "text": "second"}
    ]);

    Mock::given(method("PUT"))
        .and(path("/scripts/s1/dialogue"))
        .and(body_json(json!({"dialogue": [
            {"speaker": "bob", "text": "first"},
            {"speaker": "alice", "text": "second"}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let script = service(&server, "")
        .update_script_dialogue(&ScriptId::new("s1"), &dialogue)
        .await
        .unwrap();
    assert_eq!(script.dialogue, dialogue);
}

#[tokio::test]
async fn update_errors_map_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/scripts/stale/dialogue"))
        .respond_with(ResponseTemplate::new(409).set_body_string("edited elsewhere"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/scripts/bad/dialogue"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unknown speaker"))
        .mount(&server)
        .await;

    let client = service(&server, "");
    let lines = [DialogueLine::new(CharacterId::new("alice"), "hi")];

    let err = client
        .update_script_dialogue(&ScriptId::new("stale"), &lines)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ref body) if body == "edited elsewhere"));

    let err = client
        .update_script_dialogue(&ScriptId::new("bad"), &lines)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn update_response_for_another_script_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/scripts/s1/dialogue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(script_json("s9")))
        .mount(&server)
        .await;

    let err = service(&server, "")
        .update_script_dialogue(
            &ScriptId::new("s1"),
            &[DialogueLine::new(CharacterId::new("alice"), "hi")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn submission_and_status_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scripts/s1/video"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"jobId": "job-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scripts/s1/video/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "in_progress",
            "progress": 37.5,
            "jobId": "job-1"
        })))
        .mount(&server)
        .await;

    let client = service(&server, "");
    let id = ScriptId::new("s1");

    let submission = client.submit_video_generation(&id).await.unwrap();
    assert_eq!(submission.job_id.as_str(), "job-1");
    assert_eq!(submission.status, VideoJobStatus::Queued);

    let report = client.get_job_status(&id).await.unwrap();
    assert_eq!(report.status, VideoJobStatus::InProgress);
    assert_eq!(report.progress, 37.5);
    assert_eq!(report.job_id, Some(submission.job_id));
}

#[tokio::test]
async fn payment_required_maps_to_insufficient_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scripts/s1/video"))
        .respond_with(ResponseTemplate::new(402).set_body_string("no tokens left"))
        .mount(&server)
        .await;

    let err = service(&server, "")
        .submit_video_generation(&ScriptId::new("s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientTokens(_)));
}

#[tokio::test]
async fn server_errors_are_retryable_and_bad_json_is_not() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scripts"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/characters"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = service(&server, "");

    let err = client.list_scripts().await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 503, .. }));
    assert!(err.is_retryable());

    let err = client.list_characters().await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn delete_accepts_empty_success_and_reports_missing_scripts() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/scripts/s1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/scripts/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = service(&server, "");
    client.delete_script(&ScriptId::new("s1")).await.unwrap();

    let err = client
        .delete_script(&ScriptId::new("gone"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
