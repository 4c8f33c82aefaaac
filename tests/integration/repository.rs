//! Repository facade tests: Actions resources, deploy keys, reviews,
//! secrets, and git-data pull request creation.

use super::*;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use github_ops::Repository;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn artifact_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write as _;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_variable_round_trip() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/actions/variables"))
        .and(body_json(json!({"name": "DEPLOY_ENV", "value": "staging"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/actions/variables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "variables": [{"name": "DEPLOY_ENV", "value": "staging"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/widget/actions/variables/DEPLOY_ENV"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");

    repo.add_variable("DEPLOY_ENV", "staging").await.unwrap();
    let vars = repo.list_variables().await.unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0]["name"], "DEPLOY_ENV");
    repo.delete_variable("DEPLOY_ENV").await.unwrap();
}

#[tokio::test]
async fn test_add_secret_seals_value() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/actions/secrets/public-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key_id": "568250167242549743",
            "key": BASE64.encode([0u8; 32])
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/widget/actions/secrets/API_TOKEN"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let payload = repo.add_secret("API_TOKEN", "hunter2").await.unwrap();

    assert_eq!(payload["key_id"], "568250167242549743");
    // Sealed box: plaintext length plus ephemeral key and MAC overhead.
    let sealed = BASE64
        .decode(payload["encrypted_value"].as_str().unwrap())
        .unwrap();
    assert_eq!(sealed.len(), "hunter2".len() + 48);
}

#[tokio::test]
async fn test_artifacts_filtered_by_producing_run() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/actions/artifacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "artifacts": [
                {"id": 1, "name": "logs", "workflow_run": {"id": 55}},
                {"id": 2, "name": "build", "workflow_run": {"id": 56}},
                {"id": 3, "name": "coverage", "workflow_run": {"id": 55}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let artifacts = repo.list_artifacts(55).await.unwrap();

    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts[0]["name"], "logs");
    assert_eq!(artifacts[1]["name"], "coverage");
}

#[tokio::test]
async fn test_deploy_key_write_access_inverts_read_only() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/keys"))
        .and(body_json(json!({
            "title": "deploy",
            "key": "ssh-ed25519 AAAA",
            "read_only": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let key = repo
        .add_deploy_key("deploy", "ssh-ed25519 AAAA", true)
        .await
        .unwrap();

    assert_eq!(key["id"], 9);
}

#[tokio::test]
async fn test_approval_requires_an_approved_review() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls/1/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls/2/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"state": "APPROVED"},
            {"state": "CHANGES_REQUESTED"}
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls/3/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"user": {"login": "bot"}},
            {"state": "APPROVED"}
        ])))
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");

    // No reviews at all.
    assert!(!repo.pull_request_approved(1).await.unwrap());
    // An explicit non-approval wins over an earlier approval.
    assert!(!repo.pull_request_approved(2).await.unwrap());
    // Stateless entries are ignored.
    assert!(repo.pull_request_approved(3).await.unwrap());
}

#[tokio::test]
async fn test_export_variables_appends_both_prefixes() {
    let mock_server = setup_mock_server().await;

    let archive = artifact_zip(&[
        ("endpoint", "https://api.internal\nsecond line ignored\n"),
        ("db-port", "5432\n"),
    ]);
    Mock::given(method("GET"))
        .and(path("/artifact/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("vars.env");
    std::fs::write(&output, "EXISTING=1\n").unwrap();

    repo.export_variables(
        &format!("{}/artifact/download", mock_server.uri()),
        "ci.yml",
        &output,
        None,
    )
    .await
    .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    // Existing content is preserved, each artifact file contributes a
    // workflow-qualified and an unqualified key, and the downloaded
    // archive itself is never exported.
    assert_eq!(lines[0], "EXISTING=1");
    assert_eq!(lines.len(), 5);
    for expected in [
        "WIDGET_CI_YML_ENDPOINT=https://api.internal",
        "WIDGET_ENDPOINT=https://api.internal",
        "WIDGET_CI_YML_DB_PORT=5432",
        "WIDGET_DB_PORT=5432",
    ] {
        assert!(lines.contains(&expected), "missing line: {}", expected);
    }
}

#[tokio::test]
async fn test_export_variables_custom_prefix() {
    let mock_server = setup_mock_server().await;

    let archive = artifact_zip(&[("region", "eu-west-1\n")]);
    Mock::given(method("GET"))
        .and(path("/artifact/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("vars.env");

    repo.export_variables(
        &format!("{}/artifact/download", mock_server.uri()),
        "deploy.yml",
        &output,
        Some("infra"),
    )
    .await
    .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.contains(&"INFRA_DEPLOY_YML_REGION=eu-west-1"));
    assert!(lines.contains(&"INFRA_REGION=eu-west-1"));
}

#[tokio::test]
async fn test_create_pull_request_git_data_sequence() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/git/blobs"))
        .and(body_json(json!({
            "content": BASE64.encode("fn main() {}\n"),
            "encoding": "base64"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": "blob1"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "tree-main"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/git/refs"))
        .and(body_json(json!({
            "ref": "refs/heads/feature/codegen",
            "sha": "tree-main"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"object": {"sha": "base-commit"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/git/trees"))
        .and(body_json(json!({
            "tree": [{"path": "src/main.rs", "mode": "100644", "type": "blob", "sha": "blob1"}],
            "base_tree": "base-commit"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": "tree2"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/git/commits"))
        .and(body_json(json!({
            "message": "Add codegen entry point",
            "tree": "tree2",
            "parents": ["base-commit"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": "commit2"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/acme/widget/git/refs/heads/feature/codegen"))
        .and(body_json(json!({"sha": "commit2"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"object": {"sha": "commit2"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/pulls"))
        .and(body_json(json!({
            "title": "Add codegen entry point",
            "body": "Add codegen entry point",
            "head": "feature/codegen",
            "base": "main"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 42,
            "html_url": "https://github.com/acme/widget/pull/42"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let mut files = BTreeMap::new();
    files.insert("src/main.rs".to_string(), "fn main() {}\n".to_string());

    let url = repo
        .create_pull_request(
            "feature/codegen",
            "Add codegen entry point",
            &files,
            Some("main"),
        )
        .await
        .unwrap();

    assert_eq!(url, "https://github.com/acme/widget/pull/42");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_create_pull_request_defaults_to_default_branch() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"default_branch": "trunk"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/git/trees/trunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "t"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    // Fail fast at the ref step; only the branch resolution is under test.
    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/git/refs"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "exists"})))
        .mount(&mock_server)
        .await;

    let repo = Repository::new(test_client(&mock_server), "acme/widget");
    let err = repo
        .create_pull_request("feature/x", "msg", &BTreeMap::new(), None)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(422));
}
