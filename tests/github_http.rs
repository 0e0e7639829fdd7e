//! HTTP-level tests of the GitHub host against a local mock server.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tekshila::config::GitHubConfig;
use tekshila::models::ContentMap;
use tekshila::publish::github::GitHubHost;
use tekshila::publish::{HostError, PublishError, PublishRequest, Publisher, RepositoryHost};

fn host(server: &MockServer) -> GitHubHost {
    let config = GitHubConfig {
        api_url: server.uri(),
        ..GitHubConfig::default()
    };
    GitHubHost::new("t0ken", &config).unwrap()
}

#[tokio::test]
async fn authenticate_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer t0ken"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "name": "The Octocat",
            "avatar_url": "https://avatars.example/octocat",
            "public_repos": 8
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = host(&server).authenticate().await.unwrap();
    assert_eq!(user.login, "octocat");
    assert_eq!(user.public_repos, 8);
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    let err = host(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, HostError::Unauthorized));
}

#[tokio::test]
async fn repositories_are_paginated() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..100)
        .map(|i| json!({"full_name": format!("octocat/repo-{i}"), "default_branch": "main"}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"full_name": "octocat/last", "default_branch": "main"}])),
        )
        .mount(&server)
        .await;

    let repos = host(&server).list_repositories().await.unwrap();
    assert_eq!(repos.len(), 101);
    assert_eq!(repos[0], "octocat/repo-0");
    assert_eq!(repos[100], "octocat/last");
}

#[tokio::test]
async fn missing_file_is_none_and_existing_file_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/contents/README.md"))
        .and(query_param("ref", "auto-docs-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc123",
            "content": "IyBI\nZWxs\nbw==\n"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/contents/src/new.py"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let host = host(&server);
    let existing = host
        .get_file("octocat/hello", "README.md", "auto-docs-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.sha, "abc123");
    assert_eq!(existing.content, "# Hello");

    let missing = host
        .get_file("octocat/hello", "src/new.py", "auto-docs-1")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_sends_sha_and_conflict_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/hello/contents/README.md"))
        .and(body_json(json!({
            "message": "Add documentation",
            "content": BASE64.encode("# Hi"),
            "branch": "auto-docs-1",
            "sha": "abc123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/hello/contents/stale.md"))
        .respond_with(ResponseTemplate::new(409).set_body_string("sha does not match"))
        .mount(&server)
        .await;

    let host = host(&server);
    host.update_file("octocat/hello", "README.md", "# Hi", "Add documentation", "auto-docs-1", "abc123")
        .await
        .unwrap();

    let err = host
        .update_file("octocat/hello", "stale.md", "x", "m", "auto-docs-1", "old")
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::Conflict(ref body) if body.contains("sha does not match")));
}

#[tokio::test]
async fn full_publish_against_rest_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"full_name": "octocat/hello", "default_branch": "main"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/branches/main"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "main", "commit": {"sha": "base-sha"}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/hello/git/refs"))
        .and(body_json(json!({"ref": "refs/heads/auto-docs-feedbeef", "sha": "base-sha"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/contents/README.md"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/hello/contents/README.md"))
        .and(body_partial_json(json!({"branch": "auto-docs-feedbeef"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/hello/pulls"))
        .and(body_partial_json(json!({"head": "auto-docs-feedbeef", "base": "main"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 7,
            "html_url": "https://github.com/octocat/hello/pull/7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let host = host(&server);
    let request = PublishRequest {
        repo: "octocat/hello".into(),
        base_branch: "main".into(),
        files: ContentMap::from([("README.md".to_string(), "# Hello".to_string())]),
        title: "Add documentation".into(),
        body: "This PR adds AI-generated documentation to the project.".into(),
        commit_message: "Add documentation".into(),
    };
    let info = Publisher::new(&host)
        .with_branch_name(|| "auto-docs-feedbeef".to_string())
        .publish(&request)
        .await
        .unwrap();

    assert_eq!(info.pr_number, 7);
    assert_eq!(info.pr_url, "https://github.com/octocat/hello/pull/7");
    assert_eq!(info.branch, "auto-docs-feedbeef");
}

#[tokio::test]
async fn missing_repository_stops_publish() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let host = host(&server);
    let request = PublishRequest {
        repo: "octocat/ghost".into(),
        base_branch: "main".into(),
        files: ContentMap::from([("README.md".to_string(), "# Ghost".to_string())]),
        title: "t".into(),
        body: "b".into(),
        commit_message: "m".into(),
    };
    let err = Publisher::new(&host).publish(&request).await.unwrap_err();
    assert!(matches!(err, PublishError::RepoNotFound { .. }));
}
