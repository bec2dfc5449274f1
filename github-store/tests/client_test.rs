use github_store::{GitHubClient, GitHubConfig, RepoSlug};
use repo_store::util::decode_content;
use repo_store::{EntryType, FileStore, StoreError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GitHubClient {
    let config = GitHubConfig::new(RepoSlug::new("octo", "demo"), Some("t0k".to_string()))
        .with_api_base(&server.uri());
    GitHubClient::new(config).unwrap()
}

#[tokio::test]
async fn test_list_root_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/contents"))
        .and(header("authorization", "Bearer t0k"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "README.md", "path": "README.md", "sha": "abc", "size": 12, "type": "file"},
            {"name": "src", "path": "src", "sha": "def", "size": 0, "type": "dir"}
        ])))
        .mount(&server)
        .await;

    let entries = client_for(&server).list("", None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "README.md");
    assert_eq!(entries[0].size, Some(12));
    assert_eq!(entries[1].entry_type, EntryType::Dir);
    assert_eq!(entries[1].size, None);
}

#[tokio::test]
async fn test_list_with_ref_and_empty_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/contents"))
        .and(query_param("ref", "main"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "This repository is empty."})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).list("", Some("main")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(m) if m == "This repository is empty."));
}

#[tokio::test]
async fn test_get_file_returns_encoded_blob() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/contents/utils/git_repo.py"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "git_repo.py",
            "path": "utils/git_repo.py",
            "sha": "f00d",
            "size": 11,
            "type": "file",
            "encoding": "base64",
            "content": "aGVsbG8g\nd29ybGQ=\n"
        })))
        .mount(&server)
        .await;

    let blob = client_for(&server).get("utils/git_repo.py").await.unwrap();
    assert_eq!(blob.revision_id, "f00d");
    assert_eq!(blob.name, "git_repo.py");
    assert_eq!(
        decode_content(&blob.content, blob.encoding.as_deref()).unwrap(),
        "hello world"
    );
}

#[tokio::test]
async fn test_get_directory_is_not_a_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/contents/src"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client_for(&server).get("src").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_sends_base64_content() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/demo/contents/bye.py"))
        .and(body_partial_json(json!({
            "message": "Create bye.py",
            "content": "cHJpbnQoJ2hpJyk="
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"sha": "blob1", "path": "bye.py"},
            "commit": {"sha": "commit1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server)
        .create("bye.py", "print('hi')", "Create bye.py")
        .await
        .unwrap();
    assert_eq!(receipt.revision_id.as_deref(), Some("blob1"));
    assert_eq!(receipt.commit_id.as_deref(), Some("commit1"));
}

#[tokio::test]
async fn test_create_existing_file_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/demo/contents/README.md"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create("README.md", "# again", "Create README.md")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_update_with_stale_sha_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/demo/contents/README.md"))
        .and(body_partial_json(json!({"sha": "old"})))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "README.md does not match old"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .update("README.md", "# new", "Update README.md", "old")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_delete_sends_expected_sha() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/octo/demo/contents/hello.py"))
        .and(body_partial_json(json!({"sha": "cafe", "message": "Delete hello.py"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": null,
            "commit": {"sha": "commit9"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server)
        .delete("hello.py", "Delete hello.py", "cafe")
        .await
        .unwrap();
    assert!(receipt.revision_id.is_none());
    assert_eq!(receipt.commit_id.as_deref(), Some("commit9"));
}

#[tokio::test]
async fn test_bad_credentials_map_to_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    let err = client_for(&server).current_user().await.unwrap_err();
    assert!(matches!(err, StoreError::Authentication(_)));
}

#[tokio::test]
async fn test_search_code_scopes_query_to_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("q", "login repo:octo/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "items": [{"name": "auth.py", "path": "src/auth.py", "sha": "x", "score": 1.5}]
        })))
        .mount(&server)
        .await;

    let hits = client_for(&server).search_code("login").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "src/auth.py");
    assert_eq!(hits[0].score, 1.5);
}

#[tokio::test]
async fn test_commit_history_for_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/commits"))
        .and(query_param("path", "README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"sha": "c2", "commit": {"message": "second", "author": {"name": "Ada", "email": "a@x", "date": "2024-05-02T10:00:00Z"}}},
            {"sha": "c1", "commit": {"message": "first", "author": {"name": "Ada", "email": "a@x", "date": "2024-05-01T10:00:00Z"}}}
        ])))
        .mount(&server)
        .await;

    let history = client_for(&server).commit_history("README.md").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].revision_id, "c2");
    assert_eq!(history[0].author, "Ada");
    assert!(history[0].timestamp > history[1].timestamp);
}

#[tokio::test]
async fn test_refs_and_default_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": "refs/heads/main",
            "object": {"sha": "tip", "type": "commit"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/demo/git/refs"))
        .and(body_partial_json(json!({"ref": "refs/heads/feature", "sha": "tip"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "ref": "refs/heads/feature",
            "object": {"sha": "tip", "type": "commit"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/demo/git/refs"))
        .and(body_partial_json(json!({"ref": "refs/heads/main"})))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Reference already exists"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "octo/demo",
            "default_branch": "trunk",
            "private": true,
            "permissions": {"admin": false, "push": true, "pull": true}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let main = client.get_ref("main").await.unwrap();
    assert_eq!(main.revision_id, "tip");

    let feature = client.create_ref("feature", "tip").await.unwrap();
    assert_eq!(feature.name, "feature");

    let err = client.create_ref("main", "tip").await.unwrap_err();
    assert!(err.is_conflict());

    assert_eq!(client.default_branch().await.unwrap(), "trunk");
    let repo = client.repository().await.unwrap();
    assert!(repo.permissions.unwrap().push);
}
