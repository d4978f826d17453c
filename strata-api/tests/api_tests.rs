/// End-to-end API tests over the in-memory store
///
/// These tests verify:
/// - The register, project, content, version and search flow
/// - Status codes for auth, validation, access and missing entities
/// - Tag creation, attachment and lookup
/// - Health and readiness

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_full_versioning_flow() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project_id = ctx.project(&alice, "P").await;

    let (status, created) = ctx
        .post(
            &format!("/contents/project/{}", project_id),
            &alice.token,
            json!({ "title": "Draft", "prompt": "hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"]["version_number"], 1);
    assert_eq!(created["primary_type"], "text");
    let content_id = created["content_id"].as_str().unwrap().to_string();

    let (status, appended) = ctx
        .post(
            &format!("/versions/content/{}", content_id),
            &alice.token,
            json!({ "prompt": "world" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appended["version_number"], 2);
    assert_eq!(appended["content_id"], content_id.as_str());

    let (status, versions) = ctx
        .get(&format!("/versions/content/{}", content_id), &alice.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<i64> = versions
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![2, 1]);

    let (status, contents) = ctx
        .get(&format!("/contents/project/{}", project_id), &alice.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contents[0]["latest_version"]["version_number"], 2);
    assert_eq!(contents[0]["latest_version"]["version_id"], appended["version_id"]);

    let (status, hits) = ctx.get("/search?q=world", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["content_id"], content_id.as_str());
    assert_eq!(hits[0]["latest_version"]["prompt"], "world");

    // "hello" only lives in v1 now
    let (_, hits) = ctx.get("/search?q=hello", &alice.token).await;
    assert!(hits.as_array().unwrap().is_empty());

    let (status, hits) = ctx.get("/search?q=world", &bob.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(hits.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_validation_and_duplicate_email() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "a@example.com", "username": "a" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "password");

    let (status, body) = ctx
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "username": "a", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");

    ctx.user("carol").await;
    let (status, body) = ctx
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "Carol@Example.com", "username": "c2", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");
    assert_eq!(body["details"][0]["message"], "Email already registered");

    let (status, body) = ctx
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": format!("{}@example.com", "x".repeat(300)),
                "username": "x",
                "password": "pw"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_login_failures() {
    let ctx = TestContext::new();
    let dave = ctx.user("dave").await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": dave.email, "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, unknown) = ctx
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["message"], body["message"]);

    let (status, _) = ctx
        .request(Method::POST, "/auth/login", None, Some(json!({ "email": dave.email })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_token() {
    let ctx = TestContext::new();
    ctx.user("erin").await;

    let (_, login) = ctx
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "erin@example.com", "password": "hunter2-password" })),
        )
        .await;
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["access_token"].as_str().unwrap();

    let (status, _) = ctx.get("/projects", access_token).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not a refresh token
    let (status, _) = ctx
        .request(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": login["access_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request(Method::GET, "/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("/search?q=x", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_projects_list_and_create() {
    let ctx = TestContext::new();
    let frank = ctx.user("frank").await;

    let (status, body) = ctx
        .post("/projects", &frank.token, json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");

    let (status, created) = ctx
        .post(
            "/projects",
            &frank.token,
            json!({ "name": "Lab", "description": "notes" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["owner_id"], frank.id.as_str());
    assert_eq!(created["description"], "notes");

    let (status, projects) = ctx.get("/projects", &frank.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["name"], "Lab");
}

#[tokio::test]
async fn test_members_management() {
    let ctx = TestContext::new();
    let owner = ctx.user("grace").await;
    let other = ctx.user("heidi").await;
    let project_id = ctx.project(&owner, "Team").await;
    let members_uri = format!("/projects/{}/members", project_id);

    let (status, _) = ctx.get(&members_uri, &other.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .post(&members_uri, &owner.token, json!({ "email": other.email, "role": "owner" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(&members_uri, &owner.token, json!({ "email": "ghost@example.com" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, membership) = ctx
        .post(&members_uri, &owner.token, json!({ "email": other.email, "role": "editor" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(membership["role"], "editor");

    let (status, _) = ctx
        .post(&members_uri, &owner.token, json!({ "email": other.email }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Editors cannot add members
    let (status, _) = ctx
        .post(&members_uri, &other.token, json!({ "email": owner.email }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, members) = ctx.get(&members_uri, &other.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (status, _) = ctx
        .get(&format!("/projects/{}/members", Uuid::new_v4()), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_access_and_validation() {
    let ctx = TestContext::new();
    let owner = ctx.user("ivan").await;
    let outsider = ctx.user("judy").await;
    let project_id = ctx.project(&owner, "Docs").await;
    let uri = format!("/contents/project/{}", project_id);

    // Membership is checked before the title
    let (status, _) = ctx.post(&uri, &outsider.token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.post(&uri, &owner.token, json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, _) = ctx
        .post(
            &format!("/contents/project/{}", Uuid::new_v4()),
            &owner.token,
            json!({ "title": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get(&uri, &outsider.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let content_id = ctx.content(&owner, &project_id, "Spec", "first").await;

    let (status, detail) = ctx
        .get(&format!("/contents/{}", content_id), &owner.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "Spec");
    assert_eq!(detail["latest_version"]["version_number"], 1);
    assert_eq!(detail["latest_version"]["prompt"], "first");

    let (status, _) = ctx
        .get(&format!("/contents/{}", content_id), &outsider.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .get(&format!("/contents/{}", Uuid::new_v4()), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_versions_not_found_before_forbidden() {
    let ctx = TestContext::new();
    let owner = ctx.user("ken").await;
    let outsider = ctx.user("lena").await;
    let project_id = ctx.project(&owner, "Lab").await;
    let content_id = ctx.content(&owner, &project_id, "Notes", "p").await;

    let missing = format!("/versions/content/{}", Uuid::new_v4());
    let (status, _) = ctx.post(&missing, &outsider.token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let existing = format!("/versions/content/{}", content_id);
    let (status, _) = ctx.post(&existing, &outsider.token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.get(&existing, &outsider.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_without_membership_is_forbidden() {
    let ctx = TestContext::new();
    let owner = ctx.user("mallory").await;
    let project_id = ctx.project(&owner, "Orphan").await;
    let content_id = ctx.content(&owner, &project_id, "Doc", "p").await;

    let removed = ctx
        .store
        .remove_membership(project_id.parse().unwrap(), owner.id.parse().unwrap())
        .await;
    assert!(removed);

    let (status, _) = ctx
        .get(&format!("/contents/project/{}", project_id), &owner.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .post(&format!("/versions/content/{}", content_id), &owner.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, hits) = ctx.get("/search?q=Doc", &owner.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(hits.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_tag_create_and_list() {
    let ctx = TestContext::new();
    let user = ctx.user("nina").await;

    let (status, created) = ctx.post("/tags", &user.token, json!({ "name": " Demo " })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Demo");

    let (status, existing) = ctx.post("/tags", &user.token, json!({ "name": "demo" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(existing["tag_id"], created["tag_id"]);
    assert_eq!(existing["name"], "Demo");

    let (status, _) = ctx.post("/tags", &user.token, json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.post("/tags", &user.token, json!({ "name": "alpha" })).await;

    let (status, tags) = ctx.get("/tags", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "Demo"]);

    let (_, filtered) = ctx.get("/tags?q=EM", &user.token).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["name"], "Demo");
}

#[tokio::test]
async fn test_attach_tags() {
    let ctx = TestContext::new();
    let owner = ctx.user("oscar").await;
    let outsider = ctx.user("peggy").await;
    let project_id = ctx.project(&owner, "Tagged").await;
    let content_id = ctx.content(&owner, &project_id, "Essay", "p").await;
    let uri = format!("/tags/content/{}", content_id);

    let (status, _) = ctx
        .post(&format!("/tags/content/{}", Uuid::new_v4()), &owner.token, json!({ "tags": ["a"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Access is checked before the body shape
    let (status, _) = ctx.post(&uri, &outsider.token, json!({ "tags": "a" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.post(&uri, &owner.token, json!({ "tags": "a" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.post(&uri, &owner.token, json!({ "tags": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.post(&uri, &owner.token, json!({ "tags": ["  ", null] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .post(&uri, &owner.token, json!({ "tags": ["a", "a", " a ", "B"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content_id"], content_id.as_str());
    let names: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "B"]);

    // Attaching again links nothing new
    ctx.post(&uri, &owner.token, json!({ "tags": ["A"] })).await;

    let (status, tags) = ctx.get(&uri, &owner.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 2);

    let (status, _) = ctx.get(&uri, &outsider.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let tag_id = body["tags"][0]["tag_id"].as_str().unwrap();
    let (status, tagged) = ctx
        .get(&format!("/tags/{}/contents", tag_id), &owner.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tagged["tag_name"], "a");
    assert_eq!(tagged["contents"][0]["content_id"], content_id.as_str());

    let (status, tagged) = ctx
        .get(&format!("/tags/{}/contents", tag_id), &outsider.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(tagged["contents"].as_array().unwrap().is_empty());

    let (status, _) = ctx
        .get(&format!("/tags/{}/contents", Uuid::new_v4()), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let user = ctx.user("quinn").await;

    let status = ctx.post_raw("/projects", &user.token, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = ctx.post_raw("/projects", &user.token, r#"{"name": 5}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requires_query() {
    let ctx = TestContext::new();
    let user = ctx.user("rupert").await;

    let (status, _) = ctx.get("/search", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.get("/search?q=%20%20", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No memberships is an empty result, not an error
    let (status, hits) = ctx.get("/search?q=anything", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(hits.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = ctx.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "connected");
}
