/// HTTP API tests
///
/// Drives the real route table through `actix_web::test` with the
/// in-memory store behind every service.
mod common;

use actix_web::{body::BoxBody, dev::Service, http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use catalyst_service::domain::Permission;
use catalyst_service::handlers;
use catalyst_service::metrics;
use catalyst_service::middleware::{GatewayIdentity, USER_ID_HEADER};
use common::{hours_ago, private_to, InMemoryStore, Services};

macro_rules! init_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(Services::new($store).into_state()))
                .wrap(GatewayIdentity)
                .configure(handlers::configure),
        )
        .await
    };
}

fn seeded() -> (Arc<InMemoryStore>, uuid::Uuid, uuid::Uuid) {
    let store = InMemoryStore::new();
    let author = store.add_user("author");
    let project = store.add_project(author, Permission::default());
    let branch = store.add_branch(project.id, None, author, hours_ago(5));
    let post = store.add_post(branch.id, author, hours_ago(4));
    (store, author, post.id)
}

#[actix_web::test]
async fn test_home_requires_user() {
    let (store, _, _) = seeded();
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/v1/timeline/home")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_malformed_user_header_is_rejected() {
    let (store, _, _) = seeded();
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/v1/timeline/global")
        .insert_header((USER_ID_HEADER, "not-a-uuid"))
        .to_request();
    // Rejected by the middleware before routing
    let err = app
        .call(req)
        .await
        .err()
        .expect("malformed header should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::BAD_REQUEST
    );
    // Request metrics label the rejection with its own status
    assert_eq!(metrics::response_status::<BoxBody>(&Err(err)), 400);
}

#[actix_web::test]
async fn test_profile_timeline_page() {
    let (store, author, _) = seeded();
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/timeline/users/{}?page=1", author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 5);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["items"][0]["kind"], "post");
    assert_eq!(body["items"][0]["user"]["username"], "author");
}

#[actix_web::test]
async fn test_duplicate_interaction_conflicts() {
    let (store, author, post_id) = seeded();
    let app = init_app!(store);

    let payload = json!({
        "target_type": "post",
        "target_id": post_id,
        "interaction_type": "LIKE",
    });

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header((USER_ID_HEADER, author.to_string()))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header((USER_ID_HEADER, author.to_string()))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/interactions/count?target_type=post&target_id={}&interaction_type=LIKE",
            post_id
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
}

#[actix_web::test]
async fn test_refresh_then_list_trending() {
    let (store, author, _) = seeded();
    let app = init_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/trending/refresh")
        .insert_header((USER_ID_HEADER, author.to_string()))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["succeeded"].as_array().unwrap().len(), 2);
    assert!(report["failures"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/trending/branches?dimension=activity")
        .insert_header((USER_ID_HEADER, author.to_string()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["entity"], "branch");
    assert_eq!(body["dimension"], "activity");
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["activity"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/trending/posts")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_refresh_requires_user() {
    let (store, _, _) = seeded();
    let app = init_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/trending/refresh")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // No pass ran, so nothing is flagged yet
    let req = test::TestRequest::get()
        .uri("/api/v1/trending/branches?dimension=activity")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_refresh_reports_failed_writes() {
    let (store, author, _) = seeded();
    let project = store.add_project(author, Permission::default());
    let broken = store.add_branch(project.id, None, author, hours_ago(1));
    store.fail_writes_for(broken.id);
    let app = init_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/trending/refresh")
        .insert_header((USER_ID_HEADER, author.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 500);
    let failures = body["report"]["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["id"], broken.id.to_string());
    assert_eq!(failures[0]["kind"], "branch");
}

#[actix_web::test]
async fn test_branch_routes() {
    let store = InMemoryStore::new();
    let author = store.add_user("author");
    let stranger = store.add_user("stranger");
    let project = store.add_project(author, private_to(&[]));
    let root = store.add_branch(project.id, None, author, hours_ago(5));
    let app = init_app!(store.clone());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/projects/{}/branches", project.id))
        .insert_header((USER_ID_HEADER, author.to_string()))
        .set_json(json!({ "name": "sequel", "parent_branch_id": root.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["parent_branch_id"], root.id.to_string());

    // Private project is invisible to others
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/projects/{}/branches", project.id))
        .insert_header((USER_ID_HEADER, stranger.to_string()))
        .set_json(json!({ "name": "fork" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let created_id = created["id"].as_str().unwrap();
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/branches/{}/parent", root.id))
        .insert_header((USER_ID_HEADER, author.to_string()))
        .set_json(json!({ "parent_branch_id": created_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
