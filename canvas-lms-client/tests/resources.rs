//! Resource mapper behaviour against a mock Canvas.

mod common;

use canvas_lms_client::ids::id_field;
use canvas_lms_client::resources::{
    ModuleItemType, NewCourse, NewModuleItem, NewSection, SectionUpdate,
};
use canvas_lms_client::{AccountRef, CanvasError, Pagination, PageSlug};
use common::{id, MockCanvas, TOKEN};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn cross_listed_section_reports_new_course() {
    let canvas = MockCanvas::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sections/5/crosslist/20"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "name": "Section A", "course_id": 20, "nonxlist_course_id": 10
        })))
        .expect(1)
        .mount(&canvas.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sections/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "name": "Section A", "course_id": 20, "nonxlist_course_id": 10
        })))
        .mount(&canvas.server)
        .await;

    let moved = canvas
        .client
        .cross_list_section(id(5), id(20))
        .await
        .expect("cross-list");
    assert_eq!(id_field(&moved, "course_id"), Some(id(20)));

    let section = canvas.client.get_section(id(5)).await.expect("get section");
    assert_eq!(id_field(&section, "course_id"), Some(id(20)));
}

#[tokio::test]
async fn deleting_missing_module_item_is_api_error() {
    let canvas = MockCanvas::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/courses/1/modules/2/items/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "message": "The specified resource does not exist." }]
        })))
        .mount(&canvas.server)
        .await;

    let err = canvas
        .client
        .delete_module_item(id(1), id(2), id(999))
        .await
        .expect_err("missing item");
    assert!(matches!(err, CanvasError::Api { status: 404, .. }), "{err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn modules_are_listed_across_pages() {
    let canvas = MockCanvas::start().await;
    let next = format!("<{}?page=2&per_page=100>; rel=\"next\"", canvas.api_url("courses/3/modules"));

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!([{ "id": 1, "position": 1 }, { "id": 2, "position": 2 }])),
        )
        .mount(&canvas.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("page", "2"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3, "position": 3 }])))
        .expect(1)
        .mount(&canvas.server)
        .await;

    let modules = canvas
        .client
        .list_modules(id(3), Pagination::All)
        .await
        .expect("modules");
    let positions: Vec<u64> = modules.iter().filter_map(|m| m["position"].as_u64()).collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[tokio::test]
async fn page_search_term_is_forwarded_when_present() {
    let canvas = MockCanvas::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/4/pages"))
        .and(query_param("search_term", "syllabus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "url": "syllabus" }])))
        .expect(1)
        .mount(&canvas.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/4/pages"))
        .and(query_param_is_missing("search_term"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&canvas.server)
        .await;

    let found = canvas
        .client
        .list_pages(id(4), Some(" syllabus "), Pagination::All)
        .await
        .expect("search");
    assert_eq!(found.len(), 1);

    let blank = canvas
        .client
        .list_pages(id(4), Some("   "), Pagination::All)
        .await
        .expect("blank search");
    assert!(blank.is_empty());
}

#[tokio::test]
async fn payloads_are_wrapped_for_canvas() {
    let canvas = MockCanvas::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/self/courses"))
        .and(body_json(json!({ "course": { "name": "Biology", "course_code": "BIO-101" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 44, "name": "Biology" })))
        .expect(1)
        .mount(&canvas.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/sections/9"))
        .and(body_json(json!({ "course_section": { "name": "Evening" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 9, "name": "Evening" })))
        .expect(1)
        .mount(&canvas.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/courses/1/modules/2/items"))
        .and(body_json(json!({ "module_item": {
            "title": "Intro", "type": "Page", "position": 1, "page_url": "intro"
        } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 31, "type": "Page" })))
        .expect(1)
        .mount(&canvas.server)
        .await;

    let course = NewCourse {
        name: "Biology".into(),
        course_code: Some("BIO-101".into()),
        sis_course_id: None,
    };
    let created = canvas
        .client
        .create_course(AccountRef::Current, &course)
        .await
        .expect("course");
    assert_eq!(created["id"], json!(44));

    let update = SectionUpdate {
        name: Some("Evening".into()),
    };
    canvas
        .client
        .update_section(id(9), &update)
        .await
        .expect("section");

    let item = NewModuleItem {
        position: Some(1),
        ..NewModuleItem::page("Intro", PageSlug::parse("intro").expect("slug"))
    };
    let item = canvas
        .client
        .create_module_item(id(1), id(2), &item)
        .await
        .expect("item");
    assert_eq!(item["type"], json!("Page"));
}

#[tokio::test]
async fn invalid_payloads_never_reach_canvas() {
    let canvas = MockCanvas::start().await;

    let blank = NewSection {
        name: "  ".into(),
        sis_section_id: None,
    };
    let err = canvas
        .client
        .create_section(id(1), &blank)
        .await
        .expect_err("blank name");
    assert!(matches!(err, CanvasError::Validation(_)));

    let err = canvas
        .client
        .update_section(id(1), &SectionUpdate::default())
        .await
        .expect_err("empty update");
    assert!(matches!(err, CanvasError::Validation(_)));

    let err = canvas
        .client
        .create_module_item(id(1), id(2), &NewModuleItem::new("Quiz 1", ModuleItemType::Quiz))
        .await
        .expect_err("quiz without content_id");
    assert!(matches!(err, CanvasError::Validation(_)));

    let requests = canvas
        .server
        .received_requests()
        .await
        .expect("request recording is on");
    assert!(requests.is_empty());
}
