// tests/http_routes.rs
//
// Route behaviour against an in-process service, the same way the
// extension popup talks to the server.
//
mod test_support;

use actix_web::{http::header, test, web, App};
use serde_json::{json, Value};
use test_support::*;
use tkb_scheduler_server::background::BackgroundSource;
use tkb_scheduler_server::generator::GridRenderer;
use tkb_scheduler_server::routes::{configure, AppState};

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn rows() -> Value {
    json!([
        row(1, "IT3080", "Mạng máy tính", "Thứ 3, 1-3, D9-101", "1-15"),
        row(2, "IT3090", "Cơ sở dữ liệu", "Thứ 3, 2-4, D5-401; Thứ 5, 1-2, D5-402", "1-15"),
    ])
}

macro_rules! service {
    ($background:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(GridRenderer::new(None), $background)))
                .configure(|cfg| configure(cfg, 16 << 20)),
        )
        .await
    };
}

#[actix_web::test]
async fn download_answers_with_a_png() {
    let app = service!(background());

    let req = test::TestRequest::post()
        .uri("/api/tkb_download/")
        .set_json(json!({ "data": rows() }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert!(resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("tkb.png"));

    let body = test::read_body(resp).await;
    assert_eq!(&body[..8], &PNG_MAGIC);
}

#[actix_web::test]
async fn download_accepts_rows_as_json_text() {
    let app = service!(background());

    let req = test::TestRequest::post()
        .uri("/api/tkb_download/")
        .set_json(json!({ "data": rows().to_string() }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn preview_lists_courses_and_conflicts() {
    let app = service!(background());

    let req = test::TestRequest::post()
        .uri("/api/tkb_preview/")
        .set_json(json!({ "data": rows() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));

    let ids: Vec<&str> = body["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "2", "2_1"]);
    assert_eq!(body["courses"][0]["courseName"], "Mạng máy tính");

    let conflicts = body["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["day"], 3);
    assert_eq!(conflicts[0]["conflictStart"], 2);
    assert_eq!(conflicts[0]["conflictEnd"], 3);
}

#[actix_web::test]
async fn preview_applies_the_week_filter() {
    let app = service!(background());

    let data = json!([
        row(1, "A", "A", "Thứ 2, 1-2, X", "1-8"),
        row(2, "B", "B", "Thứ 2, 1-2, Y", "9-15"),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/tkb_preview/")
        .set_json(json!({ "data": data, "week": 12 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["courses"].as_array().unwrap().len(), 1);
    assert_eq!(body["courses"][0]["id"], "2");
    assert!(body["conflicts"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn unparseable_row_text_is_a_bad_request() {
    let app = service!(background());

    let req = test::TestRequest::post()
        .uri("/api/tkb_download/")
        .set_json(json!({ "data": "[{not json" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn wrong_body_shape_is_a_bad_request() {
    let app = service!(background());

    let req = test::TestRequest::post()
        .uri("/api/tkb_download/")
        .set_json(json!({ "data": 5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn missing_background_is_a_server_error() {
    let app = service!(BackgroundSource::File("/definitely/not/here/bg.png".into()));

    let req = test::TestRequest::post()
        .uri("/api/tkb_download/")
        .set_json(json!({ "data": rows() }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn status_reports_alive() {
    let app = service!(background());

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["alive"], true);
    assert!(body["renders_served"].is_u64());
}

#[actix_web::test]
async fn concurrent_renders_all_complete() {
    let app = service!(background());

    let request = || {
        test::TestRequest::post()
            .uri("/api/tkb_download/")
            .set_json(json!({ "data": rows() }))
            .to_request()
    };

    let (a, b, c) = tokio::join!(
        test::call_service(&app, request()),
        test::call_service(&app, request()),
        test::call_service(&app, request()),
    );

    for resp in [a, b, c] {
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert_eq!(&body[..8], &PNG_MAGIC);
    }
}
