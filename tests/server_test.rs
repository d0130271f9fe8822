mod common;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use student_pass::{configure, load_data, train_model, AppState, ForestParams};

fn state() -> web::Data<AppState> {
    let file = common::create_test_csv();
    let table = load_data(file.path(), b',').unwrap();
    let model = train_model(&table, 0.2, ForestParams { n_trees: 25, ..Default::default() }).unwrap();
    web::Data::new(AppState {
        table: std::sync::Arc::new(table),
        model,
    })
}

async fn get_page(uri: &str) -> (StatusCode, String) {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, String::from_utf8(body.to_vec()).unwrap())
}

const SECTIONS: [&str; 5] = [
    "view-description",
    "view-dataset",
    "view-charts",
    "view-predict",
    "view-help",
];

#[actix_web::test]
async fn test_each_view_renders_only_itself() {
    for (slug, section) in ["description", "dataset", "charts", "predict", "help"]
        .iter()
        .zip(SECTIONS)
    {
        let (status, body) = get_page(&format!("/?view={}", slug)).await;
        assert_eq!(status, StatusCode::OK, "view {}", slug);
        for other in SECTIONS {
            assert_eq!(
                body.contains(&format!("id=\"{}\"", other)),
                other == section,
                "view {} vs section {}",
                slug,
                other
            );
        }
    }
}

#[actix_web::test]
async fn test_default_view_is_description() {
    let (status, body) = get_page("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("id=\"view-description\""));
    assert!(body.contains("Random Forest"));
}

#[actix_web::test]
async fn test_unknown_view_is_not_found() {
    let (status, _) = get_page("/?view=stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_dataset_column_selection() {
    let (_, body) = get_page("/?view=dataset&columns=G3&columns=age").await;
    assert!(body.contains("<th>age</th>"));
    assert!(body.contains("<th>G3</th>"));
    assert!(!body.contains("<th>school</th>"));

    let (_, body) = get_page("/?view=dataset").await;
    for column in common::HEADER.split(',') {
        assert!(body.contains(&format!("<th>{}</th>", column)), "missing {}", column);
    }
}

#[actix_web::test]
async fn test_predict_view_clamps_sliders() {
    let (status, body) = get_page("/?view=predict&age=99&absences=-5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="age" min="10" max="20" step="1" value="20""#));
    assert!(body.contains(r#"name="absences" min="0" max="100" step="1" value="0""#));
    assert!(body.contains("Model accuracy:"));
    assert!(body.contains("predicted to"));
}

#[actix_web::test]
async fn test_predict_view_rejects_non_numeric_slider() {
    let (status, _) = get_page("/?view=predict&G1=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_charts_view_embeds_svg() {
    let (_, body) = get_page("/?view=charts").await;
    assert_eq!(body.matches("<svg").count(), 4);
}

#[actix_web::test]
async fn test_single_chart_endpoint() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/charts/correlation.svg").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "image/svg+xml"
    );

    let req = test::TestRequest::get().uri("/charts/pie.svg").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_predict_api() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/predict")
        .set_json(json!({
            "age": 16, "studytime": 3, "failures": 0, "absences": 2, "G1": 19, "G2": 19
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["prediction"], "Pass");
    assert!(body["confidence"].as_f64().unwrap() > 0.5);

    let req = test::TestRequest::post()
        .uri("/api/predict")
        .set_json(json!({
            "age": 16, "studytime": 3, "failures": 0, "absences": 200, "G1": 19, "G2": 19
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_model_info_and_health() {
    let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/model").to_request();
    let info: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(info["n_trees"], 25);
    assert_eq!(info["seed"], 42);
    assert_eq!(info["test_size"], 12);
    assert_eq!(info["features"].as_array().unwrap().len(), 6);
    assert_eq!(info["report"]["classes"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "Student pass predictor is running!".as_bytes());
}
