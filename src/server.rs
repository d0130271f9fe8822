use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{info, warn};

use crate::charts::ChartKind;
use crate::data::StudentTable;
use crate::error::{AppError, Result};
use crate::model::{StudentInput, TrainedModel};
use crate::views::{self, DashboardQuery, RenderContext};

/// Read-only state shared by every worker: the table and the forest fitted
/// from it at startup.
pub struct AppState {
    pub table: Arc<StudentTable>,
    pub model: TrainedModel,
}

impl AppState {
    fn context(&self) -> RenderContext<'_> {
        RenderContext {
            table: &self.table,
            model: &self.model,
        }
    }
}

async fn dashboard(
    query: web::Query<Vec<(String, String)>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let query = DashboardQuery::from_pairs(&query)?;
    let page = views::render(&state.context(), &query)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page))
}

async fn chart(path: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let name = path.into_inner();
    let kind = ChartKind::from_slug(name.trim_end_matches(".svg"))
        .ok_or_else(|| AppError::UnknownView(name.clone()))?;
    let svg = kind.render(&state.table)?;
    Ok(HttpResponse::Ok().content_type("image/svg+xml").body(svg))
}

async fn predict(
    req: web::Json<StudentInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let input = req.into_inner();
    if let Err(e) = input.validate() {
        warn!(error = %e, "rejected prediction request");
        return Err(e);
    }
    let response = state.model.predict(&input)?;
    Ok(HttpResponse::Ok().json(response))
}

async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.model.info())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Student pass predictor is running!")
}

/// Routes shared by the binary and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(dashboard))
        .route("/charts/{name}", web::get().to(chart))
        .route("/api/predict", web::post().to(predict))
        .route("/api/model", web::get().to(model_info))
        .route("/health", web::get().to(health_check));
}

pub async fn start_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(state);

    info!("starting dashboard on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
