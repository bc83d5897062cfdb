use crate::background::*;
use crate::compute_conflicts::*;
use crate::error::*;
use crate::generator::*;
use crate::schedule_api::*;
use ::serde::{Deserialize, Serialize};
use actix_web::http::header;
use actix_web::*;
use lazy_static::*;
use log::*;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

const DOWNLOAD_FILE_NAME: &str = "tkb.png";

pub fn get_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub served: u64,
    pub failed: u64,
    pub last_render: Option<u64>,
}

impl RenderStats {
    fn record<T>(&mut self, result: &TkbResult<T>) {
        match result {
            Ok(_) => self.served += 1,
            Err(_) => self.failed += 1,
        }
        self.last_render = Some(get_unix_timestamp());
    }
}

// Counters only; renders share nothing else
lazy_static! {
    pub static ref RENDER_STATS: Arc<Mutex<RenderStats>> =
        Arc::new(Mutex::new(RenderStats::default()));
}

/// Per-server render setup, shared read-only by every worker.
pub struct AppState {
    pub renderer: GridRenderer,
    pub background: BackgroundSource,
}

impl AppState {
    pub fn new(renderer: GridRenderer, background: BackgroundSource) -> Self {
        AppState {
            renderer,
            background,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    data: RowInput,
    #[serde(default)]
    week: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Serialize)]
struct IdentifiedCourse {
    id: String,
    #[serde(flatten)]
    course: Course,
}

#[derive(Debug, Serialize)]
struct ReturnPreview {
    image: String,
    courses: Vec<IdentifiedCourse>,
    conflicts: Vec<Conflict>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Status {
    alive: bool,
    renders_served: u64,
    renders_failed: u64,
    seconds_since_last_render: Option<u64>,
}

fn error_response(e: TkbError) -> HttpResponse {
    error!("Render failed: {}", e);

    let body = ErrorMessage {
        message: e.to_string(),
    };

    if e.is_client_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

async fn record_render<T>(result: &TkbResult<T>) {
    let mut lock = RENDER_STATS.lock().await;
    lock.record(result);
    drop(lock);
}

/// Background load stays on the worker; plan, paint and encode run on the
/// blocking pool.
async fn render_request(state: &AppState, request: RenderRequest) -> TkbResult<(RenderPlan, Vec<u8>)> {
    let background = load_background(&state.background).await?;
    let renderer = state.renderer.clone();

    web::block(move || renderer.draw(background, request.data, request.week)).await?
}

/// Renders the posted rows and answers with the PNG itself.
#[post("/api/tkb_download/")]
pub async fn tkb_download(state: web::Data<AppState>, post: web::Json<RenderRequest>) -> HttpResponse {
    let request = post.into_inner();

    let result = render_request(&state, request).await.map(|(_, png)| png);

    record_render(&result).await;

    match result {
        Ok(png) => {
            info!("Serving timetable image ({} bytes)", png.len());
            HttpResponse::Ok()
                .content_type("image/png")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
                ))
                .body(png)
        }
        Err(e) => error_response(e),
    }
}

/// Same render, answered as JSON with the data URI and the parsed courses
/// and conflicts it was drawn from.
#[post("/api/tkb_preview/")]
pub async fn tkb_preview(state: web::Data<AppState>, post: web::Json<RenderRequest>) -> HttpResponse {
    let request = post.into_inner();

    let result = render_request(&state, request).await;

    record_render(&result).await;

    match result {
        Ok((plan, png)) => {
            let courses = plan
                .courses
                .into_iter()
                .map(|(id, course)| IdentifiedCourse { id, course })
                .collect();

            HttpResponse::Ok().json(ReturnPreview {
                image: png_data_uri(&png),
                courses,
                conflicts: plan.conflicts,
            })
        }
        Err(e) => error_response(e),
    }
}

#[get("/status")]
pub async fn get_status() -> HttpResponse {
    let lock = RENDER_STATS.lock().await;
    let stats = lock.clone();
    drop(lock);

    HttpResponse::Ok().json(Status {
        alive: true,
        renders_served: stats.served,
        renders_failed: stats.failed,
        seconds_since_last_render: stats
            .last_render
            .map(|last| get_unix_timestamp().saturating_sub(last)),
    })
}

/// Registers the routes and a JSON body limit whose errors use the same
/// `{"message": ...}` shape as render errors.
pub fn configure(cfg: &mut web::ServiceConfig, max_body_bytes: usize) {
    let json_config = web::JsonConfig::default()
        .limit(max_body_bytes)
        .error_handler(|err, _req| {
            let body = ErrorMessage {
                message: err.to_string(),
            };
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        });

    cfg.app_data(json_config)
        .service(tkb_download)
        .service(tkb_preview)
        .service(get_status);
}
