mod cache;
mod config;
mod db;
mod errors;
mod models;
mod proximity;
mod repositories;
mod response;
mod routes;
mod services;
mod validation;

use std::io;

use actix_cors::Cors;
use actix_web::http::{header, Method};
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use utoipa::openapi::Server;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::API_PREFIX;
use crate::services::{CSiteClient, KokWatchClient, MineCatalog};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MineNearMe API",
        description = "Community impact reporting around mining sites.\n\n\
            Stores citizen impact reports and their response timelines, threads \
            comments per case, proxies C-Site citizen reports and KokWatch map data, \
            and answers \"what is near this point\" for reports, topics and mines.",
        version = "1.0.0"
    ),
    paths(
        routes::health::health,
        routes::reports::list_reports,
        routes::reports::get_report,
        routes::reports::create_report,
        routes::reports::nearby_reports,
        routes::reports::get_actions,
        routes::reports::add_action,
        routes::reports::update_status,
        routes::reports::update_action,
        routes::reports::assign_response,
        routes::reports::create_case_report,
        routes::reports::list_case_reports,
        routes::comments::list_comments,
        routes::comments::comment_stats,
        routes::comments::create_comment,
        routes::comments::toggle_like,
        routes::comments::delete_comment,
        routes::citizen_reports::list_citizen_reports,
        routes::citizen_reports::all_citizen_reports,
        routes::citizen_reports::probe_csite,
        routes::citizen_reports::nearby_citizen_reports,
        routes::mines::nearby_mines,
        routes::kokwatch::kokwatch,
    ),
    components(schemas(
        proximity::Coordinate,
        models::ReportStatus, models::ResponseStatus, models::Priority,
        models::ImpactType, models::ActionStatus, models::EvidenceKind,
        models::Evidence, models::Reporter, models::ImpactReport,
        models::Attachment, models::Action, models::Budget, models::ResponseActionRecord,
        models::Reply, models::Comment,
        models::Position, models::CreateReportRequest, models::CaseReportRequest,
        models::AddActionRequest, models::UpdateStatusRequest, models::UpdateActionRequest,
        models::AssignResponseRequest, models::CreateCommentRequest,
        models::NearbyCitizenReportsRequest,
        models::HealthPayload, models::Pagination, models::ReportListPayload,
        models::CaseReportListPayload, models::ReportDetailPayload,
        models::CreatedReport, models::CreatedReportPayload, models::NearbyReportsPayload,
        models::CommentPagination, models::CommentListPayload, models::CommentStats,
        models::LikePayload, models::NearbyCitizenReportsResponse, models::CSiteProbeResponse,
        models::NearbyMinesPayload,
        services::csite::CitizenReport, services::mines::Mine,
    )),
    tags(
        (name = "System", description = "Health and status"),
        (name = "Reports", description = "Impact reports and their response timelines"),
        (name = "Comments", description = "Per-case discussion threads"),
        (name = "Citizen Reports", description = "C-Site topics near a point or mine"),
        (name = "Mines", description = "Mine catalogue proximity search"),
        (name = "KokWatch", description = "KokWatch map data proxy"),
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
    let cfg = config::Config::from_env();

    let pool = db::create_pool(&cfg)?;

    if cfg.csite.token.is_empty() {
        log::warn!("CSITE_TOKEN is not set; C-Site requests will be rejected upstream");
    }
    let http = reqwest::Client::builder()
        .user_agent("MineNearMe/1.0")
        .timeout(cfg.upstream_timeout)
        .build()
        .map_err(io::Error::other)?;
    let csite = web::Data::new(CSiteClient::new(http.clone(), cfg.csite.clone(), cfg.cache_ttl));
    let kokwatch = web::Data::new(KokWatchClient::new(http, cfg.kokwatch_base_url.clone()));
    log::info!("C-Site search radius: {} km", csite.radius_km());

    let catalog = MineCatalog::load(&cfg.mine_data_paths).map_err(io::Error::other)?;
    if catalog.is_empty() {
        log::warn!("Mine catalogue is empty; set MINE_DATA_PATHS to GeoJSON files");
    } else {
        log::info!("Mine catalogue ready with {} mines", catalog.len());
    }
    let catalog = web::Data::new(catalog);

    let bind = format!("{}:{}", cfg.host, cfg.port);
    log::info!("Starting MineNearMe API on {bind}");
    log::info!("Swagger UI: http://{bind}{API_PREFIX}/docs/");

    let mut openapi = ApiDoc::openapi();
    openapi.servers = Some(vec![Server::new(API_PREFIX)]);

    let openapi_url: &'static str = Box::leak(format!("{API_PREFIX}/openapi.json").into_boxed_str());
    let docs_path: &'static str = Box::leak(format!("{API_PREFIX}/docs/{{_:.*}}").into_boxed_str());
    let health_path: &'static str = Box::leak(format!("{API_PREFIX}/health").into_boxed_str());
    let cors_origins = cfg.cors_origins.clone();

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .supports_credentials()
            .max_age(86_400);

        App::new()
            .wrap(
                Logger::new(r#"%a "%r" %s %b %Dms "%{User-Agent}i""#)
                    .exclude("/health")
                    .exclude(health_path),
            )
            .wrap(cors)
            .app_data(web::Data::new(pool.clone()))
            .app_data(csite.clone())
            .app_data(kokwatch.clone())
            .app_data(catalog.clone())
            .service(SwaggerUi::new(docs_path).url(openapi_url, openapi.clone()))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .bind(&bind)?
    .run()
    .await
}
