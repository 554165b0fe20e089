use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::prize::list_prizes,
        handlers::prize::create_prize,
        handlers::prize::get_prize,
        handlers::prize::delete_prize,
        handlers::participant::list_participants,
        handlers::participant::create_participant,
        handlers::participant::get_participant,
        handlers::participant::delete_participant,
        handlers::draw::get_eligible,
        handlers::draw::get_options,
        handlers::draw::draw,
        handlers::winner::list_winners,
        handlers::winner::dashboard,
    ),
    components(
        schemas(
            CreatePrizeRequest,
            PrizeResponse,
            CreateParticipantRequest,
            ParticipantResponse,
            ParticipantPageResponse,
            DrawRequest,
            DrawOptionsResponse,
            DrawnWinner,
            DrawResponse,
            WinnerResponse,
            WinnerPageResponse,
            DashboardResponse,
            ApiError,
        )
    ),
    tags(
        (name = "prize", description = "Prize management API"),
        (name = "participant", description = "Participant management API"),
        (name = "draw", description = "Draw API"),
        (name = "winner", description = "Winner history API"),
    ),
    info(
        title = "Giveaway Backend API",
        version = "1.0.0",
        description = "Giveaway manager REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
