use crate::models::SessionSummary;
use crate::session::ApiKey;
use crate::utils::responses::ResponseBuilder;
use actix_web::HttpResponse;

/// Summary of the session the request authenticated as
pub async fn me(key: ApiKey) -> HttpResponse {
    ResponseBuilder::ok(&SessionSummary::from(&*key))
}
