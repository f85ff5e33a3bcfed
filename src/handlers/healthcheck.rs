use crate::healthcheck::{self, ReportOptions};
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpResponse};

/// Aggregated reachability report
///
/// Always answers 200; the `pass` field carries the verdict.
pub async fn healthcheck(options: web::Data<ReportOptions>) -> HttpResponse {
    let report = healthcheck::run(&options).await;
    ResponseBuilder::ok(&report)
}
