use scale_common::db::{BudgetLoader, SqlExecutor};

use actix_web::web::*;
use actix_web::{error, HttpResponse};

use crate::middleware::auth::AuthGate;

mod budget;

/// Mounts the `/v0` API. Every route under it sits behind `auth_gate`. Bodies are decoded
/// as JSON whatever their content type; ones larger than `max_body_bytes` or that fail to
/// decode get an empty 400.
pub fn configure<E: SqlExecutor + BudgetLoader + Clone>(
    cfg: &mut ServiceConfig,
    auth_gate: AuthGate,
    max_body_bytes: usize,
) {
    let json_config = JsonConfig::default()
        .limit(max_body_bytes)
        .content_type_required(false)
        .error_handler(|err, _req| {
            log::warn!("Failed to decode request body: {err}");
            error::InternalError::from_response(err, HttpResponse::BadRequest().finish()).into()
        });

    cfg.service(
        scope("/v0")
            .app_data(json_config)
            .configure(budget::configure::<E>)
            .wrap(auth_gate),
    );
}
