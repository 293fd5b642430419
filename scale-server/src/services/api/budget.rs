use scale_common::db::{BudgetLoader, SqlExecutor};

use actix_web::web::*;

use crate::handlers::budget;

pub fn configure<E: SqlExecutor + BudgetLoader + Clone>(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/budget")
            .route("", get().to(budget::get::<E>))
            .route("", post().to(budget::update::<E>)),
    );
}
