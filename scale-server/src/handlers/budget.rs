use scale_common::db::{self, BudgetLoader, SqlExecutor};
use scale_common::messages::{ServerResponse, UpdateRequest};

use actix_web::{web, HttpResponse};

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::Identity;

pub async fn update<E: SqlExecutor + Clone>(
    executor: web::Data<E>,
    identity: Identity,
    request: web::Json<UpdateRequest>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let request = request.into_inner();

    match web::block(move || {
        let budget_dao = db::budget::Dao::new(executor.get_ref());
        budget_dao.update_budget(identity.as_str(), &request.update)
    })
    .await?
    {
        Ok(_) => (),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::StorageFailure(
                "Failed to store budget information",
            ));
        }
    }

    Ok(HttpResponse::Ok().json(ServerResponse::<()>::success(
        "Successfully created budget",
        None,
    )))
}

pub async fn get<E: SqlExecutor + BudgetLoader + Clone>(
    executor: web::Data<E>,
    identity: Identity,
) -> Result<HttpResponse, HttpErrorResponse> {
    let budget = match web::block(move || {
        let budget_dao = db::budget::Dao::new(executor.get_ref());
        budget_dao.get_budget(identity.as_str())
    })
    .await?
    {
        Ok(b) => b,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::StorageFailure(
                "Failed to retrieve budget information",
            ));
        }
    };

    Ok(HttpResponse::Ok().json(ServerResponse::success(
        "Successfully retrieved budget",
        Some(budget),
    )))
}

#[cfg(test)]
mod tests {
    use scale_common::db::testing::{self, RecordingExecutor};
    use scale_common::db::BindValue;
    use scale_common::messages::{BudgetView, ResponseType};
    use scale_common::models::category::Category;
    use scale_common::models::whitelist_item::WhiteListItem;

    use actix_web::cookie::Cookie;
    use actix_web::http::header::ContentType;
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::{Bytes, Data};
    use actix_web::App;
    use serde_json::json;

    use crate::handlers::test_utils::{auth_cookie, status_and_body, test_auth_gate};
    use crate::services;

    const MAX_BODY_BYTES: usize = 65536;

    async fn send(executor: &RecordingExecutor, req: TestRequest) -> (StatusCode, Bytes) {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(executor.clone()))
                .configure(|cfg| {
                    services::api::configure::<RecordingExecutor>(
                        cfg,
                        test_auth_gate(),
                        MAX_BODY_BYTES,
                    )
                }),
        )
        .await;

        status_and_body(test::try_call_service(&app, req.to_request()).await).await
    }

    async fn post_update(
        executor: &RecordingExecutor,
        cookie: Option<Cookie<'static>>,
        body: &str,
    ) -> (StatusCode, Bytes) {
        let mut req = TestRequest::post()
            .uri("/v0/budget")
            .insert_header(ContentType::json())
            .set_payload(String::from(body));

        if let Some(cookie) = cookie {
            req = req.cookie(cookie);
        }

        send(executor, req).await
    }

    fn envelope(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[actix_web::test]
    async fn test_update_single_category() {
        let executor = RecordingExecutor::new();

        let (status, body) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{"change":{"categories":[{"name":"rent","budget":800,"id":""}]}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            envelope(&body),
            json!({"status": 0, "message": "Successfully created budget", "type": "success"}),
        );

        let statements = executor.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].sql.starts_with(
            "INSERT INTO categories (user_id, name, budget, category_id) \
             VALUES ($1, $2, $3, $4) ON CONFLICT"
        ));
        assert_eq!(
            statements[0].binds,
            vec![
                BindValue::Text(String::from("u1")),
                BindValue::Text(String::from("rent")),
                BindValue::Double(800.0),
                BindValue::Text(String::new()),
            ],
        );
    }

    #[actix_web::test]
    async fn test_update_without_content_type() {
        let executor = RecordingExecutor::new();

        let req = TestRequest::post()
            .uri("/v0/budget")
            .cookie(auth_cookie("u1"))
            .set_payload(r#"{"change":{"categories":[{"name":"rent","budget":800,"id":""}]}}"#);
        let (status, body) = send(&executor, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope(&body)["type"], "success");
        assert_eq!(executor.call_count(), 1);

        let executor = RecordingExecutor::new();

        let req = TestRequest::post()
            .uri("/v0/budget")
            .cookie(auth_cookie("u1"))
            .insert_header(ContentType::plaintext())
            .set_payload(r#"{"change":{"whitelist":[{"category":"rent","name":"Landlord"}]}}"#);
        let (status, _) = send(&executor, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(executor.call_count(), 1);
    }

    #[actix_web::test]
    async fn test_update_treats_null_ids_as_new() {
        let executor = RecordingExecutor::new();

        let (status, _) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{
                "change": {
                    "categories": [{"name": "rent", "budget": 800, "id": null}],
                    "whitelist": [{"category": "rent", "name": "Landlord", "id": null}]
                }
            }"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);

        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].binds[3], BindValue::Text(String::new()));
        assert_eq!(statements[1].binds[3], BindValue::Text(String::new()));
    }

    #[actix_web::test]
    async fn test_update_writes_categories_before_whitelist() {
        let executor = RecordingExecutor::new();

        let (status, _) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{
                "change": {
                    "whitelist": [{"category": "food", "name": "Grocer"}],
                    "categories": [{"name": "food", "budget": 250.5}]
                }
            }"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);

        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].sql.starts_with("INSERT INTO categories "));
        assert!(statements[1].sql.starts_with("INSERT INTO whitelist "));
        assert_eq!(
            statements[1].binds,
            vec![
                BindValue::Text(String::from("u1")),
                BindValue::Text(String::from("food")),
                BindValue::Text(String::from("Grocer")),
                BindValue::Text(String::new()),
            ],
        );
    }

    #[actix_web::test]
    async fn test_update_ignores_client_supplied_owner() {
        let executor = RecordingExecutor::new();

        let (status, _) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{"change":{"categories":[{"user_id":"mallory","name":"rent","budget":1,"id":"c9"}]}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);

        let statements = executor.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].binds[0], BindValue::Text(String::from("u1")));
        assert!(!statements[0]
            .binds
            .contains(&BindValue::Text(String::from("mallory"))));
    }

    #[actix_web::test]
    async fn test_empty_and_remove_only_requests_write_nothing() {
        for body in [
            "{}",
            r#"{"change":{}}"#,
            r#"{"remove":{"categories":[{"name":"rent","budget":800,"id":"c1"}]}}"#,
        ] {
            let executor = RecordingExecutor::new();
            let (status, body) = post_update(&executor, Some(auth_cookie("u1")), body).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(envelope(&body)["type"], "success");
            assert_eq!(executor.call_count(), 0);
        }
    }

    #[actix_web::test]
    async fn test_update_without_cookie_rejected() {
        let executor = RecordingExecutor::new();

        let (status, body) = post_update(
            &executor,
            None,
            r#"{"change":{"categories":[{"name":"rent","budget":800,"id":""}]}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            envelope(&body),
            json!({"status": 401, "message": "Unauthorized User", "type": "unauthenticated"}),
        );
        assert_eq!(executor.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_malformed_body_rejected_with_empty_response() {
        let executor = RecordingExecutor::new();

        let (status, body) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{"change":{"categories":[{"name":"rent","budget":"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
        assert_eq!(executor.call_count(), 0);

        let (status, body) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{"change":{"categories":[{"name":"rent","budget":"lots"}]}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
        assert_eq!(executor.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_category_failure_skips_whitelist() {
        let executor = RecordingExecutor::failing_at_call(0);

        let (status, body) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{"change":{"categories":[{"name":"rent","budget":800}],"whitelist":[{"category":"rent","name":"Landlord"}]}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let envelope = envelope(&body);
        assert_eq!(envelope["status"], 502);
        assert_eq!(envelope["message"], "Failed to store budget information");
        assert_eq!(envelope["type"], "persistence");

        assert_eq!(executor.call_count(), 1);
    }

    #[actix_web::test]
    async fn test_whitelist_failure_reported() {
        let executor = RecordingExecutor::failing_at_call(1);

        let (status, body) = post_update(
            &executor,
            Some(auth_cookie("u1")),
            r#"{"change":{"categories":[{"name":"rent","budget":800}],"whitelist":[{"category":"rent","name":"Landlord"}]}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            envelope(&body)["message"],
            "Failed to store budget information"
        );
        assert_eq!(executor.call_count(), 2);
    }

    #[actix_web::test]
    async fn test_get_without_cookie_rejected() {
        let executor = RecordingExecutor::new();

        let (status, body) = send(&executor, TestRequest::get().uri("/v0/budget")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(envelope(&body)["type"], "unauthenticated");
        assert!(executor.loads().is_empty());
    }

    #[actix_web::test]
    async fn test_get_returns_budget() {
        let executor = RecordingExecutor::with_budget(BudgetView {
            categories: vec![Category {
                name: String::from("rent"),
                budget: 800.0,
                id: String::from("c1"),
            }],
            whitelist: vec![WhiteListItem {
                category: String::from("rent"),
                name: String::from("Landlord"),
                id: String::new(),
            }],
        });

        let req = TestRequest::get()
            .uri("/v0/budget")
            .cookie(auth_cookie("u1"));
        let (status, body) = send(&executor, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            envelope(&body),
            json!({
                "status": 0,
                "message": "Successfully retrieved budget",
                "type": "success",
                "result": {
                    "categories": [{"name": "rent", "budget": 800.0, "id": "c1"}],
                    "whitelist": [{"category": "rent", "name": "Landlord", "id": ""}]
                }
            }),
        );

        assert_eq!(executor.loads(), vec![String::from("u1")]);
        assert_eq!(executor.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_get_storage_failure() {
        let executor = RecordingExecutor::failing_loads();

        let req = TestRequest::get()
            .uri("/v0/budget")
            .cookie(auth_cookie("u1"));
        let (status, body) = send(&executor, req).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            envelope(&body),
            json!({
                "status": 502,
                "message": "Failed to retrieve budget information",
                "type": "persistence"
            }),
        );
        assert_eq!(executor.loads(), vec![String::from("u1")]);
    }

    #[actix_web::test]
    #[ignore = "requires a PostgreSQL database configured through SCALE_DB_* variables"]
    async fn test_update_then_get() {
        let db_thread_pool = testing::db_thread_pool();
        let user_id = format!("test-user-{}", uuid::Uuid::now_v7());

        let app = test::init_service(
            App::new()
                .app_data(Data::new(db_thread_pool.clone()))
                .configure(|cfg| {
                    services::api::configure::<scale_common::db::DbThreadPool>(
                        cfg,
                        test_auth_gate(),
                        MAX_BODY_BYTES,
                    )
                }),
        )
        .await;

        for body in [
            r#"{"change":{"categories":[{"name":"rent","budget":800,"id":""},{"name":"food","budget":200,"id":""}],"whitelist":[{"category":"food","name":"Grocer","id":""}]}}"#,
            r#"{"change":{"categories":[{"name":"rent","budget":950,"id":"c1"}]}}"#,
        ] {
            let req = TestRequest::post()
                .uri("/v0/budget")
                .cookie(auth_cookie(&user_id))
                .insert_header(ContentType::json())
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = TestRequest::get()
            .uri("/v0/budget")
            .cookie(auth_cookie(&user_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let response: scale_common::messages::ServerResponse<BudgetView> =
            test::read_body_json(resp).await;
        assert_eq!(response.response_type, ResponseType::Success);

        let budget = response.result.unwrap();
        let names = budget
            .categories
            .iter()
            .map(|c| (c.name.as_str(), c.budget, c.id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![("food", 200.0, ""), ("rent", 950.0, "c1")]);
        assert_eq!(budget.whitelist.len(), 1);
        assert_eq!(budget.whitelist[0].name, "Grocer");
    }
}
