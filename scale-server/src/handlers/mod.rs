pub mod budget;

pub mod error {
    use scale_common::messages::{ResponseType, ServerResponse};
    use scale_common::token::TokenError;

    use actix_web::http::StatusCode;
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use std::fmt;

    pub const UNAUTHORIZED_USER_MSG: &str = "Unauthorized User";

    #[derive(Debug)]
    pub enum HttpErrorResponse {
        // 401
        Unauthenticated,

        // 500
        InternalError(String),

        // 502
        StorageFailure(&'static str),
    }

    impl HttpErrorResponse {
        fn message(&self) -> &str {
            match self {
                HttpErrorResponse::Unauthenticated => UNAUTHORIZED_USER_MSG,
                HttpErrorResponse::InternalError(msg) => msg,
                HttpErrorResponse::StorageFailure(msg) => msg,
            }
        }

        fn response_type(&self) -> ResponseType {
            match self {
                HttpErrorResponse::Unauthenticated => ResponseType::Unauthenticated,
                HttpErrorResponse::InternalError(_) => ResponseType::InternalError,
                HttpErrorResponse::StorageFailure(_) => ResponseType::Persistence,
            }
        }
    }

    impl std::error::Error for HttpErrorResponse {}

    impl fmt::Display for HttpErrorResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}: {}", self.response_type(), self.message())
        }
    }

    impl actix_web::error::ResponseError for HttpErrorResponse {
        fn error_response(&self) -> HttpResponse {
            let status = self.status_code();

            HttpResponseBuilder::new(status).json(ServerResponse::error(
                status.as_u16(),
                self.message(),
                self.response_type(),
            ))
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                HttpErrorResponse::Unauthenticated => StatusCode::UNAUTHORIZED,
                HttpErrorResponse::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                HttpErrorResponse::StorageFailure(_) => StatusCode::BAD_GATEWAY,
            }
        }
    }

    impl From<actix_web::error::BlockingError> for HttpErrorResponse {
        fn from(_err: actix_web::error::BlockingError) -> Self {
            HttpErrorResponse::InternalError(String::from("Actix thread pool failure"))
        }
    }

    // The reason a token was rejected is never passed on to the client
    impl From<TokenError> for HttpErrorResponse {
        fn from(_err: TokenError) -> Self {
            HttpErrorResponse::Unauthenticated
        }
    }
}
