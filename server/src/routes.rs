use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum request body size to accept. Detection submissions may
/// carry an inline image reference.
const MAX_BODY_LENGTH: u64 = 16 * 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        MissingFields
        | InvalidId(..)
        | InvalidFillLevel(..)
        | InvalidBattery(..)
        | InvalidStatus(..)
        | InvalidUserType(..)
        | InvalidItem { .. }
        | EmailAlreadyExists
        | BinIdAlreadyExists => StatusCode::BAD_REQUEST,
        InvalidCredentials => StatusCode::UNAUTHORIZED,
        NonExistentUser(..) | NonExistentBin(..) => StatusCode::NOT_FOUND,
        Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Sqlx { .. } | CredentialHash => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post, put, query};

    use super::{handlers, query as q, MAX_BODY_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let r = environment.urls.api_path.clone();

            let $route_variable = warp::any()
                .map(move || environment.clone())
                .and(p(r));

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_register_route => register, rt; p("auth"), p("register"), end(), post(), warp::body::content_length_limit(MAX_BODY_LENGTH), warp::body::json());
    route!(make_login_route => login, rt; p("auth"), p("login"), end(), post(), warp::body::content_length_limit(MAX_BODY_LENGTH), warp::body::json());
    route!(make_bins_list_route => bins_list, rt; p("bins"), end(), g());
    route!(make_bin_retrieve_route => bin_retrieve, rt; p("bins"), par::<String>(), end(), g());
    route!(make_bin_create_route => bin_create, rt; p("bins"), end(), post(), warp::body::content_length_limit(MAX_BODY_LENGTH), warp::body::json());
    route!(make_bin_update_route => bin_update, rt; p("bins"), par::<String>(), end(), put(), warp::body::content_length_limit(MAX_BODY_LENGTH), warp::body::json());
    route!(make_bin_delete_route => bin_delete, rt; p("bins"), par::<String>(), end(), delete());
    route!(make_user_retrieve_route => user_retrieve, rt; p("users"), par::<String>(), end(), g());
    route!(make_recycle_route => recycle, rt; p("recycle"), end(), post(), warp::body::content_length_limit(MAX_BODY_LENGTH), warp::body::json());
    route!(make_detections_route => detections, rt; p("detections"), par::<String>(), end(), g(), query::<q::DetectionsQuery>());
}
