use std::time::{Duration, Instant};

use log::debug;
use uuid::Uuid;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::auth;
use crate::bins::{BinPatch, NewBin};
use crate::detection::RecycleRequest;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    query::DetectionsQuery,
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::user::{LoginAttempt, LoginRequest, NewUser, RegistrationRequest, StoredCredentials, User};

const SERVER_TIMING_HEADER: &str = "server-timing";

/// Hard ceiling on the detections listing, whatever the caller asks for.
const MAX_DETECTIONS_LIMIT: i64 = 50;

type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn register(environment: Environment, request: RegistrationRequest) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::register(), e);

        debug!(environment.logger, "Validating registration...");
        let registration = request.into_validated().map_err(&error_handler)?;

        debug!(environment.logger, "Hashing credential...");
        let password_hash = auth::hash_credential(&registration.password).map_err(&error_handler)?;

        debug!(environment.logger, "Creating user..."; "email" => &registration.email);
        let user = environment
            .db
            .insert_user(NewUser::new(registration, password_hash))
            .await
            .map_err(&error_handler)?;

        with_header(
            with_status(json(&user), StatusCode::CREATED),
            "location",
            environment.urls.user(user.id()).as_str(),
        )
    }
}

pub async fn login(environment: Environment, request: LoginRequest) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::login(), e);

        let attempt = request.into_validated().map_err(&error_handler)?;

        debug!(environment.logger, "Looking up credentials..."; "email" => &attempt.email);
        let stored = environment
            .db
            .retrieve_credentials(&attempt.email)
            .await
            .map_err(&error_handler)?
            .ok_or(BackendError::InvalidCredentials)
            .map_err(&error_handler)?;

        debug!(environment.logger, "Verifying credential...");
        let user = verify_login(attempt, stored).map_err(&error_handler)?;

        json(&user)
    }
}

pub async fn bins_list(environment: Environment) -> RouteResult {
    timed! {
        debug!(environment.logger, "Listing bins...");
        let bins = environment
            .db
            .list_bins()
            .await
            .map_err(|e: BackendError| Rejection::new(Context::bins_list(), e))?;

        json(&bins)
    }
}

pub async fn bin_retrieve(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::bin_retrieve(id.clone()), e);

        let bin_id = parse_id(&id).map_err(&error_handler)?;
        debug!(environment.logger, "Retrieving bin..."; "id" => %bin_id);

        let bin = environment
            .db
            .retrieve_bin(&bin_id)
            .await
            .map_err(&error_handler)?
            .ok_or(BackendError::NonExistentBin(bin_id))
            .map_err(&error_handler)?;

        json(&bin)
    }
}

pub async fn bin_create(environment: Environment, fields: NewBin) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::bin_create(), e);

        fields.validate().map_err(&error_handler)?;
        debug!(environment.logger, "Creating bin..."; "public_id" => &fields.public_id);

        let bin = environment
            .db
            .insert_bin(fields)
            .await
            .map_err(&error_handler)?;

        with_status(json(&bin), StatusCode::CREATED)
    }
}

pub async fn bin_update(environment: Environment, id: String, patch: BinPatch) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::bin_update(id.clone()), e);

        let bin_id = parse_id(&id).map_err(&error_handler)?;
        patch.validate().map_err(&error_handler)?;
        debug!(environment.logger, "Updating bin..."; "id" => %bin_id);

        let bin = environment
            .db
            .update_bin(&bin_id, patch)
            .await
            .map_err(&error_handler)?
            .ok_or(BackendError::NonExistentBin(bin_id))
            .map_err(&error_handler)?;

        json(&bin)
    }
}

pub async fn bin_delete(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::bin_delete(id.clone()), e);

        let bin_id = parse_id(&id).map_err(&error_handler)?;
        debug!(environment.logger, "Deleting bin..."; "id" => %bin_id);

        let deleted = environment
            .db
            .delete_bin(&bin_id)
            .await
            .map_err(&error_handler)?
            .ok_or(BackendError::NonExistentBin(bin_id))
            .map_err(&error_handler)?;

        json(&SuccessResponse::BinDeleted {
            message: "Bin deleted successfully",
            deleted_bin: deleted,
        })
    }
}

pub async fn user_retrieve(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::user_retrieve(id.clone()), e);

        let user_id = parse_id(&id).map_err(&error_handler)?;
        debug!(environment.logger, "Retrieving user..."; "id" => %user_id);

        let user = environment
            .db
            .retrieve_user(&user_id)
            .await
            .map_err(&error_handler)?
            .ok_or(BackendError::NonExistentUser(user_id))
            .map_err(&error_handler)?;

        json(&user)
    }
}

pub async fn recycle(environment: Environment, request: RecycleRequest) -> RouteResult {
    timed! {
        let RecycleRequest { user_id, item } = request;

        let error_handler = |e: BackendError| Rejection::new(Context::recycle(user_id.clone()), e);

        let raw_id = user_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(BackendError::MissingFields)
            .map_err(&error_handler)?;
        let item = item
            .ok_or(BackendError::MissingFields)
            .map_err(&error_handler)?;

        let id = parse_id(&raw_id).map_err(&error_handler)?;
        item.validate().map_err(&error_handler)?;

        debug!(environment.logger, "Recording recycling event..."; "user_id" => %id, "type" => &item.item_type);
        let receipt = environment
            .db
            .submit_recycling(&id, item)
            .await
            .map_err(&error_handler)?;

        debug!(environment.logger, "Sending receipt..."; "user_id" => %id);
        json(&SuccessResponse::Recycle {
            message: "Recycling recorded successfully",
            updated_user: receipt.updated_user,
            saved_detection: receipt.saved_detection,
        })
    }
}

pub async fn detections(
    environment: Environment,
    user_id: String,
    query: DetectionsQuery,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::detections(user_id.clone()), e);

        let id = parse_id(&user_id).map_err(&error_handler)?;
        let limit = query
            .limit
            .unwrap_or(environment.config.recent_detections_limit)
            .clamp(1, MAX_DETECTIONS_LIMIT);

        debug!(environment.logger, "Listing recent detections..."; "user_id" => %id, "limit" => limit);
        let detections = environment
            .db
            .recent_detections(&id, limit)
            .await
            .map_err(&error_handler)?;

        json(&detections)
    }
}

fn parse_id(raw: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(raw).map_err(|_| BackendError::InvalidId(raw.to_owned()))
}

fn verify_login(attempt: LoginAttempt, stored: StoredCredentials) -> Result<User, BackendError> {
    // wrong password and wrong role must be indistinguishable
    if auth::verify_credential(&attempt.password, &stored.password_hash)
        && stored.user.user_type() == attempt.user_type
    {
        Ok(stored.user)
    } else {
        Err(BackendError::InvalidCredentials)
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
