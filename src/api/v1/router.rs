use super::error::*;
use super::handler::{self, RelationAction};
use crate::application_port::{AuthService, RelationshipService};
use crate::domain_model::UserId;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // TODO: need a timeout
    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let activate = warp::post()
        .and(warp::path("activate"))
        .and(warp::path::end())
        .and(json_body())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::activate);

    let send_verification = warp::post()
        .and(warp::path("send_verification"))
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::send_verification);

    let find_user = warp::post()
        .and(warp::path("find_user"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.user_service.clone()))
        .and_then(handler::find_user);

    let send_reset_code = warp::post()
        .and(warp::path("send_reset_code"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.password_reset_service.clone()))
        .and_then(handler::send_reset_code);

    let validate_reset_code = warp::post()
        .and(warp::path("validate_reset_code"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.password_reset_service.clone()))
        .and_then(handler::validate_reset_code);

    let change_password = warp::post()
        .and(warp::path("change_password"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.password_reset_service.clone()))
        .and_then(handler::change_password);

    let profile = warp::get()
        .and(warp::path("profile"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::get_profile);

    let update_details = warp::put()
        .and(warp::path("profile"))
        .and(warp::path("details"))
        .and(warp::path::end())
        .and(json_body())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::update_details);

    let friends = warp::get()
        .and(warp::path("friends"))
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_relations);

    let relationship = warp::get()
        .and(warp::path("relationship"))
        .and(warp::path::param::<UserId>())
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::relationship_status);

    let relation_actions = relation_route(RelationAction::SendRequest, server.clone())
        .or(relation_route(RelationAction::CancelRequest, server.clone()))
        .or(relation_route(RelationAction::Follow, server.clone()))
        .or(relation_route(RelationAction::Unfollow, server.clone()))
        .or(relation_route(RelationAction::AcceptRequest, server.clone()))
        .or(relation_route(RelationAction::Unfriend, server.clone()))
        .or(relation_route(RelationAction::DeleteRequest, server.clone()));

    register
        .or(login)
        .or(refresh)
        .or(activate)
        .or(send_verification)
        .or(find_user)
        .or(send_reset_code)
        .or(validate_reset_code)
        .or(change_password)
        .or(profile)
        .or(update_details)
        .or(friends)
        .or(relationship)
        .or(relation_actions)
}

/// `PUT /{action}/{id}`: the caller acts on the account `id`.
fn relation_route(
    action: RelationAction,
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::put()
        .and(warp::path(action.path()))
        .and(warp::path::param::<UserId>())
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(
            move |other: UserId,
                  user_id: UserId,
                  relationship_service: Arc<dyn RelationshipService>| {
                handler::change_relation(action, other, user_id, relationship_service)
            },
        )
}

fn json_body<T: DeserializeOwned + Send>()
-> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user_id = auth_service
                    .verify_token(token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)?;
                Ok(user_id)
            } else {
                Err(reject::custom(ApiError::new(
                    ApiErrorCode::InvalidToken,
                    "expected a Bearer token",
                )))
            }
        }
    })
}
