use super::error::*;
use crate::application_port::*;
use crate::domain_model::{ProfileDetails, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn message(message: &'static str) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::ok(MessageResponse { message }))
}

// region auth

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub birth_year: i32,
    pub birth_month: u32,
    pub birth_day: u32,
    pub gender: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub session: SessionInfo,
    pub message: &'static str,
}

pub async fn register(
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        password: body.password,
        birth_year: body.birth_year,
        birth_month: body.birth_month,
        birth_day: body.birth_day,
        gender: body.gender,
    };
    let session = auth_service
        .signup(signup_input)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(RegisterResponse {
        session,
        message: "Register success! Please verify your email to start",
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let session = auth_service
        .login(login_input)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(session)))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh_token(&body.refresh_token)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

pub async fn activate(
    body: ActivateRequest,
    user_id: UserId,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .activate(user_id, &body.token)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(message("Account has been activated successfully"))
}

pub async fn send_verification(
    user_id: UserId,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .resend_verification(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(message("Email verification link has been sent to your email"))
}

// endregion

// region password reset

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

pub async fn find_user(
    body: EmailRequest,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let found = user_service
        .find_user(&body.email)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(found)))
}

pub async fn send_reset_code(
    body: EmailRequest,
    password_reset_service: Arc<dyn PasswordResetService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    password_reset_service
        .send_code(&body.email)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(message("Email reset code has been sent to your email"))
}

#[derive(Debug, Deserialize)]
pub struct ValidateCodeRequest {
    pub email: String,
    pub code: String,
}

pub async fn validate_reset_code(
    body: ValidateCodeRequest,
    password_reset_service: Arc<dyn PasswordResetService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    password_reset_service
        .validate_code(&body.email, &body.code)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(message("ok"))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub email: String,
    pub code: String,
    pub password: String,
}

pub async fn change_password(
    body: ChangePasswordRequest,
    password_reset_service: Arc<dyn PasswordResetService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    password_reset_service
        .change_password(ChangePasswordInput {
            email: body.email,
            code: body.code,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(message("Password has been changed"))
}

// endregion

// region profile

pub async fn get_profile(
    username: String,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = user_service
        .get_profile(user_id, &username)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

pub async fn update_details(
    body: ProfileDetails,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let details = user_service
        .update_details(user_id, body)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(details)))
}

pub async fn list_relations(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let lists = relationship_service
        .list_relations(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(lists)))
}

// endregion

// region relationship

/// The relationship changes reachable as `PUT /{action}/{id}`.
#[derive(Debug, Clone, Copy)]
pub enum RelationAction {
    SendRequest,
    CancelRequest,
    Follow,
    Unfollow,
    AcceptRequest,
    Unfriend,
    DeleteRequest,
}

impl RelationAction {
    pub fn path(&self) -> &'static str {
        match self {
            RelationAction::SendRequest => "add_friend",
            RelationAction::CancelRequest => "cancel_request",
            RelationAction::Follow => "follow",
            RelationAction::Unfollow => "unfollow",
            RelationAction::AcceptRequest => "accept_request",
            RelationAction::Unfriend => "unfriend",
            RelationAction::DeleteRequest => "delete_request",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            RelationAction::SendRequest => "friend request has been sent",
            RelationAction::CancelRequest => "you successfully canceled request",
            RelationAction::Follow => "follow success",
            RelationAction::Unfollow => "unfollow success",
            RelationAction::AcceptRequest => "friend request accepted",
            RelationAction::Unfriend => "unfriend request accepted",
            RelationAction::DeleteRequest => "delete request accepted",
        }
    }
}

pub async fn change_relation(
    action: RelationAction,
    other: UserId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = match action {
        RelationAction::SendRequest => relationship_service.send_request(user_id, other).await,
        RelationAction::CancelRequest => relationship_service.cancel_request(user_id, other).await,
        RelationAction::Follow => relationship_service.follow(user_id, other).await,
        RelationAction::Unfollow => relationship_service.unfollow(user_id, other).await,
        RelationAction::AcceptRequest => relationship_service.accept_request(user_id, other).await,
        RelationAction::Unfriend => relationship_service.unfriend(user_id, other).await,
        RelationAction::DeleteRequest => relationship_service.delete_request(user_id, other).await,
    };
    result.map_err(ApiError::from).map_err(reject::custom)?;

    Ok(message(action.success_message()))
}

pub async fn relationship_status(
    other: UserId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = relationship_service
        .relationship_status(user_id, other)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(status)))
}

// endregion
