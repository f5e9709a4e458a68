//! Account HTTP handlers.
//!
//! ```text
//! POST /auth/register {"name":"Ada","email":"ada@example.com","password":"hunter22"}
//! POST /auth/login {"email":"ada@example.com","password":"hunter22"}
//! GET /api/profile
//! PUT /users/{id}/promote
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::UserProfile;
use crate::domain::{
    CredentialsValidationError, Error, IssuedToken, LoginCredentials, Registration, UserId,
    UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::{AdminUser, AuthenticatedUser};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Sign-up payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestBody {
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "hunter22", min_length = 6)]
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestBody {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

/// Bearer token returned by a successful login.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponseBody {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(format = "date-time")]
    pub expires_at: String,
}

impl From<IssuedToken> for TokenResponseBody {
    fn from(value: IssuedToken) -> Self {
        Self {
            token: value.token,
            token_type: "Bearer".to_owned(),
            expires_at: value.expires_at.to_rfc3339(),
        }
    }
}

/// Public view of an account.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub coin_balance: u64,
    #[schema(example = "user")]
    pub role: String,
    #[schema(format = "date-time")]
    pub created_at: String,
}

impl From<UserProfile> for ProfileResponseBody {
    fn from(value: UserProfile) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name.as_ref().to_owned(),
            email: value.email.to_string(),
            coin_balance: value.coin_balance.value(),
            role: value.role.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

fn field_error(field: &str, code: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    let message = err.to_string();
    match err {
        CredentialsValidationError::User(UserValidationError::EmptyName)
        | CredentialsValidationError::User(UserValidationError::NameTooLong { .. }) => {
            field_error("name", "invalid_name", message)
        }
        CredentialsValidationError::User(UserValidationError::InvalidEmail) => {
            field_error("email", "invalid_email", message)
        }
        CredentialsValidationError::PasswordTooShort { .. } => {
            field_error("password", "password_too_short", message)
        }
        CredentialsValidationError::EmptyPassword => {
            field_error("password", "empty_password", message)
        }
        CredentialsValidationError::User(_) => Error::invalid_request(message),
    }
}

/// Create an account with the starting coin balance.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequestBody,
    responses(
        (status = 201, description = "Account created", body = ProfileResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequestBody>,
) -> ApiResult<HttpResponse> {
    let RegisterRequestBody {
        name,
        email,
        password,
    } = payload.into_inner();
    let registration =
        Registration::try_from_parts(&name, &email, password).map_err(map_credentials_error)?;
    let created = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(ProfileResponseBody::from(created)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequestBody,
    responses(
        (status = 200, description = "Login success", body = TokenResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequestBody>,
) -> ApiResult<web::Json<TokenResponseBody>> {
    let LoginRequestBody { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, password).map_err(map_credentials_error)?;
    let token = state.accounts.login(credentials).await?;
    Ok(web::Json(TokenResponseBody::from(token)))
}

/// Return the caller's account, including the current coin balance.
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponseBody),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "getProfile",
    security(("BearerToken" = []))
)]
#[get("/api/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<ProfileResponseBody>> {
    let account = state.profiles.profile(user.user_id()).await?;
    Ok(web::Json(ProfileResponseBody::from(account)))
}

fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "id", "value": raw, "code": "invalid_uuid" }))
    })
}

/// Grant the admin role to another account.
#[utoipa::path(
    put,
    path = "/users/{id}/promote",
    params(("id" = String, Path, format = "uuid", description = "Account identifier")),
    responses(
        (status = 200, description = "Account is now an administrator", body = ProfileResponseBody),
        (status = 400, description = "Invalid account id", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "promoteUser",
    security(("BearerToken" = []))
)]
#[put("/users/{id}/promote")]
pub async fn promote_user(
    state: web::Data<HttpState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProfileResponseBody>> {
    let user_id = parse_user_id(&path.into_inner())?;
    let promoted = state.accounts.promote(&user_id).await?;
    info!(admin_id = %admin.user_id(), user_id = %promoted.id, "account promoted");
    Ok(web::Json(ProfileResponseBody::from(promoted)))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
