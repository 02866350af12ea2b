use axum::{
    extract::{rejection::FormRejection, rejection::QueryRejection, Query, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::ApiResult;

#[derive(Debug, Deserialize)]
pub struct SignupParams {
    pub username: String,
    pub password: String,
}

/// OAuth2 password-grant style form body
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /signup?username=&password=
///
/// 200 `{"success": "<username> saved"}`, or 400 when the username is taken.
pub async fn signup(
    State(state): State<AppState>,
    params: Result<Query<SignupParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params.map_err(|e| ApiError::unprocessable_entity(e.body_text(), Default::default()))?;

    let username = state.authenticator.register(&params.username, &params.password).await?;
    Ok(Json(json!({ "success": format!("{} saved", username) })))
}

/// POST /login (form-encoded `username`, `password`)
///
/// 200 `{"access_token": ..., "token_type": "bearer"}`, or 401.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) = form.map_err(|e| ApiError::unprocessable_entity(e.body_text(), Default::default()))?;

    let access_token = state.authenticator.authenticate(&form.username, &form.password).await?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
