//! Login: account lookup, active check, password comparison, role resolution.

use crate::config::ResolvedModel;
use crate::error::AppError;
use crate::store::DataStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LoginResponse {
    pub message: String,
    pub user_role: String,
    pub role_description: String,
    pub userid: String,
    pub roles: Vec<String>,
    pub stuuserid: Value,
    pub student_semester: Value,
    pub student_section: Value,
    pub teacher_userid: Value,
    pub teacher_id: Value,
}

/// Split a comma-delimited role string into trimmed, uppercased, non-empty codes.
pub fn normalize_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty())
        .collect()
}

pub struct AuthService;

impl AuthService {
    pub async fn login(
        store: &dyn DataStore,
        model: &ResolvedModel,
        req: &LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let username = req.username.as_deref().unwrap_or("");
        let password = req.password.as_deref().unwrap_or("");
        if username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest("Username and password are required".into()));
        }

        let Some(account) = store.find_account(&model.accounts, username).await? else {
            tracing::warn!(username, "login rejected: unknown user");
            return Err(AppError::InvalidCredentials);
        };
        if !account.active {
            tracing::warn!(username, "login rejected: inactive account");
            return Err(AppError::Forbidden("Account is inactive".into()));
        }
        // Stored passwords are plaintext.
        if account.password.as_deref() != Some(password) {
            tracing::warn!(username, "login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let user_roles = normalize_roles(account.roles.as_deref().unwrap_or(""));
        let Some(role) = model.roles.resolve(&user_roles) else {
            tracing::warn!(username, roles = ?user_roles, "login rejected: no recognised role");
            return Err(AppError::Forbidden("Insufficient permissions".into()));
        };
        tracing::info!(username, user_role = %role.user_role, "login");

        Ok(LoginResponse {
            message: role.message.clone(),
            user_role: role.user_role.clone(),
            role_description: role.description.clone(),
            userid: username.to_string(),
            roles: user_roles,
            stuuserid: account.student_userid,
            student_semester: account.student_semester,
            student_section: account.student_section,
            teacher_userid: account.teacher_userid,
            teacher_id: account.teacher_id,
        })
    }
}
