//! User administration (`/auth/users`, `/auth/register`, `/auth/set-active`)

use fleet_client::{ApiClient, ApiRequest, Result};
use serde::Serialize;
use serde::de::IgnoredAny;

use crate::types::user::UserList;
use crate::types::{NewUser, User, UserUpdate};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    changes: &'a UserUpdate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetActiveRequest<'a> {
    user_id: &'a str,
    active: bool,
}

pub async fn list(client: &ApiClient) -> Result<Vec<User>> {
    let list: UserList = client
        .call(ApiRequest::get("/auth/users"), "Failed to fetch users")
        .await?;
    Ok(list.users)
}

pub async fn create(client: &ApiClient, user: &NewUser) -> Result<User> {
    let request = ApiRequest::post("/auth/register").json(user)?;
    client.call(request, "Failed to create user").await
}

/// Update a user; the id travels in the body as `userId`.
pub async fn update(client: &ApiClient, user_id: &str, changes: &UserUpdate) -> Result<User> {
    let request = ApiRequest::patch("/auth/users").json(&UpdateUserRequest { user_id, changes })?;
    client.call(request, "Failed to update user").await
}

pub async fn set_active(client: &ApiClient, user_id: &str, active: bool) -> Result<()> {
    let request = ApiRequest::post("/auth/set-active").json(&SetActiveRequest { user_id, active })?;
    let default_message = if active {
        "Failed to activate user"
    } else {
        "Failed to deactivate user"
    };
    client
        .call::<IgnoredAny>(request, default_message)
        .await
        .map(|_| ())
}
