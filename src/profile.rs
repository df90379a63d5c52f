//! Route handlers for the logged in user's profile and the onboarding step.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, User, UserID,
    db::lock_connection,
    extract::{AppJson, non_empty},
    user::{ProfileUpdate, complete_onboarding, get_user_by_id, update_profile},
};

/// The state needed for reading and updating profiles.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The profile as shown to its owner. The password hash is never included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    id: UserID,
    email: String,
    username: Option<String>,
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    age: Option<u32>,
    phone: Option<String>,
    address: Option<String>,
    onboarding_completed: bool,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            name: user.name,
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            phone: user.phone,
            address: user.address,
            onboarding_completed: user.onboarding_completed,
        }
    }
}

/// Get the logged in user's profile.
pub async fn get_profile(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Profile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_user_by_id(user_id, &connection).map(|user| Json(user.into()))
}

/// The profile fields sent by the client. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Update the logged in user's profile.
///
/// The display name only changes when both the first and last name are given.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    AppJson(form): AppJson<ProfileForm>,
) -> Result<Json<Profile>, Error> {
    let update = ProfileUpdate {
        first_name: non_empty(form.first_name.as_deref()).map(str::to_owned),
        last_name: non_empty(form.last_name.as_deref()).map(str::to_owned),
        age: form.age,
        phone: non_empty(form.phone.as_deref()).map(str::to_owned),
        address: non_empty(form.address.as_deref()).map(str::to_owned),
    };
    let connection = lock_connection(&state.db_connection)?;

    update_profile(user_id, update, &connection).map(|user| Json(user.into()))
}

/// The fields of the onboarding form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Record the logged in user's names and mark their onboarding as complete.
///
/// # Errors
///
/// Returns [Error::MissingFields] if the first or last name is missing.
pub async fn complete_onboarding_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    AppJson(form): AppJson<OnboardingForm>,
) -> Result<Json<Profile>, Error> {
    let first_name = non_empty(form.first_name.as_deref()).ok_or(Error::MissingFields)?;
    let last_name = non_empty(form.last_name.as_deref()).ok_or(Error::MissingFields)?;
    let phone = non_empty(form.phone.as_deref());
    let connection = lock_connection(&state.db_connection)?;

    let user = complete_onboarding(user_id, first_name, last_name, phone, &connection)?;
    tracing::info!("User {user_id} completed onboarding");

    Ok(Json(user.into()))
}
