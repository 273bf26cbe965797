//! JSON data endpoint for signed-in users.

use axum::Json;
use gatehouse_tools::SampleData;

use crate::auth::RequireAuth;

/// Returns the sample data set, labelled with the caller's email or name.
pub async fn data(RequireAuth(user): RequireAuth) -> Json<SampleData> {
    Json(SampleData::for_user(&user))
}
