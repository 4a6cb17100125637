//! Account profile endpoints

use super::error::ClientError;
use super::gateway::{AuthenticatedGateway, OutboundRequest};
use unidash_core::IdentityProvider;
use unidash_core::models::{ChangePasswordRequest, ProfileUpdate, UserProfile};
use unidash_core::validation;

impl<P: IdentityProvider> AuthenticatedGateway<P> {
    /// Current user's profile
    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.execute(OutboundRequest::get("/account/profile/")).await
    }

    /// Apply a partial profile update and return the stored profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ClientError> {
        let request = OutboundRequest::put("/account/profile/").json(update)?;
        self.execute(request).await
    }

    /// Change the password through the data API
    pub async fn change_password(&self, change: &ChangePasswordRequest) -> Result<(), ClientError> {
        validation::validate_new_password(&change.new_password)?;
        let request = OutboundRequest::post("/account/profile/change-password/").json(change)?;
        self.execute_empty(request).await
    }
}
