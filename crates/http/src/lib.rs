//! Unidash HTTP clients
//!
//! The data API is reached through [`client::AuthenticatedGateway`], which
//! attaches the signed-in user's credential and recovers once from an expired
//! session. [`identity::SupabaseIdentity`] is the identity provider the
//! gateway reads credentials from.

pub mod client;
pub mod identity;

pub use client::{
    ApiClientBuilder, AuthenticatedGateway, ClientError, CsvExport, OutboundRequest,
    PublicClient, UploadFile,
};
pub use identity::SupabaseIdentity;
