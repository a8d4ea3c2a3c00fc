//! OAuth2 module for the cloud destination's credentials.
//!
//! This module provides:
//! - Token record and owner-only credential store
//! - Authorization-code client for Google's token endpoint
//! - Consent flow with a local HTTP callback listener

pub mod client;
pub mod consent;
pub mod token;

pub use client::{OAuthClient, OAuthConfig, TokenEndpoint, PHOTOS_LIBRARY_SCOPE};
pub use consent::{
    acquire_credential, AuthorizationCodeSource, ConsentFlow, ConsentState, LocalCallbackListener,
};
pub use token::{CredentialStore, OAuthToken};
