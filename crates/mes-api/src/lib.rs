//! mes-api — HTTP client for the MES REST API.
//!
//! [`MesClient`] covers the endpoints the client needs: the four resource
//! listings, login and registration. It also implements
//! [`mes_core::search::ResourceSource`], which is how the search aggregator
//! reaches the network.

pub mod client;
pub mod error;

pub use client::MesClient;
pub use error::ApiError;
