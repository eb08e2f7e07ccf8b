//! GraphQL client for the dev-tools UI
//!
//! Two configurations share one cache identity rule: a server-side
//! rendering client over HTTP and a browser client over a reconnecting
//! WebSocket subscription link.

pub mod cache;
pub mod client;

pub use cache::{data_id_from_object, EntityKind, NormalizedCache};
pub use client::{
    Client, ClientFactory, GraphqlError, GraphqlRequest, HttpLink, Link, RenderContext,
    SubscriptionOptions, WebSocketLink,
};
