//! Rostra: a small server-rendered blogging platform.
//!
//! Users author posts, optionally attached to a group and an image,
//! comment on each other's posts, and follow authors to build a
//! personalized feed. The interesting parts live in three places:
//!
//! - [`application::feed`] composes the filtered, ordered candidate set
//!   for each listing view (global, group, profile, followed authors);
//! - [`application::pagination`] slices a candidate set into 1-indexed
//!   pages with a clamp-to-last-page policy for bad page input;
//! - [`cache`] memoizes the rendered index page for a fixed window,
//!   deliberately serving stale content until the window elapses.
//!
//! Everything else is conventional glue: axum handlers, askama
//! templates, sqlx repositories, layered configuration.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
