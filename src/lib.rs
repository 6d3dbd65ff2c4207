// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth Gate - Bearer Token Authentication for Axum
//!
//! This crate provides an authentication gate that sits in front of Axum
//! handlers, verifies Firebase ID tokens, enforces a verified-email policy
//! and hands the verified claims to the handlers.
//!
//! ## Modules
//!
//! - `auth` - The gate: token extraction, verification, claim policy
//! - `api` - HTTP API handlers (Axum) for the standalone server
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
