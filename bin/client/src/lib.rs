//! Terminal client for the boxoffice booking service.
//!
//! The binary wires a [`SessionManager`] to the HTTP client and drives it
//! through a [`Shell`](shell::Shell), which consults the route guard before
//! every view and returns to the login view when the session ends.
//!
//! [`SessionManager`]: boxoffice_session::SessionManager

pub mod commands;
pub mod config;
pub mod error;
pub mod shell;
