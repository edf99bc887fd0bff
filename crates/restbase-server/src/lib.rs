//! restbase HTTP server.
//!
//! Serves every resource declared in the manifest as a REST collection:
//! `GET`/`PUT` on `/{resource}` and `GET`/`PUT`/`DELETE` on
//! `/{resource}/{id}`, plus the landing page, `/echo`, `/testDB` and
//! `/resetDB`.

pub mod cli;
pub mod handlers;
pub mod server;

pub use cli::{init_logging, run, Args};
pub use server::{build_router, start_server, AppState};
