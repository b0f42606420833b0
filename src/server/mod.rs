//! HTTP server layer for ServerGo.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       HTTP Layer                          │
//! │                                                           │
//! │  ┌──────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │  │   gate   │ → │   handlers   │   │      routes      │   │
//! │  │ (admit/  │   │ (login form, │   │ (router + static │   │
//! │  │  deny)   │   │  healthz)    │   │  file fallback)  │   │
//! │  └──────────┘   └──────────────┘   └──────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod gate;
pub mod handlers;
pub mod routes;

pub use gate::{gate_middleware, GateState};
pub use handlers::{
    health_handler, login_page_handler, login_submit_handler, logout_handler, safe_next, AppState,
    HealthResponse, LoginForm, LoginPageQuery,
};
pub use routes::create_router;
