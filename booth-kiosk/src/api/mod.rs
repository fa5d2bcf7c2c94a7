//! HTTP API handlers for the kiosk

pub mod auth;
pub mod gallery;
pub mod health;
pub mod limits;
pub mod qr;
pub mod sessions;

pub use auth::admin_middleware;
pub use gallery::{output_list, promo_random};
pub use health::health_routes;
pub use limits::{api_rate_limiter, rate_limit_middleware, ApiRateLimiter};
pub use qr::generate_qr;
pub use sessions::{create_session, delete_session, get_session, list_photos, photo_details};
