pub mod use_idle_logout;
pub mod use_live_sync;
pub mod use_location_beacon;

pub use use_idle_logout::{use_idle_logout, DEFAULT_IDLE_MS};
pub use use_live_sync::{refresh_selection, upsert_driver_position, use_live_sync};
pub use use_location_beacon::use_location_beacon;
