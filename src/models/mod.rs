pub mod auth;
pub mod capture;
pub mod driver;
pub mod live_event;
pub mod package;

pub use auth::{AuthResponse, Role};
pub use capture::{CaptureError, CaptureSession, CloseOutcome, GeoFix, PickedFile, SubmissionPayload};
pub use driver::{DriverPosition, DriverStats, MapData, MapPackage};
pub use live_event::{ClosedNotice, LiveEvent};
pub use package::{Package, PackageStatus, ProofImage};
