// ABOUTME: Validated domain types shared by config, commands, and deploys.
// ABOUTME: Service names, image names, and deployable versions.

mod image;
mod service_name;
mod version;

pub use image::{ImageName, ImageNameError};
pub use service_name::{ServiceName, ServiceNameError};
pub use version::{Version, VersionError};
