use crate::dto::HealthRes;

/// Simple health service shared by every DDX surface.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "DDX is alive".into(),
        }
    }
}
