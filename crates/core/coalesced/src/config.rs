use std::time::Duration;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
/// Config values for [`CoalescionService`](crate::CoalescionService).
pub struct CoalescionServiceConfig {
    /// Minimum time a coalescing group stays open before its result is released,
    /// measured from when the shared task started. Zero disables the floor.
    pub min_window: Duration,
}

impl CoalescionServiceConfig {
    pub fn with_min_window(min_window: Duration) -> Self {
        Self { min_window }
    }
}
