use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct AircraftFilter {
    pub category: Option<String>,
    pub min_seats: Option<i32>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl AircraftFilter {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub found: usize,
    pub synced: usize,
}
