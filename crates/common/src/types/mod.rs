use serde::{Deserialize, Serialize};

/// Body of `GET /api/health`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: String,
    pub database: String,
}

impl Health {
    pub fn ok() -> Self {
        Self { status: "ok".into(), database: "ok".into() }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self { status: "degraded".into(), database: reason.into() }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
