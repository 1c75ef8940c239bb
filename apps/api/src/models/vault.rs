use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The slice of a user's career vault the match scorer reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct VaultProfile {
    pub target_roles: Vec<String>,
    pub skills: Vec<String>,
}
