use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Role of a logged-in user. Determines the capability set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Secretary,
    Teacher,
    Student,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Administrator => write!(f, "administrator"),
            Role::Secretary => write!(f, "secretary"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    /// Accepts the English names and the Spanish names used by the backend.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "administrator" | "admin" | "administrador" => Ok(Role::Administrator),
            "secretary" | "secretaria" | "administrativo" => Ok(Role::Secretary),
            "teacher" | "docente" | "profesor" => Ok(Role::Teacher),
            "student" | "alumno" | "estudiante" => Ok(Role::Student),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

/// The user performing an operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}
