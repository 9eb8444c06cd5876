// user_context.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rol del usuario dentro del departamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Admin,
  ChiefEngineer,
  SuperintendingEngineer,
  ExecutiveEngineer,
  DataEntry,
  Viewer,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Role::Admin => "admin",
      Role::ChiefEngineer => "chief_engineer",
      Role::SuperintendingEngineer => "superintending_engineer",
      Role::ExecutiveEngineer => "executive_engineer",
      Role::DataEntry => "data_entry",
      Role::Viewer => "viewer",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for Role {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
      "admin" => Ok(Role::Admin),
      "chief_engineer" | "ce" => Ok(Role::ChiefEngineer),
      "superintending_engineer" | "se" => Ok(Role::SuperintendingEngineer),
      "executive_engineer" | "ee" => Ok(Role::ExecutiveEngineer),
      "data_entry" => Ok(Role::DataEntry),
      "viewer" => Ok(Role::Viewer),
      other => Err(DomainError::ValidationError(format!("Rol desconocido: {}", other))),
    }
  }
}

/// Usuario que opera el formulario. Se construye una vez y se entrega al
/// controlador; nada en el núcleo lo vuelve a leer de otra fuente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
  pub user_id: String,
  pub display_name: String,
  pub role: Role,
  pub zone: Option<String>,
  pub circle: Option<String>,
  pub division: Option<String>,
}

impl UserContext {
  pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
    Self { user_id: user_id.into(), display_name: display_name.into(), role, zone: None, circle: None, division: None }
  }

  pub fn with_affiliation(mut self, zone: Option<String>, circle: Option<String>, division: Option<String>) -> Self {
    self.zone = zone;
    self.circle = circle;
    self.division = division;
    self
  }

  /// Los usuarios `Viewer` sólo consultan.
  pub fn can_edit(&self) -> bool {
    self.role != Role::Viewer
  }

  /// Identificador que se registra como actor en la historia.
  pub fn actor(&self) -> &str {
    &self.user_id
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parsing_accepts_aliases() {
    assert_eq!("EE".parse::<Role>().unwrap(), Role::ExecutiveEngineer);
    assert_eq!("data-entry".parse::<Role>().unwrap(), Role::DataEntry);
    assert!("janitor".parse::<Role>().is_err());
  }

  #[test]
  fn viewer_cannot_edit() {
    let u = UserContext::new("u1", "Ana", Role::Viewer);
    assert!(!u.can_edit());
    assert!(UserContext::new("u2", "Ravi", Role::DataEntry).can_edit());
  }
}
