use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tipos de workflow documental que conoce el crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
  Tender,
  Contract,
  #[default]
  Unknown,
}

impl fmt::Display for WorkflowType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      WorkflowType::Tender => "tender",
      WorkflowType::Contract => "contract",
      WorkflowType::Unknown => "unknown",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for WorkflowType {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "tender" | "licitacion" | "licitación" => Ok(WorkflowType::Tender),
      "contract" | "contrato" => Ok(WorkflowType::Contract),
      _ => Ok(WorkflowType::Unknown),
    }
  }
}
