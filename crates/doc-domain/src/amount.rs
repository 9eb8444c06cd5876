// amount.rs
use crate::DomainError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Interpreta un importe: decimal no negativo con a lo sumo dos decimales.
/// No admite signos, separadores de miles ni notación científica.
pub fn parse_amount(raw: &str) -> Result<Decimal, DomainError> {
  let t = raw.trim();
  let (int_part, frac_part) = match t.split_once('.') {
    Some((i, f)) => (i, Some(f)),
    None => (t, None),
  };
  if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
    return Err(DomainError::ValidationError(format!("Importe inválido '{}'", t)));
  }
  if let Some(f) = frac_part {
    if f.is_empty() || f.len() > 2 || !f.chars().all(|c| c.is_ascii_digit()) {
      return Err(DomainError::ValidationError(format!("Importe '{}' admite como máximo dos decimales", t)));
    }
  }
  Decimal::from_str(t).map_err(|e| DomainError::ValidationError(format!("Importe inválido '{}': {}", t, e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_plain_and_two_decimal_amounts() {
    assert_eq!(parse_amount("1500").unwrap(), Decimal::from(1500));
    assert_eq!(parse_amount(" 12.5 ").unwrap(), Decimal::from_str("12.5").unwrap());
    assert_eq!(parse_amount("0.99").unwrap(), Decimal::from_str("0.99").unwrap());
  }

  #[test]
  fn rejects_malformed_amounts() {
    for raw in ["", "-5", "1.234", "1,000", "abc", ".5", "5.", "1e3", "+3"] {
      assert!(parse_amount(raw).is_err(), "should reject {:?}", raw);
    }
  }
}
