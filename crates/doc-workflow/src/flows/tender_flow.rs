// tender_flow.rs
//
// Workflow de licitación: once pasos, desde la publicación del NIT hasta la
// firma del contrato.
use crate::definition::WorkflowDefinition;
use crate::errors::WorkflowError;
use crate::step::{FieldGroup, StepDefinition};
use crate::workflow_type::WorkflowType;
use doc_domain::FieldSpec;

/// Nombres de los pasos, en orden.
pub const TENDER_STEPS: [&str; 11] = ["nit_publication",
                                      "prebid_meeting",
                                      "bid_submission",
                                      "technical_opening",
                                      "technical_evaluation",
                                      "financial_opening",
                                      "financial_evaluation",
                                      "negotiation",
                                      "award_approval",
                                      "letter_of_acceptance",
                                      "agreement"];

pub fn tender_definition() -> Result<WorkflowDefinition, WorkflowError> {
  WorkflowDefinition::builder(WorkflowType::Tender)
    .field(FieldSpec::text("tender_number", "Número de licitación").with_max_len(50))
    .field(FieldSpec::text("work_name", "Nombre de la obra").with_max_len(250))
    .field(FieldSpec::text("authority", "Autoridad").with_max_len(100))
    .field(FieldSpec::amount("estimated_cost", "Costo estimado"))
    .field(FieldSpec::amount("emd_amount", "Depósito de garantía (EMD)"))
    .field(FieldSpec::date("validity_from", "Vigencia desde"))
    .field(FieldSpec::date("validity_to", "Vigencia hasta"))
    .field(FieldSpec::text("remarks", "Observaciones").with_max_len(500))
    .field(FieldSpec::text("agreement_number", "Número de contrato").with_max_len(50))
    .step(StepDefinition::new("nit_publication", "Publicación del NIT").with_group(FieldGroup::file("nit_file").with_date("nit_date")))
    .step(StepDefinition::new("prebid_meeting", "Reunión previa a la oferta").with_group(FieldGroup::file("prebid_minutes_file").with_date("prebid_date")
                                                                                                                              .with_time("prebid_time")))
    .step(StepDefinition::new("bid_submission", "Presentación de ofertas").with_group(FieldGroup::file("bid_submission_file").with_date("bid_submission_date")
                                                                                                                             .with_time("bid_submission_time")))
    .step(StepDefinition::new("technical_opening", "Apertura técnica").with_group(FieldGroup::file("tech_opening_file").with_date("tech_opening_date")
                                                                                                                        .with_time("tech_opening_time")))
    .step(StepDefinition::new("technical_evaluation", "Evaluación técnica").with_group(FieldGroup::file("tech_evaluation_file").with_date("tech_evaluation_date")))
    .step(StepDefinition::new("financial_opening", "Apertura financiera").with_group(FieldGroup::file("fin_opening_file").with_date("fin_opening_date")
                                                                                                                          .with_time("fin_opening_time")))
    .step(StepDefinition::new("financial_evaluation", "Evaluación financiera").with_group(FieldGroup::file("fin_evaluation_file").with_date("fin_evaluation_date")))
    .step(StepDefinition::new("negotiation", "Negociación").with_group(FieldGroup::file("negotiation_file").with_date("negotiation_date")))
    .step(StepDefinition::new("award_approval", "Aprobación de la adjudicación").with_group(FieldGroup::file("approval_file").with_date("approval_date")))
    .step(StepDefinition::new("letter_of_acceptance", "Carta de aceptación").with_group(FieldGroup::file("loa_file").with_date("loa_date")))
    .step(StepDefinition::new("agreement", "Firma del contrato").with_group(FieldGroup::file("agreement_file").with_date("agreement_date"))
                                                                .with_field("agreement_number"))
    .mandatory(["tender_number", "work_name", "authority", "validity_from", "validity_to", "agreement_number"])
    .validity_period("validity_from", "validity_to")
    .build()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn step_order_matches_names() {
    let def = tender_definition().expect("definición válida");
    let names: Vec<&str> = def.registry().steps().iter().map(|s| s.name()).collect();
    assert_eq!(names, TENDER_STEPS.to_vec());
  }
}
