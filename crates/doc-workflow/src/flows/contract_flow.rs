// contract_flow.rs
//
// Workflow de ejecución de contrato: seis pasos, de la orden de trabajo a la
// factura final.
use crate::definition::WorkflowDefinition;
use crate::errors::WorkflowError;
use crate::step::{FieldGroup, StepDefinition};
use crate::workflow_type::WorkflowType;
use doc_domain::FieldSpec;

pub fn contract_definition() -> Result<WorkflowDefinition, WorkflowError> {
  WorkflowDefinition::builder(WorkflowType::Contract)
    .field(FieldSpec::text("contract_number", "Número de contrato").with_max_len(50))
    .field(FieldSpec::text("contractor_name", "Contratista").with_max_len(150))
    .field(FieldSpec::text("authority", "Autoridad").with_max_len(100))
    .field(FieldSpec::amount("contract_value", "Valor del contrato"))
    .field(FieldSpec::date("start_date", "Fecha de inicio"))
    .field(FieldSpec::date("end_date", "Fecha de término"))
    .field(FieldSpec::text("agreement_number", "Número de acuerdo").with_max_len(50))
    .field(FieldSpec::amount("pg_amount", "Monto de la garantía de cumplimiento"))
    .field(FieldSpec::amount("final_bill_amount", "Monto de la factura final"))
    .step(StepDefinition::new("work_order", "Orden de trabajo").with_group(FieldGroup::file("work_order_file").with_date("work_order_date")))
    .step(StepDefinition::new("performance_guarantee", "Garantía de cumplimiento").with_group(FieldGroup::file("pg_file").with_date("pg_date"))
                                                                                  .with_field("pg_amount"))
    .step(StepDefinition::new("site_handover", "Entrega del terreno").with_group(FieldGroup::file("site_handover_file").with_date("site_handover_date")
                                                                                                                       .with_time("site_handover_time")))
    .step(StepDefinition::new("commencement", "Inicio de obra").with_group(FieldGroup::file("commencement_file").with_date("commencement_date")))
    .step(StepDefinition::new("completion_certificate", "Certificado de término").with_group(FieldGroup::file("completion_file").with_date("completion_date")))
    .step(StepDefinition::new("final_bill", "Factura final").with_group(FieldGroup::file("final_bill_file").with_date("final_bill_date"))
                                                            .with_field("final_bill_amount"))
    .mandatory(["contract_number", "contractor_name", "authority", "start_date", "end_date", "agreement_number"])
    .validity_period("start_date", "end_date")
    .build()
}
