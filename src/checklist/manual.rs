//! Checks that always require human sign-off.
use super::{CheckOutcome, ChecklistContext};

pub(super) fn assay_strategy(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "Assay strategy and endpoint definitions require SME review.",
        "Attach assay protocols, endpoint rationale, and acceptance criteria.",
    )
}

pub(super) fn experimental_controls(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "Experimental controls and reproducibility protocol require manual review.",
        "Document positive/negative controls and replication strategy.",
    )
}

pub(super) fn human_data_governance(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "Human-data governance, privacy, and consent controls require manual review.",
        "Attach IRB/privacy governance documentation when applicable.",
    )
}

pub(super) fn translation_plan(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "PK/PD and translational validation strategy require manual review.",
        "Link in vitro, in vivo, and translational bridge plans.",
    )
}

pub(super) fn change_control(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "Model/data change control approvals require manual review.",
        "Attach change tickets, approvals, and impact assessments.",
    )
}

pub(super) fn benefit_risk(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "Benefit-risk rationale requires manual clinical/scientific review.",
        "Provide reviewer-signed benefit-risk narrative.",
    )
}

pub(super) fn gxp_readiness(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "GxP readiness and quality-system alignment require manual review.",
        "Map bundle artifacts to relevant GxP/quality SOP controls.",
    )
}

pub(super) fn submission_mapping(_: &ChecklistContext) -> CheckOutcome {
    CheckOutcome::manual_review(
        "Regulatory submission mapping to dossier sections requires manual review.",
        "Map evidence artifacts to IND/CTA sections and reviewer notes.",
    )
}
