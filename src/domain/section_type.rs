//! Semantic section types keyed by LOINC code
//!
//! The set of types is closed. New types are added by extending [`SectionType`] and
//! [`SECTION_TYPES`] together; codes outside the table are carried as unclassified sections.

use serde::{Deserialize, Serialize};

/// LOINC code of the product data elements section
pub const PRODUCT_LISTING_CODE: &str = "48780-1";

/// Known section types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    ProductListing,
    PackageLabel,
    BoxedWarning,
    RecentMajorChanges,
    IndicationsAndUsage,
    DosageAndAdministration,
    DosageFormsAndStrengths,
    Contraindications,
    WarningsAndPrecautions,
    Warnings,
    Precautions,
    GeneralPrecautions,
    AdverseReactions,
    DrugInteractions,
    DrugAndLabTestInteractions,
    UseInSpecificPopulations,
    Pregnancy,
    TeratogenicEffects,
    LaborAndDelivery,
    NursingMothers,
    PediatricUse,
    GeriatricUse,
    DrugAbuseAndDependence,
    Overdosage,
    Description,
    ClinicalPharmacology,
    MechanismOfAction,
    Pharmacodynamics,
    Pharmacokinetics,
    NonclinicalToxicology,
    Carcinogenesis,
    ClinicalStudies,
    References,
    HowSupplied,
    StorageAndHandling,
    PatientCounseling,
    PatientPackageInsert,
    SupplementalPatientMaterial,
    SpecialSituations,
    ActiveIngredient,
    InactiveIngredient,
    Purpose,
    DoNotUse,
    AskDoctor,
    AskDoctorOrPharmacist,
    WhenUsing,
    StopUse,
    PregnancyOrBreastfeeding,
    KeepOutOfReach,
    OtherSafetyInformation,
    Questions,
    StatementOfIdentity,
    SplUnclassified,
}

/// Static LOINC code table
pub const SECTION_TYPES: &[(&str, SectionType)] = &[
    (PRODUCT_LISTING_CODE, SectionType::ProductListing),
    ("51945-4", SectionType::PackageLabel),
    ("34066-1", SectionType::BoxedWarning),
    ("43683-2", SectionType::RecentMajorChanges),
    ("34067-9", SectionType::IndicationsAndUsage),
    ("34068-7", SectionType::DosageAndAdministration),
    ("43678-2", SectionType::DosageFormsAndStrengths),
    ("34070-3", SectionType::Contraindications),
    ("43685-7", SectionType::WarningsAndPrecautions),
    ("34071-1", SectionType::Warnings),
    ("42232-9", SectionType::Precautions),
    ("34072-9", SectionType::GeneralPrecautions),
    ("34084-4", SectionType::AdverseReactions),
    ("34073-7", SectionType::DrugInteractions),
    ("34074-5", SectionType::DrugAndLabTestInteractions),
    ("43684-0", SectionType::UseInSpecificPopulations),
    ("42228-7", SectionType::Pregnancy),
    ("34077-8", SectionType::TeratogenicEffects),
    ("34079-4", SectionType::LaborAndDelivery),
    ("34080-2", SectionType::NursingMothers),
    ("34081-0", SectionType::PediatricUse),
    ("34082-8", SectionType::GeriatricUse),
    ("42227-9", SectionType::DrugAbuseAndDependence),
    ("34088-5", SectionType::Overdosage),
    ("34089-3", SectionType::Description),
    ("34090-1", SectionType::ClinicalPharmacology),
    ("43679-0", SectionType::MechanismOfAction),
    ("43681-6", SectionType::Pharmacodynamics),
    ("43682-4", SectionType::Pharmacokinetics),
    ("43680-8", SectionType::NonclinicalToxicology),
    ("34083-6", SectionType::Carcinogenesis),
    ("34092-7", SectionType::ClinicalStudies),
    ("34093-5", SectionType::References),
    ("34069-5", SectionType::HowSupplied),
    ("44425-7", SectionType::StorageAndHandling),
    ("34076-0", SectionType::PatientCounseling),
    ("42230-3", SectionType::PatientPackageInsert),
    ("38056-8", SectionType::SupplementalPatientMaterial),
    ("42231-1", SectionType::SpecialSituations),
    ("55106-9", SectionType::ActiveIngredient),
    ("51727-6", SectionType::InactiveIngredient),
    ("55105-1", SectionType::Purpose),
    ("50570-1", SectionType::DoNotUse),
    ("50569-3", SectionType::AskDoctor),
    ("50568-5", SectionType::AskDoctorOrPharmacist),
    ("50567-7", SectionType::WhenUsing),
    ("50566-9", SectionType::StopUse),
    ("53414-9", SectionType::PregnancyOrBreastfeeding),
    ("50565-1", SectionType::KeepOutOfReach),
    ("60561-8", SectionType::OtherSafetyInformation),
    ("53413-1", SectionType::Questions),
    ("69718-5", SectionType::StatementOfIdentity),
    ("42229-5", SectionType::SplUnclassified),
];

impl SectionType {
    /// Looks up the section type for a LOINC code
    pub fn from_loinc(code: &str) -> Option<Self> {
        let code = code.trim();
        SECTION_TYPES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, section_type)| *section_type)
    }

    /// Canonical LOINC code for this type
    pub fn loinc_code(&self) -> &'static str {
        SECTION_TYPES
            .iter()
            .find(|(_, section_type)| section_type == self)
            .map(|(code, _)| *code)
            .unwrap_or("")
    }

    pub fn is_product_listing(&self) -> bool {
        matches!(self, Self::ProductListing)
    }
}
