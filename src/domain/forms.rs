//! Canonical dosage forms and routes of administration
//!
//! Products carry their `formCode` and `routeCode` as coded values. Producers spell the
//! display names inconsistently ("TABLET, FILM COATED", "Tabs", "PO", "BY MOUTH"), so the
//! extractor also maps them onto the closed sets below. Lookups work on lowercased words:
//! the first word (or two-word phrase) found in a table decides.

use serde::{Deserialize, Serialize};

/// Canonical dosage form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosageForm {
    Tablet,
    Capsule,
    Pellet,
    Granules,
    Powder,
    Solution,
    Suspension,
    Syrup,
    Elixir,
    Liquid,
    Tincture,
    Injection,
    Cream,
    Ointment,
    Gel,
    Lotion,
    Foam,
    Patch,
    Shampoo,
    Paste,
    Soap,
    Wash,
    Inhaler,
    Aerosol,
    Spray,
    Suppository,
    Drops,
    Rinse,
    Film,
    Strip,
    Lozenge,
    Kit,
}

const DOSAGE_FORM_WORDS: &[(&str, DosageForm)] = &[
    ("tab", DosageForm::Tablet),
    ("tabs", DosageForm::Tablet),
    ("tbl", DosageForm::Tablet),
    ("tablet", DosageForm::Tablet),
    ("tablets", DosageForm::Tablet),
    ("pill", DosageForm::Tablet),
    ("pills", DosageForm::Tablet),
    ("cap", DosageForm::Capsule),
    ("caps", DosageForm::Capsule),
    ("capsule", DosageForm::Capsule),
    ("capsules", DosageForm::Capsule),
    ("pellet", DosageForm::Pellet),
    ("pellets", DosageForm::Pellet),
    ("granule", DosageForm::Granules),
    ("granules", DosageForm::Granules),
    ("powder", DosageForm::Powder),
    ("powders", DosageForm::Powder),
    ("sol", DosageForm::Solution),
    ("soln", DosageForm::Solution),
    ("solution", DosageForm::Solution),
    ("concentrate", DosageForm::Solution),
    ("susp", DosageForm::Suspension),
    ("suspension", DosageForm::Suspension),
    ("emulsion", DosageForm::Suspension),
    ("syr", DosageForm::Syrup),
    ("syrup", DosageForm::Syrup),
    ("elixir", DosageForm::Elixir),
    ("liq", DosageForm::Liquid),
    ("liquid", DosageForm::Liquid),
    ("tincture", DosageForm::Tincture),
    ("inj", DosageForm::Injection),
    ("injection", DosageForm::Injection),
    ("injectable", DosageForm::Injection),
    ("vial", DosageForm::Injection),
    ("ampule", DosageForm::Injection),
    ("ampoule", DosageForm::Injection),
    ("cream", DosageForm::Cream),
    ("oint", DosageForm::Ointment),
    ("ointment", DosageForm::Ointment),
    ("gel", DosageForm::Gel),
    ("jelly", DosageForm::Gel),
    ("lotion", DosageForm::Lotion),
    ("foam", DosageForm::Foam),
    ("patch", DosageForm::Patch),
    ("shampoo", DosageForm::Shampoo),
    ("paste", DosageForm::Paste),
    ("dentifrice", DosageForm::Paste),
    ("bar", DosageForm::Soap),
    ("soap", DosageForm::Soap),
    ("cleanser", DosageForm::Wash),
    ("wash", DosageForm::Wash),
    ("inhaler", DosageForm::Inhaler),
    ("aerosol", DosageForm::Aerosol),
    ("spray", DosageForm::Spray),
    ("supp", DosageForm::Suppository),
    ("suppository", DosageForm::Suppository),
    ("suppositories", DosageForm::Suppository),
    ("drop", DosageForm::Drops),
    ("drops", DosageForm::Drops),
    ("gtt", DosageForm::Drops),
    ("rinse", DosageForm::Rinse),
    ("mouthwash", DosageForm::Rinse),
    ("film", DosageForm::Film),
    ("strip", DosageForm::Strip),
    ("lozenge", DosageForm::Lozenge),
    ("troche", DosageForm::Lozenge),
    ("kit", DosageForm::Kit),
];

impl DosageForm {
    /// Maps a `formCode` display name onto a canonical form
    ///
    /// ```
    /// use spl_extract::domain::DosageForm;
    ///
    /// assert_eq!(DosageForm::from_display_name("TABLET, FILM COATED"), Some(DosageForm::Tablet));
    /// assert_eq!(DosageForm::from_display_name("INJECTION, SOLUTION"), Some(DosageForm::Injection));
    /// assert_eq!(DosageForm::from_display_name("IMPLANT"), None);
    /// ```
    pub fn from_display_name(raw: &str) -> Option<Self> {
        lookup(raw, DOSAGE_FORM_WORDS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tablet => "tablet",
            Self::Capsule => "capsule",
            Self::Pellet => "pellet",
            Self::Granules => "granules",
            Self::Powder => "powder",
            Self::Solution => "solution",
            Self::Suspension => "suspension",
            Self::Syrup => "syrup",
            Self::Elixir => "elixir",
            Self::Liquid => "liquid",
            Self::Tincture => "tincture",
            Self::Injection => "injection",
            Self::Cream => "cream",
            Self::Ointment => "ointment",
            Self::Gel => "gel",
            Self::Lotion => "lotion",
            Self::Foam => "foam",
            Self::Patch => "patch",
            Self::Shampoo => "shampoo",
            Self::Paste => "paste",
            Self::Soap => "soap",
            Self::Wash => "wash",
            Self::Inhaler => "inhaler",
            Self::Aerosol => "aerosol",
            Self::Spray => "spray",
            Self::Suppository => "suppository",
            Self::Drops => "drops",
            Self::Rinse => "rinse",
            Self::Film => "film",
            Self::Strip => "strip",
            Self::Lozenge => "lozenge",
            Self::Kit => "kit",
        }
    }

    /// Plausible strength of one active ingredient per unit of this form, in mg
    pub fn strength_range_mg(&self) -> Option<(f64, f64)> {
        match self {
            Self::Tablet => Some((0.001, 2000.0)),
            Self::Capsule => Some((0.001, 1500.0)),
            Self::Injection => Some((0.000_001, 500.0)),
            Self::Solution => Some((0.001, 1000.0)),
            _ => None,
        }
    }
}

impl std::fmt::Display for DosageForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical route of administration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Oral,
    Buccal,
    Sublingual,
    Intravenous,
    Intramuscular,
    Subcutaneous,
    Intradermal,
    Intrathecal,
    Epidural,
    Intraarticular,
    Intravitreal,
    Topical,
    Transdermal,
    Inhalation,
    Nasal,
    Ophthalmic,
    Otic,
    Rectal,
    Vaginal,
    Urethral,
    Dental,
    Irrigation,
    Implantation,
}

const ROUTE_WORDS: &[(&str, Route)] = &[
    ("by mouth", Route::Oral),
    ("per os", Route::Oral),
    ("per rectum", Route::Rectal),
    ("po", Route::Oral),
    ("oral", Route::Oral),
    ("orally", Route::Oral),
    ("buccal", Route::Buccal),
    ("sl", Route::Sublingual),
    ("sublingual", Route::Sublingual),
    ("iv", Route::Intravenous),
    ("intravenous", Route::Intravenous),
    ("im", Route::Intramuscular),
    ("intramuscular", Route::Intramuscular),
    ("sc", Route::Subcutaneous),
    ("sq", Route::Subcutaneous),
    ("subcut", Route::Subcutaneous),
    ("subcutaneous", Route::Subcutaneous),
    ("intradermal", Route::Intradermal),
    ("intrathecal", Route::Intrathecal),
    ("epidural", Route::Epidural),
    ("intraarticular", Route::Intraarticular),
    ("intra-articular", Route::Intraarticular),
    ("intravitreal", Route::Intravitreal),
    ("topical", Route::Topical),
    ("cutaneous", Route::Topical),
    ("dermal", Route::Topical),
    ("external", Route::Topical),
    ("transdermal", Route::Transdermal),
    ("inhalation", Route::Inhalation),
    ("respiratory", Route::Inhalation),
    ("pulmonary", Route::Inhalation),
    ("nasal", Route::Nasal),
    ("intranasal", Route::Nasal),
    ("ophthalmic", Route::Ophthalmic),
    ("ocular", Route::Ophthalmic),
    ("conjunctival", Route::Ophthalmic),
    ("otic", Route::Otic),
    ("auricular", Route::Otic),
    ("aural", Route::Otic),
    ("rectal", Route::Rectal),
    ("vaginal", Route::Vaginal),
    ("intravaginal", Route::Vaginal),
    ("urethral", Route::Urethral),
    ("dental", Route::Dental),
    ("gingival", Route::Dental),
    ("periodontal", Route::Dental),
    ("irrigation", Route::Irrigation),
    ("implantation", Route::Implantation),
];

impl Route {
    /// Maps a `routeCode` display name onto a canonical route
    ///
    /// ```
    /// use spl_extract::domain::Route;
    ///
    /// assert_eq!(Route::from_display_name("ORAL"), Some(Route::Oral));
    /// assert_eq!(Route::from_display_name("by mouth"), Some(Route::Oral));
    /// assert_eq!(Route::from_display_name("NOT APPLICABLE"), None);
    /// ```
    pub fn from_display_name(raw: &str) -> Option<Self> {
        lookup(raw, ROUTE_WORDS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oral => "oral",
            Self::Buccal => "buccal",
            Self::Sublingual => "sublingual",
            Self::Intravenous => "intravenous",
            Self::Intramuscular => "intramuscular",
            Self::Subcutaneous => "subcutaneous",
            Self::Intradermal => "intradermal",
            Self::Intrathecal => "intrathecal",
            Self::Epidural => "epidural",
            Self::Intraarticular => "intraarticular",
            Self::Intravitreal => "intravitreal",
            Self::Topical => "topical",
            Self::Transdermal => "transdermal",
            Self::Inhalation => "inhalation",
            Self::Nasal => "nasal",
            Self::Ophthalmic => "ophthalmic",
            Self::Otic => "otic",
            Self::Rectal => "rectal",
            Self::Vaginal => "vaginal",
            Self::Urethral => "urethral",
            Self::Dental => "dental",
            Self::Irrigation => "irrigation",
            Self::Implantation => "implantation",
        }
    }

    /// Whether `form` can be given by this route
    ///
    /// `None` when no rule covers the pair.
    pub fn accepts(&self, form: DosageForm) -> Option<bool> {
        use DosageForm as F;

        let (compatible, incompatible): (&[DosageForm], &[DosageForm]) = match self {
            Self::Oral => (
                &[
                    F::Tablet, F::Capsule, F::Pellet, F::Granules, F::Powder, F::Solution,
                    F::Suspension, F::Syrup, F::Elixir, F::Liquid, F::Paste, F::Film, F::Strip,
                    F::Lozenge,
                ],
                &[
                    F::Injection, F::Cream, F::Ointment, F::Gel, F::Lotion, F::Foam, F::Patch,
                    F::Inhaler, F::Aerosol, F::Suppository,
                ],
            ),
            Self::Topical => (
                &[
                    F::Cream, F::Ointment, F::Gel, F::Lotion, F::Foam, F::Patch, F::Shampoo,
                    F::Paste, F::Soap, F::Wash, F::Liquid, F::Solution, F::Suspension, F::Spray,
                    F::Powder,
                ],
                &[F::Tablet, F::Capsule, F::Injection, F::Suppository, F::Inhaler],
            ),
            Self::Intravenous | Self::Intramuscular | Self::Subcutaneous => (
                &[F::Injection, F::Solution],
                &[F::Tablet, F::Capsule, F::Cream, F::Ointment, F::Gel, F::Suppository],
            ),
            Self::Inhalation => (
                &[F::Inhaler, F::Aerosol, F::Spray, F::Powder, F::Solution],
                &[F::Tablet, F::Capsule, F::Cream, F::Ointment, F::Gel, F::Suppository],
            ),
            Self::Nasal => (
                &[F::Spray, F::Drops, F::Gel, F::Solution, F::Suspension],
                &[F::Tablet, F::Capsule, F::Injection, F::Suppository],
            ),
            Self::Rectal => (
                &[F::Suppository, F::Solution, F::Suspension, F::Gel],
                &[F::Tablet, F::Capsule, F::Injection, F::Inhaler],
            ),
            Self::Ophthalmic => (
                &[F::Drops, F::Solution, F::Suspension, F::Gel, F::Ointment],
                &[F::Tablet, F::Capsule, F::Injection, F::Suppository],
            ),
            Self::Otic => (
                &[F::Drops, F::Solution, F::Suspension, F::Gel],
                &[F::Tablet, F::Capsule, F::Injection, F::Suppository],
            ),
            _ => return None,
        };

        if compatible.contains(&form) {
            Some(true)
        } else if incompatible.contains(&form) {
            Some(false)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First table entry matching a two-word phrase or a single word of `raw`, left to right
fn lookup<T: Copy>(raw: &str, table: &[(&str, T)]) -> Option<T> {
    let lowered = raw.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();
    let find = |key: &str| table.iter().find(|(word, _)| *word == key).map(|(_, v)| *v);

    for (i, &word) in words.iter().enumerate() {
        if let Some(next) = words.get(i + 1) {
            if let Some(found) = find(&format!("{word} {next}")) {
                return Some(found);
            }
        }
        if let Some(found) = find(word) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("TABLET", Some(DosageForm::Tablet))]
    #[test_case("TABLET, FILM COATED, EXTENDED RELEASE", Some(DosageForm::Tablet))]
    #[test_case("Caps", Some(DosageForm::Capsule))]
    #[test_case("INJECTION, POWDER, LYOPHILIZED, FOR SOLUTION", Some(DosageForm::Injection))]
    #[test_case("SOLUTION/ DROPS", Some(DosageForm::Solution))]
    #[test_case("SPRAY, METERED", Some(DosageForm::Spray))]
    #[test_case("LOZENGE", Some(DosageForm::Lozenge))]
    #[test_case("IMPLANT", None)]
    #[test_case("", None)]
    fn test_dosage_form_from_display_name(raw: &str, expected: Option<DosageForm>) {
        assert_eq!(DosageForm::from_display_name(raw), expected);
    }

    #[test_case("ORAL", Some(Route::Oral))]
    #[test_case("By Mouth", Some(Route::Oral))]
    #[test_case("PO", Some(Route::Oral))]
    #[test_case("INTRAVENOUS", Some(Route::Intravenous))]
    #[test_case("RESPIRATORY (INHALATION)", Some(Route::Inhalation))]
    #[test_case("INTRA-ARTICULAR", Some(Route::Intraarticular))]
    #[test_case("AURICULAR (OTIC)", Some(Route::Otic))]
    #[test_case("NOT APPLICABLE", None)]
    fn test_route_from_display_name(raw: &str, expected: Option<Route>) {
        assert_eq!(Route::from_display_name(raw), expected);
    }

    #[test_case(Route::Oral, DosageForm::Tablet, Some(true))]
    #[test_case(Route::Oral, DosageForm::Cream, Some(false))]
    #[test_case(Route::Topical, DosageForm::Capsule, Some(false))]
    #[test_case(Route::Intravenous, DosageForm::Injection, Some(true))]
    #[test_case(Route::Subcutaneous, DosageForm::Suppository, Some(false))]
    #[test_case(Route::Ophthalmic, DosageForm::Ointment, Some(true))]
    #[test_case(Route::Oral, DosageForm::Kit, None)]
    #[test_case(Route::Vaginal, DosageForm::Tablet, None)]
    fn test_route_accepts_form(route: Route, form: DosageForm, expected: Option<bool>) {
        assert_eq!(route.accepts(form), expected);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&DosageForm::Suppository).unwrap(),
            "\"suppository\""
        );
        assert_eq!(serde_json::to_string(&Route::Intravenous).unwrap(), "\"intravenous\"");
        assert_eq!(Route::Otic.to_string(), "otic");
    }
}
