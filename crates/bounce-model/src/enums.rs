//! Type-safe enumerations for encounter and outcome concepts.
//!
//! The merged event table carries these as free text. Parsing is lenient
//! (trimmed, case-insensitive) and every enum has a canonical label used in
//! output tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of encounter represented by a row of the merged event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterKind {
    /// Emergency department stay.
    Ed,
    /// Inpatient hospital admission.
    Admission,
}

impl EncounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncounterKind::Ed => "ed",
            EncounterKind::Admission => "admission",
        }
    }
}

impl fmt::Display for EncounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EncounterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ED" | "ED_VISIT" | "ED_STAY" | "EMERGENCY" => Ok(EncounterKind::Ed),
            "ADMISSION" | "HOSPITAL" | "HOSPITAL_ADMISSION" | "INPATIENT" => {
                Ok(EncounterKind::Admission)
            }
            _ => Err(format!("Unknown encounter type: {s}")),
        }
    }
}

/// How an ED stay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Patient left the ED without being admitted.
    Discharged,
    /// Patient was admitted to the hospital from the ED.
    Admitted,
    /// Patient was transferred to another facility.
    Transferred,
    /// Left against advice, eloped, died, hospice, or anything unrecognized.
    Other,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Discharged => "discharged",
            Disposition::Admitted => "admitted",
            Disposition::Transferred => "transferred",
            Disposition::Other => "other",
        }
    }

    /// Normalize free-text disposition values (e.g. `HOME`, `ADMITTED`,
    /// `LEFT WITHOUT BEING SEEN`).
    ///
    /// Non-discharge outcomes are checked first so that text such as
    /// "discharged to hospice" does not count as a plain discharge.
    pub fn from_text(text: &str) -> Self {
        let upper = text.trim().to_uppercase();
        let tokens: Vec<&str> = upper
            .split(|ch: char| !ch.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();
        let has_token = |needle: &str| tokens.iter().any(|token| *token == needle);
        let excluded = has_token("AMA")
            || has_token("LWBS")
            || upper.contains("AGAINST MEDICAL")
            || upper.contains("LEFT WITHOUT")
            || upper.contains("ELOPE")
            || upper.contains("EXPIRED")
            || upper.contains("DEATH")
            || upper.contains("DECEASED")
            || upper.contains("DIED")
            || upper.contains("HOSPICE");
        if excluded {
            Disposition::Other
        } else if upper.contains("ADMIT") {
            Disposition::Admitted
        } else if upper.contains("TRANSFER") {
            Disposition::Transferred
        } else if upper.contains("HOME") || upper.contains("DISCHARG") {
            Disposition::Discharged
        } else {
            Disposition::Other
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Route by which a patient entered an inpatient admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionSource {
    /// Direct admission, not through the ED.
    Direct,
    /// Planned/elective admission.
    Scheduled,
    /// Admitted through an ED stay.
    ViaEd,
}

impl AdmissionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionSource::Direct => "direct",
            AdmissionSource::Scheduled => "scheduled",
            AdmissionSource::ViaEd => "via-ed",
        }
    }
}

impl fmt::Display for AdmissionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdmissionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "DIRECT" | "DIRECT ADMIT" | "DIRECT ADMISSION" => Ok(AdmissionSource::Direct),
            "SCHEDULED" | "ELECTIVE" | "SURGICAL SAME DAY ADMISSION" => {
                Ok(AdmissionSource::Scheduled)
            }
            "ED" | "VIA ED" | "EMERGENCY" | "EMERGENCY ROOM" | "EW EMER" => {
                Ok(AdmissionSource::ViaEd)
            }
            _ => Err(format!("Unknown admission source: {s}")),
        }
    }
}

/// Administrative sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
    Unknown,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Female, Sex::Male, Sex::Unknown];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Unknown => "Unknown",
        }
    }

    /// Anything other than F/M (or the spelled-out forms) maps to `Unknown`.
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_uppercase().as_str() {
            "F" | "FEMALE" => Sex::Female,
            "M" | "MALE" => Sex::Male,
            _ => Sex::Unknown,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Race/ethnicity grouped into major categories.
///
/// Hispanic or Latino is kept as its own category (it can be any race), in
/// line with how the source registry reports ethnicity-specific entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RaceCategory {
    White,
    Black,
    Asian,
    HispanicLatino,
    AmericanIndianAlaskaNative,
    NativeHawaiianPacificIslander,
    Other,
    Unknown,
}

impl RaceCategory {
    pub const ALL: [RaceCategory; 8] = [
        RaceCategory::White,
        RaceCategory::Black,
        RaceCategory::Asian,
        RaceCategory::HispanicLatino,
        RaceCategory::AmericanIndianAlaskaNative,
        RaceCategory::NativeHawaiianPacificIslander,
        RaceCategory::Other,
        RaceCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RaceCategory::White => "White",
            RaceCategory::Black => "Black or African American",
            RaceCategory::Asian => "Asian",
            RaceCategory::HispanicLatino => "Hispanic or Latino",
            RaceCategory::AmericanIndianAlaskaNative => "American Indian or Alaska Native",
            RaceCategory::NativeHawaiianPacificIslander => "Native Hawaiian or Pacific Islander",
            RaceCategory::Other => "Other",
            RaceCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RaceCategory {
    type Err = String;

    /// Parse raw registry race strings (e.g. `WHITE - RUSSIAN`,
    /// `HISPANIC/LATINO - CUBAN`) as well as the canonical labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        if normalized.is_empty() {
            return Err("Empty race value".to_string());
        }
        if normalized.starts_with("WHITE") || normalized == "PORTUGUESE" {
            return Ok(RaceCategory::White);
        }
        if normalized.starts_with("BLACK") {
            return Ok(RaceCategory::Black);
        }
        if normalized.starts_with("ASIAN") {
            return Ok(RaceCategory::Asian);
        }
        if normalized.starts_with("HISPANIC") || normalized == "SOUTH AMERICAN" {
            return Ok(RaceCategory::HispanicLatino);
        }
        match normalized.as_str() {
            "AMERICAN INDIAN/ALASKA NATIVE" | "AMERICAN INDIAN OR ALASKA NATIVE" => {
                Ok(RaceCategory::AmericanIndianAlaskaNative)
            }
            "NATIVE HAWAIIAN OR OTHER PACIFIC ISLANDER" | "NATIVE HAWAIIAN OR PACIFIC ISLANDER" => {
                Ok(RaceCategory::NativeHawaiianPacificIslander)
            }
            "OTHER" | "MULTIPLE RACE/ETHNICITY" => Ok(RaceCategory::Other),
            "UNKNOWN" | "UNABLE TO OBTAIN" | "PATIENT DECLINED TO ANSWER" => {
                Ok(RaceCategory::Unknown)
            }
            _ => Err(format!("Unmapped race value: {s}")),
        }
    }
}

/// Age bands used for demographic stratification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    Under18,
    From18To34,
    From35To49,
    From50To64,
    From65To79,
    From80,
    Unknown,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 7] = [
        AgeGroup::Under18,
        AgeGroup::From18To34,
        AgeGroup::From35To49,
        AgeGroup::From50To64,
        AgeGroup::From65To79,
        AgeGroup::From80,
        AgeGroup::Unknown,
    ];

    /// Left-closed bins: 0-17, 18-34, 35-49, 50-64, 65-79, 80+.
    pub fn from_age(age: Option<u32>) -> Self {
        match age {
            None => AgeGroup::Unknown,
            Some(0..18) => AgeGroup::Under18,
            Some(18..35) => AgeGroup::From18To34,
            Some(35..50) => AgeGroup::From35To49,
            Some(50..65) => AgeGroup::From50To64,
            Some(65..80) => AgeGroup::From65To79,
            Some(_) => AgeGroup::From80,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Under18 => "0-17",
            AgeGroup::From18To34 => "18-34",
            AgeGroup::From35To49 => "35-49",
            AgeGroup::From50To64 => "50-64",
            AgeGroup::From65To79 => "65-79",
            AgeGroup::From80 => "80+",
            AgeGroup::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of an index ED discharge within the observation window.
///
/// The four variants partition the index cohort: every index event gets
/// exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeLabel {
    /// Returned to the ED, no qualifying admission.
    EdOnly,
    /// Admitted to hospital without an ED revisit.
    AdmitOnly,
    /// ED revisit together with an admission.
    Both,
    /// No follow-up of either kind in the window.
    Neither,
}

impl OutcomeLabel {
    pub const ALL: [OutcomeLabel; 4] = [
        OutcomeLabel::EdOnly,
        OutcomeLabel::AdmitOnly,
        OutcomeLabel::Both,
        OutcomeLabel::Neither,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeLabel::EdOnly => "ED_ONLY",
            OutcomeLabel::AdmitOnly => "ADMIT_ONLY",
            OutcomeLabel::Both => "BOTH",
            OutcomeLabel::Neither => "NEITHER",
        }
    }

    pub fn has_ed_revisit(&self) -> bool {
        matches!(self, OutcomeLabel::EdOnly | OutcomeLabel::Both)
    }

    pub fn has_admission(&self) -> bool {
        matches!(self, OutcomeLabel::AdmitOnly | OutcomeLabel::Both)
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutcomeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ED_ONLY" => Ok(OutcomeLabel::EdOnly),
            "ADMIT_ONLY" => Ok(OutcomeLabel::AdmitOnly),
            "BOTH" => Ok(OutcomeLabel::Both),
            "NEITHER" => Ok(OutcomeLabel::Neither),
            _ => Err(format!("Unknown outcome label: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_from_text() {
        assert_eq!(Disposition::from_text("HOME"), Disposition::Discharged);
        assert_eq!(Disposition::from_text("admitted"), Disposition::Admitted);
        assert_eq!(Disposition::from_text("TRANSFER"), Disposition::Transferred);
        assert_eq!(
            Disposition::from_text("LEFT WITHOUT BEING SEEN"),
            Disposition::Other
        );
        assert_eq!(
            Disposition::from_text("Discharged to hospice"),
            Disposition::Other
        );
        assert_eq!(Disposition::from_text("Left AMA"), Disposition::Other);
        assert_eq!(Disposition::from_text("ELOPED"), Disposition::Other);
        assert_eq!(Disposition::from_text(""), Disposition::Other);
    }

    #[test]
    fn test_race_category_from_str() {
        assert_eq!(
            "WHITE - RUSSIAN".parse::<RaceCategory>().unwrap(),
            RaceCategory::White
        );
        assert_eq!(
            "HISPANIC/LATINO - CUBAN".parse::<RaceCategory>().unwrap(),
            RaceCategory::HispanicLatino
        );
        assert_eq!(
            "Black or African American".parse::<RaceCategory>().unwrap(),
            RaceCategory::Black
        );
        assert_eq!(
            "PATIENT DECLINED TO ANSWER".parse::<RaceCategory>().unwrap(),
            RaceCategory::Unknown
        );
        assert!("MARTIAN".parse::<RaceCategory>().is_err());
        assert!("  ".parse::<RaceCategory>().is_err());
    }

    #[test]
    fn test_age_group_bins() {
        assert_eq!(AgeGroup::from_age(Some(0)), AgeGroup::Under18);
        assert_eq!(AgeGroup::from_age(Some(17)), AgeGroup::Under18);
        assert_eq!(AgeGroup::from_age(Some(18)), AgeGroup::From18To34);
        assert_eq!(AgeGroup::from_age(Some(64)), AgeGroup::From50To64);
        assert_eq!(AgeGroup::from_age(Some(80)), AgeGroup::From80);
        assert_eq!(AgeGroup::from_age(Some(104)), AgeGroup::From80);
        assert_eq!(AgeGroup::from_age(None), AgeGroup::Unknown);
    }

    #[test]
    fn test_admission_source_from_str() {
        assert_eq!(
            "via-ed".parse::<AdmissionSource>().unwrap(),
            AdmissionSource::ViaEd
        );
        assert_eq!(
            "ELECTIVE".parse::<AdmissionSource>().unwrap(),
            AdmissionSource::Scheduled
        );
        assert_eq!(
            "direct".parse::<AdmissionSource>().unwrap(),
            AdmissionSource::Direct
        );
        assert!("taxi".parse::<AdmissionSource>().is_err());
    }

    #[test]
    fn test_outcome_label_round_trips_through_display() {
        for label in OutcomeLabel::ALL {
            assert_eq!(label.to_string().parse::<OutcomeLabel>().unwrap(), label);
        }
    }
}
