//! Cohort key derivation.
//!
//! A cohort is identified by `"{race} {sex}"` after normalization:
//!
//! - applicants whose ethnicity is exactly "hispanic or latino" (trimmed,
//!   case-insensitive) are assigned the race label `Hispanic`
//! - race and sex are title-cased, so "WHITE" and "white" collapse
//! - blank attributes become `Unknown`

pub const HISPANIC_ETHNICITY: &str = "hispanic or latino";
pub const HISPANIC_RACE: &str = "Hispanic";
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Exact (not substring) match against "hispanic or latino".
pub fn is_hispanic_or_latino(ethnicity: &str) -> bool {
    ethnicity.trim().to_lowercase() == HISPANIC_ETHNICITY
}

/// Race label used for grouping.
pub fn cohort_race(race: &str, ethnicity: &str) -> String {
    if is_hispanic_or_latino(ethnicity) {
        return HISPANIC_RACE.to_string();
    }
    label(race)
}

/// Sex label used for grouping.
pub fn cohort_sex(sex: &str) -> String {
    label(sex)
}

pub fn cohort_key(race: &str, sex: &str) -> String {
    format!("{race} {sex}")
}

/// Canonical form of a user-typed cohort key, e.g. `" asian  FEMALE"`.
pub fn canonical_key(raw: &str) -> String {
    title_case(&squash_whitespace(raw))
}

fn label(raw: &str) -> String {
    let squashed = squash_whitespace(raw);
    if squashed.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        title_case(&squashed)
    }
}

/// Trim and collapse internal whitespace runs to one space.
fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case a string word by word.
///
/// A letter is upper-cased when it does not follow another letter and
/// lower-cased otherwise, so `"2 or more minority races"` becomes
/// `"2 Or More Minority Races"` and `"AMERICAN INDIAN"` becomes
/// `"American Indian"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(ch);
            prev_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hispanic_override_requires_exact_phrase() {
        assert!(is_hispanic_or_latino(" Hispanic or Latino "));
        assert!(is_hispanic_or_latino("HISPANIC OR LATINO"));
        assert!(!is_hispanic_or_latino("Hispanicky"));
        assert!(!is_hispanic_or_latino("Not Hispanic or Latino"));
        assert!(!is_hispanic_or_latino("hispanic"));
    }

    #[test]
    fn race_is_overridden_for_hispanic_applicants() {
        assert_eq!(cohort_race("White", " Hispanic or Latino "), "Hispanic");
        assert_eq!(cohort_race("white", "Hispanicky"), "White");
    }

    #[test]
    fn title_case_collapses_case_variants() {
        assert_eq!(title_case("WHITE"), "White");
        assert_eq!(title_case("white"), "White");
        assert_eq!(title_case("black or african american"), "Black Or African American");
        assert_eq!(title_case("2 or more minority races"), "2 Or More Minority Races");
    }

    #[test]
    fn title_case_treats_punctuation_as_word_break() {
        assert_eq!(title_case("native hawaiian/pacific-islander"), "Native Hawaiian/Pacific-Islander");
    }

    #[test]
    fn blank_attributes_become_unknown() {
        assert_eq!(cohort_sex("   "), "Unknown");
        assert_eq!(cohort_race("", "Not Hispanic or Latino"), "Unknown");
    }

    #[test]
    fn canonical_key_squashes_whitespace() {
        assert_eq!(canonical_key("  asian   FEMALE "), "Asian Female");
    }

    #[test]
    fn labels_and_typed_keys_agree_on_inner_whitespace() {
        let race = cohort_race("Black  or\tAfrican American", "Not Hispanic or Latino");
        assert_eq!(race, "Black Or African American");
        assert_eq!(
            cohort_key(&race, &cohort_sex("male")),
            canonical_key("black or african  american male")
        );
    }
}
