use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The 28 states recognized by the cleaner.
pub const STATES: [&str; 28] = [
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

/// The 8 union territories, treated as states for risk aggregation.
pub const UNION_TERRITORIES: [&str; 8] = [
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

static LOOKUP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    STATES
        .iter()
        .chain(UNION_TERRITORIES.iter())
        .map(|name| (normalize_key(name), *name))
        .collect()
});

/// Resolves a raw state name to its canonical form. Matching is
/// case-insensitive and tolerant of surrounding/internal whitespace, but a
/// name with missing word breaks ("Uttarpradesh") does not resolve.
pub fn canonical_state(raw: &str) -> Option<&'static str> {
    LOOKUP.get(&normalize_key(raw)).copied()
}

fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// District names have no canonical registry, so they are only title-cased.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_all_regions() {
        assert_eq!(STATES.len() + UNION_TERRITORIES.len(), 36);
        assert_eq!(LOOKUP.len(), 36);
    }

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        assert_eq!(canonical_state("uttar pradesh"), Some("Uttar Pradesh"));
        assert_eq!(canonical_state("  UTTAR   PRADESH "), Some("Uttar Pradesh"));
        assert_eq!(canonical_state("tamil nadu"), Some("Tamil Nadu"));
        assert_eq!(canonical_state("delhi"), Some("Delhi"));
    }

    #[test]
    fn lookup_rejects_concatenated_names() {
        assert_eq!(canonical_state("Uttarpradesh"), None);
        assert_eq!(canonical_state("TamilNadu"), None);
        assert_eq!(canonical_state(""), None);
    }

    #[test]
    fn title_case_normalizes_districts() {
        assert_eq!(title_case("  north   GOA "), "North Goa");
        assert_eq!(title_case("ERNAKULAM"), "Ernakulam");
        assert_eq!(title_case("sri ganganagar"), "Sri Ganganagar");
    }
}
