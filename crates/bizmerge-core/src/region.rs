/// Region code to English country name.
const COUNTRIES: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BE", "Belgium"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CN", "China"),
    ("CZ", "Czech Republic"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("IE", "Ireland"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("MX", "Mexico"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("US", "United States"),
    ("ZA", "South Africa"),
];

/// Country name for a region code. `UK` is accepted as an alias of `GB`;
/// unknown codes are returned upper-cased.
#[must_use]
pub fn country_name(region: &str) -> String {
    let code = region.trim().to_uppercase();
    let lookup = if code == "UK" { "GB" } else { code.as_str() };

    COUNTRIES
        .iter()
        .find(|(c, _)| *c == lookup)
        .map_or(code.clone(), |(_, name)| (*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve_case_insensitively() {
        assert_eq!(country_name("us"), "United States");
        assert_eq!(country_name("UK"), "United Kingdom");
        assert_eq!(country_name(" fr "), "France");
    }

    #[test]
    fn unknown_code_falls_back_to_code() {
        assert_eq!(country_name("xx"), "XX");
    }

    #[test]
    fn table_is_sorted_for_readability() {
        let codes: Vec<&str> = COUNTRIES.iter().map(|(c, _)| *c).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
    }
}
