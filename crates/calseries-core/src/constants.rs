/// Zone id for Coordinated Universal Time, always registered.
pub const UTC_TZID: &str = "UTC";

/// Pseudo zone id for wall-clock values with no zone attached.
pub const FLOATING_TZID: &str = "floating";

/// Built-in aliases that resolve to [`UTC_TZID`].
pub const UTC_ALIASES: [&str; 2] = ["GMT", "Z"];

/// Zone ids that never need to be carried alongside a series.
pub const TRIVIAL_TZIDS: [&str; 4] = [UTC_TZID, FLOATING_TZID, UTC_ALIASES[0], UTC_ALIASES[1]];

/// Maximum number of alias hops followed before resolution gives up.
pub const MAX_ALIAS_DEPTH: usize = 20;

pub const PRODUCT_NAME: &str = "calseries";
pub const DEFAULT_PRODID: &str = const_str::concat!("-//", PRODUCT_NAME, "//Recurrence Engine//EN");

/// Prefixes some producers put in front of otherwise valid IANA zone ids.
pub const VENDOR_TZID_PREFIXES: [&str; 2] = ["/mozilla.org/20050126_1/", "/softwarestudio.org/Tzfile/"];

#[must_use]
pub fn is_trivial_tzid(tzid: &str) -> bool {
    TRIVIAL_TZIDS.iter().any(|t| t.eq_ignore_ascii_case(tzid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_tzids() {
        assert!(is_trivial_tzid("utc"));
        assert!(is_trivial_tzid("Z"));
        assert!(is_trivial_tzid("floating"));
        assert!(!is_trivial_tzid("Europe/Berlin"));
    }

    #[test]
    fn prodid_is_concatenated() {
        assert_eq!(DEFAULT_PRODID, "-//calseries//Recurrence Engine//EN");
    }
}
