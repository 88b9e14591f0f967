use crate::types::MAX_INCIDENTS;

/// End of the block that holds an incident section.
const SECTION_END: &str = "</div>";

/// Lines shorter than this are treated as layout noise.
const MIN_INCIDENT_CHARS: usize = 10;

/// Pull up to [`MAX_INCIDENTS`] human-readable lines out of the section that
/// starts at the first `marker` and ends at the next `</div>`.
///
/// Returns an empty list when the marker, or a closing block after it, is
/// missing.
pub fn extract_incidents(raw: &str, marker: &str) -> Vec<String> {
    let Some(start) = raw.find(marker) else {
        return Vec::new();
    };
    let section = &raw[start + marker.len()..];
    let Some(end) = section.find(SECTION_END) else {
        return Vec::new();
    };

    section[..end]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains(['<', '>']))
        .filter(|line| line.chars().count() >= MIN_INCIDENT_CHARS)
        .take(MAX_INCIDENTS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn keeps_first_five_in_order() {
        let raw = "<html><div>Recent History\n\
                   Incident one: storage latency\n\
                   Incident two: auth failures\n\
                   Incident three: throttling\n\
                   Incident four: regional outage\n\
                   Incident five: DNS issues\n\
                   Incident six: degraded search\n\
                   Incident seven: billing delays\n\
                   </div></html>";
        let incidents = extract_incidents(raw, "Recent History");
        assert_eq!(incidents, vec![
            "Incident one: storage latency",
            "Incident two: auth failures",
            "Incident three: throttling",
            "Incident four: regional outage",
            "Incident five: DNS issues",
        ]);
    }

    #[test]
    fn missing_marker_yields_nothing() {
        let raw = "<div>All systems normal\nNothing to report here\n</div>";
        assert!(extract_incidents(raw, "Incidents").is_empty());
    }

    #[test]
    fn missing_section_end_yields_nothing() {
        let raw = "Incidents\nA long incident description line\n";
        assert!(extract_incidents(raw, "Incidents").is_empty());
    }

    #[test]
    fn filters_markup_and_short_lines() {
        let raw = "Incidents\n\
                   <span>Tagged line that is long</span>\n\
                   \n\
                   short\n\
                   \t  Vertex AI elevated error rates   \n\
                   a > b comparison line here\n\
                   </div>";
        assert_eq!(extract_incidents(raw, "Incidents"), vec![
            "Vertex AI elevated error rates"
        ]);
    }

    #[test]
    fn uses_first_marker_occurrence() {
        let raw = "Incidents\nFirst section incident line\n</div>\
                   Incidents\nSecond section incident line\n</div>";
        assert_eq!(extract_incidents(raw, "Incidents"), vec![
            "First section incident line"
        ]);
    }

    #[rstest]
    #[case("123456789", false)]
    #[case("1234567890", true)]
    #[case("   12345678901   ", true)]
    fn minimum_length(#[case] line: &str, #[case] kept: bool) {
        let raw = format!("Incidents\n{line}\n</div>");
        assert_eq!(!extract_incidents(&raw, "Incidents").is_empty(), kept);
    }
}
