//! Display names for taggers. Internal ids are short and lowercase; the
//! "propaganda" mode used for public-facing plots swaps in the canonical
//! collaboration names.

/// Canonical display name for a tagger id; unknown ids display as-is.
pub fn display_name(tagger: &str) -> &str {
    match tagger {
        "gaia" => "GAIA",
        "jfc" => "JetFitterCharm",
        "jfit" => "JetFitterCOMBNN",
        "fabtag" => "MV1 + MV1c",
        other => other,
    }
}

/// Legend label: the display name in propaganda mode, the raw id otherwise.
pub fn label(tagger: &str, propaganda: bool) -> &str {
    if propaganda {
        display_name(tagger)
    } else {
        tagger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_taggers_have_display_names() {
        assert_eq!(display_name("gaia"), "GAIA");
        assert_eq!(display_name("fabtag"), "MV1 + MV1c");
        assert_eq!(display_name("mystery"), "mystery");
    }

    #[test]
    fn propaganda_mode_switches_labels() {
        assert_eq!(label("jfc", false), "jfc");
        assert_eq!(label("jfc", true), "JetFitterCharm");
    }
}
