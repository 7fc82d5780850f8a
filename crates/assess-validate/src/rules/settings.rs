use serde::{Deserialize, Serialize};

/// Tunables for the registration rule set (`[rules]` settings section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Completed attempts allowed per assessment family.
    pub max_attempts: usize,
    /// Assessment types counted together for attempts.
    pub numeracy_family: Vec<String>,
    pub french_immersion_type: String,
    /// School reporting requirement of francophone schools.
    pub csf_reporting_requirement: String,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            numeracy_family: ["NME10", "NMF10", "NME", "NMF"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            french_immersion_type: "LTF12".to_string(),
            csf_reporting_requirement: "CSF".to_string(),
        }
    }
}

impl RuleSettings {
    /// Whether two assessment types count toward the same attempt limit.
    pub fn same_family(&self, a: &str, b: &str) -> bool {
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
        let numeracy = |t: &str| self.numeracy_family.iter().any(|f| f.eq_ignore_ascii_case(t));
        numeracy(a) && numeracy(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeracy_types_share_a_family() {
        let settings = RuleSettings::default();
        assert!(settings.same_family("NME10", "nmf10"));
        assert!(settings.same_family("LTE10", "LTE10"));
        assert!(!settings.same_family("NME10", "LTE10"));
    }
}
