//! Static guidance returned alongside every classification.
//!
//! These steps are deliberately rule-based rather than generated: they are
//! safety-critical advice and must be identical for every caller.

/// Immediate next steps shown to a consumer after their narrative is
/// classified, regardless of claim type.
pub const IMMEDIATE_NEXT_STEPS: &[&str] = &[
    "Secure your accounts: reset passwords and enable multi-factor authentication.",
    "Call your bank or platform hotline to freeze affected accounts or cards.",
    "File a police report (SPF) with reference numbers, links, or screenshots.",
    "Document all communications with the institution (dates, times, reference numbers).",
];

/// Owned copy for embedding in a JSON response body.
pub fn immediate_next_steps() -> Vec<String> {
    IMMEDIATE_NEXT_STEPS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_steps_are_stable() {
        let steps = immediate_next_steps();
        assert_eq!(steps.len(), 4);
        assert!(steps[0].contains("multi-factor"));
        assert!(steps[2].contains("police report"));
    }
}
