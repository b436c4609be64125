//! Shared fixtures for the skill pipeline tests.

use skillctx_types::skill::{ListField, RawSkillRecord, SkillMetadata};

use super::tokens::CharRatioEstimator;

pub(crate) fn estimator() -> CharRatioEstimator {
    CharRatioEstimator::default()
}

/// Raw record with the given triggers, related ids, and declared token cost.
pub(crate) fn raw(
    name: &str,
    triggers: &[&str],
    related: &[&str],
    tokens: Option<u32>,
) -> RawSkillRecord {
    let mut metadata = SkillMetadata::new(name, format!("Test skill {name}"));
    metadata.triggers = ListField::from(triggers.to_vec());
    metadata.related = ListField::from(related.to_vec());
    metadata.tokens = tokens;
    RawSkillRecord {
        origin: format!("{name}/SKILL.md"),
        plugin: None,
        metadata,
        body: format!("Body of {name}."),
    }
}

/// The two-skill security corpus: `security-infra` relates to
/// `security-auth` and to a `devops` skill that does not exist.
pub(crate) fn scenario_corpus() -> Vec<RawSkillRecord> {
    vec![
        raw(
            "security-infra",
            &["csp", "cors", "hsts"],
            &["security-auth", "devops"],
            Some(400),
        ),
        raw("security-auth", &["oauth", "jwt"], &[], Some(300)),
    ]
}
