// Unique resource names for suite runs.
use anyhow::{Result, ensure};
use datahub_common::names::PROJECT_NAME_MAX;

pub const PROJECT_PREFIX: &str = "sub_test_p";
pub const TOPIC_PREFIX: &str = "sub_test_t";

/// `<prefix><unix seconds>_<case index>_<8 random hex chars>`.
///
/// The random suffix keeps concurrent runs started in the same second apart.
pub fn unique_name(prefix: &str, case: u32) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}{}_{case}_{}",
        chrono::Utc::now().timestamp(),
        &suffix[..8]
    )
}

/// Project names leave room for two case digits; larger indexes are rejected.
pub fn project_name(case: u32) -> Result<String> {
    let name = unique_name(PROJECT_PREFIX, case);
    ensure!(
        name.len() <= PROJECT_NAME_MAX,
        "project name {name} exceeds {PROJECT_NAME_MAX} characters; case index {case} is too large"
    );
    Ok(name)
}

pub fn topic_name(case: u32) -> String {
    unique_name(TOPIC_PREFIX, case)
}
