//! Branch naming (spec §4.F): `feature/<plan-id-short>/<task-id-short>-<slug>`.

use crate::id::short_id;

const MAX_SLUG_LEN: usize = 30;

fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut last_was_dash = false;
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    trimmed.chars().take(MAX_SLUG_LEN).collect()
}

pub fn branch_name(plan_id: &str, task_id: &str, title: &str) -> String {
    format!("feature/{}/{}-{}", short_id(plan_id), short_id(task_id), slugify(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_alphanumerics_collapse_to_single_dash() {
        assert_eq!(slugify("Fix the  DB!! Connection--Pool"), "fix-the-db-connection-pool");
    }

    #[test]
    fn trims_leading_and_trailing_dashes() {
        assert_eq!(slugify("!!wrap this!!"), "wrap-this");
    }

    #[test]
    fn truncates_to_thirty_chars() {
        let long = "a".repeat(50);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn branch_name_uses_short_ids() {
        let plan_id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
        let task_id = "01BXZ3NDEKTSV4RRFFQ69G5FAV";
        let name = branch_name(plan_id, task_id, "Add login form");
        assert_eq!(name, "feature/01ARZ3ND/01BXZ3ND-add-login-form");
    }
}
