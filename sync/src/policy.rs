//! The Argo CD RBAC policy the sync publishes.
//!
//! Each directory group `G` contributes exactly two rows:
//!
//! ```text
//! p,role:G-role,*,*,G/*,allow
//! g,G,role:G-role
//! ```
//!
//! The document is rebuilt from scratch on every run and replaces whatever
//! the config map held before.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Result, SyncError};

/// Role given to any subject no row matches
pub const DEFAULT_ROLE: &str = "role:readonly";

pub const POLICY_DEFAULT_KEY: &str = "policy.default";
pub const POLICY_CSV_KEY: &str = "policy.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyRow {
    Permission {
        subject: String,
        resource: String,
        action: String,
        scope: String,
        effect: String,
    },
    Grouping {
        member: String,
        role: String,
    },
}

impl PolicyRow {
    /// Role name for a group: `role:<group>-role`
    pub fn role_for(group: &str) -> String {
        format!("role:{}-role", group)
    }

    /// Full access to everything under the group's own namespace
    pub fn permission(group: &str) -> Self {
        PolicyRow::Permission {
            subject: Self::role_for(group),
            resource: "*".to_string(),
            action: "*".to_string(),
            scope: format!("{}/*", group),
            effect: "allow".to_string(),
        }
    }

    /// Members of the group receive its role
    pub fn grouping(group: &str) -> Self {
        PolicyRow::Grouping {
            member: group.to_string(),
            role: Self::role_for(group),
        }
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            PolicyRow::Permission {
                subject,
                resource,
                action,
                scope,
                effect,
            } => vec![
                "p",
                subject.as_str(),
                resource.as_str(),
                action.as_str(),
                scope.as_str(),
                effect.as_str(),
            ],
            PolicyRow::Grouping { member, role } => vec!["g", member.as_str(), role.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    default_role: String,
    rows: Vec<PolicyRow>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self {
            default_role: DEFAULT_ROLE.to_string(),
            rows: Vec::new(),
        }
    }

    /// Append the permission row and then the grouping row for `group`
    pub fn grant_group(&mut self, group: &str) {
        self.rows.push(PolicyRow::permission(group));
        self.rows.push(PolicyRow::grouping(group));
    }

    pub fn rows(&self) -> &[PolicyRow] {
        &self.rows
    }

    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Serialize the rows as CSV: no header, `\n` terminated.
    ///
    /// Fields are quoted when they hold a comma, quote or line break, and also
    /// when they start with whitespace or are exactly `\.`.
    pub fn to_csv(&self) -> Result<String> {
        let mut out = String::new();
        for row in &self.rows {
            let fields = row
                .fields()
                .into_iter()
                .map(encode_field)
                .collect::<Result<Vec<_>>>()?;
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        Ok(out)
    }

    /// The full `data` of the RBAC config map
    pub fn to_config_map_data(&self) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::from([
            (POLICY_DEFAULT_KEY.to_string(), self.default_role.clone()),
            (POLICY_CSV_KEY.to_string(), self.to_csv()?),
        ]))
    }
}

/// Quote one field; leading whitespace forces quotes on top of csv's own rules
fn encode_field(field: &str) -> Result<String> {
    if field.is_empty() {
        // A lone empty record would come back as `""`
        return Ok(String::new());
    }

    let quote_style = if field.starts_with(char::is_whitespace) || field == r"\." {
        csv::QuoteStyle::Always
    } else {
        csv::QuoteStyle::Necessary
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(quote_style)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer
        .write_record([field])
        .map_err(|e| SyncError::Policy(e.to_string()))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| SyncError::Policy(e.to_string()))?;
    let mut encoded = String::from_utf8(bytes).map_err(|e| SyncError::Policy(e.to_string()))?;
    encoded.truncate(encoded.trim_end_matches("\r\n").len());
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_alternate_per_group_in_order() {
        let mut doc = PolicyDocument::new();
        for group in ["teamA", "teamB", "teamC"] {
            doc.grant_group(group);
        }

        assert_eq!(doc.rows().len(), 6);
        for (i, group) in ["teamA", "teamB", "teamC"].iter().enumerate() {
            assert_eq!(doc.rows()[2 * i], PolicyRow::permission(group));
            assert_eq!(doc.rows()[2 * i + 1], PolicyRow::grouping(group));
        }
    }

    #[test]
    fn test_csv_matches_argocd_format() {
        let mut doc = PolicyDocument::new();
        doc.grant_group("teamA");
        doc.grant_group("teamB");

        assert_eq!(
            doc.to_csv().unwrap(),
            "p,role:teamA-role,*,*,teamA/*,allow\n\
             g,teamA,role:teamA-role\n\
             p,role:teamB-role,*,*,teamB/*,allow\n\
             g,teamB,role:teamB-role\n"
        );
    }

    #[test]
    fn test_empty_document() {
        let doc = PolicyDocument::new();
        assert_eq!(doc.to_csv().unwrap(), "");

        let data = doc.to_config_map_data().unwrap();
        assert_eq!(data["policy.default"], "role:readonly");
        assert_eq!(data["policy.csv"], "");
    }

    #[test]
    fn test_group_names_with_commas_are_quoted() {
        let mut doc = PolicyDocument::new();
        doc.grant_group("ops,dev");

        assert_eq!(
            doc.to_csv().unwrap(),
            "p,\"role:ops,dev-role\",*,*,\"ops,dev/*\",allow\n\
             g,\"ops,dev\",\"role:ops,dev-role\"\n"
        );
    }

    #[test]
    fn test_leading_whitespace_fields_are_quoted() {
        let mut doc = PolicyDocument::new();
        doc.grant_group(" ops");

        assert_eq!(
            doc.to_csv().unwrap(),
            "p,role: ops-role,*,*,\" ops/*\",allow\n\
             g,\" ops\",role: ops-role\n"
        );
    }

    #[test]
    fn test_encode_field_rules() {
        assert_eq!(encode_field("teamA").unwrap(), "teamA");
        assert_eq!(encode_field("a\"b").unwrap(), "\"a\"\"b\"");
        assert_eq!(encode_field("line\nbreak").unwrap(), "\"line\nbreak\"");
        assert_eq!(encode_field("\tops").unwrap(), "\"\tops\"");
        assert_eq!(encode_field(r"\.").unwrap(), r#""\.""#);
        assert_eq!(encode_field("").unwrap(), "");
    }

    #[test]
    fn test_config_map_data_has_exactly_two_keys() {
        let mut doc = PolicyDocument::new();
        doc.grant_group("teamA");

        let data = doc.to_config_map_data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[POLICY_DEFAULT_KEY], DEFAULT_ROLE);
        assert_eq!(
            data[POLICY_CSV_KEY],
            "p,role:teamA-role,*,*,teamA/*,allow\ng,teamA,role:teamA-role\n"
        );
    }
}
