//! ARM resource ID parsing.
//!
//! Every resource module defines a typed ID struct (`FirewallId`,
//! `PurviewAccountId`, ...) built on the segment parser here. IDs have the
//! shape
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}[...]`
//! with case-insensitive segment keys, matching how Resource Manager itself
//! treats them.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ResourceIdError {
    #[error("ID {id:?} is missing the {key:?} segment")]
    MissingSegment { id: String, key: &'static str },

    #[error("ID {id:?} belongs to provider {actual:?}, expected {expected:?}")]
    WrongProvider {
        id: String,
        expected: &'static str,
        actual: String,
    },

    #[error("ID {id:?} has unexpected trailing segments")]
    TrailingSegments { id: String },

    #[error("ID {id:?} is not a valid resource ID")]
    Malformed { id: String },
}

/// Consumes key/value segment pairs from left to right.
pub struct IdParser<'a> {
    raw: &'a str,
    segments: Vec<&'a str>,
    pos: usize,
}

impl<'a> IdParser<'a> {
    pub fn new(raw: &'a str) -> Result<Self, ResourceIdError> {
        let trimmed = raw.trim_end_matches('/');
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Err(ResourceIdError::Malformed { id: raw.to_string() });
        };

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.is_empty() || segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty())
        {
            return Err(ResourceIdError::Malformed { id: raw.to_string() });
        }

        Ok(Self {
            raw,
            segments,
            pos: 0,
        })
    }

    /// Consume one `{key}/{value}` pair, returning the value.
    pub fn expect_key(&mut self, key: &'static str) -> Result<String, ResourceIdError> {
        if self.pos + 2 > self.segments.len()
            || !self.segments[self.pos].eq_ignore_ascii_case(key)
        {
            return Err(ResourceIdError::MissingSegment {
                id: self.raw.to_string(),
                key,
            });
        }

        let value = self.segments[self.pos + 1].to_string();
        self.pos += 2;
        Ok(value)
    }

    /// Consume `/subscriptions/{sub}/resourceGroups/{rg}`.
    pub fn expect_scope(&mut self) -> Result<(String, String), ResourceIdError> {
        let subscription_id = self.expect_key("subscriptions")?;
        let resource_group = self.expect_key("resourceGroups")?;
        Ok((subscription_id, resource_group))
    }

    /// Consume `/providers/{namespace}` and verify the namespace.
    pub fn expect_provider(&mut self, namespace: &'static str) -> Result<(), ResourceIdError> {
        let actual = self.expect_key("providers")?;
        if !actual.eq_ignore_ascii_case(namespace) {
            return Err(ResourceIdError::WrongProvider {
                id: self.raw.to_string(),
                expected: namespace,
                actual,
            });
        }
        Ok(())
    }

    /// Every segment must be consumed; anything left is an error.
    pub fn finish(self) -> Result<(), ResourceIdError> {
        if self.pos != self.segments.len() {
            return Err(ResourceIdError::TrailingSegments {
                id: self.raw.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREWALL_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/azureFirewalls/fw-1";

    #[test]
    fn parses_a_well_formed_id() {
        let mut parser = IdParser::new(FIREWALL_ID).unwrap();
        let (sub, rg) = parser.expect_scope().unwrap();
        parser.expect_provider("Microsoft.Network").unwrap();
        let name = parser.expect_key("azureFirewalls").unwrap();
        parser.finish().unwrap();

        assert_eq!(sub, "00000000-0000-0000-0000-000000000000");
        assert_eq!(rg, "rg-1");
        assert_eq!(name, "fw-1");
    }

    #[test]
    fn segment_keys_are_case_insensitive() {
        let id = "/SUBSCRIPTIONS/sub-1/resourcegroups/rg-1/PROVIDERS/microsoft.network/azurefirewalls/fw-1";
        let mut parser = IdParser::new(id).unwrap();
        parser.expect_scope().unwrap();
        parser.expect_provider("Microsoft.Network").unwrap();
        assert_eq!(parser.expect_key("azureFirewalls").unwrap(), "fw-1");
    }

    #[test]
    fn rejects_missing_leading_slash() {
        assert!(matches!(
            IdParser::new("subscriptions/sub-1"),
            Err(ResourceIdError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_odd_segment_count() {
        assert!(matches!(
            IdParser::new("/subscriptions/sub-1/resourceGroups"),
            Err(ResourceIdError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_wrong_segment_key() {
        let mut parser = IdParser::new(FIREWALL_ID).unwrap();
        parser.expect_scope().unwrap();
        parser.expect_provider("Microsoft.Network").unwrap();

        let err = parser.expect_key("virtualNetworks").unwrap_err();
        assert!(matches!(
            err,
            ResourceIdError::MissingSegment {
                key: "virtualNetworks",
                ..
            }
        ));
    }

    #[test]
    fn rejects_wrong_provider_namespace() {
        let mut parser = IdParser::new(FIREWALL_ID).unwrap();
        parser.expect_scope().unwrap();

        let err = parser.expect_provider("Microsoft.Purview").unwrap_err();
        assert!(matches!(err, ResourceIdError::WrongProvider { .. }));
    }

    #[test]
    fn rejects_trailing_segments() {
        let id = format!("{}/applicationRuleCollections/rules", FIREWALL_ID);
        let mut parser = IdParser::new(&id).unwrap();
        parser.expect_scope().unwrap();
        parser.expect_provider("Microsoft.Network").unwrap();
        parser.expect_key("azureFirewalls").unwrap();

        assert!(matches!(
            parser.finish(),
            Err(ResourceIdError::TrailingSegments { .. })
        ));
    }

    #[test]
    fn tolerates_a_trailing_slash() {
        let id = format!("{}/", FIREWALL_ID);
        let mut parser = IdParser::new(&id).unwrap();
        parser.expect_scope().unwrap();
        parser.expect_provider("Microsoft.Network").unwrap();
        parser.expect_key("azureFirewalls").unwrap();
        parser.finish().unwrap();
    }
}
