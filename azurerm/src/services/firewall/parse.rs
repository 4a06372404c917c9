//! Typed resource IDs for Azure Firewall.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct FirewallId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl FirewallId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let mut parser = IdParser::new(input)?;
        let (subscription_id, resource_group) = parser.expect_scope()?;
        parser.expect_provider("Microsoft.Network")?;
        let name = parser.expect_key("azureFirewalls")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for FirewallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/azureFirewalls/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

/// ID of an application rule collection within a firewall. The collection
/// is not a standalone ARM object; the ID addresses an entry of the parent
/// firewall's collection list.
#[derive(Debug, Clone, PartialEq)]
pub struct FirewallApplicationRuleCollectionId {
    pub subscription_id: String,
    pub resource_group: String,
    pub firewall_name: String,
    pub name: String,
}

impl FirewallApplicationRuleCollectionId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        firewall_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            firewall_name: firewall_name.into(),
            name: name.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let mut parser = IdParser::new(input)?;
        let (subscription_id, resource_group) = parser.expect_scope()?;
        parser.expect_provider("Microsoft.Network")?;
        let firewall_name = parser.expect_key("azureFirewalls")?;
        let name = parser.expect_key("applicationRuleCollections")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            firewall_name,
            name,
        })
    }

    pub fn firewall_id(&self) -> FirewallId {
        FirewallId::new(&self.subscription_id, &self.resource_group, &self.firewall_name)
    }
}

impl fmt::Display for FirewallApplicationRuleCollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/applicationRuleCollections/{}",
            self.firewall_id(),
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firewall_round_trip() {
        let id = FirewallId::new("sub-1", "rg-1", "fw-1");
        assert_eq!(FirewallId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rule_collection_round_trip() {
        let id = FirewallApplicationRuleCollectionId::new("sub-1", "rg-1", "fw-1", "rules-1");
        let formatted = id.to_string();
        assert!(formatted.ends_with("/azureFirewalls/fw-1/applicationRuleCollections/rules-1"));
        assert_eq!(
            FirewallApplicationRuleCollectionId::parse(&formatted).unwrap(),
            id
        );
    }

    #[test]
    fn firewall_id_rejects_collection_ids() {
        let raw = FirewallApplicationRuleCollectionId::new("s", "r", "fw", "c").to_string();
        assert!(matches!(
            FirewallId::parse(&raw),
            Err(ResourceIdError::TrailingSegments { .. })
        ));
    }
}
