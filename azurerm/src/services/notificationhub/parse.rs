//! Typed resource IDs for Notification Hubs.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl NamespaceId {
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
        parser.expect_provider("Microsoft.NotificationHubs")?;
        let name = parser.expect_key("namespaces")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.NotificationHubs/namespaces/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationHubId {
    pub subscription_id: String,
    pub resource_group: String,
    pub namespace_name: String,
    pub name: String,
}

impl NotificationHubId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        namespace_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            namespace_name: namespace_name.into(),
            name: name.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let mut parser = IdParser::new(input)?;
        let (subscription_id, resource_group) = parser.expect_scope()?;
        parser.expect_provider("Microsoft.NotificationHubs")?;
        let namespace_name = parser.expect_key("namespaces")?;
        let name = parser.expect_key("notificationHubs")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            namespace_name,
            name,
        })
    }

    pub fn namespace_id(&self) -> NamespaceId {
        NamespaceId::new(&self.subscription_id, &self.resource_group, &self.namespace_name)
    }
}

impl fmt::Display for NotificationHubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/notificationHubs/{}",
            self.namespace_id(),
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_round_trip() {
        let id = NamespaceId::new("sub-1", "rg-1", "ns-1");
        assert_eq!(NamespaceId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn hub_round_trip() {
        let id = NotificationHubId::new("sub-1", "rg-1", "ns-1", "hub-1");
        let formatted = id.to_string();
        assert!(formatted.ends_with("/namespaces/ns-1/notificationHubs/hub-1"));
        assert_eq!(NotificationHubId::parse(&formatted).unwrap(), id);
    }

    #[test]
    fn hub_id_rejects_namespace_ids() {
        let raw = NamespaceId::new("sub-1", "rg-1", "ns-1").to_string();
        assert!(NotificationHubId::parse(&raw).is_err());
    }
}
