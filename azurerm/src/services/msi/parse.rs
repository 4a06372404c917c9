//! Typed resource IDs for Managed Identity.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct UserAssignedIdentityId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl UserAssignedIdentityId {
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
        parser.expect_provider("Microsoft.ManagedIdentity")?;
        let name = parser.expect_key("userAssignedIdentities")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for UserAssignedIdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ManagedIdentity/userAssignedIdentities/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let id = UserAssignedIdentityId::new("sub-1", "rg-1", "identity-1");
        let formatted = id.to_string();
        assert_eq!(
            formatted,
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.ManagedIdentity/userAssignedIdentities/identity-1"
        );
        assert_eq!(UserAssignedIdentityId::parse(&formatted).unwrap(), id);
    }

    #[test]
    fn rejects_other_providers() {
        let err = UserAssignedIdentityId::parse(
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Network/azureFirewalls/fw-1",
        )
        .unwrap_err();
        assert!(matches!(err, ResourceIdError::WrongProvider { .. }));
    }

    #[test]
    fn rejects_truncated_ids() {
        assert!(UserAssignedIdentityId::parse(
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.ManagedIdentity"
        )
        .is_err());
    }
}
