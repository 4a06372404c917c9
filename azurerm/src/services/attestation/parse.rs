//! Typed resource IDs for Attestation.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct AttestationProviderId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl AttestationProviderId {
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
        parser.expect_provider("Microsoft.Attestation")?;
        let name = parser.expect_key("attestationProviders")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for AttestationProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Attestation/attestationProviders/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let id = AttestationProviderId::new("sub-1", "rg-1", "attestor1");
        assert_eq!(AttestationProviderId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_trailing_segments() {
        let raw = format!("{}/extra/segment", AttestationProviderId::new("s", "r", "n"));
        assert!(matches!(
            AttestationProviderId::parse(&raw),
            Err(ResourceIdError::TrailingSegments { .. })
        ));
    }
}
