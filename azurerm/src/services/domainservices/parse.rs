//! Typed resource IDs for AAD Domain Services.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DomainServiceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl DomainServiceId {
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
        parser.expect_provider("Microsoft.AAD")?;
        let name = parser.expect_key("domainServices")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for DomainServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.AAD/domainServices/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

/// A replica set within a domain service. The trailing ID is assigned by
/// the service, not chosen by the practitioner.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainServiceReplicaSetId {
    pub subscription_id: String,
    pub resource_group: String,
    pub domain_service_name: String,
    pub replica_set_id: String,
}

impl DomainServiceReplicaSetId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        domain_service_name: impl Into<String>,
        replica_set_id: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            domain_service_name: domain_service_name.into(),
            replica_set_id: replica_set_id.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ResourceIdError> {
        let mut parser = IdParser::new(input)?;
        let (subscription_id, resource_group) = parser.expect_scope()?;
        parser.expect_provider("Microsoft.AAD")?;
        let domain_service_name = parser.expect_key("domainServices")?;
        let replica_set_id = parser.expect_key("replicaSets")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            domain_service_name,
            replica_set_id,
        })
    }

    pub fn domain_service_id(&self) -> DomainServiceId {
        DomainServiceId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.domain_service_name,
        )
    }
}

impl fmt::Display for DomainServiceReplicaSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/replicaSets/{}",
            self.domain_service_id(),
            self.replica_set_id
        )
    }
}
