//! Typed resource IDs for Analysis Services.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisServicesServerId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl AnalysisServicesServerId {
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
        parser.expect_provider("Microsoft.AnalysisServices")?;
        let name = parser.expect_key("servers")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for AnalysisServicesServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.AnalysisServices/servers/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let id = AnalysisServicesServerId::new("sub-1", "rg-1", "asserver1");
        assert_eq!(
            AnalysisServicesServerId::parse(&id.to_string()).unwrap(),
            id
        );
    }

    #[test]
    fn rejects_other_resource_types() {
        let err = AnalysisServicesServerId::parse(
            "/subscriptions/s/resourceGroups/r/providers/Microsoft.AnalysisServices/capacities/c",
        )
        .unwrap_err();
        assert!(matches!(err, ResourceIdError::MissingSegment { .. }));
    }
}
