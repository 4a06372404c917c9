//! Typed resource IDs for Confidential Ledger.

use crate::resourceid::{IdParser, ResourceIdError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl LedgerId {
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
        parser.expect_provider("Microsoft.ConfidentialLedger")?;
        let name = parser.expect_key("ledgers")?;
        parser.finish()?;

        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ConfidentialLedger/ledgers/{}",
            self.subscription_id, self.resource_group, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let id = LedgerId::new("sub-1", "rg-1", "ledger1");
        assert_eq!(LedgerId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(LedgerId::parse("ledger1").is_err());
        assert!(LedgerId::parse("/subscriptions/s/resourceGroups/r/providers/Microsoft.ConfidentialLedger").is_err());
    }
}
