use crate::error::{Error, ErrorClass, ErrorOrigin};
use serde::{Deserialize, Serialize};

///
/// EndpointConfig
/// One host/schema endpoint of a link pair.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EndpointConfig {
    pub host: String,
    pub schema: String,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            schema: schema.into(),
        }
    }
}

///
/// LinkConfig
/// Source and local endpoints of one replication link.
///
/// Gateway adapters use the endpoints to stamp hand-out rows: the
/// outbound ledger records which remote host and schema an entity was
/// handed to, and the bookkeeping schemas live next to the user schemas
/// under fixed prefixes.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkConfig {
    pub source: EndpointConfig,
    pub local: EndpointConfig,
}

impl LinkConfig {
    #[must_use]
    pub const fn new(source: EndpointConfig, local: EndpointConfig) -> Self {
        Self { source, local }
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (endpoint, name) in [(&self.source, "source"), (&self.local, "local")] {
            if endpoint.host.is_empty() {
                return Err(Error::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Config,
                    format!("{name} endpoint has an empty host"),
                ));
            }
            if endpoint.schema.is_empty() {
                return Err(Error::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Config,
                    format!("{name} endpoint has an empty schema"),
                ));
            }
        }
        if self.source == self.local {
            return Err(Error::new(
                ErrorClass::Unsupported,
                ErrorOrigin::Config,
                "source and local endpoints must differ",
            ));
        }
        Ok(())
    }

    /// Bookkeeping schema holding the outbound ledger, on the source host.
    #[must_use]
    pub fn outbound_schema(&self) -> String {
        format!("replink_outbound__{}", self.source.schema)
    }

    /// Bookkeeping schema holding the inbound mirror, on the local host.
    #[must_use]
    pub fn inbound_schema(&self) -> String {
        format!("replink_inbound__{}", self.local.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LinkConfig {
        LinkConfig::new(
            EndpointConfig::new("db.example.org", "experiments"),
            EndpointConfig::new("lab.example.org", "experiments_cache"),
        )
    }

    #[test]
    fn valid_config_passes_validation() {
        config().validate().expect("config should validate");
    }

    #[test]
    fn empty_schema_is_rejected() {
        let mut config = config();
        config.local.schema.clear();
        let err = config.validate().expect_err("empty schema should be rejected");
        assert_eq!(err.origin, ErrorOrigin::Config);
    }

    #[test]
    fn identical_endpoints_are_rejected() {
        let mut config = config();
        config.local = config.source.clone();
        config
            .validate()
            .expect_err("a link onto itself should be rejected");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = config();
        let json = serde_json::to_string(&config).expect("config should serialize");
        let back: LinkConfig = serde_json::from_str(&json).expect("config should deserialize");
        assert_eq!(config, back);
    }

    #[test]
    fn bookkeeping_schemas_derive_from_the_user_schemas() {
        let config = config();
        assert_eq!(config.outbound_schema(), "replink_outbound__experiments");
        assert_eq!(config.inbound_schema(), "replink_inbound__experiments_cache");
    }
}
