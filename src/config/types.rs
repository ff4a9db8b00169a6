//! Configuration types for infra-config
//!
//! A [`ValidatedConfig`] can only be produced by the loader. Its fields are
//! private and it is not `Clone`; every consumer borrows the one
//! instance built at startup.

use serde::Serialize;
use std::collections::BTreeMap;

/// Application identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSection {
    /// Stage-qualified namespace (`<ns><stage>`), prefixed to every resource name
    pub ns: String,

    /// Deployment stage label (e.g. `Dev`, `Prod`)
    pub stage: String,
}

/// Target cloud account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsSection {
    /// Numeric account number
    pub account: u64,

    /// Region name (e.g. `ap-northeast-2`)
    pub region: String,
}

impl AwsSection {
    /// Account number in its canonical 12-digit form.
    pub fn account_id(&self) -> String {
        format!("{:012}", self.account)
    }
}

/// Pre-existing virtual network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpcSection {
    /// Network identifier (`vpc-` followed by 16 lowercase hex digits)
    pub id: String,
}

/// Settings shared by every service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonServiceConfig {
    /// Container port
    pub port: u16,

    /// Image tag
    pub tag: String,
}

/// A named service entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Image repository name
    #[serde(rename = "repositoryName")]
    pub repository_name: String,
}

/// The `[service]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSection {
    pub common: CommonServiceConfig,

    /// Named services keyed by their table name
    #[serde(flatten)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Everything a single service stack needs from the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDeployment {
    pub name: String,
    pub repository_name: String,
    pub port: u16,
    pub tag: String,
}

/// Validated, stage-qualified configuration
#[derive(Debug, PartialEq, Serialize)]
pub struct ValidatedConfig {
    app: AppSection,
    aws: AwsSection,
    vpc: VpcSection,
    service: ServiceSection,

    /// Unknown top-level keys, kept as written
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl ValidatedConfig {
    pub(crate) fn new(
        app: AppSection,
        aws: AwsSection,
        vpc: VpcSection,
        service: ServiceSection,
        extra: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            app,
            aws,
            vpc,
            service,
            extra,
        }
    }

    pub fn app(&self) -> &AppSection {
        &self.app
    }

    pub fn aws(&self) -> &AwsSection {
        &self.aws
    }

    pub fn vpc(&self) -> &VpcSection {
        &self.vpc
    }

    pub fn common(&self) -> &CommonServiceConfig {
        &self.service.common
    }

    /// Named services in key order
    pub fn services(&self) -> &BTreeMap<String, ServiceConfig> {
        &self.service.services
    }

    pub fn service(&self, key: &str) -> Option<&ServiceConfig> {
        self.service.services.get(key)
    }

    /// Combine a named service with the common port and tag.
    pub fn service_deployment(&self, key: &str) -> Option<ServiceDeployment> {
        self.service(key).map(|svc| ServiceDeployment {
            name: svc.name.clone(),
            repository_name: svc.repository_name.clone(),
            port: self.service.common.port,
            tag: self.service.common.tag.clone(),
        })
    }

    /// Top-level keys the schema does not know about
    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidatedConfig {
        let mut services = BTreeMap::new();
        services.insert(
            "chatbot".to_string(),
            ServiceConfig {
                name: "Chatbot".to_string(),
                repository_name: "demo-chatbot".to_string(),
            },
        );

        ValidatedConfig::new(
            AppSection {
                ns: "DemoDev".to_string(),
                stage: "Dev".to_string(),
            },
            AwsSection {
                account: 42,
                region: "us-east-1".to_string(),
            },
            VpcSection {
                id: "vpc-0123456789abcdef".to_string(),
            },
            ServiceSection {
                common: CommonServiceConfig {
                    port: 8080,
                    tag: "latest".to_string(),
                },
                services,
            },
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_account_id_is_zero_padded() {
        let config = sample();
        assert_eq!(config.aws().account_id(), "000000000042");
    }

    #[test]
    fn test_service_deployment_merges_common() {
        let config = sample();
        let deployment = config.service_deployment("chatbot").unwrap();
        assert_eq!(deployment.name, "Chatbot");
        assert_eq!(deployment.repository_name, "demo-chatbot");
        assert_eq!(deployment.port, 8080);
        assert_eq!(deployment.tag, "latest");

        assert!(config.service_deployment("front").is_none());
    }

    #[test]
    fn test_serializes_services_beside_common() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["service"]["common"]["port"], 8080);
        assert_eq!(value["service"]["chatbot"]["repositoryName"], "demo-chatbot");
        assert_eq!(value["app"]["ns"], "DemoDev");
    }
}
