//! Deployment manifest
//!
//! Derives the stack layout every deployment is built from: stack ids
//! prefixed with the stage-qualified namespace, the target environment,
//! inter-stack dependencies, global tags and per-service container wiring.
//! Nothing here talks to a cloud provider.

use crate::config::schema::pascal_case;
use crate::config::{ServiceDeployment, ValidatedConfig};
use serde::Serialize;
use std::collections::BTreeMap;

/// Path probed by every service health check
pub const HEALTH_CHECK_PATH: &str = "/healthz/";

/// What a stack declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackKind {
    /// Imports the pre-existing network
    Vpc,
    /// Shared file system
    Efs,
    /// Cluster, load balancer, task roles and log group
    EcsCluster,
    /// One containerized service
    Service,
}

/// Account and region every stack deploys into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEnv {
    pub account: String,
    pub region: String,
}

/// Container wiring for a service stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub service_name: String,
    pub repository_name: String,
    /// Full image reference in the account's registry
    pub image: String,
    pub task_family: String,
    pub container_name: String,
    pub container_port: u16,
    pub health_check: Vec<String>,
    pub log_stream_prefix: String,
    pub cloud_map_name: String,
}

impl ServiceSpec {
    fn new(ns: &str, env: &StackEnv, deployment: ServiceDeployment) -> Self {
        let ServiceDeployment {
            name,
            repository_name,
            port,
            tag,
        } = deployment;

        Self {
            image: format!(
                "{}.dkr.ecr.{}.amazonaws.com/{}:{}",
                env.account, env.region, repository_name, tag
            ),
            task_family: format!("{}{}", ns, name),
            container_name: name.to_lowercase(),
            container_port: port,
            health_check: vec![
                "CMD-SHELL".to_string(),
                format!(
                    "curl -f http://localhost:{}{} || exit 1",
                    port, HEALTH_CHECK_PATH
                ),
            ],
            log_stream_prefix: ns.to_lowercase(),
            cloud_map_name: name.to_lowercase(),
            service_name: name,
            repository_name,
        }
    }
}

/// A single stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackSpec {
    pub id: String,
    pub kind: StackKind,
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceSpec>,
}

/// The full deployment layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackManifest {
    /// App-wide context (`ns`, `stage`)
    pub context: BTreeMap<String, String>,
    /// Tags applied to every resource
    pub tags: BTreeMap<String, String>,
    pub env: StackEnv,
    /// Stacks in declaration order; dependencies always precede dependents
    pub stacks: Vec<StackSpec>,
}

impl StackManifest {
    /// Derive the manifest from a validated configuration
    pub fn from_config(config: &ValidatedConfig) -> Self {
        let ns = config.app().ns.as_str();
        let stage = config.app().stage.as_str();

        let env = StackEnv {
            account: config.aws().account_id(),
            region: config.aws().region.clone(),
        };

        let vpc_stack = stack_id(ns, "Vpc");
        let efs_stack = stack_id(ns, "Efs");
        let cluster_stack = stack_id(ns, "EcsCluster");

        let mut stacks = vec![
            StackSpec {
                id: vpc_stack.clone(),
                kind: StackKind::Vpc,
                depends_on: Vec::new(),
                vpc_id: Some(config.vpc().id.clone()),
                service: None,
            },
            StackSpec {
                id: efs_stack.clone(),
                kind: StackKind::Efs,
                depends_on: vec![vpc_stack.clone()],
                vpc_id: None,
                service: None,
            },
            StackSpec {
                id: cluster_stack.clone(),
                kind: StackKind::EcsCluster,
                depends_on: vec![vpc_stack],
                vpc_id: None,
                service: None,
            },
        ];

        for key in config.services().keys() {
            let Some(deployment) = config.service_deployment(key) else {
                continue;
            };
            stacks.push(StackSpec {
                id: stack_id(ns, &format!("{}Service", pascal_case(key))),
                kind: StackKind::Service,
                depends_on: vec![efs_stack.clone(), cluster_stack.clone()],
                vpc_id: None,
                service: Some(ServiceSpec::new(ns, &env, deployment)),
            });
        }

        let context = BTreeMap::from([
            ("ns".to_string(), ns.to_string()),
            ("stage".to_string(), stage.to_string()),
        ]);
        let tags = BTreeMap::from([
            ("namespace".to_string(), ns.to_string()),
            ("stage".to_string(), stage.to_string()),
        ]);

        Self {
            context,
            tags,
            env,
            stacks,
        }
    }

    /// Find a stack by id
    pub fn stack(&self, id: &str) -> Option<&StackSpec> {
        self.stacks.iter().find(|s| s.id == id)
    }

    /// Service stacks only
    pub fn service_stacks(&self) -> impl Iterator<Item = &StackSpec> {
        self.stacks.iter().filter(|s| s.kind == StackKind::Service)
    }
}

fn stack_id(ns: &str, name: &str) -> String {
    format!("{}{}Stack", ns, name)
}
