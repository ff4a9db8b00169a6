//! Deployment manifest tests

use infra_config::config::load_config_from_str;
use infra_config::manifest::{StackKind, StackManifest};

const CONFIG: &str = r#"
[app]
ns = "Demo"
stage = "Dev"

[aws]
account = 42
region = "us-east-1"

[vpc]
id = "vpc-0123456789abcdef"

[service.common]
port = 8000
tag = "2024-06-01"

[service.chatbot]
name = "Chatbot"
repositoryName = "demo-chatbot"

[service.front_end]
name = "Front"
repositoryName = "demo-front"
"#;

fn manifest() -> StackManifest {
    let config = load_config_from_str(CONFIG).unwrap();
    StackManifest::from_config(&config)
}

#[test]
fn test_stack_order_and_ids() {
    let manifest = manifest();
    let ids: Vec<&str> = manifest.stacks.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "DemoDevVpcStack",
            "DemoDevEfsStack",
            "DemoDevEcsClusterStack",
            "DemoDevChatbotServiceStack",
            "DemoDevFrontEndServiceStack",
        ]
    );
}

#[test]
fn test_dependencies_precede_dependents() {
    let manifest = manifest();
    for (index, stack) in manifest.stacks.iter().enumerate() {
        for dependency in &stack.depends_on {
            let position = manifest
                .stacks
                .iter()
                .position(|s| &s.id == dependency)
                .unwrap();
            assert!(position < index, "{} depends on later {}", stack.id, dependency);
        }
    }

    let chatbot = manifest.stack("DemoDevChatbotServiceStack").unwrap();
    assert_eq!(
        chatbot.depends_on,
        vec!["DemoDevEfsStack", "DemoDevEcsClusterStack"]
    );
    let efs = manifest.stack("DemoDevEfsStack").unwrap();
    assert_eq!(efs.depends_on, vec!["DemoDevVpcStack"]);
}

#[test]
fn test_env_tags_and_context() {
    let manifest = manifest();
    assert_eq!(manifest.env.account, "000000000042");
    assert_eq!(manifest.env.region, "us-east-1");
    assert_eq!(manifest.tags["namespace"], "DemoDev");
    assert_eq!(manifest.tags["stage"], "Dev");
    assert_eq!(manifest.context["ns"], "DemoDev");
}

#[test]
fn test_vpc_stack_imports_network() {
    let manifest = manifest();
    let vpc = manifest.stack("DemoDevVpcStack").unwrap();
    assert_eq!(vpc.kind, StackKind::Vpc);
    assert_eq!(vpc.vpc_id.as_deref(), Some("vpc-0123456789abcdef"));
}

#[test]
fn test_service_stacks_carry_container_wiring() {
    let manifest = manifest();
    let services: Vec<_> = manifest.service_stacks().collect();
    assert_eq!(services.len(), 2);

    let front = manifest
        .stack("DemoDevFrontEndServiceStack")
        .and_then(|s| s.service.as_ref())
        .unwrap();
    assert_eq!(front.service_name, "Front");
    assert_eq!(
        front.image,
        "000000000042.dkr.ecr.us-east-1.amazonaws.com/demo-front:2024-06-01"
    );
    assert_eq!(front.task_family, "DemoDevFront");
    assert_eq!(front.container_port, 8000);
}

#[test]
fn test_manifest_serializes_to_json() {
    let value = serde_json::to_value(manifest()).unwrap();
    assert_eq!(value["stacks"][0]["kind"], "vpc");
    assert_eq!(value["stacks"][2]["kind"], "ecs_cluster");
    assert!(value["stacks"][0].get("service").is_none());
    assert_eq!(value["stacks"][3]["service"]["container_name"], "chatbot");
}
