//! Schema rules for the configuration document
//!
//! Validation walks the raw document once and records every violation it
//! finds instead of stopping at the first one. Known sections are closed;
//! only the top level accepts keys the schema does not list.

use crate::config::types::{
    AppSection, AwsSection, CommonServiceConfig, ServiceConfig, ServiceSection, VpcSection,
};
use crate::error::{ConfigError, ValidationErrors, Violation, ViolationKind};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Canonical virtual network identifier: fixed prefix and 16 lowercase hex digits
pub const VPC_ID_PATTERN: &str = r"^vpc-[0-9a-f]{16}$";

const TOP_LEVEL_KEYS: &[&str] = &["app", "aws", "vpc", "service"];
const APP_KEYS: &[&str] = &["ns", "stage"];
const AWS_KEYS: &[&str] = &["account", "region"];
const VPC_KEYS: &[&str] = &["id"];
const COMMON_KEYS: &[&str] = &["port", "tag"];
const SERVICE_KEYS: &[&str] = &["name", REPOSITORY_KEY, REPOSITORY_ALIAS];

/// Repository key as written in service tables
pub const REPOSITORY_KEY: &str = "repositoryName";

/// Snake-case spelling, also reachable through the environment overlay
pub const REPOSITORY_ALIAS: &str = "repository_name";

/// Largest account number with 12 decimal digits
pub const MAX_ACCOUNT: u64 = 999_999_999_999;

/// Key under `[service]` holding the shared settings
pub const COMMON_SERVICE_KEY: &str = "common";

/// A document that passed validation, before namespace qualification
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    pub app: AppSection,
    pub aws: AwsSection,
    pub vpc: VpcSection,
    pub service: ServiceSection,
    pub extra: BTreeMap<String, Value>,
}

/// Compiled schema
#[derive(Debug)]
pub struct Schema {
    vpc_id: Regex,
}

impl Schema {
    /// Compile the schema's format checks
    pub fn new() -> Result<Self, ConfigError> {
        let vpc_id = Regex::new(VPC_ID_PATTERN).map_err(|e| ConfigError::InvalidPattern {
            pattern: VPC_ID_PATTERN.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { vpc_id })
    }

    /// Check a network identifier against the canonical pattern
    pub fn check_vpc_id(&self, id: &str) -> Result<(), ViolationKind> {
        if self.vpc_id.is_match(id) {
            Ok(())
        } else {
            Err(ViolationKind::InvalidFormat(format!(
                "must be \"vpc-\" followed by 16 lowercase hex digits, got \"{}\"",
                id
            )))
        }
    }

    /// Validate a raw document, collecting every violation
    pub fn validate(&self, document: &Value) -> Result<ConfigDocument, ValidationErrors> {
        let Some(root) = document.as_object() else {
            return Err(ValidationErrors::new(vec![Violation::new(
                "<document>",
                ViolationKind::WrongType {
                    expected: "table",
                    found: type_name(document),
                },
            )]));
        };

        let mut checker = Checker::default();

        let app = checker.section(root, "", "app", Some(APP_KEYS));
        let ns = checker.text(&app, "ns");
        let stage = checker.text(&app, "stage");

        let aws = checker.section(root, "", "aws", Some(AWS_KEYS));
        let account = checker.number(&aws, "account", 0, MAX_ACCOUNT);
        let region = checker.text(&aws, "region");

        let vpc = checker.section(root, "", "vpc", Some(VPC_KEYS));
        let vpc_id = checker.text(&vpc, "id").and_then(|id| {
            match self.check_vpc_id(&id) {
                Ok(()) => Some(id),
                Err(kind) => {
                    checker.report("vpc.id", kind);
                    None
                }
            }
        });

        let service = checker.section(root, "", "service", None);
        let common = checker.nested(&service, COMMON_SERVICE_KEY, COMMON_KEYS);
        let port = checker
            .number(&common, "port", 1, u64::from(u16::MAX))
            .and_then(|p| u16::try_from(p).ok());
        let tag = checker.text(&common, "tag");
        let services = checker.named_services(&service);

        let extra: BTreeMap<String, Value> = root
            .iter()
            .filter(|(key, _)| !TOP_LEVEL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        match (ns, stage, account, region, vpc_id, port, tag) {
            (
                Some(ns),
                Some(stage),
                Some(account),
                Some(region),
                Some(id),
                Some(port),
                Some(tag),
            ) if checker.is_clean() => Ok(ConfigDocument {
                app: AppSection { ns, stage },
                aws: AwsSection { account, region },
                vpc: VpcSection { id },
                service: ServiceSection {
                    common: CommonServiceConfig { port, tag },
                    services,
                },
                extra,
            }),
            _ => Err(checker.into_errors()),
        }
    }
}

/// Where a section lookup landed
enum Section<'a> {
    Table {
        path: String,
        map: &'a Map<String, Value>,
    },
    Missing {
        path: String,
    },
    /// Present but not a table; already reported
    Rejected,
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn report(&mut self, field: impl Into<String>, kind: ViolationKind) {
        self.violations.push(Violation::new(field, kind));
    }

    fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn into_errors(self) -> ValidationErrors {
        ValidationErrors::new(self.violations)
    }

    /// Resolve `key` in `map`. With `allowed` set the section is closed and
    /// any other key in it is reported.
    fn section<'a>(
        &mut self,
        map: &'a Map<String, Value>,
        parent: &str,
        key: &str,
        allowed: Option<&[&str]>,
    ) -> Section<'a> {
        let path = join(parent, key);
        match map.get(key) {
            None => Section::Missing { path },
            Some(Value::Object(inner)) => {
                if let Some(allowed) = allowed {
                    for unknown in inner.keys().filter(|k| !allowed.contains(&k.as_str())) {
                        self.report(join(&path, unknown), ViolationKind::NotAllowed);
                    }
                }
                Section::Table { path, map: inner }
            }
            Some(other) => {
                self.report(
                    path,
                    ViolationKind::WrongType {
                        expected: "table",
                        found: type_name(other),
                    },
                );
                Section::Rejected
            }
        }
    }

    /// Resolve a closed sub-section of `parent`
    fn nested<'a>(&mut self, parent: &Section<'a>, key: &str, allowed: &[&str]) -> Section<'a> {
        match parent {
            Section::Table { path, map } => self.section(*map, path, key, Some(allowed)),
            Section::Missing { path } => Section::Missing {
                path: join(path, key),
            },
            Section::Rejected => Section::Rejected,
        }
    }

    /// Look up a field, reporting it when absent
    fn field<'a>(&mut self, section: &Section<'a>, key: &str) -> Option<(String, &'a Value)> {
        match section {
            Section::Table { path, map } => {
                let field = join(path, key);
                let map: &'a Map<String, Value> = *map;
                match map.get(key) {
                    Some(value) => Some((field, value)),
                    None => {
                        self.report(field, ViolationKind::Missing);
                        None
                    }
                }
            }
            Section::Missing { path } => {
                self.report(join(path, key), ViolationKind::Missing);
                None
            }
            Section::Rejected => None,
        }
    }

    /// Required non-empty string
    fn text(&mut self, section: &Section<'_>, key: &str) -> Option<String> {
        let (field, value) = self.field(section, key)?;
        match value {
            Value::String(s) if s.is_empty() => {
                self.report(field, ViolationKind::Empty);
                None
            }
            Value::String(s) => Some(s.clone()),
            other => {
                self.report(
                    field,
                    ViolationKind::WrongType {
                        expected: "string",
                        found: type_name(other),
                    },
                );
                None
            }
        }
    }

    /// Required whole number within `min..=max`; digit strings are accepted
    fn number(&mut self, section: &Section<'_>, key: &str, min: u64, max: u64) -> Option<u64> {
        let (field, value) = self.field(section, key)?;
        let parsed = match value {
            Value::Number(n) if n.is_u64() => n.as_u64(),
            Value::Number(n) if n.is_i64() => {
                self.report(field, ViolationKind::OutOfRange { min, max });
                return None;
            }
            Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                match s.parse::<u64>() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        self.report(field, ViolationKind::OutOfRange { min, max });
                        return None;
                    }
                }
            }
            _ => None,
        };

        match parsed {
            Some(n) if (min..=max).contains(&n) => Some(n),
            Some(_) => {
                self.report(field, ViolationKind::OutOfRange { min, max });
                None
            }
            None => {
                self.report(
                    field,
                    ViolationKind::WrongType {
                        expected: "number",
                        found: type_name(value),
                    },
                );
                None
            }
        }
    }

    /// Every table under `[service]` other than `common`, in key order
    fn named_services(&mut self, service: &Section<'_>) -> BTreeMap<String, ServiceConfig> {
        let mut services = BTreeMap::new();
        let Section::Table { map, .. } = service else {
            return services;
        };

        let mut keys: Vec<&String> = map
            .keys()
            .filter(|k| k.as_str() != COMMON_SERVICE_KEY)
            .collect();
        keys.sort();

        // Stack name -> service key that claimed it
        let mut stack_names: BTreeMap<String, String> = BTreeMap::new();

        for key in keys {
            let field = join("service", key);
            let entry = self.section(*map, "service", key, Some(SERVICE_KEYS));
            let name = self.text(&entry, "name");
            let repository_name = self.repository_name(&entry);

            let stack_name = pascal_case(key);
            let unique = if stack_name.is_empty() {
                self.report(
                    field,
                    ViolationKind::InvalidFormat(
                        "service key must contain a letter or digit".to_string(),
                    ),
                );
                false
            } else if let Some(first) = stack_names.get(&stack_name) {
                self.report(
                    field,
                    ViolationKind::Conflict {
                        with: join("service", first),
                    },
                );
                false
            } else {
                stack_names.insert(stack_name, key.clone());
                true
            };

            if let (Some(name), Some(repository_name), true) = (name, repository_name, unique) {
                services.insert(
                    key.clone(),
                    ServiceConfig {
                        name,
                        repository_name,
                    },
                );
            }
        }

        services
    }

    /// `repositoryName`, or its snake-case alias when only that is present
    fn repository_name(&mut self, entry: &Section<'_>) -> Option<String> {
        let (path, map) = match entry {
            Section::Table { path, map } => (path, *map),
            _ => return self.text(entry, REPOSITORY_KEY),
        };

        match (map.contains_key(REPOSITORY_KEY), map.contains_key(REPOSITORY_ALIAS)) {
            (true, true) => {
                self.report(
                    join(path, REPOSITORY_ALIAS),
                    ViolationKind::Conflict {
                        with: join(path, REPOSITORY_KEY),
                    },
                );
                None
            }
            (false, true) => self.text(entry, REPOSITORY_ALIAS),
            _ => self.text(entry, REPOSITORY_KEY),
        }
    }
}

/// `chatbot` -> `Chatbot`, `front_end` / `front-end` -> `FrontEnd`
pub fn pascal_case(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}
