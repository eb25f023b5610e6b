use tracing::{debug, info, warn};

use crate::error::{Result, SynthError};
use crate::lookup::{HostedZoneProvider, MissingContext, ParameterStore};
use crate::regions::verify_region;
use crate::resources::HostedZone;
use crate::template::{CfnResource, ResourceOutput, SavedResource, StrVal, Template};

/// Where a stack is deployed. The account is optional: when it is unknown,
/// lookups are keyed by region alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub region: String,
    pub account: Option<String>,
}

impl Environment {
    pub fn new(region: &str) -> Result<Self> {
        verify_region(region)?;
        Ok(Self { region: region.to_string(), account: None })
    }

    pub fn with_account(mut self, account: &str) -> Self {
        self.account = Some(account.to_string());
        self
    }
}

/// A stack being declared. Resources are appended in order; a resource may
/// only reference resources that were added before it.
#[derive(Debug)]
pub struct Stack {
    name: String,
    env: Environment,
    template: Template,
    missing: Vec<MissingContext>,
}

/// The result of a successful synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStack {
    pub name: String,
    pub env: Environment,
    pub template: Template,
}

// A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
// It must start with an alphabetical character and can't be longer than 128 characters.
pub fn validate_stack_name(stack_name: &str) -> Result<()> {
    let invalid = || SynthError::InvalidStackName { name: stack_name.to_string() };
    let mut chars = stack_name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(invalid()),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid());
    }
    if stack_name.len() > 128 {
        return Err(invalid());
    }
    Ok(())
}

/// builds the logical id of a child construct: `StaticSite` + `SiteBucket`
/// becomes `StaticSiteSiteBucket`.
pub fn logical_id(scope: &str, id: &str) -> String {
    format!("{scope}{id}")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn validate_logical_id(logical_id: &str) -> Result<()> {
    if logical_id.is_empty()
        || logical_id.len() > 255
        || !logical_id.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(SynthError::InvalidLogicalId(logical_id.to_string()));
    }
    Ok(())
}

impl Stack {
    pub fn new(name: &str, env: Environment) -> Result<Self> {
        validate_stack_name(name)?;
        Ok(Self {
            name: name.to_string(),
            env,
            template: Template::default(),
            missing: vec![],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn missing_context(&self) -> &[MissingContext] {
        &self.missing
    }

    pub fn set_description(&mut self, description: &str) {
        self.template.description = Some(description.to_string());
    }

    pub fn add_resource<R: CfnResource>(&mut self, logical_id: &str, resource: &R) -> Result<()> {
        self.add_resource_with_dependencies(logical_id, resource, &[])
    }

    pub fn add_resource_with_dependencies<R: CfnResource>(
        &mut self,
        logical_id: &str,
        resource: &R,
        depends_on: &[&str],
    ) -> Result<()> {
        validate_logical_id(logical_id)?;
        if self.template.contains(logical_id) {
            return Err(SynthError::DuplicateLogicalId(logical_id.to_string()));
        }
        resource.validate().map_err(|reason| SynthError::InvalidResource {
            logical_id: logical_id.to_string(),
            reason,
        })?;
        let saved = SavedResource {
            ty: resource.type_string().to_string(),
            properties: serde_json::to_value(resource)?,
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        };
        let mut references = std::collections::BTreeSet::new();
        crate::template::collect_references(&saved.properties, &mut references);
        references.extend(saved.depends_on.iter().cloned());
        for reference in references {
            if !self.template.contains(&reference) {
                return Err(SynthError::UndeclaredReference {
                    from: logical_id.to_string(),
                    to: reference,
                });
            }
        }
        debug!(logical_id, ty = %saved.ty, "declared resource");
        self.template.push_resource(logical_id.to_string(), saved);
        Ok(())
    }

    pub fn add_output(&mut self, name: &str, value: StrVal, description: Option<&str>) -> Result<()> {
        validate_logical_id(name)?;
        let value = serde_json::to_value(&value)?;
        let mut references = std::collections::BTreeSet::new();
        crate::template::collect_references(&value, &mut references);
        for reference in references {
            if !self.template.contains(&reference) {
                return Err(SynthError::UndeclaredReference { from: name.to_string(), to: reference });
            }
        }
        if self.template.output(name).is_some() {
            return Err(SynthError::DuplicateLogicalId(name.to_string()));
        }
        self.template.push_output(name.to_string(), ResourceOutput {
            description: description.map(|d| d.to_string()),
            value,
        });
        Ok(())
    }

    /// reads an SSM parameter at synthesis time. When the value is not known
    /// yet, the lookup is recorded as missing and a placeholder is returned
    /// so the rest of the stack can still be declared.
    pub fn ssm_parameter<L: ParameterStore + ?Sized>(&mut self, lookups: &L, parameter_name: &str) -> Result<String> {
        match lookups.parameter_value(&self.env, parameter_name)? {
            Some(value) => Ok(value),
            None => {
                let missing = MissingContext::ssm_parameter(&self.env, parameter_name);
                warn!(key = %missing.key, "ssm parameter not in context cache");
                self.missing.push(missing);
                Ok(format!("dummy-value-for-{parameter_name}"))
            }
        }
    }

    /// finds the public hosted zone for a domain. Same missing-value
    /// behavior as [`Stack::ssm_parameter`].
    pub fn hosted_zone<L: HostedZoneProvider + ?Sized>(&mut self, lookups: &L, domain_name: &str) -> Result<HostedZone> {
        match lookups.find_zone(&self.env, domain_name)? {
            Some(zone) => Ok(zone),
            None => {
                let missing = MissingContext::hosted_zone(&self.env, domain_name);
                warn!(key = %missing.key, "hosted zone not in context cache");
                self.missing.push(missing);
                Ok(HostedZone {
                    hosted_zone_id: "DUMMY".to_string(),
                    zone_name: HostedZone::absolute_name(domain_name),
                })
            }
        }
    }

    /// finishes the stack. Fails if any lookup was left unresolved.
    pub fn synth(self) -> Result<SynthesizedStack> {
        if !self.missing.is_empty() {
            return Err(SynthError::MissingLookups(self.missing));
        }
        info!(
            stack = %self.name,
            region = %self.env.region,
            resources = self.template.resource_ids().count(),
            "synthesized stack"
        );
        Ok(SynthesizedStack {
            name: self.name,
            env: self.env,
            template: self.template,
        })
    }
}

impl SynthesizedStack {
    pub fn template_file_name(&self) -> String {
        format!("{}.template.json", self.name)
    }

    /// writes `<out_dir>/<StackName>.template.json`, creating `out_dir` if needed.
    pub fn write_to(&self, out_dir: &std::path::Path) -> Result<std::path::PathBuf> {
        std::fs::create_dir_all(out_dir).map_err(|source| SynthError::Write {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let path = out_dir.join(self.template_file_name());
        let contents = self.template.to_json_pretty()? + "\n";
        std::fs::write(&path, contents).map_err(|source| SynthError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "wrote template");
        Ok(path)
    }
}
