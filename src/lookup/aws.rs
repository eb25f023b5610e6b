//! Resolves missing context lookups against a live AWS account and stores the
//! answers in the context cache.

use aws_config::BehaviorVersion;
use aws_sdk_route53::types::HostedZone as SdkHostedZone;
use aws_sdk_ssm::config::Region;
use tracing::info;

use super::{ContextCache, ContextProviderKind, MissingContext};
use crate::error::{Result, SynthError};
use crate::resources::HostedZone;

fn lookup_error(key: &str, message: String) -> SynthError {
    SynthError::Lookup { key: key.to_string(), message }
}

fn prop<'a>(missing: &'a MissingContext, name: &str) -> Result<&'a str> {
    missing
        .props
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| lookup_error(&missing.key, format!("lookup is missing the '{name}' property")))
}

/// the public zone whose name is exactly `wanted` (an absolute name, ending in a dot).
/// ListHostedZonesByName starts at `wanted` and carries on alphabetically, so
/// later zones in the page are not matches.
fn select_public_zone<'a>(zones: &'a [SdkHostedZone], wanted: &str) -> Option<&'a SdkHostedZone> {
    zones
        .iter()
        .filter(|z| !z.config().is_some_and(|c| c.private_zone()))
        .find(|z| HostedZone::absolute_name(z.name()).eq_ignore_ascii_case(wanted))
}

fn zone_from_sdk(zone: &SdkHostedZone) -> std::result::Result<HostedZone, String> {
    HostedZone::from_context_value(&serde_json::json!({
        "Id": zone.id(),
        "Name": zone.name(),
    }))
}

pub async fn resolve_missing(missing: &[MissingContext], cache: &mut ContextCache) -> Result<()> {
    for entry in missing {
        let region = prop(entry, "region")?;
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        match entry.provider {
            ContextProviderKind::SsmParameter => {
                let name = prop(entry, "parameterName")?;
                let client = aws_sdk_ssm::Client::new(&sdk_config);
                let out = client
                    .get_parameter()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| lookup_error(&entry.key, aws_sdk_ssm::error::DisplayErrorContext(&e).to_string()))?;
                let value = out
                    .parameter()
                    .and_then(|p| p.value())
                    .ok_or_else(|| lookup_error(&entry.key, format!("SSM parameter {name} has no value")))?;
                info!(key = %entry.key, "resolved ssm parameter");
                cache.insert(entry.key.clone(), serde_json::Value::String(value.to_string()));
            }
            ContextProviderKind::HostedZone => {
                let domain_name = prop(entry, "domainName")?;
                let wanted = HostedZone::absolute_name(domain_name);
                let client = aws_sdk_route53::Client::new(&sdk_config);
                let out = client
                    .list_hosted_zones_by_name()
                    .dns_name(&wanted)
                    .send()
                    .await
                    .map_err(|e| lookup_error(&entry.key, aws_sdk_route53::error::DisplayErrorContext(&e).to_string()))?;
                let zone = select_public_zone(out.hosted_zones(), &wanted)
                    .ok_or_else(|| lookup_error(&entry.key, format!("Found no public hosted zone named {wanted}")))?;
                let zone = zone_from_sdk(zone).map_err(|reason| lookup_error(&entry.key, reason))?;
                info!(key = %entry.key, zone = %zone.hosted_zone_id, "resolved hosted zone");
                cache.insert(entry.key.clone(), zone.to_context_value());
            }
        }
    }
    Ok(())
}
