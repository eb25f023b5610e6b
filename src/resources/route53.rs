use serde::Serialize;
use serde_json::{json, Value};

use super::*;

pub const RECORD_SET_TYPE: &str = "AWS::Route53::RecordSet";

/// this is static for all of AWS for aliases to CloudFront
/// see here: https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-properties-route53-aliastarget.html#cfn-route53-aliastarget-hostedzoneid
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// An existing hosted zone, as returned by a zone lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// bare id, without the `/hostedzone/` prefix.
    pub hosted_zone_id: String,
    /// always ends in a dot.
    pub zone_name: String,
}

impl HostedZone {
    pub fn absolute_name(name: &str) -> String {
        if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{name}.")
        }
    }

    /// parses the cached form `{"Id": "/hostedzone/Z123", "Name": "example.com."}`.
    pub fn from_context_value(value: &Value) -> Result<Self, String> {
        let id = value
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("expected an object with a string \"Id\", found {value}"))?;
        let name = value
            .get("Name")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("expected an object with a string \"Name\", found {value}"))?;
        let id = id.strip_prefix("/hostedzone/").unwrap_or(id);
        if id.is_empty() {
            return Err("hosted zone id is empty".into());
        }
        Ok(Self {
            hosted_zone_id: id.to_string(),
            zone_name: Self::absolute_name(name),
        })
    }

    pub fn to_context_value(&self) -> Value {
        json!({
            "Id": format!("/hostedzone/{}", self.hosted_zone_id),
            "Name": self.zone_name,
        })
    }

    /// a record name relative to this zone, made fully qualified.
    /// `www` and `www.example.com` both become `www.example.com.` in zone `example.com.`.
    pub fn fully_qualified(&self, record_name: &str) -> String {
        if record_name.ends_with('.') {
            return record_name.to_string();
        }
        let zone = self.zone_name.trim_end_matches('.');
        if record_name == zone || record_name.ends_with(&format!(".{zone}")) {
            format!("{record_name}.")
        } else {
            format!("{record_name}.{}", self.zone_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub dns_name: StrVal,
    pub hosted_zone_id: String,
}

impl From<&DistributionHandle> for AliasTarget {
    fn from(distribution: &DistributionHandle) -> Self {
        Self {
            dns_name: distribution.domain_name(),
            hosted_zone_id: CLOUDFRONT_HOSTED_ZONE_ID.to_string(),
        }
    }
}

/// Declaration of an `A` alias record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    pub record_name: String,
    pub zone: HostedZone,
    pub target: AliasTarget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AliasTargetProperties<'a> {
    #[serde(rename = "DNSName")]
    dns_name: &'a StrVal,
    hosted_zone_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RecordSetProperties<'a> {
    alias_target: AliasTargetProperties<'a>,
    hosted_zone_id: &'a str,
    name: String,
    #[serde(rename = "Type")]
    record_type: &'static str,
}

impl CfnResource for RecordSetProperties<'_> {
    fn type_string(&self) -> &'static str {
        RECORD_SET_TYPE
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim_end_matches('.').is_empty() {
            return Err("Route53 record must have a name. Example mysubdomain.mywebsite.com".into());
        }
        Ok(())
    }
}

pub fn add_alias_record_resource(stack: &mut Stack, logical_id: &str, conf: &AliasRecord) -> Result<(), SynthError> {
    let properties = RecordSetProperties {
        alias_target: AliasTargetProperties {
            dns_name: &conf.target.dns_name,
            hosted_zone_id: &conf.target.hosted_zone_id,
        },
        hosted_zone_id: &conf.zone.hosted_zone_id,
        name: conf.zone.fully_qualified(&conf.record_name),
        record_type: "A",
    };
    stack.add_resource(logical_id, &properties)
}
