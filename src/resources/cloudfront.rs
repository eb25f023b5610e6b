use serde::Serialize;

use super::*;

pub const DISTRIBUTION_TYPE: &str = "AWS::CloudFront::Distribution";

/// caching optimized:
/// https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/using-managed-cache-policies.html#managed-cache-caching-optimized
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SslMethod {
    #[serde(rename = "sni-only")]
    Sni,
    #[serde(rename = "vip")]
    Vip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SecurityPolicyProtocol {
    #[serde(rename = "SSLv3")]
    SslV3,
    #[serde(rename = "TLSv1")]
    TlsV1,
    #[serde(rename = "TLSv1_2016")]
    TlsV1_2016,
    #[serde(rename = "TLSv1.1_2016")]
    TlsV1_1_2016,
    #[serde(rename = "TLSv1.2_2018")]
    TlsV1_2_2018,
    #[serde(rename = "TLSv1.2_2019")]
    TlsV1_2_2019,
    #[serde(rename = "TLSv1.2_2021")]
    TlsV1_2_2021,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ViewerProtocolPolicy {
    #[serde(rename = "allow-all")]
    AllowAll,
    #[default]
    #[serde(rename = "redirect-to-https")]
    RedirectToHttps,
    #[serde(rename = "https-only")]
    HttpsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PriceClass {
    #[default]
    #[serde(rename = "PriceClass_100")]
    PriceClass100,
    #[serde(rename = "PriceClass_200")]
    PriceClass200,
    #[serde(rename = "PriceClass_All")]
    PriceClassAll,
}

/// Custom domain names served by the distribution, and the certificate that
/// covers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConfiguration {
    pub acm_cert_ref: String,
    pub names: Vec<String>,
    pub ssl_method: SslMethod,
    pub security_policy: SecurityPolicyProtocol,
}

/// Declaration of a distribution with a single S3 origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudfrontDistribution {
    pub comment: Option<String>,
    pub alias_configuration: Option<AliasConfiguration>,
    pub origin: BucketHandle,
    pub default_root_object: Option<String>,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub price_class: PriceClass,
    pub enabled: bool,
}

impl CloudfrontDistribution {
    pub fn new(origin: BucketHandle) -> Self {
        Self {
            comment: None,
            alias_configuration: None,
            origin,
            default_root_object: Some("index.html".into()),
            viewer_protocol_policy: ViewerProtocolPolicy::default(),
            price_class: PriceClass::default(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionHandle {
    pub logical_id: String,
}

impl DistributionHandle {
    pub fn distribution_id(&self) -> StrVal {
        get_ref(&self.logical_id)
    }

    pub fn domain_name(&self) -> StrVal {
        get_att(&self.logical_id, "DomainName")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ViewerCertificate<'a> {
    acm_certificate_arn: &'a str,
    ssl_support_method: SslMethod,
    minimum_protocol_version: SecurityPolicyProtocol,
}

#[derive(Debug, Serialize)]
struct S3OriginConfig {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Origin {
    id: &'static str,
    domain_name: StrVal,
    s3_origin_config: S3OriginConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DefaultCacheBehavior {
    target_origin_id: &'static str,
    viewer_protocol_policy: ViewerProtocolPolicy,
    allowed_methods: [&'static str; 2],
    cached_methods: [&'static str; 2],
    cache_policy_id: &'static str,
    compress: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    aliases: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    default_cache_behavior: DefaultCacheBehavior,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_root_object: Option<&'a str>,
    enabled: bool,
    http_version: &'static str,
    origins: Vec<Origin>,
    price_class: PriceClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    viewer_certificate: Option<ViewerCertificate<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionProperties<'a> {
    distribution_config: DistributionConfig<'a>,
}

impl CfnResource for DistributionProperties<'_> {
    fn type_string(&self) -> &'static str {
        DISTRIBUTION_TYPE
    }

    fn validate(&self) -> Result<(), String> {
        let config = &self.distribution_config;
        if let Some(cert) = &config.viewer_certificate {
            if cert.acm_certificate_arn.is_empty() {
                return Err("Alias configuration requires an ACM certificate ARN".into());
            }
            if config.aliases.map_or(true, |a| a.is_empty()) {
                return Err("Alias configuration requires at least one domain name".into());
            }
        }
        Ok(())
    }
}

const DEFAULT_ORIGIN_ID: &str = "origin1";

pub fn add_cloudfront_resource(
    stack: &mut Stack,
    logical_id: &str,
    conf: &CloudfrontDistribution,
) -> Result<DistributionHandle, SynthError> {
    let alias = conf.alias_configuration.as_ref();
    let properties = DistributionProperties {
        distribution_config: DistributionConfig {
            aliases: alias.map(|a| a.names.as_slice()),
            comment: conf.comment.as_deref(),
            default_cache_behavior: DefaultCacheBehavior {
                target_origin_id: DEFAULT_ORIGIN_ID,
                viewer_protocol_policy: conf.viewer_protocol_policy,
                allowed_methods: ["GET", "HEAD"],
                cached_methods: ["GET", "HEAD"],
                cache_policy_id: CACHING_OPTIMIZED_POLICY_ID,
                compress: true,
            },
            default_root_object: conf.default_root_object.as_deref(),
            enabled: conf.enabled,
            http_version: "http2",
            origins: vec![Origin {
                id: DEFAULT_ORIGIN_ID,
                domain_name: conf.origin.domain_name(),
                s3_origin_config: S3OriginConfig {},
            }],
            price_class: conf.price_class,
            viewer_certificate: alias.map(|a| ViewerCertificate {
                acm_certificate_arn: &a.acm_cert_ref,
                ssl_support_method: a.ssl_method,
                minimum_protocol_version: a.security_policy,
            }),
        },
    };
    stack.add_resource(logical_id, &properties)?;
    Ok(DistributionHandle { logical_id: logical_id.to_string() })
}
