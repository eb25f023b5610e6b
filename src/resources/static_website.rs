use tracing::{debug, instrument};

use super::*;
use crate::lookup::ContextLookups;
use crate::stack::logical_id;

pub const CERTIFICATE_PARAMETER_PREFIX: &str = "CertificateArn-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSiteProps {
    /// apex domain, eg: `mystaticsite.com`
    pub domain_name: String,
    /// eg: `www`
    pub site_sub_domain: String,
}

pub fn site_domain(domain_name: &str, site_sub_domain: &str) -> String {
    format!("{site_sub_domain}.{domain_name}")
}

/// name of the SSM parameter holding the ARN of the site's certificate.
pub fn certificate_parameter_name(site_domain: &str) -> String {
    format!("{CERTIFICATE_PARAMETER_PREFIX}{site_domain}")
}

impl StaticSiteProps {
    pub fn site_domain(&self) -> String {
        site_domain(&self.domain_name, &self.site_sub_domain)
    }
}

/// Static site infrastructure: an S3 bucket holding the content, served over
/// HTTPS by a CloudFront distribution, with a Route53 alias record pointing
/// the site domain at the distribution.
///
/// The ACM certificate is created and validated elsewhere; its ARN is read
/// from the SSM parameter `CertificateArn-<site domain>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSite {
    pub site_domain: String,
    pub bucket: BucketHandle,
    pub distribution: DistributionHandle,
    pub record_logical_id: String,
    pub bucket_output: String,
    pub distribution_output: String,
}

impl StaticSite {
    #[instrument(skip_all, fields(scope = scope, domain = %props.domain_name, subdomain = %props.site_sub_domain))]
    pub fn new<L: ContextLookups + ?Sized>(
        stack: &mut Stack,
        scope: &str,
        props: &StaticSiteProps,
        lookups: &L,
    ) -> Result<Self, SynthError> {
        let site_domain = props.site_domain();
        debug!(%site_domain, "declaring static site");

        // Content bucket
        let bucket = add_s3_bucket_resource(stack, &logical_id(scope, "SiteBucket"), &S3Bucket {
            name: site_domain.clone(),
            public_website: Some(PublicWebsite::default()),
            public_read_access: true,
        })?;
        let bucket_output = logical_id(scope, "Bucket");
        stack.add_output(&bucket_output, bucket.bucket_name_ref(), Some("Name of the site content bucket"))?;

        // Pre-existing ACM certificate, with the ARN stored in an SSM Parameter
        let certificate_arn = stack.ssm_parameter(lookups, &certificate_parameter_name(&site_domain))?;

        // CloudFront distribution that provides HTTPS
        let mut distribution_conf = CloudfrontDistribution::new(bucket.clone());
        distribution_conf.alias_configuration = Some(AliasConfiguration {
            acm_cert_ref: certificate_arn,
            names: vec![site_domain.clone()],
            ssl_method: SslMethod::Sni,
            security_policy: SecurityPolicyProtocol::TlsV1_1_2016,
        });
        let distribution = add_cloudfront_resource(stack, &logical_id(scope, "SiteDistribution"), &distribution_conf)?;
        let distribution_output = logical_id(scope, "DistributionId");
        stack.add_output(&distribution_output, distribution.distribution_id(), Some("Id of the site distribution"))?;

        // Route53 alias record for the CloudFront distribution
        let zone = stack.hosted_zone(lookups, &props.domain_name)?;
        let record_logical_id = logical_id(scope, "SiteAliasRecord");
        add_alias_record_resource(stack, &record_logical_id, &AliasRecord {
            record_name: site_domain.clone(),
            zone,
            target: AliasTarget::from(&distribution),
        })?;

        Ok(Self {
            site_domain,
            bucket,
            distribution,
            record_logical_id,
            bucket_output,
            distribution_output,
        })
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::lookup::ContextCache;

    #[rstest]
    #[case("example.com", "www", "www.example.com")]
    #[case("mystaticsite.com", "www", "www.mystaticsite.com")]
    #[case("example.co.uk", "blog", "blog.example.co.uk")]
    #[case("example.com", "a.b", "a.b.example.com")]
    fn site_domain_is_subdomain_dot_apex(#[case] apex: &str, #[case] sub: &str, #[case] expected: &str) {
        assert_eq!(site_domain(apex, sub), expected);
        let props = StaticSiteProps { domain_name: apex.into(), site_sub_domain: sub.into() };
        assert_eq!(props.site_domain(), expected);
        assert_eq!(certificate_parameter_name(expected), format!("CertificateArn-{expected}"));
    }

    #[test]
    fn declares_everything_in_order() {
        let env = Environment::new("us-east-1").unwrap();
        let mut cache = ContextCache::new();
        cache.set_parameter(&env, "CertificateArn-www.example.com", "arn:cert");
        cache.set_hosted_zone(&env, "example.com", &HostedZone {
            hosted_zone_id: "Z1".into(),
            zone_name: "example.com.".into(),
        });
        let mut stack = Stack::new("Test", env).unwrap();
        let props = StaticSiteProps { domain_name: "example.com".into(), site_sub_domain: "www".into() };
        let site = StaticSite::new(&mut stack, "StaticSite", &props, &cache).unwrap();

        assert_eq!(site.site_domain, "www.example.com");
        assert_eq!(site.bucket.logical_id, "StaticSiteSiteBucket");
        assert_eq!(site.distribution.logical_id, "StaticSiteSiteDistribution");
        assert_eq!(site.record_logical_id, "StaticSiteSiteAliasRecord");
        assert_eq!(stack.template().resource_ids().collect::<Vec<_>>(), vec![
            "StaticSiteSiteBucket",
            "StaticSiteSiteBucketPolicy",
            "StaticSiteSiteDistribution",
            "StaticSiteSiteAliasRecord",
        ]);
        assert_eq!(stack.template().output_names().collect::<Vec<_>>(), vec![
            "StaticSiteBucket",
            "StaticSiteDistributionId",
        ]);
        assert!(stack.missing_context().is_empty());
    }

    #[test]
    fn records_both_lookups_when_cache_is_empty() {
        let mut stack = Stack::new("Test", Environment::new("us-east-1").unwrap()).unwrap();
        let props = StaticSiteProps { domain_name: "example.com".into(), site_sub_domain: "www".into() };
        StaticSite::new(&mut stack, "StaticSite", &props, &ContextCache::new()).unwrap();
        let keys: Vec<_> = stack.missing_context().iter().map(|m| m.key.clone()).collect();
        assert_eq!(keys, vec![
            "ssm:parameterName=CertificateArn-www.example.com:region=us-east-1".to_string(),
            "hosted-zone:domainName=example.com:region=us-east-1".to_string(),
        ]);
    }
}
