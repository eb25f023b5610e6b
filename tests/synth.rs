use rstest::{fixture, rstest};
use serde_json::json;

use static_site::resources::{
    certificate_parameter_name, site_domain, HostedZone, BUCKET_TYPE, DISTRIBUTION_TYPE, RECORD_SET_TYPE,
};
use static_site::{ContextCache, DeploymentContext, Environment, SiteApp, SynthError, SynthesizedStack};

const CERT_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/abc";

fn cache_for(apex: &str, sub: &str) -> ContextCache {
    let env = Environment::new("us-east-1").unwrap();
    let mut cache = ContextCache::new();
    cache.set_parameter(&env, &certificate_parameter_name(&site_domain(apex, sub)), CERT_ARN);
    cache.set_hosted_zone(&env, apex, &HostedZone {
        hosted_zone_id: "Z0123456789".into(),
        zone_name: HostedZone::absolute_name(apex),
    });
    cache
}

fn synth(apex: &str, sub: &str) -> SynthesizedStack {
    let ctx = DeploymentContext::from_args([format!("domain={apex}"), format!("subdomain={sub}")]).unwrap();
    SiteApp::default().synth(&ctx, &cache_for(apex, sub)).unwrap()
}

#[fixture]
fn mystaticsite() -> SynthesizedStack {
    synth("mystaticsite.com", "www")
}

#[rstest]
fn one_of_each_resource(mystaticsite: SynthesizedStack) {
    let template = &mystaticsite.template;
    let buckets: Vec<_> = template.resources_of_type(BUCKET_TYPE).collect();
    let distributions: Vec<_> = template.resources_of_type(DISTRIBUTION_TYPE).collect();
    let records: Vec<_> = template.resources_of_type(RECORD_SET_TYPE).collect();
    assert_eq!(buckets.len(), 1);
    assert_eq!(distributions.len(), 1);
    assert_eq!(records.len(), 1);

    let (bucket_id, bucket) = buckets[0];
    assert_eq!(bucket.properties["BucketName"], "www.mystaticsite.com");

    let (dist_id, dist) = distributions[0];
    let config = &dist.properties["DistributionConfig"];
    assert_eq!(config["Aliases"], json!(["www.mystaticsite.com"]));
    assert_eq!(config["ViewerCertificate"]["AcmCertificateArn"], CERT_ARN);
    assert_eq!(config["ViewerCertificate"]["SslSupportMethod"], "sni-only");
    assert_eq!(config["DefaultRootObject"], "index.html");
    assert_eq!(config["Origins"][0]["DomainName"]["Fn::GetAtt"][0], bucket_id);

    let (_, record) = records[0];
    assert_eq!(record.properties["Name"], "www.mystaticsite.com.");
    assert_eq!(record.properties["Type"], "A");
    assert_eq!(record.properties["HostedZoneId"], "Z0123456789");
    assert_eq!(record.properties["AliasTarget"]["DNSName"]["Fn::GetAtt"][0], dist_id);
}

#[rstest]
fn declared_in_dependency_order(mystaticsite: SynthesizedStack) {
    let template = &mystaticsite.template;
    let ids: Vec<_> = template.resource_ids().map(str::to_string).collect();
    for id in &ids {
        let me = template.declaration_index(id).unwrap();
        for referenced in template.references(id) {
            let them = template.declaration_index(&referenced).unwrap();
            assert!(them < me, "{id} references {referenced}, which is declared after it");
        }
    }
    let bucket = template.declaration_index("StaticSiteSiteBucket").unwrap();
    let dist = template.declaration_index("StaticSiteSiteDistribution").unwrap();
    let record = template.declaration_index("StaticSiteSiteAliasRecord").unwrap();
    assert!(bucket < dist && dist < record);
}

#[rstest]
fn outputs_and_description(mystaticsite: SynthesizedStack) {
    let template = &mystaticsite.template;
    assert_eq!(mystaticsite.name, "MyStaticSite");
    assert_eq!(mystaticsite.template_file_name(), "MyStaticSite.template.json");
    assert_eq!(template.description.as_deref(), Some("Static website for www.mystaticsite.com"));
    assert_eq!(template.output("StaticSiteBucket").unwrap().value, json!({"Ref": "StaticSiteSiteBucket"}));
    assert_eq!(template.output("StaticSiteDistributionId").unwrap().value, json!({"Ref": "StaticSiteSiteDistribution"}));

    let rendered: serde_json::Value = serde_json::from_str(&template.to_json_pretty().unwrap()).unwrap();
    assert_eq!(rendered["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(rendered["Resources"].as_object().unwrap().len(), 4);
}

#[rstest]
#[case("example.com", "www", "www.example.com")]
#[case("example.org", "docs", "docs.example.org")]
#[case("example.co.uk", "blog", "blog.example.co.uk")]
fn site_domain_flows_into_every_resource(#[case] apex: &str, #[case] sub: &str, #[case] expected: &str) {
    let stack = synth(apex, sub);
    let template = &stack.template;
    let (_, bucket) = template.resources_of_type(BUCKET_TYPE).next().unwrap();
    assert_eq!(bucket.properties["BucketName"], expected);
    let (_, dist) = template.resources_of_type(DISTRIBUTION_TYPE).next().unwrap();
    assert_eq!(dist.properties["DistributionConfig"]["Aliases"][0], expected);
    let (_, record) = template.resources_of_type(RECORD_SET_TYPE).next().unwrap();
    assert_eq!(record.properties["Name"], format!("{expected}."));
}

#[rstest]
#[case::no_domain(&["subdomain=www"], "domain")]
#[case::no_subdomain(&["domain=mystaticsite.com"], "subdomain")]
#[case::blank_domain(&["domain=", "subdomain=www"], "domain")]
#[case::nothing(&[], "domain")]
fn missing_context_is_rejected(#[case] args: &[&str], #[case] missing_key: &str) {
    let ctx = DeploymentContext::from_args(args.iter().copied()).unwrap();
    let err = SiteApp::default().synth(&ctx, &cache_for("mystaticsite.com", "www")).unwrap_err();
    match err {
        SynthError::MissingContextValue(key) => assert_eq!(key, missing_key),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unresolved_lookups_are_all_reported() {
    let ctx = DeploymentContext::from_args(["domain=mystaticsite.com", "subdomain=www"]).unwrap();
    let err = SiteApp::default().synth(&ctx, &ContextCache::new()).unwrap_err();
    let SynthError::MissingLookups(missing) = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(missing.len(), 2);
    let message = err.to_string();
    assert!(message.contains("ssm:parameterName=CertificateArn-www.mystaticsite.com:region=us-east-1"));
    assert!(message.contains("hosted-zone:domainName=mystaticsite.com:region=us-east-1"));
}

#[test]
fn account_is_part_of_the_lookup_key() {
    let ctx = DeploymentContext::from_args(["domain=mystaticsite.com", "subdomain=www"]).unwrap();
    // cache was filled without an account, so nothing matches
    let err = SiteApp::default()
        .with_account("123456789012")
        .synth(&ctx, &cache_for("mystaticsite.com", "www"))
        .unwrap_err();
    assert!(err.to_string().contains("account=123456789012"));
}

#[test]
fn padded_context_values_are_trimmed() {
    let ctx = DeploymentContext::from_args(["domain= mystaticsite.com", "subdomain=www "]).unwrap();
    let stack = SiteApp::default().synth(&ctx, &cache_for("mystaticsite.com", "www")).unwrap();
    let (_, bucket) = stack.template.resources_of_type(BUCKET_TYPE).next().unwrap();
    assert_eq!(bucket.properties["BucketName"], "www.mystaticsite.com");
}
