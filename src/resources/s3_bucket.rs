use serde::Serialize;
use serde_json::json;

use super::*;

pub const BUCKET_TYPE: &str = "AWS::S3::Bucket";
pub const BUCKET_POLICY_TYPE: &str = "AWS::S3::BucketPolicy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicWebsite {
    pub index_document: String,
    pub error_document: String,
}

impl Default for PublicWebsite {
    fn default() -> Self {
        Self {
            index_document: "index.html".into(),
            error_document: "error.html".into(),
        }
    }
}

/// Declaration of a content bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
    pub public_website: Option<PublicWebsite>,
    /// grants `s3:GetObject` on every object to everyone.
    pub public_read_access: bool,
}

/// What the rest of the stack can reference once a bucket is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
    pub logical_id: String,
    pub bucket_name: String,
}

impl BucketHandle {
    /// resolves to the bucket's name.
    pub fn bucket_name_ref(&self) -> StrVal {
        get_ref(&self.logical_id)
    }

    pub fn domain_name(&self) -> StrVal {
        get_att(&self.logical_id, "DomainName")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PublicAccessBlockConfiguration {
    block_public_acls: bool,
    block_public_policy: bool,
    ignore_public_acls: bool,
    restrict_public_buckets: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BucketProperties<'a> {
    bucket_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    website_configuration: Option<&'a PublicWebsite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_access_block_configuration: Option<PublicAccessBlockConfiguration>,
}

impl CfnResource for BucketProperties<'_> {
    fn type_string(&self) -> &'static str {
        BUCKET_TYPE
    }

    fn validate(&self) -> Result<(), String> {
        validate_bucket_name(self.bucket_name)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BucketPolicyProperties {
    bucket: StrVal,
    policy_document: serde_json::Value,
}

impl CfnResource for BucketPolicyProperties {
    fn type_string(&self) -> &'static str {
        BUCKET_POLICY_TYPE
    }
}

pub fn validate_bucket_name(bucket_name: &str) -> Result<(), String> {
    if bucket_name.len() > 63 || bucket_name.len() < 3 {
        return Err(format!("Invalid bucket name {:?}\nMust be between 3 and 63 characters", bucket_name));
    }
    let valid_char_check = |c: char| -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
    };
    if !bucket_name.chars().all(valid_char_check) {
        return Err(format!("Invalid bucket name {:?}\nMay only contain lowercase letters, numbers, dots, and dashes", bucket_name));
    }
    let first_ok = bucket_name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let last_ok = bucket_name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !first_ok || !last_ok {
        return Err(format!("Invalid bucket name {:?}\nFirst and last character must be either lowercase letter, or number", bucket_name));
    }
    if bucket_name.contains("..") {
        return Err(format!("Invalid bucket name {:?}\nMay not contain two consecutive dots", bucket_name));
    }
    Ok(())
}

/// declares the bucket, plus a bucket policy when it is publicly readable.
pub fn add_s3_bucket_resource(stack: &mut Stack, logical_id: &str, conf: &S3Bucket) -> Result<BucketHandle, SynthError> {
    // new buckets block public policies by default, so a public bucket has to
    // opt out of the policy half of the block.
    let public_access_block_configuration = conf.public_read_access.then_some(PublicAccessBlockConfiguration {
        block_public_acls: true,
        block_public_policy: false,
        ignore_public_acls: true,
        restrict_public_buckets: false,
    });
    let properties = BucketProperties {
        bucket_name: &conf.name,
        website_configuration: conf.public_website.as_ref(),
        public_access_block_configuration,
    };
    stack.add_resource(logical_id, &properties)?;

    if conf.public_read_access {
        let policy = BucketPolicyProperties {
            bucket: get_ref(logical_id),
            policy_document: json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "s3:GetObject",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Resource": StrVal::Sub(format!("arn:${{AWS::Partition}}:s3:::${{{logical_id}}}/*")),
                }],
            }),
        };
        stack.add_resource(&format!("{logical_id}Policy"), &policy)?;
    }

    Ok(BucketHandle {
        logical_id: logical_id.to_string(),
        bucket_name: conf.name.clone(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn stack() -> Stack {
        Stack::new("Test", Environment::new("us-east-1").unwrap()).unwrap()
    }

    #[test]
    fn website_defaults_to_index_and_error_html() {
        let site = PublicWebsite::default();
        assert_eq!(site.index_document, "index.html");
        assert_eq!(site.error_document, "error.html");
    }

    #[test]
    fn bucket_name_rules() {
        assert!(validate_bucket_name("www.example.com").is_ok());
        assert!(validate_bucket_name("ab").unwrap_err().contains("Must be between 3 and 63 characters"));
        assert!(validate_bucket_name("WWW.example.com").unwrap_err().contains("May only contain lowercase"));
        assert!(validate_bucket_name("-abc").unwrap_err().contains("First and last character"));
        assert!(validate_bucket_name("something..exact").unwrap_err().contains("May not contain two consecutive dots"));
    }

    #[test]
    fn public_bucket_gets_website_and_read_policy() {
        let mut stack = stack();
        let conf = S3Bucket {
            name: "www.example.com".into(),
            public_website: Some(PublicWebsite::default()),
            public_read_access: true,
        };
        let handle = add_s3_bucket_resource(&mut stack, "SiteBucket", &conf).unwrap();
        assert_eq!(handle.bucket_name, "www.example.com");

        let template = stack.template();
        let bucket = template.resource("SiteBucket").unwrap();
        assert_eq!(bucket.ty, BUCKET_TYPE);
        assert_eq!(bucket.properties["BucketName"], "www.example.com");
        assert_eq!(bucket.properties["WebsiteConfiguration"]["IndexDocument"], "index.html");
        assert_eq!(bucket.properties["WebsiteConfiguration"]["ErrorDocument"], "error.html");
        assert_eq!(bucket.properties["PublicAccessBlockConfiguration"]["BlockPublicPolicy"], false);

        let policy = template.resource("SiteBucketPolicy").unwrap();
        assert_eq!(policy.ty, BUCKET_POLICY_TYPE);
        let statement = &policy.properties["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Resource"]["Fn::Sub"], "arn:${AWS::Partition}:s3:::${SiteBucket}/*");
        assert!(template.references("SiteBucketPolicy").contains("SiteBucket"));
    }

    #[test]
    fn private_bucket_has_no_policy() {
        let mut stack = stack();
        let conf = S3Bucket { name: "private-bucket".into(), ..Default::default() };
        add_s3_bucket_resource(&mut stack, "Private", &conf).unwrap();
        assert_eq!(stack.template().resource_ids().collect::<Vec<_>>(), vec!["Private"]);
        let props = &stack.template().resource("Private").unwrap().properties;
        assert!(props.get("WebsiteConfiguration").is_none());
        assert!(props.get("PublicAccessBlockConfiguration").is_none());
    }

    #[test]
    fn invalid_bucket_name_fails_declaration() {
        let mut stack = stack();
        let conf = S3Bucket { name: "Not_A_Bucket".into(), ..Default::default() };
        let err = add_s3_bucket_resource(&mut stack, "Bad", &conf).unwrap_err();
        assert!(matches!(err, SynthError::InvalidResource { .. }));
    }
}
