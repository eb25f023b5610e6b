pub use crate::error::SynthError;
pub use crate::stack::{Environment, Stack};
pub use crate::template::{get_att, get_ref, CfnResource, StrVal};

mod s3_bucket;
pub use s3_bucket::*;
mod cloudfront;
pub use cloudfront::*;
mod route53;
pub use route53::*;

// higher level resources:
mod static_website;
pub use static_website::*;
