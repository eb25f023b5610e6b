//! Synthesizes the CloudFormation template for a static website: an S3
//! content bucket, a CloudFront distribution serving it over HTTPS with a
//! pre-provisioned ACM certificate, and a Route53 alias record for the site
//! domain.
//!
//! ```no_run
//! use static_site::{ContextCache, DeploymentContext, SiteApp};
//!
//! let context = DeploymentContext::from_args(["domain=mystaticsite.com", "subdomain=www"])?;
//! let lookups = ContextCache::load("cdk.context.json".as_ref())?;
//! let stack = SiteApp::default().synth(&context, &lookups)?;
//! stack.write_to("cdk.out".as_ref())?;
//! # Ok::<(), static_site::SynthError>(())
//! ```

pub mod app;
pub mod context;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod regions;
pub mod resources;
pub mod stack;
pub mod template;

pub use app::SiteApp;
pub use context::DeploymentContext;
pub use error::SynthError;
pub use lookup::{ContextCache, ContextLookups, HostedZoneProvider, MissingContext, ParameterStore};
pub use stack::{Environment, Stack, SynthesizedStack};
pub use template::Template;
