use tracing::{info, instrument};

use crate::context::DeploymentContext;
use crate::error::Result;
use crate::lookup::ContextLookups;
use crate::regions::CLOUDFRONT_CERTIFICATE_REGION;
use crate::resources::{StaticSite, StaticSiteProps};
use crate::stack::{Environment, Stack, SynthesizedStack};

pub const STACK_NAME: &str = "MyStaticSite";
pub const SITE_CONSTRUCT_ID: &str = "StaticSite";
pub const DOMAIN_CONTEXT_KEY: &str = "domain";
pub const SUBDOMAIN_CONTEXT_KEY: &str = "subdomain";

/// The static site stack: reads `domain` and `subdomain` from the deployment
/// context and declares one [`StaticSite`] in `us-east-1`.
///
/// Supply the context with `static-site synth -c domain=mystaticsite.com -c subdomain=www`
/// or in cdk.json:
/// ```json
/// {
///   "context": {
///     "domain": "mystaticsite.com",
///     "subdomain": "www"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteApp {
    pub stack_name: String,
    pub env: Environment,
}

impl Default for SiteApp {
    fn default() -> Self {
        Self {
            stack_name: STACK_NAME.to_string(),
            env: Environment {
                region: CLOUDFRONT_CERTIFICATE_REGION.to_string(),
                account: None,
            },
        }
    }
}

impl SiteApp {
    pub fn with_account(mut self, account: &str) -> Self {
        self.env = self.env.with_account(account);
        self
    }

    /// reads the site identity out of the context. Both values are required.
    pub fn site_props(context: &DeploymentContext) -> Result<StaticSiteProps> {
        Ok(StaticSiteProps {
            domain_name: context.require(DOMAIN_CONTEXT_KEY)?.to_string(),
            site_sub_domain: context.require(SUBDOMAIN_CONTEXT_KEY)?.to_string(),
        })
    }

    #[instrument(skip_all, fields(stack = %self.stack_name))]
    pub fn synth<L: ContextLookups + ?Sized>(&self, context: &DeploymentContext, lookups: &L) -> Result<SynthesizedStack> {
        let props = Self::site_props(context)?;
        let mut stack = Stack::new(&self.stack_name, self.env.clone())?;
        stack.set_description(&format!("Static website for {}", props.site_domain()));
        let site = StaticSite::new(&mut stack, SITE_CONSTRUCT_ID, &props, lookups)?;
        let synthesized = stack.synth()?;
        info!(site = %site.site_domain, "static site ready");
        Ok(synthesized)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::SynthError;
    use crate::lookup::ContextCache;

    #[test]
    fn pinned_to_certificate_region() {
        let app = SiteApp::default();
        assert_eq!(app.stack_name, "MyStaticSite");
        assert_eq!(app.env.region, "us-east-1");
        assert_eq!(app.env.account, None);
        assert_eq!(app.with_account("123").env.account.as_deref(), Some("123"));
    }

    #[test]
    fn missing_context_fails_before_declaring_anything() {
        let ctx = DeploymentContext::from_args(["subdomain=www"]).unwrap();
        let err = SiteApp::default().synth(&ctx, &ContextCache::new()).unwrap_err();
        assert!(matches!(err, SynthError::MissingContextValue(ref k) if k == "domain"));

        let ctx = DeploymentContext::from_args(["domain=example.com"]).unwrap();
        let err = SiteApp::default().synth(&ctx, &ContextCache::new()).unwrap_err();
        assert!(matches!(err, SynthError::MissingContextValue(ref k) if k == "subdomain"));
    }
}
