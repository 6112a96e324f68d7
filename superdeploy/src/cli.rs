//! Command-line flags.
use crate::config::{
    DeploymentConfig, DEFAULT_ENVIRONMENT, DEFAULT_HEALTH_SETTLE_SECS, DEFAULT_IMAGE_TAG,
    DEFAULT_REGION,
};
use crate::observability::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// Flags of the `superdeploy` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "superdeploy",
    version,
    about = "SuperDeploy Python Deployment Script",
    after_help = "Examples:\n  superdeploy --project-name myapp                        # Full deployment\n  superdeploy --project-name myapp --plan-only            # Dry run\n  superdeploy --project-name myapp --infrastructure-only  # Infrastructure only\n  superdeploy --project-name myapp --application-only     # Application only"
)]
pub struct DeployArgs {
    /// Name of the project
    #[arg(long, value_name = "NAME")]
    pub project_name: String,

    /// Deployment environment
    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// AWS region
    #[arg(long, default_value = DEFAULT_REGION)]
    pub aws_region: String,

    /// Docker image tag
    #[arg(long, default_value = DEFAULT_IMAGE_TAG)]
    pub image_tag: String,

    /// Only run the infrastructure plan, don't push or deploy
    #[arg(long)]
    pub plan_only: bool,

    /// Only deploy infrastructure
    #[arg(long)]
    pub infrastructure_only: bool,

    /// Only deploy the application
    #[arg(long)]
    pub application_only: bool,

    /// Auto-approve infrastructure changes
    #[arg(long)]
    pub auto_approve: bool,

    /// Verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Project directory every tool runs in
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// AWS account id; resolved from the credential check when omitted
    #[arg(long, value_name = "ID")]
    pub aws_account_id: Option<String>,

    /// Seconds to wait before checking service health
    #[arg(long, value_name = "N", default_value_t = DEFAULT_HEALTH_SETTLE_SECS)]
    pub health_settle_secs: u64,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Write the JSON run report to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl DeployArgs {
    /// Builds the deployment configuration.
    ///
    /// Flag combinations are not checked here; the orchestrator rejects
    /// invalid ones before any stage runs.
    #[must_use]
    pub fn to_config(&self) -> DeploymentConfig {
        DeploymentConfig::builder(self.project_name.clone())
            .environment(self.environment.clone())
            .aws_region(self.aws_region.clone())
            .image_tag(self.image_tag.clone())
            .plan_only(self.plan_only)
            .infrastructure_only(self.infrastructure_only)
            .application_only(self.application_only)
            .auto_approve(self.auto_approve)
            .verbose(self.verbose)
            .project_dir(self.project_dir.clone())
            .aws_account_id(self.aws_account_id.clone())
            .health_settle_secs(self.health_settle_secs)
            .build_unchecked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        DeployArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = DeployArgs::try_parse_from(["superdeploy", "--project-name", "demo"]).unwrap();
        let config = args.to_config();

        assert_eq!(config, DeploymentConfig::builder("demo").build().unwrap());
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.report.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = DeployArgs::try_parse_from([
            "superdeploy",
            "--project-name",
            "shop",
            "--environment",
            "staging",
            "--aws-region",
            "eu-west-1",
            "--image-tag",
            "v3",
            "--plan-only",
            "--auto-approve",
            "--verbose",
            "--project-dir",
            "/srv/shop",
            "--aws-account-id",
            "111122223333",
            "--health-settle-secs",
            "0",
            "--log-format",
            "json",
            "--report",
            "report.json",
        ])
        .unwrap();
        let config = args.to_config();

        assert_eq!(config.environment, "staging");
        assert_eq!(config.aws_region, "eu-west-1");
        assert_eq!(config.image_tag, "v3");
        assert!(config.plan_only && config.auto_approve && config.verbose);
        assert_eq!(config.project_dir, PathBuf::from("/srv/shop"));
        assert_eq!(config.aws_account_id.as_deref(), Some("111122223333"));
        assert_eq!(config.health_settle_secs, 0);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_exclusive_modes_parse_but_fail_validation() {
        let args = DeployArgs::try_parse_from([
            "superdeploy",
            "--project-name",
            "demo",
            "--infrastructure-only",
            "--application-only",
        ])
        .unwrap();
        assert!(args.to_config().validate().is_err());
    }

    #[test]
    fn test_project_name_required() {
        assert!(DeployArgs::try_parse_from(["superdeploy"]).is_err());
    }
}
