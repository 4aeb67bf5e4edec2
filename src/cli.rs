use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use jenkins_pulse::config::{Config, OutputFormat};
use jenkins_pulse::output;
use jenkins_pulse::AggregationEngine;

#[derive(Parser)]
#[command(name = "jenkins-pulse")]
#[command(author, version, about = "Jenkins pipeline status aggregator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./jenkins-pulse.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "JENKINS_URL")]
    url: Option<String>,

    #[arg(long, global = true, env = "JENKINS_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "JENKINS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Status of every job with representative stages
    Pipelines,

    /// Description and last build stages for one job
    Pipeline { job: String },

    /// Recent builds across jobs, newest first
    History {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Details of a single build
    Build { job: String, number: u64 },

    /// Queue a new build of a job
    Trigger { job: String },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        config
            .jenkins
            .apply_overrides(self.url.clone(), self.user.clone(), self.token.clone());
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config.output.pretty |= self.pretty;
        Ok(config)
    }

    async fn render(&self, engine: &AggregationEngine, config: &Config) -> Result<String> {
        let pretty = config.output.pretty;
        let table = config.output.format == OutputFormat::Table;

        let rendered = match &self.command {
            Commands::Pipelines => {
                let pipelines = engine.list_pipelines().await;
                info!("Aggregated {} pipelines", pipelines.len());
                if table {
                    output::render_pipelines(&pipelines)
                } else {
                    output::render_json(&pipelines, pretty)?
                }
            }
            Commands::Pipeline { job } => {
                let detail = engine.get_pipeline_detail(job).await?;
                if table {
                    output::render_pipeline_detail(&detail)
                } else {
                    output::render_json(&detail, pretty)?
                }
            }
            Commands::History { limit } => {
                let report = engine.build_history_report(*limit).await;
                info!(
                    "Collected {} builds ({} jobs failed)",
                    report.entries.len(),
                    report.failures.len()
                );
                if table {
                    output::render_history(&report)
                } else {
                    output::render_json(&report.entries, pretty)?
                }
            }
            Commands::Build { job, number } => {
                let build = engine.get_build_detail(job, *number).await?;
                if table {
                    output::render_build(&build)
                } else {
                    output::render_json(&build, pretty)?
                }
            }
            Commands::Trigger { job } => {
                let result = engine.trigger_build(job).await?;
                if table {
                    output::render_trigger(&result)
                } else {
                    output::render_json(&result, pretty)?
                }
            }
        };

        Ok(rendered)
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.load_config()?;
        let engine = AggregationEngine::from_credentials(
            config.jenkins.credentials(),
            config.jenkins.engine_settings(),
        )?;
        info!("Engine mode: {:?}", engine.mode());

        let rendered = self.render(&engine, &config).await?;

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, rendered)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{rendered}");
        }

        Ok(())
    }
}
