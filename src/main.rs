use anyhow::Context;
use clap::Parser;
use postbox::core::form;
use postbox::domain::ports::IdentityProvider;
use postbox::utils::logger;
use postbox::{
    CliConfig, GraphQlClient, NotificationCenter, StaticIdentity, SubmissionOrchestrator,
    SubmissionOutcome, SubmitContext,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    let settings = cli.settings().context("invalid configuration")?;

    let (verbose, json_logs) = cli.log_flags(&settings);
    if json_logs {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting postbox CLI");
    if verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let identity = StaticIdentity::from_handle(cli.user.clone());
    let Some(session) = identity.current_user() else {
        eprintln!("❌ Sign in to Post (pass --user or set POSTBOX_USER)");
        std::process::exit(2);
    };

    let form = form::shared(cli.form_state());
    let layout = form::lock(&form).layout(Some(&session), cli.fixed_topic.as_deref());
    tracing::debug!("Form layout: {:?}", layout);

    let client = GraphQlClient::from_config(&settings);
    let notifier = Arc::new(NotificationCenter::new());
    let orchestrator = SubmissionOrchestrator::with_options(
        client,
        notifier.clone(),
        form,
        settings.submit_options(),
    );

    let context = SubmitContext::from_session(Some(&session), cli.fixed_topic.as_deref());

    match orchestrator.submit_form(&context).await {
        SubmissionOutcome::Succeeded(receipt) => {
            println!("✅ Post {} created", receipt.post.id);
            println!(
                "📁 Subreddit {}{}",
                receipt.topic_group_id,
                if receipt.created_topic { " (new)" } else { "" }
            );
        }
        SubmissionOutcome::Rejected(errors) => {
            for message in errors.messages() {
                eprintln!("- {}", message);
            }
            std::process::exit(2);
        }
        SubmissionOutcome::Failed { error, notification } => {
            let message = notifier
                .get(notification)
                .map(|notification| notification.message)
                .unwrap_or_default();
            tracing::error!("{:?} step failed: {}", error.kind(), error);
            eprintln!("❌ {}", message);
            std::process::exit(1);
        }
        SubmissionOutcome::Busy => {
            eprintln!("❌ A submission is already in progress");
            std::process::exit(1);
        }
    }

    Ok(())
}
