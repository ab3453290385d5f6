use anyhow::{bail, Context};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use leadflow::api::http::{AssumeOnline, HttpClient, ReqwestHttpClient, TokioClock};
use leadflow::api::stats::{SocialProof, StatsClient};
use leadflow::error::WidgetError;
use leadflow::utils::mailto::MailtoKind;
use leadflow::widget::provider::{BookingEvent, WidgetMount, WidgetProvider};
use leadflow::{telemetry, Capabilities, Field, FormOrchestrator, IntakeConfig, SessionState, SubmitDecision};

/// Terminal host: there is no page to embed a scheduler into.
struct HeadlessWidget;

#[async_trait]
impl WidgetProvider for HeadlessWidget {
    async fn ready(&self) {
        futures::future::pending::<()>().await;
    }

    fn mount(&self, mount: &WidgetMount) -> Result<(), WidgetError> {
        Err(WidgetError::Mount {
            selector: mount.selector.clone(),
            reason: "no browser host".to_string(),
        })
    }

    fn subscribe(&self, _namespace: &str) -> UnboundedReceiver<BookingEvent> {
        unbounded_channel().1
    }

    fn destroy(&self, _selector: &str) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = IntakeConfig::from_env().context("invalid LEADFLOW_* configuration")?;
    telemetry::init_tracing()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [name, email, need] = args.as_slice() else {
        bail!("usage: leadflow <name> <email> <automation need>");
    };

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let stats = StatsClient::new(http.clone(), config.stats_url()).fetch().await;
    println!("{}", SocialProof::new(&stats).current());

    let form = FormOrchestrator::new(
        &config,
        Capabilities {
            http,
            network: Arc::new(AssumeOnline),
            clock: Arc::new(TokioClock),
            widget: Arc::new(HeadlessWidget),
            analytics: None,
        },
    );
    form.change_field(Field::Name, name.as_str());
    form.change_field(Field::Email, email.as_str());
    form.change_field(Field::AutomationNeed, need.as_str());

    match form.submit().await {
        SubmitDecision::Succeeded => {
            if let SessionState::Result { payload } = form.state() {
                if let Some(message) = payload.analysis.as_ref().and_then(|a| a.personalized_message.clone()) {
                    println!("{}", message);
                }
                if let Some(analysis) = payload.analysis.as_ref() {
                    for label in [
                        analysis.time_saved_label(),
                        analysis.cost_savings_label(),
                        analysis.timeline_label(),
                        analysis.recommended_tier.as_ref().map(|tier| tier.to_string()),
                    ]
                    .into_iter()
                    .flatten()
                    {
                        println!("  {}", label);
                    }
                }
                println!("Lead: {}", payload.lead_id().unwrap_or_else(|| "-".to_string()));
            }
            Ok(())
        }
        SubmitDecision::Invalid { .. } => {
            let session = form.snapshot();
            for field in Field::ALL {
                if let Some(error) = session.visible_error(field) {
                    eprintln!("{}: {}", field, error);
                }
            }
            bail!("form is not valid")
        }
        SubmitDecision::Failed { message } => {
            eprintln!("{}", message);
            eprintln!("{}", form.mail_fallback_link(MailtoKind::SubmissionFailed));
            bail!("submission failed")
        }
        other => bail!("unexpected submit outcome: {:?}", other),
    }
}
