//! The three-stage run: fetch headlines, draft a post, deliver it.
//!
//! Stages run strictly in order and a failing stage stops the run. Stage
//! errors are folded into [`RunOutcome`] rather than propagated, so the
//! caller decides what to print.

use crate::api::{AskAsync, generate_post};
use crate::delivery::smtp::Mailer;
use crate::delivery::{DeliveryManager, DeliveryOutcome};
use crate::error::{FetchError, GenerateError};
use crate::models::{GeneratedPost, MarketContext};
use crate::scrapers::ContextSource;
use crate::utils::framed;
use tracing::{error, info, instrument};

/// How far a run got.
#[derive(Debug)]
pub enum RunOutcome {
    /// No headlines; nothing else ran.
    NoContext(FetchError),
    /// Headlines fetched but the model produced nothing; delivery never ran.
    NoPost {
        context: MarketContext,
        error: GenerateError,
    },
    /// A post was drafted and delivery was attempted.
    Delivered {
        context: MarketContext,
        post: GeneratedPost,
        delivery: DeliveryOutcome,
    },
}

/// Run the pipeline once.
#[instrument(level = "info", skip_all)]
pub async fn run<S, A, M>(source: &S, api: &A, delivery: &DeliveryManager<M>) -> RunOutcome
where
    S: ContextSource,
    A: AskAsync<Response = String>,
    M: Mailer,
{
    info!("Fetching market context");
    let context = match source.fetch_context().await {
        Ok(context) => context,
        Err(e) => {
            error!(error = %e, transient = e.is_transient(), "Error scraping market context");
            return RunOutcome::NoContext(e);
        }
    };

    info!(headlines = context.headlines.len(), date = %context.date, "Generating advisory post");
    let post = match generate_post(api, &context).await {
        Ok(post) => post,
        Err(error) => return RunOutcome::NoPost { context, error },
    };

    println!("{}", framed(post.as_str()));

    let outcome = delivery.deliver_post(&post).await;
    info!(sent = outcome.is_sent(), attempts = outcome.attempts(), "Delivery finished");

    RunOutcome::Delivered {
        context,
        post,
        delivery: outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::delivery::tests::{ScriptedMailer, mail_config, policy};
    use crate::outputs::failed::read_failure_record;
    use crate::scrapers::moneycontrol::MoneycontrolScraper;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    struct FixedSource(Vec<&'static str>);

    impl ContextSource for FixedSource {
        async fn fetch_context(&self) -> Result<MarketContext, FetchError> {
            Ok(MarketContext {
                date: "2025-05-06".to_string(),
                headlines: self.0.iter().map(|h| h.to_string()).collect(),
            })
        }
    }

    /// Returns a canned reply and counts how often it was asked.
    #[derive(Default)]
    struct CannedModel {
        reply: Option<&'static str>,
        calls: AtomicUsize,
        last_prompt: std::sync::Mutex<String>,
    }

    impl AskAsync for CannedModel {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = text.to_string();
            self.reply
                .map(str::to_string)
                .ok_or(GenerateError::EmptyCompletion)
        }
    }

    fn dir_entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_headlines_to_sent_email() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FixedSource(vec!["Markets fall 2%", "SIP inflows rise"]);
        let model = CannedModel {
            reply: Some("Volatility is normal. Keep your SIPs running 📈"),
            ..CannedModel::default()
        };
        let mailer = ScriptedMailer::failing(0);
        let delivery = DeliveryManager::new(&mailer, &mail_config(), &policy(tmp.path(), 3));

        let outcome = run(&source, &model, &delivery).await;

        match outcome {
            RunOutcome::Delivered { post, delivery, .. } => {
                assert_eq!(post.as_str(), "Volatility is normal. Keep your SIPs running 📈");
                assert_eq!(delivery, DeliveryOutcome::Sent { attempts: 1 });
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(model.last_prompt.lock().unwrap().contains("Markets fall 2%\nSIP inflows rise"));
        assert_eq!(mailer.calls(), 1);
        assert_eq!(dir_entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_fetch_network_error_halts_before_generation() {
        let tmp = tempfile::tempdir().unwrap();
        // nothing listens on port 1
        let source = MoneycontrolScraper::new(SourceConfig {
            url: Url::parse("http://127.0.0.1:1/news/").unwrap(),
            headline_selector: "li.clearfix".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let model = CannedModel {
            reply: Some("unused"),
            ..CannedModel::default()
        };
        let mailer = ScriptedMailer::failing(0);
        let delivery = DeliveryManager::new(&mailer, &mail_config(), &policy(tmp.path(), 3));

        let outcome = run(&source, &model, &delivery).await;

        assert!(matches!(outcome, RunOutcome::NoContext(FetchError::Http(_))));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(mailer.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_delivery() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FixedSource(vec!["Gold hits record"]);
        let model = CannedModel::default();
        let mailer = ScriptedMailer::failing(0);
        let delivery = DeliveryManager::new(&mailer, &mail_config(), &policy(tmp.path(), 3));

        let outcome = run(&source, &model, &delivery).await;

        assert!(matches!(
            outcome,
            RunOutcome::NoPost {
                error: GenerateError::EmptyCompletion,
                ..
            }
        ));
        assert_eq!(mailer.calls(), 0);
    }

    #[tokio::test]
    async fn test_auth_failures_persist_post() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("failed_posts");
        let source = FixedSource(vec!["Rupee slides", "FIIs sell"]);
        let model = CannedModel {
            reply: Some("Diversify beyond the rupee 🌍"),
            ..CannedModel::default()
        };
        let mailer = ScriptedMailer::failing(usize::MAX);
        let delivery = DeliveryManager::new(&mailer, &mail_config(), &policy(&dir, 3));

        let outcome = run(&source, &model, &delivery).await;

        let path = match outcome {
            RunOutcome::Delivered {
                delivery:
                    DeliveryOutcome::Persisted {
                        path,
                        subject,
                        attempts,
                        ..
                    },
                ..
            } => {
                assert_eq!(attempts, 3);
                assert!(subject.starts_with("LinkedIn Advisory Post - "));
                path
            }
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(mailer.calls(), 3);
        assert_eq!(dir_entries(&dir), 1);

        let record = read_failure_record(&path).await.unwrap();
        assert_eq!(record.content, "Diversify beyond the rupee 🌍");
        assert!(record.error.contains("authentication failed"));
    }
}
