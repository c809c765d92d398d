pub mod collect;
pub mod summarize;


use digest_core::{CollectionWindow, CoreError};
use llm_interface::LlmProvider;
use reddit_client::PostSource;
use storage::BlobStore;
use tracing::info;

pub use collect::{refilter, CollectReport, Collector, StageOutcome};
pub use summarize::{compose_digest, DigestReport, SummarizeRequest, Summarizer};

/// What one scheduled run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub collect: StageOutcome<CollectReport>,
    pub digest: Option<DigestReport>,
}

/// Collect, then summarize when a summarizer is attached.
pub struct Pipeline<S, B, P> {
    collector: Collector<S, B>,
    summarizer: Option<Summarizer<P, B>>,
}

impl<S, B, P> Pipeline<S, B, P>
where
    S: PostSource,
    B: BlobStore,
    P: LlmProvider,
{
    pub fn new(collector: Collector<S, B>) -> Self {
        Self {
            collector,
            summarizer: None,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Summarizer<P, B>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn collector(&self) -> &Collector<S, B> {
        &self.collector
    }

    pub async fn run(&self, window: &CollectionWindow) -> Result<RunReport, CoreError> {
        let collect = self.collector.collect(window).await?;

        let digest = match (&collect, &self.summarizer) {
            (StageOutcome::Completed(report), Some(summarizer)) => {
                let request = report.summarize_request();
                info!("Triggering summarize for {}", request.date);
                Some(summarizer.summarize(&request).await?)
            }
            (StageOutcome::Completed(report), None) => {
                info!("Summarize trigger disabled, digest for {} not generated", report.date);
                None
            }
            (StageOutcome::Skipped { .. }, _) => None,
        };

        Ok(RunReport { collect, digest })
    }
}
