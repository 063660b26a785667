use crate::analyzer;
use crate::cache::LoadCache;
use crate::config::Config;
use crate::report::{AnalysisReport, ReportStatus};
use crate::selection::{select, Selection};
use crate::summary;
use async_stream::stream;
use chrono::Utc;
use futures::Stream;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Runs load → analyze → report for analysis requests
pub struct AnalysisPipeline {
    config: Config,
    cache: Arc<LoadCache>,
}

impl AnalysisPipeline {
    /// Create a pipeline with its own load cache
    pub fn new(config: Config) -> Self {
        Self::with_cache(config, Arc::new(LoadCache::new()))
    }

    /// Create a pipeline sharing an existing load cache
    pub fn with_cache(config: Config, cache: Arc<LoadCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LoadCache> {
        &self.cache
    }

    /// Every request starts from the configured seed, so seeded runs repeat
    /// exactly.
    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Run one request with the configured keywords
    pub async fn run(&self) -> AnalysisReport {
        self.run_with_keywords(&self.config.keywords).await
    }

    /// Run one request with the given raw keyword string
    pub async fn run_with_keywords(&self, raw_keywords: &str) -> AnalysisReport {
        let mut rng = self.rng();
        let court = self.config.court;

        let (records, notices) = match select(&self.cache, &self.config, &mut rng).await {
            Selection::Loaded { records, notices } => (records, notices),
            Selection::NoData { notices } => {
                tracing::warn!(court = %court, "no data available for request");
                return AnalysisReport::no_data(court, notices);
            }
        };

        let keywords = analyzer::analyze(&records, raw_keywords);
        tracing::info!(
            court = %court,
            records = records.len(),
            keywords = keywords.len(),
            "analysis complete"
        );

        AnalysisReport {
            generated_at: Utc::now(),
            court,
            status: ReportStatus::Ok,
            notices,
            record_count: records.len(),
            keywords,
            outcome_distribution: summary::outcome_distribution(&records, self.config.top_outcomes),
            court_distribution: summary::court_distribution(&records),
            sample: summary::sample_records(&records, self.config.sample_size, &mut rng),
            records,
        }
    }

    /// One request per keyword line, all sharing this pipeline's load cache.
    /// Useful for stdio pipelines: `cat terms.txt | jurisbot analyze --stdin`
    pub fn process_keyword_lines<'a>(
        &'a self,
        lines: impl Iterator<Item = String> + 'a,
    ) -> impl Stream<Item = AnalysisReport> + 'a {
        Box::pin(stream! {
            for line in lines {
                yield self.run_with_keywords(&line).await;
            }
        })
    }
}
