use chrono::Utc;

use crate::{
    config::Config,
    data_seeder::seed_demo_corpus,
    feed_interface::FeedInterface,
    infrastructure::corpus::{Corpus, InMemoryCorpus},
};

const DEMO_SEED: u64 = 2024;

#[derive(Clone)]
pub struct AppState {
    pub feed: FeedInterface,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mut corpus = Corpus::new();
        if config.seed_demo_data {
            seed_demo_corpus(&mut corpus, DEMO_SEED, Utc::now())?;
        }

        // One corpus, one cache: every route shares this feed
        let feed = FeedInterface::new(InMemoryCorpus::new(corpus), config.toplists.clone());

        Ok(Self { feed, config })
    }
}
