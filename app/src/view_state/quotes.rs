// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use common::{QuoteEntity, QuoteState, ZenQuote};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::ActionError;
use crate::live::{LiveQuery, Subscription};
use crate::quotes_api::{QuoteSource, QuotesApiError};
use crate::repository::QuoteRepository;

/// State behind the home screen: the quote of the moment, whether it is
/// already a favourite, and the list of favourites.
pub struct QuotesViewState {
    repository: QuoteRepository,
    source: Arc<dyn QuoteSource>,
    quote_state: watch::Sender<QuoteState>,
    is_favorite: watch::Sender<bool>,
    favorite_quotes: LiveQuery<Vec<QuoteEntity>>,
    // Number of the most recently started fetch.
    latest_fetch: Mutex<u64>,
}

impl QuotesViewState {
    pub fn new(repository: QuoteRepository, source: Arc<dyn QuoteSource>) -> Self {
        let favorite_quotes = repository.get_all_favorite_quotes();
        Self {
            repository,
            source,
            quote_state: watch::Sender::new(QuoteState::Idle),
            is_favorite: watch::Sender::new(false),
            favorite_quotes,
            latest_fetch: Mutex::new(0),
        }
    }

    pub fn quote_state(&self) -> QuoteState {
        self.quote_state.borrow().clone()
    }

    pub fn subscribe_quote_state(&self) -> watch::Receiver<QuoteState> {
        self.quote_state.subscribe()
    }

    pub fn is_favorite(&self) -> bool {
        *self.is_favorite.borrow()
    }

    pub fn subscribe_is_favorite(&self) -> watch::Receiver<bool> {
        self.is_favorite.subscribe()
    }

    pub fn favorite_quotes(&self) -> Vec<QuoteEntity> {
        self.favorite_quotes.latest().unwrap_or_default()
    }

    pub fn subscribe_favorites(&self) -> Subscription<Vec<QuoteEntity>> {
        self.favorite_quotes.subscribe()
    }

    /// Moves to `Loading`, asks the source for quotes once and settles on
    /// `Loaded` with the first quote or `Failed` with the error text. A first
    /// quote with blank text or author counts as a failure. When
    /// several fetches overlap only the last one started may publish.
    pub async fn fetch_random_quote(&self) {
        let fetch_id = {
            let mut latest = self.latest_fetch.lock();
            *latest += 1;
            *latest
        };
        self.quote_state.send_replace(QuoteState::Loading);

        let outcome = self
            .source
            .fetch_quotes()
            .await
            .and_then(|quotes| quotes.into_iter().next().ok_or(QuotesApiError::Empty))
            .and_then(|zen| {
                if zen.quote.trim().is_empty() || zen.author.trim().is_empty() {
                    Err(QuotesApiError::Blank)
                } else {
                    Ok(zen)
                }
            });

        match outcome {
            Ok(ZenQuote { quote, author }) => {
                let saved = match self.repository.is_quote_saved(&quote, &author).await {
                    Ok(saved) => saved,
                    Err(e) => {
                        error!("Could not check favourite status: {:?}", e);
                        false
                    }
                };
                if !self.is_latest_fetch(fetch_id) {
                    debug!("Dropping result of superseded fetch #{}.", fetch_id);
                    return;
                }
                self.is_favorite.send_replace(saved);
                self.quote_state
                    .send_replace(QuoteState::Loaded { quote, author });
            }
            Err(e) => {
                if !self.is_latest_fetch(fetch_id) {
                    debug!("Dropping error of superseded fetch #{}.", fetch_id);
                    return;
                }
                warn!("Failed to fetch quote: {}", e);
                self.is_favorite.send_replace(false);
                self.quote_state.send_replace(QuoteState::Failed(e.to_string()));
            }
        }
    }

    fn is_latest_fetch(&self, fetch_id: u64) -> bool {
        *self.latest_fetch.lock() == fetch_id
    }

    fn is_current_quote(&self, quote: &str, author: &str) -> bool {
        self.quote_state.borrow().quote() == Some((quote, author))
    }

    /// Saves a favourite. If it is the quote on screen the favourite flag
    /// flips right away and is rolled back should the write fail.
    pub async fn save_quote_to_favorites(&self, quote: &str, author: &str) -> Result<(), ActionError> {
        self.set_favorite_optimistically(quote, author, true, async {
            self.repository.save_quote(quote, author).await.map(|_| ())
        })
        .await
    }

    pub async fn remove_quote_from_favorites(&self, quote: &str, author: &str) -> Result<(), ActionError> {
        self.set_favorite_optimistically(quote, author, false, async {
            self.repository.delete_quote(quote, author).await.map(|_| ())
        })
        .await
    }

    async fn set_favorite_optimistically(
        &self,
        quote: &str,
        author: &str,
        favorite: bool,
        write: impl Future<Output = anyhow::Result<()>>,
    ) -> Result<(), ActionError> {
        let previous = self
            .is_current_quote(quote, author)
            .then(|| self.is_favorite.send_replace(favorite));

        if let Err(e) = write.await {
            if let Some(previous) = previous {
                if self.is_current_quote(quote, author) {
                    self.is_favorite.send_replace(previous);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn check_if_quote_is_saved(&self, quote: &str, author: &str) -> Result<bool, ActionError> {
        Ok(self.repository.is_quote_saved(quote, author).await?)
    }

    /// A favourite picked at random, shown when the remote fetch failed.
    /// `None` when there are no favourites.
    pub async fn random_saved_quote(&self) -> Result<Option<QuoteEntity>, ActionError> {
        let quotes = self.favorite_quotes.subscribe().first().await?;
        Ok(quotes.choose(&mut rand::thread_rng()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::dao::QuoteDao;
    use crate::database::{Store, MIGRATIONS, SCHEMA_VERSION};
    use crate::quotes_api::QuotesApiResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn zen(quote: &str, author: &str) -> ZenQuote {
        ZenQuote {
            quote: quote.to_string(),
            author: author.to_string(),
        }
    }

    /// Replies are handed out in call order. A reply waits for its gate
    /// (if any) before returning.
    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<VecDeque<(Option<oneshot::Receiver<()>>, Option<Vec<ZenQuote>>)>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn reply(self, quotes: Option<Vec<ZenQuote>>) -> Self {
            self.replies.lock().push_back((None, quotes));
            self
        }

        fn gated_reply(self, quotes: Vec<ZenQuote>) -> (Self, oneshot::Sender<()>) {
            let (open, gate) = oneshot::channel();
            self.replies.lock().push_back((Some(gate), Some(quotes)));
            (self, open)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn fetch_quotes(&self) -> QuotesApiResult<Vec<ZenQuote>> {
            let (gate, quotes) = self
                .replies
                .lock()
                .pop_front()
                .expect("no scripted reply left");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            // `None` plays the part of an unavailable service.
            quotes.ok_or(QuotesApiError::Status(503))
        }
    }

    async fn setup_view_state(source: ScriptedSource) -> (Arc<QuotesViewState>, Arc<ScriptedSource>) {
        let store = Store::open_in_memory(SCHEMA_VERSION, MIGRATIONS).await.unwrap();
        let clock = Arc::new(FixedClock::on(2025, 1, 1).unwrap());
        let repository = QuoteRepository::new(QuoteDao::new(store), clock);
        let source = Arc::new(source);
        let state = QuotesViewState::new(repository, source.clone());
        (Arc::new(state), source)
    }

    async fn wait_for_calls(source: &ScriptedSource, calls: usize) {
        while source.calls() < calls {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let (state, _source) = setup_view_state(ScriptedSource::default()).await;
        assert_eq!(state.quote_state(), QuoteState::Idle);
        assert!(!state.is_favorite());
    }

    #[tokio::test]
    async fn test_fetch_goes_through_loading_to_loaded() {
        let (source, open) = ScriptedSource::default()
            .gated_reply(vec![zen("Stay hungry.", "Steve Jobs"), zen("Other", "Someone")]);
        let (state, source) = setup_view_state(source).await;

        let fetch = tokio::spawn({
            let state = state.clone();
            async move { state.fetch_random_quote().await }
        });
        wait_for_calls(&source, 1).await;
        assert_eq!(state.quote_state(), QuoteState::Loading);

        open.send(()).unwrap();
        fetch.await.unwrap();

        // Only the first element of the batch is used.
        assert_eq!(
            state.quote_state(),
            QuoteState::Loaded {
                quote: "Stay hungry.".to_string(),
                author: "Steve Jobs".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_carries_message() {
        let (state, _source) = setup_view_state(ScriptedSource::default().reply(None)).await;

        state.fetch_random_quote().await;

        assert_eq!(
            state.quote_state(),
            QuoteState::Failed("Quote service responded with status 503".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_failure() {
        let (state, _source) = setup_view_state(ScriptedSource::default().reply(Some(vec![]))).await;

        state.fetch_random_quote().await;

        let message = state.quote_state().error().map(str::to_string);
        assert_eq!(message.as_deref(), Some("Quote service returned no quotes"));
    }

    #[tokio::test]
    async fn test_blank_quote_is_a_failure() {
        let source = ScriptedSource::default()
            .reply(Some(vec![zen("", ""), zen("Later", "Someone")]))
            .reply(Some(vec![zen("Words", "  ")]));
        let (state, _source) = setup_view_state(source).await;

        state.fetch_random_quote().await;
        assert_eq!(
            state.quote_state(),
            QuoteState::Failed("Quote service returned a blank quote".to_string())
        );

        state.fetch_random_quote().await;
        assert!(state.quote_state().error().is_some());
        assert!(!state.is_favorite());
    }

    #[tokio::test]
    async fn test_failed_state_can_be_refetched() {
        let source = ScriptedSource::default()
            .reply(None)
            .reply(Some(vec![zen("Q", "A")]));
        let (state, _source) = setup_view_state(source).await;

        state.fetch_random_quote().await;
        assert!(state.quote_state().error().is_some());

        state.fetch_random_quote().await;
        assert_eq!(state.quote_state().quote(), Some(("Q", "A")));
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_overwrite_newer_one() {
        let (source, open_first) = ScriptedSource::default().gated_reply(vec![zen("Old", "A")]);
        let (source, open_second) = source.gated_reply(vec![zen("New", "B")]);
        let (state, source) = setup_view_state(source).await;

        let first = tokio::spawn({
            let state = state.clone();
            async move { state.fetch_random_quote().await }
        });
        wait_for_calls(&source, 1).await;
        let second = tokio::spawn({
            let state = state.clone();
            async move { state.fetch_random_quote().await }
        });
        wait_for_calls(&source, 2).await;

        open_second.send(()).unwrap();
        second.await.unwrap();
        open_first.send(()).unwrap();
        first.await.unwrap();

        assert_eq!(state.quote_state().quote(), Some(("New", "B")));
    }

    #[tokio::test]
    async fn test_favorite_flag_follows_saves_and_fetches() {
        let source = ScriptedSource::default()
            .reply(Some(vec![zen("Q", "A")]))
            .reply(Some(vec![zen("Q", "A")]));
        let (state, _source) = setup_view_state(source).await;
        let mut favorites = state.subscribe_favorites();

        state.fetch_random_quote().await;
        assert!(!state.is_favorite());

        state.save_quote_to_favorites("Q", "A").await.unwrap();
        assert!(state.is_favorite());
        assert!(state.check_if_quote_is_saved("Q", "A").await.unwrap());
        let saved = favorites.wait_for(|q| q.len() == 1).await.unwrap();
        assert_eq!(saved[0].date, "01-01-2025 00:00:00");

        // A fresh fetch of the same quote reads the flag back from storage.
        state.fetch_random_quote().await;
        assert!(state.is_favorite());

        state.remove_quote_from_favorites("Q", "A").await.unwrap();
        assert!(!state.is_favorite());
        assert!(favorites.wait_for(|q| q.is_empty()).await.is_ok());
    }

    #[tokio::test]
    async fn test_saving_another_quote_leaves_flag_alone() {
        let (state, _source) =
            setup_view_state(ScriptedSource::default().reply(Some(vec![zen("Q", "A")]))).await;
        state.fetch_random_quote().await;

        state.save_quote_to_favorites("Other", "B").await.unwrap();

        assert!(!state.is_favorite());
        assert!(state.check_if_quote_is_saved("Other", "B").await.unwrap());
    }

    #[tokio::test]
    async fn test_random_saved_quote() {
        let (state, _source) = setup_view_state(ScriptedSource::default()).await;
        assert_eq!(state.random_saved_quote().await.unwrap(), None);

        state.save_quote_to_favorites("Q", "A").await.unwrap();
        state
            .subscribe_favorites()
            .wait_for(|q| q.len() == 1)
            .await
            .unwrap();

        let picked = state.random_saved_quote().await.unwrap().unwrap();
        assert_eq!((picked.quote.as_str(), picked.author.as_str()), ("Q", "A"));
    }
}
