mod mocks;

use feed_datastore::{DataStore, SummaryState};
use feed_pulse::{
    types::{Channel, VideoInfo},
    FeedProcessor, FeedProcessorBuilder, ProcessOutcome, RunOutcome,
};
use mocks::{
    channel_scraper::{feed_xml, MockChannelScraper},
    datastore::MockDataStore,
    notifier::MockNotifier,
    summarizer::MockSummarizer,
    transcript_source::MockTranscriptSource,
};

type TestProcessor = FeedProcessor<
    MockDataStore,
    MockTranscriptSource,
    MockSummarizer,
    MockNotifier,
    MockChannelScraper,
>;

fn build_processor(
    store: MockDataStore,
    transcript_source: MockTranscriptSource,
    summarizer: MockSummarizer,
    notifier: MockNotifier,
    scraper: MockChannelScraper,
    channels: Vec<Channel>,
) -> TestProcessor {
    FeedProcessorBuilder::new()
        .store(store)
        .transcript_source(transcript_source)
        .summarizer(summarizer)
        .notifier(notifier)
        .channel_scraper(scraper)
        .channels(channels)
        .languages(["it", "en"])
        .build()
}

fn video(item_id: &str, title: &str) -> VideoInfo {
    VideoInfo {
        item_id: item_id.to_string(),
        title: title.to_string(),
        link: format!("https://www.youtube.com/watch?v={item_id}"),
        channel_name: "JTalks".to_string(),
        channel_id: "UC_jtalks".to_string(),
        transcript: None,
    }
}

async fn seed_pointers(store: &MockDataStore, pointers: &[(&str, &str)]) {
    for (channel_id, item_id) in pointers {
        store
            .set_pointer(channel_id, item_id, &format!("Channel {channel_id}"))
            .await
            .unwrap();
    }
}

// ─── process() scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_item_is_summarized_cached_and_announced() {
    let store = MockDataStore::default();
    let transcripts = MockTranscriptSource::default().with_transcript("X", "it", "T");
    let summarizer = MockSummarizer::new("S");
    let notifier = MockNotifier::default();

    let inner = store.inner.clone();
    let summarizer_calls = summarizer.calls.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        transcripts,
        summarizer,
        notifier,
        MockChannelScraper::default(),
        vec![],
    );

    let outcome = processor.process(&video("X", "Titolo X")).await.unwrap();
    assert_eq!(outcome, ProcessOutcome::Summarized);

    let entry = inner.peek_cache_entry("X").expect("X should be cached");
    assert_eq!(entry.transcript, "T");
    assert_eq!(entry.summary, SummaryState::Ok("S".into()));

    assert_eq!(
        messages.messages(),
        vec![
            "📢 New video from JTalks!\n🎥 Titolo X\n🔗 https://www.youtube.com/watch?v=X"
                .to_string(),
            "S".to_string(),
        ]
    );
    assert_eq!(
        *summarizer_calls.lock().unwrap(),
        vec![("T".to_string(), "Titolo X".to_string())]
    );
}

#[tokio::test]
async fn test_process_is_idempotent_after_success() {
    let transcripts = MockTranscriptSource::default().with_transcript("X", "it", "T");
    let summarizer = MockSummarizer::new("S");
    let notifier = MockNotifier::default();

    let transcript_calls = transcripts.calls.clone();
    let summarizer_calls = summarizer.calls.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        MockDataStore::default(),
        transcripts,
        summarizer,
        notifier,
        MockChannelScraper::default(),
        vec![],
    );

    let item = video("X", "Titolo X");
    assert_eq!(
        processor.process(&item).await.unwrap(),
        ProcessOutcome::Summarized
    );
    assert_eq!(processor.process(&item).await.unwrap(), ProcessOutcome::Cached);

    assert_eq!(summarizer_calls.lock().unwrap().len(), 1);
    assert_eq!(transcript_calls.lock().unwrap().len(), 1);

    let messages = messages.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2], messages[0]);
    assert_eq!(messages[3], "S");
}

#[tokio::test]
async fn test_item_without_transcript_is_announced_only() {
    let store = MockDataStore::default();
    let transcripts = MockTranscriptSource::default();
    let summarizer = MockSummarizer::new("unused");
    let notifier = MockNotifier::default();

    let inner = store.inner.clone();
    let transcript_calls = transcripts.calls.clone();
    let summarizer_calls = summarizer.calls.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        transcripts,
        summarizer,
        notifier,
        MockChannelScraper::default(),
        vec![],
    );

    let outcome = processor.process(&video("Y", "Titolo Y")).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::NoTranscript);
    assert!(outcome.is_success());
    assert_eq!(
        messages.messages(),
        vec!["📢 New video from JTalks!\n🎥 Titolo Y\n🔗 https://www.youtube.com/watch?v=Y"]
    );
    assert!(summarizer_calls.lock().unwrap().is_empty());
    assert_eq!(
        inner.peek_cache_entry("Y").unwrap().summary,
        SummaryState::NoTranscript
    );
    // every preferred language was tried
    assert_eq!(
        *transcript_calls.lock().unwrap(),
        vec![
            ("Y".to_string(), "it".to_string()),
            ("Y".to_string(), "en".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_summary_failure_is_cached_and_reported() {
    let store = MockDataStore::default();
    let transcripts = MockTranscriptSource::default().with_transcript("Z", "it", "T");
    let notifier = MockNotifier::default();

    let inner = store.inner.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        transcripts,
        MockSummarizer::failing("quota exceeded"),
        notifier,
        MockChannelScraper::default(),
        vec![],
    );

    let outcome = processor.process(&video("Z", "Titolo Z")).await.unwrap();

    assert_eq!(
        outcome,
        ProcessOutcome::SummaryFailed {
            reason: "quota exceeded".into()
        }
    );
    assert!(!outcome.is_success());

    let entry = inner.peek_cache_entry("Z").unwrap();
    assert_eq!(entry.transcript, "T");
    assert_eq!(entry.summary, SummaryState::Failed("quota exceeded".into()));

    assert_eq!(
        messages.messages(),
        vec![
            "📢 New video from JTalks!\n🎥 Titolo Z\n🔗 https://www.youtube.com/watch?v=Z"
                .to_string(),
            "❌ Summary not available for: Titolo Z".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_transcript_falls_back_to_second_language() {
    let transcripts = MockTranscriptSource::default().with_transcript("X", "en", "english words");
    let summarizer = MockSummarizer::new("S");

    let transcript_calls = transcripts.calls.clone();
    let summarizer_calls = summarizer.calls.clone();

    let processor = build_processor(
        MockDataStore::default(),
        transcripts,
        summarizer,
        MockNotifier::default(),
        MockChannelScraper::default(),
        vec![],
    );

    let outcome = processor.process(&video("X", "Titolo")).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Summarized);
    assert_eq!(transcript_calls.lock().unwrap().len(), 2);
    assert_eq!(summarizer_calls.lock().unwrap()[0].0, "english words");
}

#[tokio::test]
async fn test_transcript_source_error_escapes_process() {
    let store = MockDataStore::default();
    let inner = store.inner.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::failing("HTTP 429"),
        MockSummarizer::new("unused"),
        MockNotifier::default(),
        MockChannelScraper::default(),
        vec![],
    );

    let err = processor.process(&video("X", "Titolo")).await.unwrap_err();

    assert!(err.to_string().contains("HTTP 429"));
    assert!(inner.peek_cache_entry("X").is_none());
}

#[tokio::test]
async fn test_notification_failures_do_not_fail_processing() {
    let store = MockDataStore::default();
    let notifier = MockNotifier::failing();

    let inner = store.inner.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default().with_transcript("X", "it", "T"),
        MockSummarizer::new("S"),
        notifier,
        MockChannelScraper::default(),
        vec![],
    );

    let outcome = processor.process(&video("X", "Titolo")).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Summarized);
    assert_eq!(messages.messages().len(), 2);
    assert_eq!(
        inner.peek_cache_entry("X").unwrap().summary,
        SummaryState::Ok("S".into())
    );
}

// ─── Recovery scans ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_process_unprocessed_handles_only_uncached_pointers() {
    let store = MockDataStore::default();
    seed_pointers(&store, &[("c1", "A"), ("c2", "B"), ("c3", "C")]).await;
    store
        .put_cache_entry("A", "transcript A", &SummaryState::Ok("summary A".into()))
        .await
        .unwrap();

    let transcripts = MockTranscriptSource::default()
        .with_transcript("B", "it", "transcript B")
        .with_transcript("C", "it", "transcript C");
    let summarizer = MockSummarizer::new("S");
    let notifier = MockNotifier::default();

    let inner = store.inner.clone();
    let summarizer_calls = summarizer.calls.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        transcripts,
        summarizer,
        notifier,
        MockChannelScraper::default(),
        vec![],
    );

    let report = processor.process_unprocessed().await.unwrap();

    assert_eq!(report.succeeded, vec!["B", "C"]);
    assert_eq!(report.handled(), 2);

    let titles = summarizer_calls
        .lock()
        .unwrap()
        .iter()
        .map(|(_, title)| title.clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Video from Channel c2", "Video from Channel c3"]);
    assert_eq!(
        messages.messages()[0],
        "📢 New video from Channel c2!\n🎥 Video from Channel c2\n🔗 https://www.youtube.com/watch?v=B"
    );

    // the already summarized entry was never read
    assert_eq!(inner.peek_cache_entry("A").unwrap().access_count, 0);
}

#[tokio::test]
async fn test_process_pending_retries_failed_entries_with_cached_transcripts() {
    let store = MockDataStore::default();
    seed_pointers(&store, &[("c1", "A"), ("c2", "B"), ("c3", "C")]).await;
    store
        .put_cache_entry("A", "transcript A", &SummaryState::Ok("summary A".into()))
        .await
        .unwrap();
    store
        .put_cache_entry("B", "transcript B", &SummaryState::Failed("timeout".into()))
        .await
        .unwrap();
    store
        .put_cache_entry("C", "transcript C", &SummaryState::Failed("timeout".into()))
        .await
        .unwrap();

    let transcripts = MockTranscriptSource::default();
    let summarizer = MockSummarizer::new("fresh summary");

    let inner = store.inner.clone();
    let transcript_calls = transcripts.calls.clone();
    let summarizer_calls = summarizer.calls.clone();

    let processor = build_processor(
        store,
        transcripts,
        summarizer,
        MockNotifier::default(),
        MockChannelScraper::default(),
        vec![],
    );

    let report = processor.process_pending().await.unwrap();

    // most recently updated first
    assert_eq!(report.succeeded, vec!["C", "B"]);
    assert!(transcript_calls.lock().unwrap().is_empty());

    let transcripts = summarizer_calls
        .lock()
        .unwrap()
        .iter()
        .map(|(transcript, _)| transcript.clone())
        .collect::<Vec<_>>();
    assert_eq!(transcripts, vec!["transcript C", "transcript B"]);

    for item_id in ["B", "C"] {
        assert_eq!(
            inner.peek_cache_entry(item_id).unwrap().summary,
            SummaryState::Ok("fresh summary".into())
        );
    }
}

#[tokio::test]
async fn test_persistence_failure_is_isolated_per_item() {
    let store = MockDataStore::default();
    seed_pointers(&store, &[("c1", "B"), ("c2", "C")]).await;
    store.fail_writes_for("B");

    let inner = store.inner.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default()
            .with_transcript("B", "it", "transcript B")
            .with_transcript("C", "it", "transcript C"),
        MockSummarizer::new("S"),
        MockNotifier::default(),
        MockChannelScraper::default(),
        vec![],
    );

    let report = processor.process_unprocessed().await.unwrap();

    assert_eq!(report.errored, vec!["B"]);
    assert_eq!(report.succeeded, vec!["C"]);
    assert_eq!(
        inner.peek_cache_entry("C").unwrap().summary,
        SummaryState::Ok("S".into())
    );
}

// ─── run_once() ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_once_stops_after_unprocessed_items() {
    let store = MockDataStore::default();
    seed_pointers(&store, &[("c1", "A"), ("c2", "B")]).await;
    store
        .put_cache_entry("A", "transcript A", &SummaryState::Failed("timeout".into()))
        .await
        .unwrap();

    let scraper = MockChannelScraper::default();
    let inner = store.inner.clone();
    let scraper_calls = scraper.calls.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default().with_transcript("B", "it", "transcript B"),
        MockSummarizer::new("S"),
        MockNotifier::default(),
        scraper,
        vec![Channel::new("JTalks", "c1")],
    );

    let outcome = processor.run_once().await.unwrap();

    match outcome {
        RunOutcome::Unprocessed(report) => assert_eq!(report.succeeded, vec!["B"]),
        other => panic!("Expected unprocessed items to be handled, got {other:?}"),
    }
    assert!(inner.schema_initialized());
    assert_eq!(
        inner.peek_cache_entry("A").unwrap().summary,
        SummaryState::Failed("timeout".into()),
        "Pending entries must wait for a later run"
    );
    assert!(scraper_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_once_retries_pending_before_polling() {
    let store = MockDataStore::default();
    seed_pointers(&store, &[("c1", "A")]).await;
    store
        .put_cache_entry("A", "transcript A", &SummaryState::Pending)
        .await
        .unwrap();

    let scraper = MockChannelScraper::default();
    let scraper_calls = scraper.calls.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default(),
        MockSummarizer::new("S"),
        MockNotifier::default(),
        scraper,
        vec![Channel::new("JTalks", "c1")],
    );

    let outcome = processor.run_once().await.unwrap();

    assert!(matches!(outcome, RunOutcome::PendingRetry(ref r) if r.succeeded == vec!["A"]));
    assert!(scraper_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_once_does_nothing_when_notifier_unreachable() {
    let store = MockDataStore::default();
    seed_pointers(&store, &[("c1", "B")]).await;

    let scraper = MockChannelScraper::from_fixture("c1");
    let summarizer = MockSummarizer::new("S");
    let notifier = MockNotifier::unreachable();

    let inner = store.inner.clone();
    let scraper_calls = scraper.calls.clone();
    let summarizer_calls = summarizer.calls.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default().with_transcript("B", "it", "T"),
        summarizer,
        notifier,
        scraper,
        vec![Channel::new("Romeo Agresti", "c1")],
    );

    let outcome = processor.run_once().await.unwrap();

    assert_eq!(outcome, RunOutcome::NotifierUnreachable);
    assert!(outcome.report().is_none());
    assert!(!inner.schema_initialized());
    assert!(inner.peek_cache_entry("B").is_none());
    assert!(scraper_calls.lock().unwrap().is_empty());
    assert!(summarizer_calls.lock().unwrap().is_empty());
    assert!(messages.messages().is_empty());
}

#[tokio::test]
async fn test_run_once_polls_feed_and_moves_pointer() {
    let store = MockDataStore::default();
    let notifier = MockNotifier::default();

    let inner = store.inner.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default().with_transcript("Xk3v9pQ2LmA", "it", "trascrizione"),
        MockSummarizer::new("Riassunto"),
        notifier,
        MockChannelScraper::from_fixture("UCmlXlTE2oTArVL8DafyRsXA"),
        vec![Channel::new("Agresti", "UCmlXlTE2oTArVL8DafyRsXA")],
    );

    let outcome = processor.run_once().await.unwrap();
    assert!(
        matches!(outcome, RunOutcome::NewItems(ref r) if r.succeeded == vec!["Xk3v9pQ2LmA"]),
        "Unexpected outcome: {outcome:?}"
    );

    let pointers = inner.pointers();
    assert_eq!(pointers.len(), 1);
    assert_eq!(pointers[0].last_item_id, "Xk3v9pQ2LmA");
    // the feed's own title wins over the configured name
    assert_eq!(pointers[0].channel_name, "Romeo Agresti");

    assert_eq!(
        messages.messages(),
        vec![
            "📢 New video from Romeo Agresti!\n🎥 Mercato Juve: le ultime su Koopmeiners & Douglas Luiz\n🔗 https://www.youtube.com/watch?v=Xk3v9pQ2LmA".to_string(),
            "Riassunto".to_string(),
        ]
    );

    // nothing changed on the channel since
    let outcome = processor.run_once().await.unwrap();
    assert_eq!(outcome, RunOutcome::NewItems(Default::default()));
    assert_eq!(messages.messages().len(), 2);
}

#[tokio::test]
async fn test_failing_channel_does_not_block_others() {
    let scraper = MockChannelScraper::default()
        .with_feed("c2", feed_xml("Second", &[("v2", "Nuovo video"), ("v1", "Vecchio")]))
        .with_feed("c3", "<html>Service Unavailable</html>".to_string());
    let store = MockDataStore::default();

    let inner = store.inner.clone();

    let processor = build_processor(
        store,
        MockTranscriptSource::default(),
        MockSummarizer::new("unused"),
        MockNotifier::default(),
        scraper,
        vec![
            Channel::new("Missing", "c1"),
            Channel::new("Second", "c2"),
            Channel::new("Broken", "c3"),
        ],
    );

    let videos = processor.poll_new_items().await.unwrap();

    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].item_id, "v2");
    assert_eq!(videos[0].title, "Nuovo video");
    assert_eq!(videos[0].channel_name, "Second");
    assert_eq!(inner.pointers().len(), 1);

    // detection is reported once per upload
    assert!(processor.poll_new_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_video_without_transcript_is_announced_once_and_polling_continues() {
    let scraper =
        MockChannelScraper::default().with_feed("c1", feed_xml("Chan", &[("N", "Senza sottotitoli")]));
    let summarizer = MockSummarizer::new("unused");
    let notifier = MockNotifier::default();

    let scraper_calls = scraper.calls.clone();
    let summarizer_calls = summarizer.calls.clone();
    let messages = notifier.clone();

    let processor = build_processor(
        MockDataStore::default(),
        MockTranscriptSource::default(),
        summarizer,
        notifier,
        scraper,
        vec![Channel::new("Chan", "c1")],
    );

    let first = processor.run_once().await.unwrap();
    assert!(
        matches!(first, RunOutcome::NewItems(ref r) if r.succeeded == vec!["N"]),
        "Unexpected outcome: {first:?}"
    );

    for _ in 0..3 {
        let outcome = processor.run_once().await.unwrap();
        assert_eq!(outcome, RunOutcome::NewItems(Default::default()));
    }

    // every later run went back to polling the feed
    assert_eq!(scraper_calls.lock().unwrap().len(), 4);
    assert_eq!(
        messages.messages(),
        vec!["📢 New video from Chan!\n🎥 Senza sottotitoli\n🔗 https://www.youtube.com/watch?v=N"]
    );
    assert!(summarizer_calls.lock().unwrap().is_empty());
}
