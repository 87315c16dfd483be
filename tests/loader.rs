use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future;
use jobboard_loader::{BatchFunction, DispatchMode, LoadError, Loader, LoaderConfig};
use tokio::sync::Notify;

#[derive(Debug, PartialEq, Eq, Clone)]
struct DummyData(String);

#[derive(Debug, PartialEq, Eq, Clone)]
struct DummyError(String);

#[derive(Default)]
struct DummyContext {
    map: HashMap<i64, String>,
    calls: Mutex<Vec<Vec<i64>>>,
    fail: AtomicBool,
    /// Fails any fetch whose keys include this one.
    fail_on: Mutex<Option<i64>>,
    /// When set, the next fetch waits for `gate` before returning.
    gated: AtomicBool,
    gate: Notify,
}

impl DummyContext {
    fn with(entries: &[(i64, &str)]) -> Arc<Self> {
        let map = entries.iter().map(|(k, v)| (*k, (*v).to_owned())).collect();
        Arc::new(Self { map, ..Default::default() })
    }

    /// Keys of every fetch so far, each sorted.
    fn calls(&self) -> Vec<Vec<i64>> {
        let mut calls = self.calls.lock().unwrap().clone();
        for keys in calls.iter_mut() {
            keys.sort();
        }
        calls
    }
}

struct DummyDataLoader;

#[async_trait]
impl BatchFunction<i64, DummyData> for DummyDataLoader {
    type Context = Arc<DummyContext>;
    type Error = DummyError;

    async fn load(
        keys: &[i64],
        context: &Arc<DummyContext>,
    ) -> Result<Vec<(i64, DummyData)>, DummyError> {
        context.calls.lock().unwrap().push(keys.to_vec());
        if context.gated.swap(false, Ordering::SeqCst) {
            context.gate.notified().await;
        }
        let fail_on = *context.fail_on.lock().unwrap();
        if context.fail.load(Ordering::SeqCst) || fail_on.map_or(false, |k| keys.contains(&k)) {
            return Err(DummyError("connection refused".to_owned()));
        }
        Ok(keys
            .iter()
            .filter_map(|k| context.map.get(k).cloned().map(|v| (*k, DummyData(v))))
            .collect::<Vec<_>>())
    }
}

fn data(s: &str) -> Option<DummyData> {
    Some(DummyData(s.to_owned()))
}

#[tokio::test]
async fn basic_load() {
    let context = DummyContext::with(&[(42, "Foo")]);

    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));
    assert_eq!(loader.load(42).await, Ok(data("Foo")));
    assert_eq!(context.calls(), vec![vec![42]]);
}

#[tokio::test]
async fn repeated_load_across_batches_fetches_twice() {
    let context = DummyContext::with(&[(42, "Foo")]);

    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));
    assert_eq!(loader.load(42).await, Ok(data("Foo")));
    assert_eq!(loader.load(42).await, Ok(data("Foo")));
    assert_eq!(context.calls(), vec![vec![42], vec![42]]);
}

#[tokio::test]
async fn basic_load_many() {
    let context = DummyContext::with(&[
        (42, "one fish"),
        (12, "two fish"),
        (5, "red fish"),
        (8, "blue fish"),
    ]);

    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));
    assert_eq!(
        loader.load_many(vec![5, 12, 8]).await,
        Ok(vec![data("red fish"), data("two fish"), data("blue fish")])
    );
}

#[tokio::test]
async fn load_async() {
    let context = DummyContext::with(&[
        (42, "one fish"),
        (12, "two fish"),
        (5, "red fish"),
        (8, "blue fish"),
    ]);

    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));

    let tuple = future::join4(
        loader.load(5),
        loader.load_many(vec![5, 42]),
        loader.load(99),
        loader.load(12),
    );

    assert_eq!(
        tuple.await,
        (
            Ok(data("red fish")),
            Ok(vec![data("red fish"), data("one fish")]),
            Ok(None),
            Ok(data("two fish"))
        )
    );
    assert_eq!(context.calls(), vec![vec![5, 12, 42, 99]]);
}

#[derive(Default)]
struct CompanyNames {
    calls: Mutex<Vec<Vec<String>>>,
}

struct CompanyNameBatch;

#[async_trait]
impl BatchFunction<String, String> for CompanyNameBatch {
    type Context = Arc<CompanyNames>;
    type Error = DummyError;

    async fn load(
        keys: &[String],
        context: &Arc<CompanyNames>,
    ) -> Result<Vec<(String, String)>, DummyError> {
        context.calls.lock().unwrap().push(keys.to_vec());
        Ok(keys
            .iter()
            .filter_map(|k| match k.as_str() {
                "A" => Some((k.clone(), "Acme".to_owned())),
                "C" => Some((k.clone(), "Globex".to_owned())),
                _ => None,
            })
            .collect())
    }
}

#[tokio::test]
async fn duplicate_keys_fan_out_from_one_fetch() {
    let context = Arc::new(CompanyNames::default());
    let loader = Loader::new(CompanyNameBatch, Arc::clone(&context));

    let handles = ["A", "B", "A", "C"].iter().map(|k| loader.load(k.to_string())).collect::<Vec<_>>();
    let results = future::join_all(handles).await;

    assert_eq!(
        results,
        vec![
            Ok(Some("Acme".to_owned())),
            Ok(None),
            Ok(Some("Acme".to_owned())),
            Ok(Some("Globex".to_owned())),
        ]
    );
    let calls = context.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![vec!["A".to_owned(), "B".to_owned(), "C".to_owned()]]);
}

#[tokio::test]
async fn failed_fetch_fails_every_caller_then_recovers() {
    let context = DummyContext::with(&[(1, "one"), (2, "two")]);
    context.fail.store(true, Ordering::SeqCst);
    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));

    let failure = LoadError::Fetch(DummyError("connection refused".to_owned()));
    let (a, b, c) = future::join3(loader.load(1), loader.load(2), loader.load_many(vec![1, 2])).await;
    assert_eq!(a, Err(failure.clone()));
    assert_eq!(b, Err(failure.clone()));
    assert_eq!(c, Err(failure));

    context.fail.store(false, Ordering::SeqCst);
    assert_eq!(loader.load(1).await, Ok(data("one")));
    assert_eq!(context.calls(), vec![vec![1, 2], vec![1]]);
}

#[tokio::test]
async fn empty_load_many_skips_fetch() {
    let context = DummyContext::with(&[]);
    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));

    assert_eq!(loader.load_many(Vec::new()).await, Ok(Vec::new()));
    assert!(context.calls().is_empty());
}

#[tokio::test]
async fn manual_dispatch_waits_for_flush() {
    let context = DummyContext::with(&[(1, "one"), (2, "two"), (3, "three")]);
    let config = LoaderConfig::default().with_dispatch(DispatchMode::Manual);
    let loader = Loader::with_config(DummyDataLoader {}, Arc::clone(&context), config);

    let mut first = Box::pin(loader.load(1));
    let second = loader.load(2);
    tokio::task::yield_now().await;
    assert!(futures::poll!(&mut first).is_pending());
    assert!(context.calls().is_empty());

    loader.flush();
    let third = loader.load(3);
    let again = loader.load(1);
    loader.flush();

    assert_eq!(
        future::join4(first, second, third, again).await,
        (Ok(data("one")), Ok(data("two")), Ok(data("three")), Ok(data("one")))
    );
    assert_eq!(context.calls(), vec![vec![1, 2], vec![1, 3]]);
}

#[tokio::test]
async fn max_batch_size_splits_fetches() {
    let context = DummyContext::with(&[(1, "one"), (2, "two"), (3, "three")]);
    let config = LoaderConfig::default().with_max_batch_size(2);
    let loader = Loader::with_config(DummyDataLoader {}, Arc::clone(&context), config);

    let values = loader.load_many(vec![1, 2, 3, 4, 1]).await;
    assert_eq!(values, Ok(vec![data("one"), data("two"), data("three"), None, data("one")]));

    let calls = context.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|keys| keys.len() <= 2));
    let mut all = calls.concat();
    all.sort();
    assert_eq!(all, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn failed_chunk_fails_the_whole_batch() {
    let context = DummyContext::with(&[(1, "one"), (2, "two"), (3, "three")]);
    *context.fail_on.lock().unwrap() = Some(3);
    let config = LoaderConfig::default().with_max_batch_size(2);
    let loader = Loader::with_config(DummyDataLoader {}, Arc::clone(&context), config);

    let failure = LoadError::Fetch(DummyError("connection refused".to_owned()));
    let (a, b, c) = future::join3(loader.load(1), loader.load(2), loader.load(3)).await;
    assert_eq!(a, Err(failure.clone()));
    assert_eq!(b, Err(failure.clone()));
    assert_eq!(c, Err(failure));
    assert_eq!(context.calls(), vec![vec![1, 2], vec![3]]);
}

#[tokio::test]
async fn load_during_fetch_starts_next_batch() {
    let context = DummyContext::with(&[(1, "one"), (2, "two")]);
    context.gated.store(true, Ordering::SeqCst);
    let loader = Loader::new(DummyDataLoader {}, Arc::clone(&context));

    let first = loader.load(1);
    while context.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    let second = loader.load(2);
    let again = loader.load(1);
    context.gate.notify_one();

    assert_eq!(
        future::join3(first, second, again).await,
        (Ok(data("one")), Ok(data("two")), Ok(data("one")))
    );
    assert_eq!(context.calls(), vec![vec![1], vec![1, 2]]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn manual_dispatch_is_one_fetch_on_multi_thread_runtime() {
    let entries = (0..50).map(|k| (k, format!("value {k}"))).collect::<Vec<_>>();
    let entries = entries.iter().map(|(k, v)| (*k, v.as_str())).collect::<Vec<_>>();
    let context = DummyContext::with(&entries);
    let config = LoaderConfig::default().with_dispatch(DispatchMode::Manual);
    let loader = Loader::with_config(DummyDataLoader {}, Arc::clone(&context), config);

    for round in 1..=50 {
        let handles = (0..200).map(|i| loader.load(i % 50)).collect::<Vec<_>>();
        loader.flush();
        let values = future::join_all(handles).await;
        for (i, value) in values.into_iter().enumerate() {
            assert_eq!(value, Ok(Some(DummyData(format!("value {}", i % 50)))));
        }

        let calls = context.calls();
        assert_eq!(calls.len(), round);
        assert_eq!(calls[round - 1], (0..50).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn dropping_loader_closes_pending_loads() {
    let context = DummyContext::with(&[(1, "one")]);
    let config = LoaderConfig::default().with_dispatch(DispatchMode::Manual);
    let loader = Loader::with_config(DummyDataLoader {}, Arc::clone(&context), config);

    let pending = loader.load(1);
    drop(loader);
    assert_eq!(pending.await, Err(LoadError::WorkerClosed));
    assert!(context.calls().is_empty());
}
