//! Test aids shared by the courier crates.

/// Metrics related test aids
pub mod metrics {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};

    use metrics::{
        Counter,
        CounterFn,
        Gauge,
        Histogram,
        Key,
        KeyName,
        Label,
        Metadata,
        Recorder,
        SharedString,
        Unit,
    };

    /// A [recorder](`metrics::Recorder`) which keeps counter values for a
    /// fixed set of `method` labels. Everything else is a no-op.
    ///
    /// Install it with [`metrics::set_default_local_recorder`] so that tests
    /// running in parallel do not observe each other.
    #[derive(Debug, Default)]
    pub struct FakeRecorder(FakeRecorderHandle);

    /// Read access to the counters of a [`FakeRecorder`].
    #[derive(Clone, Debug, Default)]
    pub struct FakeRecorderHandle {
        counters: Arc<RwLock<HashMap<Key, Arc<FakeCounter>>>>,
        methods: &'static [&'static str],
    }

    #[derive(Debug, Default)]
    struct FakeCounter(AtomicU64);

    impl CounterFn for FakeCounter {
        fn increment(&self, value: u64) {
            self.0.fetch_add(value, Ordering::Relaxed);
        }

        fn absolute(&self, value: u64) {
            self.0.fetch_max(value, Ordering::Relaxed);
        }
    }

    impl FakeRecorder {
        /// Tracks counters whose `method` label is one of `methods`.
        pub fn new_for(methods: &'static [&'static str]) -> Self {
            Self(FakeRecorderHandle {
                counters: Arc::default(),
                methods,
            })
        }

        pub fn handle(&self) -> FakeRecorderHandle {
            self.0.clone()
        }

        fn is_tracked(&self, key: &Key) -> bool {
            key.labels().any(|label| {
                label.key() == "method" && self.0.methods.iter().any(|&m| m == label.value())
            })
        }
    }

    impl Recorder for FakeRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            if !self.is_tracked(key) {
                return Counter::noop();
            }

            let mut counters = self.0.counters.write().unwrap();
            let counter = counters.entry(key.clone()).or_default();
            Counter::from_arc(counter.clone())
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    impl FakeRecorderHandle {
        /// Value of `counter_name{method=method}`, zero if it was never
        /// incremented.
        pub fn get_counter_value(&self, counter_name: &'static str, method: &'static str) -> u64 {
            self.get_counter_value_by_labels(counter_name, &[("method", method)])
        }

        /// Value of the counter with exactly the given labels, in the order in
        /// which they were passed to [`metrics::counter`].
        pub fn get_counter_value_by_labels(
            &self,
            counter_name: &'static str,
            labels: &[(&'static str, &'static str)],
        ) -> u64 {
            let key = Key::from_parts(
                counter_name,
                labels
                    .iter()
                    .map(|&(key, value)| Label::new(key, value))
                    .collect::<Vec<_>>(),
            );
            self.counters
                .read()
                .unwrap()
                .get(&key)
                .map(|counter| counter.0.load(Ordering::Relaxed))
                .unwrap_or_default()
        }
    }
}
