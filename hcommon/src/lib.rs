//! Shared primitives and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use hcommon::{Deadline, GenerationOptions, TraceId};
//!
//! let trace = TraceId::new("cycle-1");
//!
//! let options = GenerationOptions::default().with_seed(1234).enable_streaming();
//! let deadline = Deadline::after(Duration::from_secs(30));
//!
//! assert_eq!(trace.to_string(), "cycle-1");
//! assert!(options.stream);
//! assert!(!deadline.is_expired());
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use hcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use hcommon::TraceId;
    //!
    //! let trace = TraceId::from("cycle-42");
    //!
    //! assert_eq!(trace.as_str(), "cycle-42");
    //! ```

    use std::fmt::{Display, Formatter};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Identifies one orchestration cycle across hooks and tool contexts.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    static NEXT_TRACE: AtomicU64 = AtomicU64::new(1);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        /// Process-unique id of the form `cycle-<millis>-<counter>`.
        pub fn generate() -> Self {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis())
                .unwrap_or_default();
            let counter = NEXT_TRACE.fetch_add(1, Ordering::Relaxed);
            Self(format!("cycle-{millis}-{counter}"))
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use hcommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(128)
    //!     .with_seed(7)
    //!     .enable_streaming();
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.max_tokens, Some(128));
    //! assert_eq!(options.seed, Some(7));
    //! assert!(options.stream);
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
        pub seed: Option<u64>,
        pub stream: bool,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn with_seed(mut self, seed: u64) -> Self {
            self.seed = Some(seed);
            self
        }

        pub fn with_streaming(mut self, stream: bool) -> Self {
            self.stream = stream;
            self
        }

        pub fn enable_streaming(self) -> Self {
            self.with_streaming(true)
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use hcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! assert!(registry.insert_new("alpha".to_string(), 1_u32));
    //! assert!(!registry.insert_new("alpha".to_string(), 2_u32));
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! ```

    use std::borrow::Borrow;
    use std::collections::BTreeMap;

    /// Ordered by key so that listings are deterministic.
    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: BTreeMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Ord,
    {
        fn default() -> Self {
            Self {
                items: BTreeMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Ord,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        /// Inserts only when `key` is vacant; returns `false` and leaves the
        /// existing entry untouched otherwise.
        pub fn insert_new(&mut self, key: K, value: V) -> bool {
            if self.items.contains_key(&key) {
                return false;
            }

            self.items.insert(key, value);
            true
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.items.keys()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub mod deadline {
    //! Wall-clock budget shared by every phase of one orchestration cycle.
    //!
    //! ```rust
    //! use std::time::Duration;
    //!
    //! use hcommon::Deadline;
    //!
    //! let deadline = Deadline::after(Duration::from_secs(5));
    //! assert!(deadline.remaining() <= Duration::from_secs(5));
    //! assert!(deadline.clamp(Duration::from_secs(60)) <= Duration::from_secs(5));
    //! assert_eq!(
    //!     deadline.clamp(Duration::from_millis(1)),
    //!     Duration::from_millis(1)
    //! );
    //! ```

    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Deadline {
        expires_at: Instant,
    }

    impl Deadline {
        pub fn after(budget: Duration) -> Self {
            Self {
                expires_at: Instant::now() + budget,
            }
        }

        pub fn at(expires_at: Instant) -> Self {
            Self { expires_at }
        }

        pub fn expires_at(&self) -> Instant {
            self.expires_at
        }

        /// Zero once expired.
        pub fn remaining(&self) -> Duration {
            self.expires_at.saturating_duration_since(Instant::now())
        }

        pub fn is_expired(&self) -> bool {
            self.remaining().is_zero()
        }

        /// The smaller of `limit` and the time left.
        pub fn clamp(&self, limit: Duration) -> Duration {
            self.remaining().min(limit)
        }
    }
}

pub use context::TraceId;
pub use deadline::Deadline;
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{Deadline, GenerationOptions, Registry, TraceId};

    #[test]
    fn trace_ids_round_trip_and_generate_unique_values() {
        let trace = TraceId::from("cycle-1");
        assert_eq!(trace.as_str(), "cycle-1");
        assert_eq!(trace.to_string(), "cycle-1");

        let first = TraceId::generate();
        let second = TraceId::generate();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("cycle-"));
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_max_tokens(123)
            .with_seed(1234)
            .enable_streaming();

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(123));
        assert_eq!(options.seed, Some(1234));
        assert!(options.stream);
    }

    #[test]
    fn registry_rejects_second_insert_for_same_key() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        assert!(registry.insert_new("beta".to_string(), 2_u32));
        assert!(registry.insert_new("alpha".to_string(), 1_u32));
        assert!(!registry.insert_new("alpha".to_string(), 9_u32));

        assert_eq!(registry.get("alpha"), Some(&1));
        assert_eq!(registry.keys().cloned().collect::<Vec<_>>(), vec!["alpha", "beta"]);

        let removed = registry.remove("alpha");
        assert_eq!(removed, Some(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn expired_deadline_reports_zero_remaining() {
        let deadline = Deadline::at(Instant::now() - Duration::from_millis(5));
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert_eq!(deadline.clamp(Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn clamp_never_exceeds_either_bound() {
        let deadline = Deadline::after(Duration::from_secs(5));
        assert!(deadline.clamp(Duration::from_secs(60)) <= Duration::from_secs(5));
        assert!(deadline.clamp(Duration::from_secs(60)) > Duration::from_secs(4));
        assert_eq!(deadline.clamp(Duration::from_millis(1)), Duration::from_millis(1));
    }
}
