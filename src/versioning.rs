// src/versioning.rs
//! In-memory versioned text configuration.
//!
//! A configuration keeps its live state plus an append-only, timestamp-keyed
//! history of snapshots. The save pointer names the snapshot that "restore
//! last" goes back to. All operations on one instance are serialized by a
//! single mutex.

use super::types::TextOptions;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("No saved state was found at {}", .0.to_rfc3339())]
    SnapshotNotFound(DateTime<Utc>),

    #[error("No saved state is available")]
    NoSnapshotAvailable,
}

/// Time source for modification stamps and snapshot keys.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct VersionState {
    current: TextOptions,
    modified_at: DateTime<Utc>,
    save_pointer: Option<DateTime<Utc>>,
    history: BTreeMap<DateTime<Utc>, TextOptions>,
}

impl VersionState {
    fn snapshot(&self, at: DateTime<Utc>) -> Result<&TextOptions, VersionError> {
        self.history.get(&at).ok_or(VersionError::SnapshotNotFound(at))
    }

    fn pointer(&self) -> Result<DateTime<Utc>, VersionError> {
        self.save_pointer.ok_or(VersionError::NoSnapshotAvailable)
    }

    fn restore(&mut self, at: DateTime<Utc>) -> Result<bool, VersionError> {
        let snapshot = self.snapshot(at)?.clone();
        let changed = snapshot != self.current;
        self.current = snapshot;
        self.modified_at = at;
        Ok(changed)
    }

    fn remove(&mut self, at: DateTime<Utc>) -> Result<TextOptions, VersionError> {
        let removed = self
            .history
            .remove(&at)
            .ok_or(VersionError::SnapshotNotFound(at))?;
        // Never leave the pointer dangling: fall back to the newest survivor.
        if self.save_pointer == Some(at) {
            self.save_pointer = self.history.keys().next_back().copied();
        }
        Ok(removed)
    }
}

pub struct VersionedConfiguration {
    name: String,
    created_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    state: Mutex<VersionState>,
}

impl VersionedConfiguration {
    pub fn new(name: impl Into<String>, options: TextOptions) -> Self {
        Self::with_clock(name, options, Arc::new(SystemClock))
    }

    /// Creates the configuration and takes its initial snapshot.
    pub fn with_clock(name: impl Into<String>, options: TextOptions, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let mut history = BTreeMap::new();
        history.insert(now, options.clone());
        Self {
            name: name.into(),
            created_at: now,
            clock,
            state: Mutex::new(VersionState {
                current: options,
                modified_at: now,
                save_pointer: Some(now),
                history,
            }),
        }
    }

    /// Rebuilds an instance from stored parts. The save pointer, if any, must
    /// name one of the snapshots.
    pub fn from_parts(
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
        current: TextOptions,
        history: impl IntoIterator<Item = (DateTime<Utc>, TextOptions)>,
        save_pointer: Option<DateTime<Utc>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VersionError> {
        let history: BTreeMap<_, _> = history.into_iter().collect();
        if let Some(pointer) = save_pointer {
            if !history.contains_key(&pointer) {
                return Err(VersionError::SnapshotNotFound(pointer));
            }
        }
        Ok(Self {
            name: name.into(),
            created_at,
            clock,
            state: Mutex::new(VersionState {
                current,
                modified_at,
                save_pointer,
                history,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, VersionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.lock().modified_at
    }

    pub fn current_state(&self) -> TextOptions {
        self.lock().current.clone()
    }

    pub fn save_pointer(&self) -> Option<DateTime<Utc>> {
        self.lock().save_pointer
    }

    /// Snapshot keys, oldest first.
    pub fn version_times(&self) -> Vec<DateTime<Utc>> {
        self.lock().history.keys().copied().collect()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Replaces the live state if it differs field-wise. Returns whether it did.
    pub fn update_current_state(&self, new_state: &TextOptions) -> bool {
        let mut state = self.lock();
        if state.current == *new_state {
            return false;
        }
        state.current = new_state.clone();
        state.modified_at = self.clock.now();
        true
    }

    /// Appends the live state to the history and moves the save pointer to it.
    ///
    /// Always records a new entry, even when nothing changed since the last
    /// save. Returns whether the saved value differs from the snapshot the
    /// pointer named before.
    pub fn save_state(&self) -> bool {
        let mut state = self.lock();
        let key = self.next_key(&state);
        let differs = match state.save_pointer.and_then(|p| state.history.get(&p)) {
            Some(previous) => *previous != state.current,
            None => true,
        };
        let snapshot = state.current.clone();
        state.history.insert(key, snapshot);
        state.save_pointer = Some(key);
        differs
    }

    pub fn restore_last_version(&self) -> Result<bool, VersionError> {
        let mut state = self.lock();
        let pointer = state.pointer()?;
        state.restore(pointer)
    }

    /// Makes the snapshot at `at` live. History and save pointer are untouched.
    pub fn restore_version(&self, at: DateTime<Utc>) -> Result<bool, VersionError> {
        self.lock().restore(at)
    }

    pub fn get_version(&self, at: DateTime<Utc>) -> Result<TextOptions, VersionError> {
        self.lock().snapshot(at).cloned()
    }

    pub fn get_last_version(&self) -> Result<TextOptions, VersionError> {
        let state = self.lock();
        let pointer = state.pointer()?;
        state.snapshot(pointer).cloned()
    }

    pub fn remove_version(&self, at: DateTime<Utc>) -> Result<TextOptions, VersionError> {
        self.lock().remove(at)
    }

    pub fn remove_last_version(&self) -> Result<TextOptions, VersionError> {
        let mut state = self.lock();
        let pointer = state.pointer()?;
        state.remove(pointer)
    }

    // Snapshot keys must stay unique and ordered even if the clock stalls.
    fn next_key(&self, state: &VersionState) -> DateTime<Utc> {
        let now = self.clock.now();
        match state.history.keys().next_back() {
            Some(last) if now <= *last => *last + Duration::microseconds(1),
            _ => now,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
            })
        }

        pub(crate) fn advance(&self, seconds: i64) {
            *self.now.lock().unwrap() += Duration::seconds(seconds);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn fira(size: i32) -> TextOptions {
        TextOptions::new("Fira Code", size)
    }

    fn configuration(clock: &Arc<ManualClock>) -> VersionedConfiguration {
        VersionedConfiguration::with_clock("editor", fira(12), clock.clone())
    }

    #[test]
    fn construction_takes_initial_snapshot() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);

        assert_eq!(conf.history_len(), 1);
        assert_eq!(conf.save_pointer(), Some(conf.created_at()));
        assert_eq!(conf.get_last_version().unwrap(), fira(12));
        assert_eq!(conf.modified_at(), conf.created_at());
    }

    #[test]
    fn modification_time_moves_only_on_real_change() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        let created = conf.created_at();

        clock.advance(5);
        assert!(!conf.update_current_state(&fira(12)));
        assert_eq!(conf.modified_at(), created);

        clock.advance(5);
        assert!(conf.update_current_state(&fira(14)));
        assert_eq!(conf.modified_at(), created + Duration::seconds(10));

        clock.advance(5);
        assert!(!conf.update_current_state(&fira(14)));
        assert_eq!(conf.modified_at(), created + Duration::seconds(10));
    }

    #[test]
    fn update_has_no_history_side_effect() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        conf.update_current_state(&fira(20));
        assert_eq!(conf.history_len(), 1);
        assert_eq!(conf.get_last_version().unwrap(), fira(12));
    }

    #[test]
    fn save_always_appends_one_entry() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);

        clock.advance(1);
        assert!(!conf.save_state(), "unchanged value reports no difference");
        assert_eq!(conf.history_len(), 2);

        clock.advance(1);
        conf.update_current_state(&fira(16));
        assert!(conf.save_state());
        assert_eq!(conf.history_len(), 3);
        assert_eq!(conf.get_last_version().unwrap(), fira(16));
    }

    #[test]
    fn save_keys_stay_unique_when_clock_stalls() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);

        conf.save_state();
        conf.save_state();
        conf.save_state();

        let times = conf.version_times();
        assert_eq!(times.len(), 4);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(conf.save_pointer(), times.last().copied());
    }

    #[test]
    fn restore_last_version_brings_back_saved_value() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        let pointer = conf.save_pointer().unwrap();

        clock.advance(3);
        conf.update_current_state(&fira(30));
        assert!(conf.restore_last_version().unwrap());
        assert_eq!(conf.current_state(), fira(12));
        assert_eq!(conf.modified_at(), pointer);

        assert!(!conf.restore_last_version().unwrap());
    }

    #[test]
    fn restore_does_not_touch_history() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        let first = conf.save_pointer().unwrap();

        clock.advance(1);
        conf.update_current_state(&fira(18));
        conf.save_state();
        let before_times = conf.version_times();
        let before_pointer = conf.save_pointer();

        assert!(conf.restore_version(first).unwrap());
        assert_eq!(conf.current_state(), fira(12));
        assert_eq!(conf.modified_at(), first);
        assert_eq!(conf.version_times(), before_times);
        assert_eq!(conf.save_pointer(), before_pointer);
        assert_eq!(conf.get_last_version().unwrap(), fira(18));
    }

    #[test]
    fn restore_unknown_version_fails() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        let missing = conf.created_at() + Duration::days(1);
        assert_eq!(
            conf.restore_version(missing),
            Err(VersionError::SnapshotNotFound(missing))
        );
        assert_eq!(conf.current_state(), fira(12));
    }

    #[test]
    fn removed_version_is_gone() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        let first = conf.save_pointer().unwrap();
        clock.advance(1);
        conf.save_state();

        assert_eq!(conf.remove_version(first).unwrap(), fira(12));
        assert_eq!(
            conf.get_version(first),
            Err(VersionError::SnapshotNotFound(first))
        );
        assert_eq!(
            conf.remove_version(first),
            Err(VersionError::SnapshotNotFound(first))
        );
    }

    #[test]
    fn removing_pointed_snapshot_repoints_to_newest_survivor() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);
        let first = conf.save_pointer().unwrap();

        clock.advance(1);
        conf.update_current_state(&fira(22));
        conf.save_state();

        assert_eq!(conf.remove_last_version().unwrap(), fira(22));
        assert_eq!(conf.save_pointer(), Some(first));
        assert_eq!(conf.get_last_version().unwrap(), fira(12));
    }

    #[test]
    fn emptied_history_has_no_last_version() {
        let clock = ManualClock::new();
        let conf = configuration(&clock);

        conf.remove_last_version().unwrap();
        assert_eq!(conf.save_pointer(), None);
        assert_eq!(conf.history_len(), 0);
        assert_eq!(conf.restore_last_version(), Err(VersionError::NoSnapshotAvailable));
        assert_eq!(conf.get_last_version(), Err(VersionError::NoSnapshotAvailable));

        // Saving again starts a fresh history.
        clock.advance(1);
        assert!(conf.save_state());
        assert_eq!(conf.get_last_version().unwrap(), fira(12));
    }

    #[test]
    fn from_parts_rejects_dangling_pointer() {
        let clock = ManualClock::new();
        let at = clock.now();
        let result = VersionedConfiguration::from_parts(
            "editor",
            at,
            at,
            fira(12),
            vec![(at, fira(12))],
            Some(at + Duration::seconds(1)),
            clock.clone(),
        );
        assert!(matches!(result, Err(VersionError::SnapshotNotFound(_))));
    }

    #[test]
    fn concurrent_saves_serialize() {
        let conf = Arc::new(VersionedConfiguration::new("shared", fira(12)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let conf = conf.clone();
                std::thread::spawn(move || {
                    conf.update_current_state(&fira(12 + i));
                    conf.save_state();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(conf.history_len(), 9);
    }
}
