//! Configuration snapshot channel between the parent and worker replicas.

use std::sync::Arc;

use tokio::sync::watch;

use melos_data::DatasetConfig;

/// Parent-held publisher for the dataset's mutable configuration.
///
/// All setters swap one `Copy` snapshot atomically in the underlying watch
/// cell, so a reader observes either the previous snapshot or the new one in
/// full, never a torn or fabricated value. Readers that fall behind skip
/// intermediate snapshots (keep-only-latest), which is the documented
/// best-effort propagation behavior.
///
/// `publish()` and the setters are sync calls — safe from both async tasks
/// and blocking threads.
#[derive(Clone, Debug)]
pub struct ConfigCell {
    tx: Arc<watch::Sender<DatasetConfig>>,
}

impl ConfigCell {
    #[must_use]
    pub fn new(initial: DatasetConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current authoritative snapshot.
    pub fn snapshot(&self) -> DatasetConfig {
        *self.tx.borrow()
    }

    /// Replace the whole snapshot.
    pub fn publish(&self, config: DatasetConfig) {
        self.tx.send_replace(config);
    }

    pub fn set_duration(&self, duration: f64) {
        self.tx.send_modify(|c| c.duration = duration);
    }

    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.tx.send_modify(|c| c.sample_rate = sample_rate);
    }

    /// Hand out a view for one worker replica.
    #[must_use]
    pub fn subscribe(&self) -> ConfigView {
        ConfigView {
            rx: self.tx.subscribe(),
        }
    }
}

/// Worker-held view of the configuration.
#[derive(Debug)]
pub struct ConfigView {
    rx: watch::Receiver<DatasetConfig>,
}

impl ConfigView {
    /// Latest published snapshot. Non-blocking; called when a batch window
    /// opens.
    pub fn latest(&mut self) -> DatasetConfig {
        *self.rx.borrow_and_update()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_the_initial_snapshot() {
        let cell = ConfigCell::new(DatasetConfig::new(44100));
        let mut view = cell.subscribe();
        assert_eq!(view.latest(), DatasetConfig::new(44100));
    }

    #[test]
    fn setters_update_one_field_at_a_time() {
        let cell = ConfigCell::new(DatasetConfig::new(44100));
        let mut view = cell.subscribe();

        cell.set_duration(0.25);
        let snap = view.latest();
        assert!((snap.duration - 0.25).abs() < f64::EPSILON);
        assert_eq!(snap.sample_rate, 44100);

        cell.set_sample_rate(8000);
        assert_eq!(view.latest().sample_rate, 8000);
    }

    #[test]
    fn slow_readers_skip_to_the_latest_snapshot() {
        let cell = ConfigCell::new(DatasetConfig::new(44100));
        let mut view = cell.subscribe();

        cell.set_sample_rate(8000);
        cell.set_sample_rate(16000);
        cell.set_sample_rate(22050);

        // Only the last value is observable; the intermediate ones were
        // dropped, not reordered or mixed.
        assert_eq!(view.latest().sample_rate, 22050);
        assert_eq!(view.latest().sample_rate, 22050);
    }

    #[test]
    fn late_subscribers_start_from_the_current_snapshot() {
        let cell = ConfigCell::new(DatasetConfig::new(44100));
        cell.set_duration(0.75);
        let mut view = cell.subscribe();
        assert!((view.latest().duration - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn publish_replaces_the_whole_snapshot() {
        let cell = ConfigCell::new(DatasetConfig::new(44100));
        cell.publish(DatasetConfig::new(8000).with_duration(1.5));
        let snap = cell.snapshot();
        assert_eq!(snap.sample_rate, 8000);
        assert!((snap.duration - 1.5).abs() < f64::EPSILON);
    }
}
