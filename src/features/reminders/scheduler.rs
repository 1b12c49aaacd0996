//! Reminder delivery scheduler
//!
//! A fixed-interval poll loop that discovers due reminders and hands
//! each to the notifier. A reminder is resolved only after its delivery
//! succeeds, so delivery is at-least-once overall and exactly-once on
//! the success path. Failed deliveries stay pending and are retried on
//! the next tick.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::store::{Reminder, ReminderStore};

/// Per-reminder ceiling on a delivery attempt. A transport call that
/// stalls past this is treated as a failed delivery; the reminder stays
/// pending and the loop moves on.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivery channel boundary consumed by the scheduler.
///
/// `notify` must only return `Ok` once the notification has actually
/// been handed to the transport; the scheduler resolves the reminder
/// immediately afterwards.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, reminder: &Reminder) -> Result<()>;
}

/// Polls the store for due reminders and delivers them.
///
/// Designed for a single instance: ticks are driven sequentially from
/// one loop and never overlap. Running two instances would double-notify
/// because no claim step precedes delivery.
pub struct ReminderScheduler {
    store: Arc<dyn ReminderStore>,
    notifier: Arc<dyn ReminderNotifier>,
    poll_interval: Duration,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        notifier: Arc<dyn ReminderNotifier>,
        poll_interval: Duration,
    ) -> Self {
        ReminderScheduler {
            store,
            notifier,
            poll_interval,
        }
    }

    /// Run the poll loop forever. Each tick completes before the next
    /// interval fires.
    pub async fn run(self) {
        info!(
            "Reminder scheduler started, polling every {:?}",
            self.poll_interval
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One poll cycle: deliver everything due, resolving each reminder
    /// after its delivery confirms. Returns the number of reminders
    /// delivered and resolved.
    ///
    /// A failure on one reminder never aborts the rest of the cycle.
    pub async fn tick(&self) -> usize {
        let now = Utc::now();
        let due = match self.store.query_due(now).await {
            Ok(due) => due,
            Err(e) => {
                error!("Failed to query due reminders: {e}");
                return 0;
            }
        };

        if due.is_empty() {
            return 0;
        }
        debug!("Tick found {} due reminder(s)", due.len());

        let mut delivered = 0;
        for reminder in &due {
            match timeout(DELIVERY_TIMEOUT, self.notifier.notify(reminder)).await {
                Ok(Ok(())) => {
                    if let Err(e) = self.store.resolve(&reminder.id).await {
                        // Known at-least-once edge: the user may see this
                        // reminder again on the next tick.
                        warn!(
                            "Delivered reminder {} but failed to resolve it, \
                             it will be redelivered: {e}",
                            reminder.id
                        );
                    } else {
                        delivered += 1;
                    }
                }
                Ok(Err(e)) => {
                    warn!(
                        "Delivery failed for reminder {}, leaving pending for retry: {e}",
                        reminder.id
                    );
                }
                Err(_) => {
                    warn!(
                        "Delivery timed out after {:?} for reminder {}, \
                         leaving pending for retry",
                        DELIVERY_TIMEOUT, reminder.id
                    );
                }
            }
        }

        info!("Tick delivered {delivered}/{} due reminder(s)", due.len());
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::testing::MemoryStore;
    use super::super::store::{NewReminder, ReminderStatus};
    use super::*;
    use anyhow::bail;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Notifier that records deliveries and can fail or stall selectively.
    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<String>>,
        fail_all: AtomicBool,
        stall_all: AtomicBool,
        fail_for: Mutex<Option<String>>,
    }

    impl RecordingNotifier {
        fn delivered_ids(&self) -> Vec<String> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReminderNotifier for RecordingNotifier {
        async fn notify(&self, reminder: &Reminder) -> Result<()> {
            if self.stall_all.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.fail_all.load(Ordering::SeqCst) {
                bail!("transport down");
            }
            if self.fail_for.lock().unwrap().as_deref() == Some(reminder.id.as_str()) {
                bail!("transport rejected this message");
            }
            self.delivered.lock().unwrap().push(reminder.id.clone());
            Ok(())
        }
    }

    fn scheduler(
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> ReminderScheduler {
        ReminderScheduler::new(store, notifier, Duration::from_secs(30))
    }

    async fn seed_due(store: &MemoryStore, text: &str, minutes_ago: i64) -> Reminder {
        store
            .create(NewReminder {
                owner: "7".to_string(),
                text: text.to_string(),
                person: None,
                due_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_zero_delay_reminder_delivered_and_resolved_on_next_tick() {
        // Scenario: created with delay 0, first tick shortly after must
        // deliver and resolve it.
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let reminder = store
            .create(NewReminder {
                owner: "7".to_string(),
                text: "now".to_string(),
                person: None,
                due_at: Utc::now(),
            })
            .await
            .unwrap();

        let delivered = scheduler(store.clone(), notifier.clone()).tick().await;

        assert_eq!(delivered, 1);
        assert_eq!(notifier.delivered_ids(), vec![reminder.id.clone()]);
        let row = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Resolved);
    }

    #[tokio::test]
    async fn test_past_absolute_time_is_due_on_next_tick() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        store
            .create(NewReminder {
                owner: "7".to_string(),
                text: "long overdue".to_string(),
                person: None,
                due_at: past,
            })
            .await
            .unwrap();

        let delivered = scheduler(store, notifier).tick().await;
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_future_reminder_not_delivered() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        store
            .create(NewReminder {
                owner: "7".to_string(),
                text: "later".to_string(),
                person: None,
                due_at: Utc::now() + ChronoDuration::hours(1),
            })
            .await
            .unwrap();

        let delivered = scheduler(store, notifier.clone()).tick().await;
        assert_eq!(delivered, 0);
        assert!(notifier.delivered_ids().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_reminder_pending_for_retry() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_all.store(true, Ordering::SeqCst);
        let reminder = seed_due(&store, "flaky", 1).await;

        let sched = scheduler(store.clone(), notifier.clone());
        assert_eq!(sched.tick().await, 0);

        // Never resolved before a successful delivery.
        let row = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Pending);

        // Transport recovers, next tick retries and succeeds.
        notifier.fail_all.store(false, Ordering::SeqCst);
        assert_eq!(sched.tick().await, 1);
        let row = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Resolved);
    }

    #[tokio::test]
    async fn test_one_failing_reminder_does_not_abort_cycle() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let bad = seed_due(&store, "bad", 2).await;
        let good = seed_due(&store, "good", 1).await;
        *notifier.fail_for.lock().unwrap() = Some(bad.id.clone());

        let delivered = scheduler(store.clone(), notifier.clone()).tick().await;

        assert_eq!(delivered, 1);
        assert_eq!(notifier.delivered_ids(), vec![good.id.clone()]);
        let bad_row = store.get(&bad.id).await.unwrap().unwrap();
        let good_row = store.get(&good.id).await.unwrap().unwrap();
        assert_eq!(bad_row.status, ReminderStatus::Pending);
        assert_eq!(good_row.status, ReminderStatus::Resolved);
    }

    #[tokio::test]
    async fn test_resolve_failure_after_delivery_is_not_fatal() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let reminder = seed_due(&store, "sticky", 1).await;
        store.fail_resolve.store(true, Ordering::SeqCst);

        // Delivery succeeds but the resolution write fails; accepted
        // at-least-once duplication, not a crash.
        let delivered = scheduler(store.clone(), notifier.clone()).tick().await;
        assert_eq!(delivered, 0);
        assert_eq!(notifier.delivered_ids(), vec![reminder.id.clone()]);

        store.fail_resolve.store(false, Ordering::SeqCst);
        let row = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_delivery_times_out_and_leaves_pending() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.stall_all.store(true, Ordering::SeqCst);
        let reminder = seed_due(&store, "hung transport", 1).await;

        let sched = scheduler(store.clone(), notifier.clone());

        // The tick must complete despite a notify call that never
        // returns; the stalled attempt counts as a failed delivery.
        assert_eq!(sched.tick().await, 0);
        assert!(notifier.delivered_ids().is_empty());
        let row = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Pending);

        // Transport recovers, the reminder is retried and delivered.
        notifier.stall_all.store(false, Ordering::SeqCst);
        assert_eq!(sched.tick().await, 1);
        let row = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Resolved);
    }

    #[tokio::test]
    async fn test_resolved_reminder_never_redelivered() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        seed_due(&store, "once", 1).await;
        let sched = scheduler(store, notifier.clone());

        assert_eq!(sched.tick().await, 1);
        assert_eq!(sched.tick().await, 0);
        assert_eq!(notifier.delivered_ids().len(), 1);
    }
}
