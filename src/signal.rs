use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::events::SlideId;

/// Single-slot, level-triggered rendezvous between one producer (the
/// animation system) and one consumer (the scheduler loop).
///
/// A `pulse` wakes the pending waiter if there is one; otherwise it arms the
/// slot so the next `wait` returns immediately. Pulses never queue: any
/// number of pulses delivered between two waits collapse into one.
#[derive(Debug, Default)]
pub struct FadeSignal {
    notify: Notify,
}

impl FadeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: deliver one completion pulse.
    pub fn pulse(&self) {
        self.notify.notify_one();
    }

    /// Consumer side: resume once per pulse, consuming a stored pulse
    /// immediately if one arrived before the call.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Routes per-slide animation-completion pulses from the display surface to
/// the scheduler. Each subscribed slide owns an independent [`FadeSignal`]
/// slot, so a pulse for one slide can never resume a wait on another.
#[derive(Debug, Default)]
pub struct CompletionHub {
    slots: Mutex<HashMap<SlideId, Arc<FadeSignal>>>,
}

impl CompletionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a completion slot for `slide`. Must happen before the slide's
    /// first animation can finish; the slot then absorbs a pulse even if the
    /// consumer has not started waiting yet.
    pub fn subscribe(self: &Arc<Self>, slide: SlideId) -> Subscription {
        let signal = Arc::new(FadeSignal::new());
        self.slots.lock().unwrap().insert(slide, signal.clone());
        Subscription {
            hub: Arc::clone(self),
            slide,
            signal,
        }
    }

    /// Deliver a completion pulse for `slide`. Pulses for slides without a
    /// live subscription are dropped.
    pub fn notify(&self, slide: SlideId) {
        if let Some(signal) = self.slots.lock().unwrap().get(&slide) {
            signal.pulse();
        }
    }

    pub fn is_subscribed(&self, slide: SlideId) -> bool {
        self.slots.lock().unwrap().contains_key(&slide)
    }
}

/// Handle to one slide's completion slot. Dropping it unsubscribes the slide.
#[derive(Debug)]
pub struct Subscription {
    hub: Arc<CompletionHub>,
    slide: SlideId,
    signal: Arc<FadeSignal>,
}

impl Subscription {
    pub fn slide(&self) -> SlideId {
        self.slide
    }

    /// Suspend until the slide's next animation-completion pulse.
    pub async fn completed(&self) {
        self.signal.wait().await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.slots.lock().unwrap().remove(&self.slide);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn pulse_before_wait_is_not_lost() {
        let signal = FadeSignal::new();
        signal.pulse();
        timeout(TICK, signal.wait())
            .await
            .expect("stored pulse should resume the wait immediately");
    }

    #[tokio::test]
    async fn pulses_collapse_into_one() {
        let signal = FadeSignal::new();
        signal.pulse();
        signal.pulse();
        signal.pulse();
        timeout(TICK, signal.wait()).await.expect("first wait resumes");
        assert!(
            timeout(TICK, signal.wait()).await.is_err(),
            "collapsed pulses must satisfy only one wait"
        );
    }

    #[tokio::test]
    async fn wait_resumes_on_later_pulse() {
        let signal = Arc::new(FadeSignal::new());
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.pulse();
        timeout(TICK, waiter)
            .await
            .expect("waiter should resume after pulse")
            .unwrap();
    }

    #[tokio::test]
    async fn hub_routes_pulses_per_slide() {
        let hub = Arc::new(CompletionHub::new());
        let first = hub.subscribe(SlideId::new(1));
        let second = hub.subscribe(SlideId::new(2));

        hub.notify(SlideId::new(2));
        assert!(
            timeout(TICK, first.completed()).await.is_err(),
            "pulse for slide 2 must not resume slide 1's wait"
        );
        timeout(TICK, second.completed())
            .await
            .expect("subscribed slide receives its pulse");
    }

    #[tokio::test]
    async fn unsubscribed_pulses_are_dropped() {
        let hub = Arc::new(CompletionHub::new());
        hub.notify(SlideId::new(9));

        let sub = hub.subscribe(SlideId::new(9));
        assert!(
            timeout(TICK, sub.completed()).await.is_err(),
            "a pulse delivered before subscription must not be replayed"
        );
    }

    #[tokio::test]
    async fn dropping_the_subscription_unsubscribes() {
        let hub = Arc::new(CompletionHub::new());
        let sub = hub.subscribe(SlideId::new(3));
        assert!(hub.is_subscribed(SlideId::new(3)));
        drop(sub);
        assert!(!hub.is_subscribed(SlideId::new(3)));
    }

    #[tokio::test]
    async fn early_pulse_after_subscribe_is_absorbed() {
        let hub = Arc::new(CompletionHub::new());
        let sub = hub.subscribe(SlideId::new(4));
        hub.notify(SlideId::new(4));
        timeout(TICK, sub.completed())
            .await
            .expect("pulse delivered before the wait is armed in the slot");
    }
}
