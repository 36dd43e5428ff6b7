use std::time::{Duration, Instant};

use crate::events::SlideId;

// Deliberately not configurable.
pub const ENTER_FADE: Duration = Duration::from_secs(2);
pub const EXIT_HOLD: Duration = Duration::from_secs(6);
pub const EXIT_FADE: Duration = Duration::from_secs(2);

/// Animation completion observed by [`SlideAnimation::tick`]; each value is
/// produced at most once per slide and forwarded to the completion hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    EnterFinished,
    ExitFinished,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Fading in from transparent.
    Entering { since: Instant },
    /// Fully visible, waiting for the scheduler to begin the exit.
    Shown,
    /// Holding fully visible, then fading out.
    Exiting { since: Instant },
    /// Exit finished; invisible but still attached until detached.
    Spent,
}

/// Clock-driven opacity envelope of one slide. All methods take an explicit
/// `now` so the envelope is testable without sleeping.
#[derive(Debug)]
pub struct SlideAnimation {
    id: SlideId,
    phase: Phase,
}

impl SlideAnimation {
    pub fn new(id: SlideId, now: Instant) -> Self {
        Self {
            id,
            phase: Phase::Entering { since: now },
        }
    }

    pub fn id(&self) -> SlideId {
        self.id
    }

    pub fn begin_exit(&mut self, now: Instant) {
        self.phase = Phase::Exiting { since: now };
    }

    /// Advance the phase machine, reporting an animation completion the
    /// first time the relevant deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<Completion> {
        match self.phase {
            Phase::Entering { since } if now.duration_since(since) >= ENTER_FADE => {
                self.phase = Phase::Shown;
                Some(Completion::EnterFinished)
            }
            Phase::Exiting { since }
                if now.duration_since(since) >= EXIT_HOLD + EXIT_FADE =>
            {
                self.phase = Phase::Spent;
                Some(Completion::ExitFinished)
            }
            _ => None,
        }
    }

    pub fn alpha(&self, now: Instant) -> f32 {
        match self.phase {
            Phase::Entering { since } => {
                fraction(now.duration_since(since), ENTER_FADE)
            }
            Phase::Shown => 1.0,
            Phase::Exiting { since } => {
                let elapsed = now.duration_since(since);
                match elapsed.checked_sub(EXIT_HOLD) {
                    None => 1.0,
                    Some(fading) => 1.0 - fraction(fading, EXIT_FADE),
                }
            }
            Phase::Spent => 0.0,
        }
    }

    /// True while the slide still changes over time (drives redraws).
    pub fn is_animating(&self) -> bool {
        !matches!(self.phase, Phase::Spent)
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(now: Instant) -> SlideAnimation {
        SlideAnimation::new(SlideId::new(0), now)
    }

    #[test]
    fn entering_ramps_alpha_and_completes_once() {
        let start = Instant::now();
        let mut anim = slide(start);

        assert_eq!(anim.alpha(start), 0.0);
        let halfway = start + ENTER_FADE / 2;
        assert!((anim.alpha(halfway) - 0.5).abs() < 0.01);
        assert_eq!(anim.tick(halfway), None);

        let done = start + ENTER_FADE;
        assert_eq!(anim.tick(done), Some(Completion::EnterFinished));
        assert_eq!(anim.tick(done), None, "completion is emitted once");
        assert_eq!(anim.alpha(done), 1.0);
    }

    #[test]
    fn shown_slide_stays_opaque_until_exit_begins() {
        let start = Instant::now();
        let mut anim = slide(start);
        anim.tick(start + ENTER_FADE);

        let much_later = start + ENTER_FADE + Duration::from_secs(3600);
        assert_eq!(anim.alpha(much_later), 1.0);
        assert_eq!(anim.tick(much_later), None);
    }

    #[test]
    fn exit_holds_then_fades_then_completes_once() {
        let start = Instant::now();
        let mut anim = slide(start);
        anim.tick(start + ENTER_FADE);

        let exit_at = start + ENTER_FADE;
        anim.begin_exit(exit_at);

        let mid_hold = exit_at + EXIT_HOLD / 2;
        assert_eq!(anim.alpha(mid_hold), 1.0);
        assert_eq!(anim.tick(mid_hold), None);

        let mid_fade = exit_at + EXIT_HOLD + EXIT_FADE / 2;
        assert!((anim.alpha(mid_fade) - 0.5).abs() < 0.01);

        let done = exit_at + EXIT_HOLD + EXIT_FADE;
        assert_eq!(anim.tick(done), Some(Completion::ExitFinished));
        assert_eq!(anim.tick(done), None, "completion is emitted once");
        assert_eq!(anim.alpha(done), 0.0);
        assert!(!anim.is_animating());
    }

    #[test]
    fn spent_slide_is_invisible_but_reports_its_id() {
        let start = Instant::now();
        let mut anim = SlideAnimation::new(SlideId::new(7), start);
        anim.tick(start + ENTER_FADE);
        anim.begin_exit(start + ENTER_FADE);
        anim.tick(start + ENTER_FADE + EXIT_HOLD + EXIT_FADE);

        assert_eq!(anim.alpha(start + Duration::from_secs(999)), 0.0);
        assert_eq!(anim.id(), SlideId::new(7));
    }
}
