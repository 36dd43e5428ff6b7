use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::events::{PreparedImageCpu, SlideId};
use crate::playlist::ShuffledCycle;
use crate::signal::{CompletionHub, Subscription};

/// The container slides are attached to and removed from. `attach` starts
/// the slide's entering fade; `begin_exit` starts the hold-then-fade-out.
/// Calls fail only when the surface is gone, which ends the show.
pub trait DisplaySurface: Send + 'static {
    fn attach(&mut self, slide: SlideId, image: PreparedImageCpu) -> Result<()>;
    fn begin_exit(&mut self, slide: SlideId) -> Result<()>;
    fn detach(&mut self, slide: SlideId) -> Result<()>;
}

/// Turns a file into a displayable image. The returned future may resolve
/// with an error (the image is skipped) or never resolve at all (the loop
/// stalls; there is deliberately no timeout).
pub trait ImageDecoder: Send + 'static {
    fn decode(&self, path: PathBuf) -> BoxFuture<'static, Result<PreparedImageCpu>>;
}

/// Drives the infinite two-slide cross-fade loop.
///
/// Steady state: exactly one slide is current; during the overlap window the
/// exiting slide and the entering one are both attached. Each iteration
/// suspends twice, once on the current slide's fade-in completion and once on
/// its fade-out completion. Subscriptions are installed before `attach`, so a
/// completion pulse can never race ahead of its waiter; per-slide slots keep
/// the two live subscriptions from cross-talking during the overlap.
pub async fn run<S, D>(
    mut surface: S,
    decoder: D,
    hub: Arc<CompletionHub>,
    mut cycle: ShuffledCycle,
) -> Result<()>
where
    S: DisplaySurface,
    D: ImageDecoder,
{
    info!(images = cycle.len(), "starting cross-fade scheduler");
    let mut ids = SlideIds::default();

    let (mut current, mut current_sub) = next_slide(&mut surface, &decoder, &hub, &mut cycle, &mut ids).await?;

    loop {
        // Entering fade finished; the slide is fully visible.
        current_sub.completed().await;
        debug!(%current, "fade-in complete; beginning exit");
        surface.begin_exit(current)?;

        // One decode in flight; the next slide starts entering while the
        // current one holds and fades out.
        let (next, next_sub) = next_slide(&mut surface, &decoder, &hub, &mut cycle, &mut ids).await?;

        // Exit fade finished; the old slide leaves the surface.
        current_sub.completed().await;
        drop(current_sub);
        surface.detach(current)?;
        debug!(%current, "slide detached");

        current = next;
        current_sub = next_sub;
    }
}

#[derive(Default)]
struct SlideIds(u64);

impl SlideIds {
    fn next(&mut self) -> SlideId {
        let id = SlideId::new(self.0);
        self.0 += 1;
        id
    }
}

/// Decode the next image from the cycle and attach it as a fresh slide.
///
/// An image whose decode resolves with an error is skipped and the cycle
/// advances; if a whole period yields nothing decodable the show cannot
/// continue. A decode that never resolves suspends here forever, leaving the
/// surface exactly as it was.
async fn next_slide<S, D>(
    surface: &mut S,
    decoder: &D,
    hub: &Arc<CompletionHub>,
    cycle: &mut ShuffledCycle,
    ids: &mut SlideIds,
) -> Result<(SlideId, Subscription)>
where
    S: DisplaySurface,
    D: ImageDecoder,
{
    let period = cycle.len();
    for _ in 0..period {
        let path = cycle.advance().to_path_buf();
        match decoder.decode(path.clone()).await {
            Ok(image) => {
                let slide = ids.next();
                let sub = hub.subscribe(slide);
                surface.attach(slide, image)?;
                debug!(%slide, path = %path.display(), "slide attached");
                return Ok((slide, sub));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping undecodable image");
            }
        }
    }
    bail!("no decodable image within one full playlist period");
}
