//! AR view lifecycle
//!
//! [`ArView::open`] decides the placement path once, acquires what that path
//! needs and mounts the scene. [`ArView::frame`] runs one display frame:
//! candidate pose, commit gestures, draw list. [`ArView::close`] releases the
//! camera, the hit-test source and the session, and drops any pending
//! transform fetch. Dropping the view closes it.

use crate::commands::{CommandSender, ViewCommand};
use crate::config::ArConfig;
use crate::error::{ArError, Result};
use devices::{
    CameraBackend, PassthroughProvider, PointerEvent, PointerState, StreamSettings, Viewport,
};
use placement::{Anchor, AnchorMachine, AnchorMode, AnchorSource, CommitOutcome, TapPolicy};
use scene::{
    FrameContext, PersistenceBridge, RenderFrame, SavePayload, SceneContent, SceneRenderer,
    TransformStore,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use xr::{
    Capability, CapabilityDetector, HitTestEngine, HitTestStatus, Pose, RenderPath,
    SessionFeature, SessionMode, XrFrame, XrRuntime, XrSession,
};

/// Platform collaborators injected into every view
#[derive(Clone)]
pub struct ArContext {
    /// `None` when the platform has no AR runtime at all
    pub runtime: Option<Arc<dyn XrRuntime>>,
    pub camera: Arc<dyn CameraBackend>,
    pub store: Arc<dyn TransformStore>,
    pub commands: Option<CommandSender>,
    pub config: ArConfig,
}

impl std::fmt::Debug for ArContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArContext")
            .field("runtime", &self.runtime.as_ref().map(|r| r.name().to_string()))
            .field("camera", &self.camera.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Input gathered by the platform for one display frame
pub struct FrameInput<'a> {
    pub now: Instant,
    /// Immersive frame (hit results and `select` events)
    pub xr: Option<&'a dyn XrFrame>,
    /// Viewer pose for the immersive camera
    pub viewer: Option<Pose>,
    /// Pointer events since the previous frame
    pub pointer: &'a [PointerEvent],
    pub viewport: Viewport,
}

impl<'a> FrameInput<'a> {
    pub fn immersive(frame: &'a dyn XrFrame, now: Instant) -> Self {
        Self {
            now,
            xr: Some(frame),
            viewer: None,
            pointer: &[],
            viewport: Viewport::new(0.0, 0.0),
        }
    }

    pub fn passthrough(pointer: &'a [PointerEvent], viewport: Viewport, now: Instant) -> Self {
        Self {
            now,
            xr: None,
            viewer: None,
            pointer,
            viewport,
        }
    }

    pub fn with_viewer(mut self, viewer: Pose) -> Self {
        self.viewer = Some(viewer);
        self
    }
}

/// Resources of the chosen placement path
enum PathState {
    Immersive {
        session: Box<dyn XrSession>,
        hit_test: HitTestEngine,
    },
    Passthrough {
        camera: PassthroughProvider,
        settings: StreamSettings,
    },
}

/// One open AR view for one content item
pub struct ArView {
    item_id: String,
    capability: Capability,
    path: PathState,
    tap: TapPolicy,
    pointer: PointerState,
    machine: AnchorMachine,
    renderer: SceneRenderer,
    bridge: PersistenceBridge,
    commands: Option<CommandSender>,
    opened_at: Instant,
    candidate: Option<Pose>,
    closed: bool,
}

impl std::fmt::Debug for ArView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArView")
            .field("item_id", &self.item_id)
            .field("capability", &self.capability)
            .field("path", &self.render_path())
            .field("anchor", &self.machine.state())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ArView {
    /// Open the view for `content`.
    ///
    /// Capability detection runs first and fixes the path. One exception: if
    /// the probe said supported but the runtime then refuses the session, the
    /// view falls back to passthrough. This happens before anything renders,
    /// so the path is still fixed for the whole view. On the
    /// passthrough path a camera failure is returned as [`ArError::Camera`];
    /// calling `open` again retries. Cancelling `cancel` at any point before
    /// this returns yields [`ArError::Cancelled`] with every acquired
    /// resource released.
    pub async fn open(
        ctx: &ArContext,
        content: SceneContent,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let item_id = content.item_id.clone();
        let capability = CapabilityDetector::detect(ctx.runtime.as_deref()).await;
        if cancel.is_cancelled() {
            return Err(ArError::Cancelled);
        }

        let mut path = None;
        if let (RenderPath::Immersive, Some(runtime)) = (capability.render_path(), &ctx.runtime) {
            path = open_immersive(runtime.as_ref(), cancel).await?;
        }
        let path = match path {
            Some(path) => path,
            None => open_passthrough(ctx, cancel).await?,
        };

        let mode = match path {
            PathState::Immersive { .. } => AnchorMode::Immersive,
            PathState::Passthrough { .. } => AnchorMode::Simulated,
        };

        let bridge = PersistenceBridge::new(Arc::clone(&ctx.store));
        let mut renderer = SceneRenderer::new(content, mode, ctx.config.renderer_options());
        renderer.request_transform(&bridge);

        tracing::info!(item = %item_id, ?mode, "AR view opened");
        Ok(Self {
            item_id,
            capability,
            path,
            tap: ctx.config.tap,
            pointer: PointerState::new(),
            machine: AnchorMachine::new(ctx.config.anchor),
            renderer,
            bridge,
            commands: ctx.commands.clone(),
            opened_at: Instant::now(),
            candidate: None,
            closed: false,
        })
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The path actually in use
    pub fn render_path(&self) -> RenderPath {
        match self.path {
            PathState::Immersive { .. } => RenderPath::Immersive,
            PathState::Passthrough { .. } => RenderPath::Passthrough,
        }
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.machine.anchor()
    }

    pub fn anchor_machine(&self) -> &AnchorMachine {
        &self.machine
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    /// Editor and asset-loader access to the scene
    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    /// Candidate pose of the last frame
    pub fn candidate(&self) -> Option<Pose> {
        self.candidate
    }

    pub fn hit_test_status(&self) -> Option<&HitTestStatus> {
        match &self.path {
            PathState::Immersive { hit_test, .. } => Some(hit_test.status()),
            PathState::Passthrough { .. } => None,
        }
    }

    /// Settings the camera granted (passthrough only)
    pub fn camera_settings(&self) -> Option<StreamSettings> {
        match &self.path {
            PathState::Passthrough { settings, .. } => Some(*settings),
            PathState::Immersive { .. } => None,
        }
    }

    /// Live camera tracks held by this view
    pub fn live_camera_tracks(&self) -> usize {
        match &self.path {
            PathState::Passthrough { camera, .. } => camera.live_tracks(),
            PathState::Immersive { .. } => 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run one display frame
    pub fn frame(&mut self, input: &FrameInput<'_>) -> Result<RenderFrame> {
        if self.closed {
            return Err(ArError::Closed);
        }

        let hit = match &self.path {
            PathState::Immersive { hit_test, .. } => Some(input.xr.and_then(|f| hit_test.tick(f))),
            PathState::Passthrough { .. } => None,
        };

        match hit {
            Some(candidate) => {
                self.candidate = candidate;
                let selects = input.xr.map_or(0, |f| f.select_count());
                for _ in 0..selects {
                    let outcome = self.machine.commit(candidate, AnchorSource::HitTest, input.now);
                    self.on_commit(outcome);
                }
            }
            None => {
                self.candidate = None;
                for event in input.pointer {
                    self.pointer.update(*event);
                }
                for down in self.pointer.drain_downs() {
                    // The tap heuristic only runs while unplaced
                    let candidate = if self.machine.is_placed() {
                        None
                    } else {
                        self.tap.resolve(down.position, input.viewport)
                    };
                    let outcome = self.machine.commit(candidate, AnchorSource::Tap, input.now);
                    self.on_commit(outcome);
                }
            }
        }

        let ctx = FrameContext {
            time: input.now.saturating_duration_since(self.opened_at).as_secs_f32(),
            now: input.now,
            candidate: self.candidate,
            viewer: input.viewer,
        };
        Ok(self.renderer.render(&self.machine, &ctx))
    }

    fn on_commit(&self, outcome: CommitOutcome) {
        if let CommitOutcome::Placed(anchor) = outcome {
            self.send(ViewCommand::Placed {
                item_id: self.item_id.clone(),
                position: anchor.pose.position,
            });
        }
    }

    fn send(&self, command: ViewCommand) {
        if let Some(commands) = &self.commands {
            commands.send(command);
        }
    }

    /// Ask the host to route to this item
    pub fn show_route(&self) {
        self.send(ViewCommand::ShowRoute {
            item_id: self.item_id.clone(),
        });
    }

    /// Report a hotspot activation to the host
    pub fn open_hotspot(&self, hotspot_id: &str) {
        self.send(ViewCommand::OpenHotspot {
            item_id: self.item_id.clone(),
            hotspot_id: hotspot_id.to_string(),
        });
    }

    /// Persist the current transform and edited hotspots
    pub async fn save(&self) -> Result<SavePayload> {
        let payload = self.renderer.save_payload()?;
        self.bridge.save(&self.item_id, &payload).await?;
        tracing::info!(item = %self.item_id, "Transform saved");
        Ok(payload)
    }

    /// Release everything the view holds. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match &mut self.path {
            PathState::Immersive { session, hit_test } => {
                hit_test.cancel(session.as_mut());
                session.end();
            }
            PathState::Passthrough { camera, .. } => camera.release(),
        }
        self.renderer.cancel_fetch();
        self.pointer.clear();

        tracing::info!(item = %self.item_id, "AR view closed");
        self.send(ViewCommand::Closed {
            item_id: self.item_id.clone(),
        });
    }
}

impl Drop for ArView {
    fn drop(&mut self) {
        self.close();
    }
}

/// Request the immersive session; `None` falls back to passthrough
async fn open_immersive(
    runtime: &dyn XrRuntime,
    cancel: &CancellationToken,
) -> Result<Option<PathState>> {
    let request = runtime.request_session(SessionMode::ImmersiveAr, &[SessionFeature::HitTest]);
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ArError::Cancelled),
        result = request => result,
    };

    let mut session = match result {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "Immersive session refused, using camera passthrough");
            return Ok(None);
        }
    };

    let hit_test = HitTestEngine::establish(session.as_mut()).await;
    if cancel.is_cancelled() {
        let mut hit_test = hit_test;
        hit_test.cancel(session.as_mut());
        session.end();
        return Err(ArError::Cancelled);
    }

    Ok(Some(PathState::Immersive { session, hit_test }))
}

async fn open_passthrough(ctx: &ArContext, cancel: &CancellationToken) -> Result<PathState> {
    let mut camera = PassthroughProvider::new(ctx.config.camera_constraints());
    // On error the provider is dropped here, releasing anything it opened
    let settings = camera.acquire(ctx.camera.as_ref(), cancel).await?;
    Ok(PathState::Passthrough { camera, settings })
}
