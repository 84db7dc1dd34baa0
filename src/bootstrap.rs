//! The demo's setup sequence.
//!
//! ```text
//! begin:    hide window ──► (assets load elsewhere)
//! complete: camera ─► rotating mesh ─► lights ─► vignette ─► debug tools
//!           ─► show window ─► start ─► first draw
//! ```
//!
//! The bootstrap only talks to the render application through
//! [`RenderHost`], so the ordering can be checked without a GPU.

use glam::Vec3;
use thiserror::Error;

use crate::assets::{AssetError, LoadedAssets};
use crate::config::{ANGULAR_VELOCITY_LABEL, DebugFlag, RenderConfig};
use crate::debug::{AttachedTools, DebugTools, ParamHandle};
use crate::geometry::RawGeometry;
use crate::lighting::add_natural_light;
use crate::post_process::ShaderPassDescriptor;
use crate::render_app::RenderError;
use crate::rotating_mesh::{AngularVelocity, RotatingMesh};
use crate::scene::{MeshId, Scene};

/// Name the model geometry is queued under.
pub const MODEL_ASSET: &str = "model";

/// Where the camera is placed before the first frame.
pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 5.0);

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("asset loading failed")]
    AssetLoad(#[source] AssetError),
    #[error("bootstrap called out of order: {0}")]
    Phase(&'static str),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// The parts of the render application the setup sequence drives.
pub trait RenderHost {
    fn config(&self) -> &RenderConfig;
    fn set_visible(&mut self, visible: bool);
    fn scene_mut(&mut self) -> &mut Scene;
    fn upload_geometry(&mut self, geometry: &RawGeometry) -> MeshId;
    /// Append a full-screen pass to the effect chain.
    fn add_pass(&mut self, descriptor: &ShaderPassDescriptor) -> Result<(), RenderError>;
    fn attach_debug(&mut self, tools: DebugTools);
    /// Begin the per-frame loop.
    fn start(&mut self);
    /// Render one frame now.
    fn draw(&mut self);
}

/// What the caller gets back once the scene is up.
#[derive(Clone, Debug, Default)]
pub struct DebugHandle {
    /// The panel value the mesh's spin rate is bound to, in debug mode.
    pub angular_velocity: Option<ParamHandle>,
    pub attached: AttachedTools,
}

impl DebugHandle {
    /// Change the live spin rate. Returns false when nothing is bound.
    pub fn set_angular_velocity(&self, value: f32) -> bool {
        match &self.angular_velocity {
            Some(param) => {
                param.set(value);
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Loading,
    Done,
}

pub struct Bootstrap {
    debug: DebugFlag,
    phase: Phase,
}

impl Bootstrap {
    pub fn new(debug: DebugFlag) -> Self {
        Self {
            debug,
            phase: Phase::Idle,
        }
    }

    pub fn debug(&self) -> DebugFlag {
        self.debug
    }

    /// Hide the window. Call before starting the asset load.
    pub fn begin<H: RenderHost + ?Sized>(&mut self, host: &mut H) -> Result<(), BootstrapError> {
        if self.phase != Phase::Idle {
            return Err(BootstrapError::Phase("begin called twice"));
        }
        host.set_visible(false);
        self.phase = Phase::Loading;
        tracing::debug!("window hidden until assets load");
        Ok(())
    }

    /// Finish setup with the outcome of the asset load.
    ///
    /// A failed load is returned as is: nothing is added to the scene and
    /// the window stays hidden.
    pub fn complete<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        result: Result<LoadedAssets, AssetError>,
    ) -> Result<DebugHandle, BootstrapError> {
        match self.phase {
            Phase::Idle => return Err(BootstrapError::Phase("complete called before begin")),
            Phase::Done => return Err(BootstrapError::Phase("complete called twice")),
            Phase::Loading => self.phase = Phase::Done,
        }

        let mut assets = result.map_err(BootstrapError::AssetLoad)?;
        let geometry = assets
            .take_geometry(MODEL_ASSET)
            .map_err(BootstrapError::AssetLoad)?;

        host.scene_mut().camera.set_position(CAMERA_POSITION);

        let tools = DebugTools::from_config(host.config(), self.debug);
        let param = tools.param(ANGULAR_VELOCITY_LABEL);
        let velocity = param
            .clone()
            .map_or_else(AngularVelocity::default, AngularVelocity::Bound);

        let mesh = host.upload_geometry(&geometry);
        host.scene_mut().add(RotatingMesh::new(mesh, velocity));
        tracing::debug!(
            triangles = geometry.triangle_count(),
            bound = param.is_some(),
            "rotating mesh attached"
        );

        add_natural_light(host.scene_mut());

        if host.config().postprocessing {
            host.add_pass(&ShaderPassDescriptor::vignette())?;
        } else {
            tracing::info!("postprocessing disabled, vignette skipped");
        }

        let attached = tools.attached();
        if attached.any() {
            host.attach_debug(tools);
        }

        host.set_visible(true);
        host.start();
        host.draw();
        tracing::info!(debug = self.debug.is_on(), "scene ready");

        Ok(DebugHandle {
            angular_velocity: param,
            attached,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetManager, AssetSource};
    use crate::geometry::Primitive;
    use crate::rotating_mesh::DEFAULT_ANGULAR_VELOCITY;
    use glam::Quat;

    #[derive(Debug, PartialEq)]
    enum Call {
        SetVisible(bool),
        Upload,
        AddPass(String),
        AttachDebug,
        Start,
        Draw,
    }

    struct RecordingHost {
        config: RenderConfig,
        scene: Scene,
        calls: Vec<Call>,
        visible: bool,
        meshes: usize,
        attached: Option<AttachedTools>,
    }

    impl RecordingHost {
        fn new(config: RenderConfig) -> Self {
            Self {
                config,
                scene: Scene::new(),
                calls: Vec::new(),
                visible: true,
                meshes: 0,
                attached: None,
            }
        }
    }

    impl RenderHost for RecordingHost {
        fn config(&self) -> &RenderConfig {
            &self.config
        }

        fn set_visible(&mut self, visible: bool) {
            self.visible = visible;
            self.calls.push(Call::SetVisible(visible));
        }

        fn scene_mut(&mut self) -> &mut Scene {
            &mut self.scene
        }

        fn upload_geometry(&mut self, _geometry: &RawGeometry) -> MeshId {
            self.calls.push(Call::Upload);
            self.meshes += 1;
            MeshId(self.meshes - 1)
        }

        fn add_pass(&mut self, descriptor: &ShaderPassDescriptor) -> Result<(), RenderError> {
            if !self.config.postprocessing {
                return Err(RenderError::PostprocessingDisabled);
            }
            self.calls.push(Call::AddPass(descriptor.label.clone()));
            Ok(())
        }

        fn attach_debug(&mut self, tools: DebugTools) {
            self.calls.push(Call::AttachDebug);
            self.attached = Some(tools.attached());
        }

        fn start(&mut self) {
            self.calls.push(Call::Start);
        }

        fn draw(&mut self) {
            self.calls.push(Call::Draw);
        }
    }

    fn loaded() -> Result<LoadedAssets, AssetError> {
        AssetManager::new()
            .queue(MODEL_ASSET, AssetSource::Primitive(Primitive::Cube))
            .load()
            .wait()
    }

    fn run(debug: bool) -> (RecordingHost, Result<DebugHandle, BootstrapError>) {
        let mut host = RecordingHost::new(RenderConfig::demo(DebugFlag(debug)));
        let mut bootstrap = Bootstrap::new(DebugFlag(debug));
        bootstrap.begin(&mut host).expect("begin");
        let result = bootstrap.complete(&mut host, loaded());
        (host, result)
    }

    #[test]
    fn window_hidden_until_assets_resolve() {
        let mut host = RecordingHost::new(RenderConfig::demo(DebugFlag(false)));
        let mut bootstrap = Bootstrap::new(DebugFlag(false));

        bootstrap.begin(&mut host).expect("begin");
        assert!(!host.visible);
        assert_eq!(host.calls, vec![Call::SetVisible(false)]);
        assert_eq!(host.scene.objects(), 0);

        bootstrap.complete(&mut host, loaded()).expect("complete");
        assert!(host.visible);
        assert_eq!(host.scene.objects(), 1);
    }

    #[test]
    fn setup_runs_in_order() {
        let (host, result) = run(true);
        assert!(result.is_ok());
        assert_eq!(
            host.calls,
            vec![
                Call::SetVisible(false),
                Call::Upload,
                Call::AddPass("Vignette".to_string()),
                Call::AttachDebug,
                Call::SetVisible(true),
                Call::Start,
                Call::Draw,
            ]
        );
        assert_eq!(host.scene.camera.position, CAMERA_POSITION);
        assert_eq!(host.scene.lights().len(), 2);
    }

    #[test]
    fn rejected_load_attaches_nothing() {
        let mut host = RecordingHost::new(RenderConfig::demo(DebugFlag(true)));
        let mut bootstrap = Bootstrap::new(DebugFlag(true));
        bootstrap.begin(&mut host).expect("begin");

        let result = bootstrap.complete(&mut host, Err(AssetError::WorkerLost));
        assert!(matches!(
            result,
            Err(BootstrapError::AssetLoad(AssetError::WorkerLost))
        ));
        assert_eq!(host.scene.objects(), 0);
        assert!(host.scene.lights().is_empty());
        assert!(!host.visible);
        assert_eq!(host.calls, vec![Call::SetVisible(false)]);
    }

    #[test]
    fn missing_model_is_a_load_failure() {
        let mut host = RecordingHost::new(RenderConfig::demo(DebugFlag(false)));
        let mut bootstrap = Bootstrap::new(DebugFlag(false));
        bootstrap.begin(&mut host).expect("begin");

        let result = bootstrap.complete(&mut host, Ok(LoadedAssets::default()));
        assert!(matches!(
            result,
            Err(BootstrapError::AssetLoad(AssetError::Missing(_)))
        ));
        assert_eq!(host.scene.objects(), 0);
    }

    #[test]
    fn no_debug_means_no_debug_tools() {
        let (host, result) = run(false);
        let handle = result.expect("complete");
        assert!(!handle.attached.any());
        assert!(handle.angular_velocity.is_none());
        assert!(host.attached.is_none());
        assert!(!host.calls.contains(&Call::AttachDebug));
    }

    #[test]
    fn debug_attaches_every_tool() {
        let (host, result) = run(true);
        let handle = result.expect("complete");
        let all = AttachedTools {
            fps: true,
            orbit: true,
            panel: true,
            screenshot: true,
        };
        assert_eq!(handle.attached, all);
        assert_eq!(host.attached, Some(all));
    }

    #[test]
    fn panel_starts_at_default_velocity() {
        let (_, result) = run(true);
        let handle = result.expect("complete");
        assert_eq!(
            handle.angular_velocity.map(|p| p.get()),
            Some(DEFAULT_ANGULAR_VELOCITY)
        );
    }

    #[test]
    fn changing_bound_velocity_changes_rotation_rate() {
        let (mut host, result) = run(true);
        let handle = result.expect("complete");

        host.scene.update(1.0);
        assert!(handle.set_angular_velocity(2.0));
        host.scene.update(1.0);

        let expected = Quat::from_rotation_y(DEFAULT_ANGULAR_VELOCITY + 2.0);
        let rotation = host.scene.draw_items()[0].transform.rotation;
        assert!(rotation.angle_between(expected) < 1e-4);
    }

    #[test]
    fn without_debug_velocity_is_fixed() {
        let (mut host, result) = run(false);
        let handle = result.expect("complete");
        assert!(!handle.set_angular_velocity(9.0));

        host.scene.update(2.0);
        let expected = Quat::from_rotation_y(DEFAULT_ANGULAR_VELOCITY * 2.0);
        let rotation = host.scene.draw_items()[0].transform.rotation;
        assert!(rotation.angle_between(expected) < 1e-4);
    }

    #[test]
    fn postprocessing_off_skips_vignette() {
        let config = RenderConfig::demo(DebugFlag(false)).postprocessing(false);
        let mut host = RecordingHost::new(config);
        let mut bootstrap = Bootstrap::new(DebugFlag(false));
        bootstrap.begin(&mut host).expect("begin");
        bootstrap.complete(&mut host, loaded()).expect("complete");
        assert!(!host.calls.iter().any(|c| matches!(c, Call::AddPass(_))));
    }

    #[test]
    fn phases_are_enforced() {
        let mut host = RecordingHost::new(RenderConfig::default());
        let mut bootstrap = Bootstrap::new(DebugFlag(false));
        assert!(matches!(
            bootstrap.complete(&mut host, loaded()),
            Err(BootstrapError::Phase(_))
        ));

        bootstrap.begin(&mut host).expect("begin");
        assert!(matches!(bootstrap.begin(&mut host), Err(BootstrapError::Phase(_))));
        bootstrap.complete(&mut host, loaded()).expect("complete");
        assert!(matches!(
            bootstrap.complete(&mut host, loaded()),
            Err(BootstrapError::Phase(_))
        ));
    }
}
