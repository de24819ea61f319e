//! The main rendering orchestrator. Owns the GPU context, render targets,
//! the scene passes and the post stack, and drives the multi-frame cycle.

pub mod accumulation;
pub mod context;
pub mod frame;
pub mod identity_pass;
pub mod pipelines;
pub mod readback;
pub mod scene_gpu;
pub mod sensor_gpu;
pub mod shapes;
pub mod targets;

use self::{
    accumulation::{ndc_offset, MultiFrame},
    context::GfxContext,
    frame::{FramePass, PlanInputs, SensorResources},
    pipelines::{
        color_scale_plane::ColorScalePlanePipeline,
        cuboid::CuboidPipeline,
        label_pass::{project_labels, LabelPass, LabelProjection, ScreenLabel},
        post_stack::{PostFrame, PostInputs, PostStack},
        scene::{SceneFormats, ScenePipelines},
        volume::{volume_transforms, VolumePipeline},
        FrameUniforms, SharedLayouts,
    },
    readback::GpuReadback,
    scene_gpu::{SceneDraw, SceneGpu},
    sensor_gpu::SensorGpu,
    targets::{ShadowTarget, Targets},
};
use crate::{
    camera::{Camera, LightCamera},
    colorscale::{transfer_function_texels, ColorScale, ColorScaleCache, PresetLibrary},
    config::{Change, Changes, ColorScaleConfig, RendererConfig},
    distance_field::{load_atlas, load_sensor_fields, outside_map_path, SensorFields, VolumeData},
    events::{EventBus, HoverEvent, RendererEvent},
    labels::{
        build_layout,
        candidates::CandidateSet,
        placement::{DepthProbe, LabelView},
        LabelLayout,
    },
    loader::Loader,
    picking::{encode_id, DEPTH_CLEAR},
    scene::{gltf::load_gltf, Scene},
    sensors::SensorSlots,
    sun,
};
use anyhow::Context;
use crossbeam_channel::Receiver;
use glam::{Vec2, Vec3};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use winit::window::Window;

/// Everything the first `prepare` has to set up.
fn initial_changes() -> Changes {
    let mut changes = Changes::empty();
    for change in [
        Change::Camera,
        Change::SensorValues,
        Change::SensorIds,
        Change::DistanceMaps,
        Change::ColorScale,
        Change::TransferFunction,
        Change::SunPosition,
        Change::BasePlane,
        Change::Ssao,
        Change::MultiFrameNumber,
        Change::SensorValueLabels,
        Change::VolumeBox,
        Change::Probes,
    ] {
        changes.insert(change);
    }
    changes
}

fn color_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
    })
}

fn depth_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<f32>,
) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
    Some(wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    })
}

fn clear(rgba: [f64; 4]) -> wgpu::LoadOp<wgpu::Color> {
    wgpu::LoadOp::Clear(wgpu::Color {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
        a: rgba[3],
    })
}

fn frame_binding(
    device: &wgpu::Device,
    layouts: &SharedLayouts,
    label: &str,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<FrameUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.frame,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    (buffer, group)
}

fn preset_roots(config: &RendererConfig) -> Vec<PathBuf> {
    let mut roots = vec![Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/colorscales")];
    if let Some(root) = &config.asset_content_root {
        roots.push(root.join("colorscales"));
    }
    roots
}

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    shadow: ShadowTarget,
    layouts: SharedLayouts,
    scene_pipelines: ScenePipelines,
    volume: VolumePipeline,
    volume_depth: wgpu::BindGroup,
    volume_count: usize,
    cuboids: CuboidPipeline,
    color_scale_plane: ColorScalePlanePipeline,
    label_pass: LabelPass,
    pub post_stack: PostStack,
    pub egui_renderer: egui_wgpu::Renderer,

    camera_ubo: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    light_ubo: wgpu::Buffer,
    light_group: wgpu::BindGroup,
    sensors: SensorGpu,
    resources: SensorResources,
    slots: SensorSlots,

    pub camera: Camera,
    light: LightCamera,
    multi_frame: MultiFrame,
    config: RendererConfig,
    pending: Changes,

    scene: Option<SceneGpu>,
    hierarchy: Option<SceneGpu>,
    scene_loader: Loader<Scene>,
    hierarchy_loader: Loader<Scene>,
    fields_loader: Loader<SensorFields>,
    outside_loader: Loader<VolumeData>,
    color_scale_loader: Loader<(ColorScaleConfig, ColorScale)>,
    presets: Arc<PresetLibrary>,
    color_scales: ColorScaleCache,

    candidates: CandidateSet,
    layout: LabelLayout,
    labels_stale: bool,
    screen_labels: Vec<ScreenLabel>,
    probes: Vec<Vec3>,
    hovered_asset: Option<u32>,
    last_hover: Option<HoverEvent>,
    events: EventBus,
    loads_requested: bool,
    loading_finished: bool,
    /// Set once the off-screen targets hold a complete sub-frame.
    rendered: bool,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        config: RendererConfig,
        candidates: CandidateSet,
    ) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let size = gfx.size;
        let device = &gfx.device;

        let targets = Targets::new(device, size);
        let shadow = ShadowTarget::new(device);
        let layouts = SharedLayouts::new(device);
        let scene_pipelines = ScenePipelines::new(
            device,
            &layouts,
            &SceneFormats {
                pre_depth: targets.pre_depth_fmt,
                normal: targets.normal_fmt,
                shadow: shadow.color_fmt,
                color: targets.color_fmt,
                id: targets.id_fmt,
                raw_id: targets.raw_id_fmt,
            },
        );
        let volume = VolumePipeline::new(device, &layouts, targets.color_fmt);
        let volume_depth = volume.depth_bind_group(device, &targets.pre_depth);
        let cuboids = CuboidPipeline::new(device, &layouts, targets.id_fmt);
        let color_scale_plane = ColorScalePlanePipeline::new(device, &layouts, targets.color_fmt);
        let label_pass = LabelPass::new(device, targets.color_fmt);
        let post_stack = PostStack::new(device, &gfx.queue, gfx.config.format, size.width, size.height);

        let egui_renderer = egui_wgpu::Renderer::new(device, gfx.config.format, None, 1);

        let (camera_ubo, camera_group) = frame_binding(device, &layouts, "Camera Frame");
        let (light_ubo, light_group) = frame_binding(device, &layouts, "Light Frame");
        let sensors = SensorGpu::new(device, &gfx.queue);

        let camera = Camera::new(
            config.camera.unwrap_or_default(),
            size.width.max(1) as f32 / size.height.max(1) as f32,
        );
        let light = LightCamera {
            eye: config.sun_position,
            ..LightCamera::default()
        };
        let multi_frame = MultiFrame::new(config.multi_frame_number, light.eye, light.center);
        let presets = Arc::new(PresetLibrary::discover(&preset_roots(&config)));

        Ok(Self {
            gfx,
            targets,
            shadow,
            layouts,
            scene_pipelines,
            volume,
            volume_depth,
            volume_count: 0,
            cuboids,
            color_scale_plane,
            label_pass,
            post_stack,
            egui_renderer,
            camera_ubo,
            camera_group,
            light_ubo,
            light_group,
            sensors,
            resources: SensorResources::default(),
            slots: SensorSlots::default(),
            camera,
            light,
            multi_frame,
            config,
            pending: initial_changes(),
            scene: None,
            hierarchy: None,
            scene_loader: Loader::new("scene"),
            hierarchy_loader: Loader::new("hierarchy"),
            fields_loader: Loader::new("distance fields"),
            outside_loader: Loader::new("outside distance field"),
            color_scale_loader: Loader::new("color scale"),
            presets,
            color_scales: ColorScaleCache::default(),
            candidates,
            layout: LabelLayout::default(),
            labels_stale: true,
            screen_labels: Vec::new(),
            probes: Vec::new(),
            hovered_asset: None,
            last_hover: None,
            events: EventBus::new(),
            loads_requested: false,
            loading_finished: false,
            rendered: false,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
            self.post_stack.resize(&self.gfx.device, new_size.width, new_size.height);
            self.volume_depth = self
                .volume
                .depth_bind_group(&self.gfx.device, &self.targets.pre_depth);
            self.camera
                .set_aspect(new_size.width as f32 / new_size.height as f32);
            self.pending.insert(Change::CanvasSize);
            self.pending.insert(Change::FrameSize);
            self.rendered = false;
        }
    }

    // -------------------- Host-facing state --------------------

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Replaces the configuration; only the properties that differ are
    /// re-applied on the next [`Self::prepare`].
    pub fn set_config(&mut self, config: RendererConfig) {
        let changes = config.diff(&self.config);
        if changes.is_empty() {
            return;
        }
        if let Some(pose) = config.camera {
            self.camera.set_pose(pose);
        }
        self.pending = self.pending.union(changes);
        self.config = config;
    }

    /// Whether the host controls the camera pose.
    pub fn camera_controlled(&self) -> bool {
        self.config.camera.is_some()
    }

    pub fn subscribe(&mut self) -> Receiver<RendererEvent> {
        self.events.subscribe()
    }

    pub fn set_hovered_asset(&mut self, asset: Option<u32>) {
        if asset != self.hovered_asset {
            self.hovered_asset = asset;
            self.pending.insert(Change::HoveredAssetId);
        }
    }

    pub fn hovered_asset(&self) -> Option<u32> {
        self.hovered_asset
    }

    /// Publishes the hover state when it differs from the last one.
    pub fn report_hover(&mut self, hover: Option<HoverEvent>) {
        if hover != self.last_hover {
            self.last_hover = hover.clone();
            self.events.emit(RendererEvent::Hover(hover));
        }
    }

    pub fn add_probe(&mut self, position: Vec3) {
        self.probes.push(position);
        self.pending.insert(Change::Probes);
    }

    pub fn clear_probes(&mut self) {
        if !self.probes.is_empty() {
            self.probes.clear();
            self.pending.insert(Change::Probes);
        }
    }

    pub fn probes(&self) -> &[Vec3] {
        &self.probes
    }

    /// Accumulated and total sub-frames of the current cycle.
    pub fn progress(&self) -> (u32, u32) {
        (self.multi_frame.frame(), self.multi_frame.count())
    }

    /// Texel reads against the targets of the last rendered sub-frame.
    pub fn readback(&self, window: Vec2) -> GpuReadback<'_> {
        GpuReadback {
            device: &self.gfx.device,
            queue: &self.gfx.queue,
            targets: &self.targets,
            window,
            view_projection_inverse: self.camera.view_projection_inverse(),
            ready: self.rendered,
        }
    }

    // -------------------- Loading --------------------

    pub fn load_scene(&mut self, path: PathBuf) {
        self.loads_requested = true;
        self.scene_loader.request(move || load_gltf(&path));
    }

    pub fn load_hierarchy(&mut self, path: PathBuf) {
        self.loads_requested = true;
        self.hierarchy_loader.request(move || {
            load_gltf(&path).with_context(|| format!("hierarchy '{}'", path.display()))
        });
    }

    fn request_fields(&mut self) {
        self.resources.fields_ready = false;
        if self.slots.is_empty() {
            self.sensors.clear_fields(&self.gfx.device, &self.gfx.queue);
            return;
        }
        let Some(root) = self.config.asset_content_root.clone() else {
            log::warn!("no asset content root, sensor distance fields stay empty");
            return;
        };
        let ids = self.slots.ids().to_vec();
        let slices = self.config.distance_map_height_slices;
        self.fields_loader
            .request(move || Ok(load_sensor_fields(&root, &ids, slices)?));
    }

    fn request_outside(&mut self) {
        self.resources.outside_ready = false;
        let Some(root) = self.config.asset_content_root.clone() else {
            return;
        };
        let slices = self.config.distance_map_height_slices;
        self.outside_loader
            .request(move || Ok(load_atlas(&outside_map_path(&root), slices)?));
    }

    fn apply_color_scale(&mut self) {
        let selection = self.config.color_scale.clone();
        if let Some(scale) = self.color_scales.get(&selection) {
            self.sensors
                .set_color_scale(&self.gfx.device, &self.gfx.queue, scale, selection.filtering);
            self.resources.color_scale_ready = true;
            return;
        }
        let presets = self.presets.clone();
        self.color_scale_loader.request(move || {
            let scale = presets.load(&selection)?;
            Ok((selection, scale))
        });
    }

    /// Applies finished background loads. Returns `true` if anything arrived.
    pub fn poll_loads(&mut self) -> bool {
        let mut arrived = false;
        let device = &self.gfx.device;
        let queue = &self.gfx.queue;

        if let Some(scene) = self.scene_loader.poll() {
            self.scene = Some(SceneGpu::upload(device, queue, &self.layouts, &scene, "Scene"));
            log::info!("scene ready ({} nodes)", scene.nodes.len());
            self.pending.insert(Change::Scene);
            arrived = true;
        }
        if let Some(scene) = self.hierarchy_loader.poll() {
            self.hierarchy = Some(SceneGpu::upload(device, queue, &self.layouts, &scene, "Hierarchy"));
            log::info!("hierarchy ready ({} nodes)", scene.nodes.len());
            self.pending.insert(Change::Scene);
            arrived = true;
        }
        if let Some(fields) = self.fields_loader.poll() {
            if fields.sensor_ids == self.slots.ids() {
                self.sensors.set_fields(device, queue, &fields);
                self.resources.fields_ready = true;
                self.multi_frame.restart();
                arrived = true;
            } else {
                log::debug!("distance fields for {:?} no longer match the sensor set", fields.sensor_ids);
            }
        }
        if let Some(outside) = self.outside_loader.poll() {
            self.sensors.set_outside(device, queue, &outside);
            self.resources.outside_ready = true;
            self.multi_frame.restart();
            arrived = true;
        }
        if let Some((selection, scale)) = self.color_scale_loader.poll() {
            if selection == self.config.color_scale {
                self.sensors
                    .set_color_scale(device, queue, &scale, selection.filtering);
                self.resources.color_scale_ready = true;
                self.multi_frame.restart();
                arrived = true;
            }
            self.color_scales.insert(&selection, scale);
        }

        if self.loads_requested
            && !self.loading_finished
            && !self.scene_loader.is_pending()
            && !self.hierarchy_loader.is_pending()
        {
            self.loading_finished = true;
            log::info!("loading finished");
            self.events.emit(RendererEvent::LoadingFinished);
        }
        arrived
    }

    // -------------------- Frame --------------------

    /// Consumes pending changes. Returns `true` while the multi-frame cycle
    /// still has sub-frames to render.
    pub fn prepare(&mut self) -> bool {
        if self.camera.take_altered() {
            self.pending.insert(Change::Camera);
            self.events.emit(RendererEvent::CameraChanged {
                eye: self.camera.eye(),
                center: self.camera.center(),
                up: self.camera.up(),
            });
        }

        let changes = self.pending.take();
        if changes.is_empty() {
            return !self.multi_frame.is_complete();
        }
        log::trace!("prepare: {:?}", changes);

        let reassigned = changes.any(&[Change::SensorValues, Change::SensorIds])
            && self.slots.assign(&self.config.sensor_values);
        if changes.contains(Change::DistanceMaps) {
            self.presets = Arc::new(PresetLibrary::discover(&preset_roots(&self.config)));
            self.request_outside();
        }
        if reassigned || changes.contains(Change::DistanceMaps) {
            self.request_fields();
        }
        if changes.any(&[Change::ColorScale, Change::DistanceMaps]) {
            self.apply_color_scale();
        }
        if changes.contains(Change::TransferFunction) {
            let texels = transfer_function_texels(&self.config.transfer_function);
            self.sensors
                .set_transfer(&self.gfx.device, &self.gfx.queue, &texels);
        }

        if changes.any(&[Change::SunPosition, Change::BasePlane]) {
            self.light.eye = self.config.sun_position;
            self.light.far = self.light.far_from_ground(self.config.base_plane_y_offset);
        }
        if changes.any(&[Change::MultiFrameNumber, Change::SunPosition]) {
            self.multi_frame
                .regenerate(self.config.multi_frame_number, self.light.eye, self.light.center);
        }
        if changes.any(&[Change::MultiFrameNumber, Change::Ssao]) {
            self.post_stack.set_ssao_kernel(
                &self.gfx.device,
                &self.gfx.queue,
                self.config.ssao.spiral_turns,
                self.multi_frame.count(),
            );
        }
        if changes.any(&[Change::Probes, Change::VolumeBox, Change::ApartmentBbox]) {
            let transforms = volume_transforms(&self.probes, &self.config.volume_bbox());
            self.volume
                .update(&self.gfx.device, &self.gfx.queue, &self.layouts, &transforms);
            self.volume_count = transforms.len();
        }
        if changes.affects_labels() || changes.contains(Change::Scene) {
            self.labels_stale = true;
        }

        self.multi_frame.restart();
        true
    }

    /// Renders the next sub-frame if the cycle is not complete, then blits
    /// the running average to `swap_view`.
    pub fn render(&mut self, swap_view: &wgpu::TextureView) {
        if !self.multi_frame.is_complete() {
            self.render_subframe();
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });
        self.post_stack
            .present(&self.gfx.device, &mut encoder, swap_view);
        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn refresh_labels(&mut self) {
        let filters = &self.config.sensor_value_labels_config.filters;
        let snapshot = if filters.must_not_be_behind_obstacles && self.scene.is_some() {
            readback::depth_snapshot(&self.gfx.device, &self.gfx.queue, &self.targets)
        } else {
            None
        };
        self.layout = build_layout(
            &self.config,
            &self.candidates,
            &LabelView::from_camera(&self.camera),
            self.camera.center(),
            snapshot.as_ref().map(|s| s as &dyn DepthProbe),
        );
        log::debug!(
            "label layout: {} labels, {} cuboids",
            self.layout.labels.len(),
            self.layout.cuboids.len()
        );
        self.cuboids
            .update(&self.gfx.device, &self.layouts, &self.layout.cuboids);
        self.color_scale_plane
            .update(&self.gfx.queue, self.layout.color_scale_plane);
        self.labels_stale = false;
    }

    fn label_projection(&self, jitter: Vec2) -> LabelProjection {
        let forward = (self.camera.center() - self.camera.eye()).normalize_or_zero();
        let right = forward.cross(self.camera.up()).normalize_or_zero();
        LabelProjection {
            view_projection: self.camera.view_projection(),
            right,
            up: right.cross(forward),
            size: self.targets.size(),
            jitter,
        }
    }

    fn render_subframe(&mut self) {
        let size = self.targets.size();
        let jitter = ndc_offset(self.multi_frame.jitter(), size);
        let shadows = frame::shadows_active(&self.config);

        let mut light = self.light.clone();
        if let Some(eye) = self.multi_frame.light_eye().filter(|_| shadows) {
            light.eye = eye;
        }
        let camera_uniforms =
            frame::camera_uniforms(&self.camera, jitter, size, self.hovered_asset, &self.config);
        let light_uniforms = frame::light_uniforms(&light, &self.config.shadow_mode);
        self.gfx
            .queue
            .write_buffer(&self.camera_ubo, 0, bytemuck::bytes_of(&camera_uniforms));
        self.gfx
            .queue
            .write_buffer(&self.light_ubo, 0, bytemuck::bytes_of(&light_uniforms));
        self.sensors.uniforms =
            frame::sensor_uniforms(&self.config, &self.slots, &light, self.resources);
        self.sensors.write_uniforms(&self.gfx.queue);

        // Depth and normals go first: the label obstruction test reads them back.
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("G-Buffer Encoder"),
            });
        self.encode_gbuffer(&mut encoder);
        self.gfx.queue.submit(std::iter::once(encoder.finish()));

        if self.labels_stale {
            self.refresh_labels();
        }
        self.screen_labels = project_labels(&self.layout.labels, &self.label_projection(jitter));

        let passes = frame::plan(
            &self.config,
            PlanInputs {
                has_hierarchy: self.hierarchy.is_some(),
                has_color_scale_plane: self.layout.color_scale_plane.is_some(),
                has_labels: !self.screen_labels.is_empty(),
            },
        );
        log::trace!("sub-frame {}: {:?}", self.multi_frame.frame(), passes);

        let device = &self.gfx.device;
        let queue = &self.gfx.queue;
        let targets = &self.targets;
        let sensor_group = self
            .sensors
            .bind_group(device, &self.layouts, &self.shadow.color);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        for pass in passes {
            match pass {
                FramePass::PreDepth | FramePass::Normal => {}
                FramePass::Shadow => {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Shadow Pass"),
                        color_attachments: &[color_attachment(
                            &self.shadow.color,
                            wgpu::LoadOp::Clear(frame::shadow_clear(&self.config.shadow_mode)),
                        )],
                        depth_stencil_attachment: depth_attachment(
                            &self.shadow.depth,
                            wgpu::LoadOp::Clear(1.0),
                        ),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    if let Some(scene) = &self.scene {
                        identity_pass::execute(
                            &mut rpass,
                            Some(&scene.batches),
                            &SceneDraw {
                                pipeline: &self.scene_pipelines.shadow,
                                frame: &self.light_group,
                                scene,
                                bind_materials: false,
                                sensors: None,
                            },
                        );
                    }
                }
                FramePass::Asset => {
                    let background = sun::clear_color(self.config.sun_is_up, self.config.enable_shadow_mapping);
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Asset Pass"),
                        color_attachments: &[
                            color_attachment(&targets.color, clear(background)),
                            color_attachment(&targets.asset_id, clear([0.0; 4])),
                            color_attachment(&targets.asset_raw, clear([0.0; 4])),
                        ],
                        depth_stencil_attachment: depth_attachment(
                            &targets.depth,
                            wgpu::LoadOp::Clear(1.0),
                        ),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    if let Some(scene) = &self.scene {
                        identity_pass::execute(
                            &mut rpass,
                            Some(&scene.batches),
                            &SceneDraw {
                                pipeline: &self.scene_pipelines.asset,
                                frame: &self.camera_group,
                                scene,
                                bind_materials: true,
                                sensors: Some(sensor_group),
                            },
                        );
                    }
                }
                FramePass::Volume => {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Volume Pass"),
                        color_attachments: &[color_attachment(&targets.color, wgpu::LoadOp::Load)],
                        depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Load),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    self.volume.draw(
                        &mut rpass,
                        &self.camera_group,
                        sensor_group,
                        &self.volume_depth,
                        !self.probes.is_empty(),
                        self.volume_count,
                    );
                }
                FramePass::HierarchyHighlight => {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Hierarchy Highlight Pass"),
                        color_attachments: &[color_attachment(&targets.color, wgpu::LoadOp::Load)],
                        depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Load),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    if let Some(hierarchy) = &self.hierarchy {
                        identity_pass::execute(
                            &mut rpass,
                            Some(&hierarchy.batches),
                            &SceneDraw {
                                pipeline: &self.scene_pipelines.highlight,
                                frame: &self.camera_group,
                                scene: hierarchy,
                                bind_materials: false,
                                sensors: None,
                            },
                        );
                    }
                }
                FramePass::NodeIds => {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Node ID Pass"),
                        color_attachments: &[color_attachment(&targets.node_id, clear([0.0; 4]))],
                        depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Load),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    if let Some(hierarchy) = &self.hierarchy {
                        identity_pass::execute(
                            &mut rpass,
                            Some(&hierarchy.batches),
                            &SceneDraw {
                                pipeline: &self.scene_pipelines.hierarchy_id,
                                frame: &self.camera_group,
                                scene: hierarchy,
                                bind_materials: false,
                                sensors: None,
                            },
                        );
                    }
                }
                FramePass::SensorIds => {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Sensor ID Pass"),
                        color_attachments: &[color_attachment(&targets.sensor_id, clear([0.0; 4]))],
                        depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Load),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    self.cuboids.draw(&mut rpass, &self.camera_group);
                }
                FramePass::ColorScalePlane => {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Color Scale Pass"),
                        color_attachments: &[color_attachment(&targets.color, wgpu::LoadOp::Load)],
                        depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Load),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    self.color_scale_plane
                        .draw(&mut rpass, &self.camera_group, sensor_group);
                }
                FramePass::Labels => {
                    self.label_pass.draw(
                        device,
                        queue,
                        &mut encoder,
                        &targets.color,
                        &self.screen_labels,
                        [targets.width, targets.height],
                    );
                }
                FramePass::Post => {
                    let highlight = self.config.enable_asset_highlighting_on_hover;
                    self.post_stack.run(
                        device,
                        queue,
                        &mut encoder,
                        &PostInputs {
                            color: &targets.color,
                            pre_depth: &targets.pre_depth,
                            normal: &targets.normal,
                            asset_id: &targets.asset_id,
                        },
                        &PostFrame {
                            projection: self.camera.projection(),
                            near: self.camera.near,
                            far: self.camera.far,
                            edges: self.config.enable_edge_outline,
                            ssao: self.config.enable_ssao,
                            ssao_min_distance: self.config.ssao.min_distance,
                            ssao_max_distance: self.config.ssao.max_distance,
                            frame: self.multi_frame.frame(),
                            weight: self.multi_frame.blend_weight(),
                            hovered: self.hovered_asset.filter(|_| highlight).map(encode_id),
                        },
                    );
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        self.multi_frame.advance();
        self.rendered = true;
    }

    fn encode_gbuffer(&self, encoder: &mut wgpu::CommandEncoder) {
        let targets = &self.targets;
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pre-Depth Pass"),
                color_attachments: &[color_attachment(
                    &targets.pre_depth,
                    clear([DEPTH_CLEAR as f64, 0.0, 0.0, 1.0]),
                )],
                depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Clear(1.0)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(scene) = &self.scene {
                identity_pass::execute(
                    &mut rpass,
                    Some(&scene.batches),
                    &SceneDraw {
                        pipeline: &self.scene_pipelines.depth,
                        frame: &self.camera_group,
                        scene,
                        bind_materials: false,
                        sensors: None,
                    },
                );
            }
        }
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Normal Pass"),
                color_attachments: &[color_attachment(&targets.normal, clear([0.0; 4]))],
                depth_stencil_attachment: depth_attachment(&targets.depth, wgpu::LoadOp::Clear(1.0)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(scene) = &self.scene {
                identity_pass::execute(
                    &mut rpass,
                    Some(&scene.batches),
                    &SceneDraw {
                        pipeline: &self.scene_pipelines.normal,
                        frame: &self.camera_group,
                        scene,
                        bind_materials: false,
                        sensors: None,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_prepare_sets_up_everything_loaded_lazily() {
        let changes = initial_changes();
        assert!(changes.contains(Change::SensorIds));
        assert!(changes.contains(Change::DistanceMaps));
        assert!(changes.contains(Change::ColorScale));
        assert!(changes.affects_labels());
    }

    #[test]
    fn presets_search_bundled_then_asset_root() {
        let config = RendererConfig {
            asset_content_root: Some(PathBuf::from("/data/apartment")),
            ..Default::default()
        };
        let roots = preset_roots(&config);
        assert_eq!(roots.len(), 2);
        assert!(roots[0].ends_with("assets/colorscales"));
        assert_eq!(roots[1], PathBuf::from("/data/apartment/colorscales"));
    }
}
