use crate::model::Bounds;
use crate::renderer::camera::{self, SOLID_OFFSET_X, WIREFRAME_OFFSET_X};
use crate::renderer::renderer::Renderer;
use egui_wgpu::ScreenDescriptor;

/// Everything the frame needs from the viewer state.
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    pub position: [f32; 3],
    pub mouse_x: f32,
    pub slot_rotation: Option<(f32, [f32; 3])>,
    pub bounds: Bounds,
    pub separate_specular: bool,
    pub has_model: bool,
}

impl Renderer {
    pub fn render(
        &mut self,
        scene: &Scene,
        paint_jobs: Vec<egui::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
        screen_descriptor: ScreenDescriptor,
    ) -> Result<(), wgpu::SurfaceError> {
        // Skip rendering if window size is invalid (minimized, not ready, etc.)
        if self.config.width == 0 || self.config.height == 0 {
            return Ok(());
        }

        let width = self.config.width as f32;
        let height = self.config.height as f32;

        let view_proj = camera::screen_view_proj(width, height);
        let eye = [width * 0.5, height * 0.5, camera::eye_distance(height)];
        let model =
            camera::model_matrix(scene.position, scene.slot_rotation, &scene.bounds, width);
        let solid = camera::scene_matrix(scene.position, scene.mouse_x, SOLID_OFFSET_X) * model;
        let wireframe =
            camera::scene_matrix(scene.position, scene.mouse_x, WIREFRAME_OFFSET_X) * model;

        // Per-copy uniforms go in before the pass
        self.write_uniforms(&view_proj, eye, scene.separate_specular, &solid, &wireframe);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if scene.has_model && !self.meshes.is_empty() {
                // Solid copy: every mesh as lit, textured faces
                render_pass.set_pipeline(&self.fill_pipeline);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                render_pass.set_bind_group(3, &self.solid_draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                for mesh in &self.meshes {
                    if mesh.index_count == 0 {
                        continue;
                    }
                    render_pass.set_bind_group(1, self.texture_bind_group(mesh.texture_id), &[]);
                    render_pass.set_bind_group(2, &mesh.material_bind_group, &[]);
                    render_pass.draw_indexed(
                        mesh.index_start..mesh.index_start + mesh.index_count,
                        mesh.base_vertex,
                        0..1,
                    );
                }

                // Wireframe copy of the first mesh, bound to its material and texture
                let wire_indices = self.wire_topology.index_count();
                if wire_indices > 0 && self.num_wire_vertices > 0 {
                    let (texture_id, material) = match self.meshes.first() {
                        Some(first) => (first.texture_id, &first.material_bind_group),
                        None => (None, &self.default_material_bind_group),
                    };
                    render_pass.set_pipeline(&self.wireframe_pipeline);
                    render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                    render_pass.set_bind_group(1, self.texture_bind_group(texture_id), &[]);
                    render_pass.set_bind_group(2, material, &[]);
                    render_pass.set_bind_group(3, &self.wireframe_draw.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, self.wire_vertex_buffer.slice(..));
                    render_pass.set_index_buffer(
                        self.wire_index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    render_pass.draw_indexed(0..wire_indices, 0, 0..1);
                }
            }
        }

        // Overlay without depth test or lighting
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut egui_rpass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui render pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.egui_renderer
                .render(&mut egui_rpass, &paint_jobs, &screen_descriptor);
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
