use wgpu::naga;

use crate::error::ShaderError;
use crate::frame::ShaderInputs;
use crate::quad::QuadVertex;

use super::compile::{capabilities_for, check_glsl};
use super::template::{
    assemble, sampler_binding, texture_binding, PassTarget, CHANNEL_COUNT, UNIFORM_BINDING,
    VERTEX_SHADER,
};

/// A linked pass program: the render pipeline for one fragment shader.
pub struct Program {
    pipeline: wgpu::RenderPipeline,
}

impl Program {
    pub fn render_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}

/// Objects shared by every pass program: the vertex module and the bind
/// group layout of the fixed shader interface.
pub struct ProgramBuilder {
    caps: naga::valid::Capabilities,
    vertex: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

impl ProgramBuilder {
    pub fn new(device: &wgpu::Device) -> Result<Self, ShaderError> {
        let caps = capabilities_for(device.features());
        check_glsl(VERTEX_SHADER, naga::ShaderStage::Vertex, caps)?;
        let vertex = glsl_module(
            device,
            "shaderdeck quad vs",
            VERTEX_SHADER,
            naga::ShaderStage::Vertex,
        )?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shaderdeck pass bgl"),
            entries: &layout_entries(),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shaderdeck pass pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Ok(Self {
            caps,
            vertex,
            bind_group_layout,
            pipeline_layout,
        })
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Assembles, checks and links one pass.
    ///
    /// `format` is the color format of whatever the pass draws into.
    pub fn build(
        &self,
        device: &wgpu::Device,
        label: &str,
        common: &str,
        source: &str,
        target: PassTarget,
        format: wgpu::TextureFormat,
    ) -> Result<Program, ShaderError> {
        let assembled = assemble(common, source, target);

        if let Err(err) = check_glsl(assembled.text(), naga::ShaderStage::Fragment, self.caps) {
            log::debug!(
                "{label}: pass source starts at line {} of the assembled shader",
                assembled.user_start_line()
            );
            return Err(err);
        }

        let fragment = glsl_module(device, label, assembled.text(), naga::ShaderStage::Fragment)?;

        let descriptor = wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vertex,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        };

        let pipeline = validation_scope(device, || device.create_render_pipeline(&descriptor))
            .map_err(|log| ShaderError::Link { log })?;

        Ok(Program { pipeline })
    }
}

/// Creates a GLSL module; a device-side rejection is a compile error.
fn glsl_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: naga::ShaderStage,
) -> Result<wgpu::ShaderModule, ShaderError> {
    validation_scope(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Glsl {
                shader: source.into(),
                stage,
                defines: Default::default(),
            },
        })
    })
    .map_err(|log| ShaderError::Compile { log })
}

/// Runs `create` with a validation error scope pushed, returning the
/// captured error text instead of letting it reach the uncaptured handler.
fn validation_scope<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, String> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = create();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err.to_string()),
        None => Ok(out),
    }
}

fn layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(1 + CHANNEL_COUNT * 2);

    entries.push(wgpu::BindGroupLayoutEntry {
        binding: UNIFORM_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ShaderInputs>() as u64),
        },
        count: None,
    });

    for unit in 0..CHANNEL_COUNT {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding(unit),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: sampler_binding(unit),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    entries
}
