use wgpu::naga;
use wgpu::naga::valid::Capabilities;

use crate::error::ShaderError;

/// Validator capabilities a device with `features` accepts in a shader.
///
/// Covers the capabilities a fragment stage can reach; everything else
/// stays off.
pub fn capabilities_for(features: wgpu::Features) -> Capabilities {
    let mut caps = Capabilities::empty();
    caps.set(Capabilities::FLOAT64, features.contains(wgpu::Features::SHADER_F64));
    caps.set(
        Capabilities::SHADER_FLOAT16,
        features.contains(wgpu::Features::SHADER_F16),
    );
    caps.set(
        Capabilities::SHADER_INT64,
        features.contains(wgpu::Features::SHADER_INT64),
    );
    caps.set(
        Capabilities::PRIMITIVE_INDEX,
        features.contains(wgpu::Features::SHADER_PRIMITIVE_INDEX),
    );
    caps.set(
        Capabilities::SHADER_BARYCENTRICS,
        features.contains(wgpu::Features::SHADER_BARYCENTRICS),
    );
    caps.set(
        Capabilities::EARLY_DEPTH_TEST,
        features.contains(wgpu::Features::SHADER_EARLY_DEPTH_TEST),
    );
    caps.set(
        Capabilities::SUBGROUP,
        features.contains(wgpu::Features::SUBGROUP),
    );
    caps.set(
        Capabilities::SUBGROUP_BARRIER,
        features.contains(wgpu::Features::SUBGROUP_BARRIER),
    );
    caps.set(Capabilities::MULTIVIEW, features.contains(wgpu::Features::MULTIVIEW));
    caps
}

/// Parses and validates a GLSL stage against `caps`.
///
/// Front-end failures (syntax, types, undeclared names) are `Compile`
/// errors; module validation failures are `Link` errors. Both carry the
/// diagnostic text rendered against `source`.
pub fn check_glsl(
    source: &str,
    stage: naga::ShaderStage,
    caps: Capabilities,
) -> Result<naga::Module, ShaderError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage);

    let module = frontend
        .parse(&options, source)
        .map_err(|errors| ShaderError::Compile {
            log: errors.emit_to_string(source),
        })?;

    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), caps)
    .validate(&module)
    .map_err(|err| ShaderError::Link {
        log: err.emit_to_string(source),
    })?;

    Ok(module)
}
