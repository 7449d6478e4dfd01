use std::collections::HashMap;

use shaderdeck_config::{Filter, Wrap};

/// Descriptor for a channel sampler.
///
/// `Nearest`/`Linear` clamp sampling to the base level; `Mipmap` walks the
/// whole chain.
pub fn sampler_descriptor(filter: Filter, wrap: Wrap) -> wgpu::SamplerDescriptor<'static> {
    let address_mode = match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    };

    let (filter_mode, lod_max_clamp) = match filter {
        Filter::Nearest => (wgpu::FilterMode::Nearest, 0.0),
        Filter::Linear => (wgpu::FilterMode::Linear, 0.0),
        Filter::Mipmap => (wgpu::FilterMode::Linear, 32.0),
    };

    wgpu::SamplerDescriptor {
        label: Some("shaderdeck channel sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: filter_mode,
        min_filter: filter_mode,
        lod_min_clamp: 0.0,
        lod_max_clamp,
        ..Default::default()
    }
}

/// One sampler per (filter, wrap) combination, created on demand.
#[derive(Default)]
pub struct SamplerCache {
    samplers: HashMap<(Filter, Wrap), wgpu::Sampler>,
}

impl SamplerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, device: &wgpu::Device, filter: Filter, wrap: Wrap) -> &wgpu::Sampler {
        self.samplers
            .entry((filter, wrap))
            .or_insert_with(|| device.create_sampler(&sampler_descriptor(filter, wrap)))
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_applies_to_every_axis() {
        let d = sampler_descriptor(Filter::Linear, Wrap::ClampToEdge);
        assert_eq!(d.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(d.address_mode_v, wgpu::AddressMode::ClampToEdge);
        assert_eq!(d.address_mode_w, wgpu::AddressMode::ClampToEdge);
    }

    #[test]
    fn only_mipmap_reaches_lower_levels() {
        assert_eq!(sampler_descriptor(Filter::Nearest, Wrap::Repeat).lod_max_clamp, 0.0);
        assert_eq!(sampler_descriptor(Filter::Linear, Wrap::Repeat).lod_max_clamp, 0.0);
        assert!(sampler_descriptor(Filter::Mipmap, Wrap::Repeat).lod_max_clamp > 0.0);
    }

    #[test]
    fn nearest_filters_both_ways() {
        let d = sampler_descriptor(Filter::Nearest, Wrap::Repeat);
        assert_eq!(d.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(d.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(d.address_mode_u, wgpu::AddressMode::Repeat);
    }
}
