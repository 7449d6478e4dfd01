use std::fmt::Write as _;
use std::ops::Range;

/// Channel slots exposed to every pass (`iChannel0`..`iChannel3`).
pub const CHANNEL_COUNT: usize = 4;

/// Binding of the `ShaderInputs` uniform block.
pub const UNIFORM_BINDING: u32 = 0;

pub const fn texture_binding(unit: usize) -> u32 {
    1 + 2 * unit as u32
}

pub const fn sampler_binding(unit: usize) -> u32 {
    2 + 2 * unit as u32
}

/// Shared vertex stage: clip-space quad corners in, position out.
pub const VERTEX_SHADER: &str = "#version 450

layout(location = 0) in vec2 pos;

void main() {
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Named parts of an assembled fragment shader, in emission order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Section {
    Interface,
    Common,
    User,
    EntryShim,
}

impl Section {
    pub const ORDER: [Section; 4] = [
        Section::Interface,
        Section::Common,
        Section::User,
        Section::EntryShim,
    ];

    fn index(self) -> usize {
        match self {
            Section::Interface => 0,
            Section::Common => 1,
            Section::User => 2,
            Section::EntryShim => 3,
        }
    }
}

/// Where a pass draws; decides the `fragCoord` origin handed to `mainImage`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassTarget {
    /// The window surface. `fragCoord` is flipped to a bottom-left origin.
    Screen,
    /// A buffer render target. Rows are stored in `fragCoord` order so that
    /// `texture(iChannelN, fragCoord / iResolution.xy)` reads back the same
    /// texel a pass wrote.
    Offscreen,
}

/// Fragment shader text plus the byte span of each section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledShader {
    text: String,
    spans: [Range<usize>; 4],
    user_line: usize,
}

impl AssembledShader {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn section(&self, section: Section) -> &str {
        &self.text[self.spans[section.index()].clone()]
    }

    /// 1-based line of the assembled text where the pass source begins.
    pub fn user_start_line(&self) -> usize {
        self.user_line
    }

    /// Maps a line of the assembled text back into the pass source.
    pub fn user_line(&self, assembled_line: usize) -> Option<usize> {
        let user_lines = self.section(Section::User).lines().count();
        let offset = assembled_line.checked_sub(self.user_line)?;
        (offset < user_lines).then_some(offset + 1)
    }
}

/// Builds the fragment shader for one pass. Output depends only on the inputs.
pub fn assemble(common: &str, user: &str, target: PassTarget) -> AssembledShader {
    let mut text = String::new();
    let mut spans: [Range<usize>; 4] = Default::default();

    let parts = [
        interface_block(),
        with_trailing_newline(common),
        with_trailing_newline(user),
        entry_shim(target),
    ];

    let mut user_line = 1;
    for (section, part) in Section::ORDER.into_iter().zip(parts) {
        if section == Section::User {
            user_line = text.lines().count() + 1;
        }
        let start = text.len();
        text.push_str(&part);
        spans[section.index()] = start..text.len();
    }

    AssembledShader {
        text,
        spans,
        user_line,
    }
}

fn with_trailing_newline(src: &str) -> String {
    let mut s = src.to_string();
    if !s.is_empty() && !s.ends_with('\n') {
        s.push('\n');
    }
    s
}

fn interface_block() -> String {
    let mut s = String::from("#version 450\n\n");

    let _ = write!(
        s,
        "layout(set = 0, binding = {UNIFORM_BINDING}) uniform ShaderInputs {{
    vec3 iResolution;
    float iTime;
    vec4 iMouse;
    int iFrame;
}};

"
    );

    for unit in 0..CHANNEL_COUNT {
        let _ = writeln!(
            s,
            "layout(set = 0, binding = {}) uniform texture2D iChannel{unit}_texture;",
            texture_binding(unit)
        );
        let _ = writeln!(
            s,
            "layout(set = 0, binding = {}) uniform sampler iChannel{unit}_sampler;",
            sampler_binding(unit)
        );
        let _ = writeln!(
            s,
            "#define iChannel{unit} sampler2D(iChannel{unit}_texture, iChannel{unit}_sampler)"
        );
    }

    s.push_str("\nlayout(location = 0) out vec4 fragColor;\n\n");
    s
}

fn entry_shim(target: PassTarget) -> String {
    let coord = match target {
        PassTarget::Screen => "vec2(gl_FragCoord.x, iResolution.y - gl_FragCoord.y)",
        PassTarget::Offscreen => "gl_FragCoord.xy",
    };

    format!(
        "
void main() {{
    vec2 fragCoord = {coord};
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    fragColor = color;
}}
"
    )
}
