//! GLSL sources for the primitive programs
//!
//! All programs share one vertex stage. Positions arrive in pixels with a
//! top-left origin and are forwarded to the fragment stage unchanged, so the
//! distance masks below work in pixel units.

pub const VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec4 a_color;

uniform vec2 u_screen_size;

out vec2 v_position;
out vec4 v_color;

void main() {
    vec2 ndc = a_position / u_screen_size * 2.0 - 1.0;
    gl_Position = vec4(ndc.x, -ndc.y, 0.0, 1.0);
    v_position = a_position;
    v_color = a_color;
}
"#;

pub const FLAT_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_position;
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;

pub const RECTANGLE_FRAGMENT_SHADER: &str = FLAT_FRAGMENT_SHADER;

pub const LINE_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_position;
in vec4 v_color;
out vec4 frag_color;

uniform vec2 line_p1;
uniform vec2 line_p2;
uniform float line_thickness;
uniform float line_falloff;

void main() {
    vec2 ab = line_p2 - line_p1;
    float t = clamp(dot(v_position - line_p1, ab) / dot(ab, ab), 0.0, 1.0);
    float d = length(v_position - (line_p1 + ab * t));
    float edge = line_thickness * 0.5;
    float mask = 1.0 - smoothstep(edge - max(line_falloff, 0.0001), edge, d);
    frag_color = vec4(v_color.rgb, v_color.a * mask);
}
"#;

pub const CIRCLE_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_position;
in vec4 v_color;
out vec4 frag_color;

uniform vec2 circle_center;
uniform float circle_radius;
uniform float circle_falloff;

void main() {
    float d = length(v_position - circle_center);
    float mask = 1.0 - smoothstep(circle_radius - max(circle_falloff, 0.0001), circle_radius, d);
    frag_color = vec4(v_color.rgb, v_color.a * mask);
}
"#;

/// Samples `u_texture` across the quad spanning `texture_origin` to
/// `texture_origin + texture_size`
pub const TEXTURE_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_position;
in vec4 v_color;
out vec4 frag_color;

uniform sampler2D u_texture;
uniform vec2 texture_origin;
uniform vec2 texture_size;

void main() {
    vec2 uv = (v_position - texture_origin) / texture_size;
    frag_color = texture(u_texture, uv) * v_color;
}
"#;

/// Ring segment from `arc_start_angle` to `arc_end_angle` (radians, [0, 2pi)).
/// Equal angles draw the full ring.
pub const ARC_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_position;
in vec4 v_color;
out vec4 frag_color;

uniform vec2 arc_center;
uniform float arc_radius;
uniform float arc_start_angle;
uniform float arc_end_angle;
uniform float arc_thickness;
uniform float arc_falloff;

const float TAU = 6.28318530718;

void main() {
    vec2 rel = v_position - arc_center;
    float d = abs(length(rel) - arc_radius);
    float edge = arc_thickness * 0.5;
    float mask = 1.0 - smoothstep(edge - max(arc_falloff, 0.0001), edge, d);

    float angle = mod(atan(rel.y, rel.x) + TAU, TAU);
    bool inside;
    if (arc_start_angle == arc_end_angle) {
        inside = true;
    } else if (arc_start_angle < arc_end_angle) {
        inside = angle >= arc_start_angle && angle <= arc_end_angle;
    } else {
        inside = angle >= arc_start_angle || angle <= arc_end_angle;
    }

    frag_color = vec4(v_color.rgb, inside ? v_color.a * mask : 0.0);
}
"#;
